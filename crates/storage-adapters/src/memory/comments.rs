use async_trait::async_trait;
use dashmap::DashMap;
use domains::{Comment, CommentRepository, Result};
use uuid::Uuid;

use super::slice_page;

#[derive(Default)]
pub struct MemoryCommentRepository {
    comments: DashMap<Uuid, Comment>,
}

impl MemoryCommentRepository {
    /// Matching comments, oldest first.
    fn collect_where(&self, predicate: impl Fn(&Comment) -> bool) -> Vec<Comment> {
        let mut found: Vec<Comment> = self
            .comments
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        found
    }
}

#[async_trait]
impl CommentRepository for MemoryCommentRepository {
    async fn insert(&self, comment: &Comment) -> Result<()> {
        self.comments.insert(comment.id, comment.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        Ok(self.comments.get(&id).map(|comment| comment.clone()))
    }

    async fn update(&self, comment: &Comment) -> Result<bool> {
        Ok(match self.comments.get_mut(&comment.id) {
            Some(mut stored) => {
                *stored = comment.clone();
                true
            }
            None => false,
        })
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.comments.remove(&id).is_some())
    }

    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64> {
        let mut removed = 0;
        for id in ids {
            if self.comments.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn find_by_thread(&self, thread_id: Uuid) -> Result<Vec<Comment>> {
        Ok(self.collect_where(|c| c.thread_id == thread_id))
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Comment>> {
        Ok(self.collect_where(|c| c.user_id == user_id))
    }

    async fn find_replies(&self, parent_ids: &[Uuid]) -> Result<Vec<Comment>> {
        Ok(self.collect_where(|c| c.parent_id.is_some_and(|parent| parent_ids.contains(&parent))))
    }

    async fn find_page_by_thread(&self, thread_id: Uuid, skip: u64, limit: u64) -> Result<Vec<Comment>> {
        Ok(slice_page(self.collect_where(|c| c.thread_id == thread_id), skip, limit))
    }

    async fn count_by_thread(&self, thread_id: Uuid) -> Result<u64> {
        Ok(self.comments.iter().filter(|entry| entry.thread_id == thread_id).count() as u64)
    }
}
