use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use domains::{
    ArrayMutation, Like, Result, SortDirection, SortField, Suspension, Thread, ThreadChanges, ThreadFilter,
    ThreadRepository, ThreadSort,
};
use uuid::Uuid;

use super::slice_page;

#[derive(Default)]
pub struct MemoryThreadRepository {
    threads: DashMap<Uuid, Thread>,
}

impl MemoryThreadRepository {
    fn matching(&self, filter: &ThreadFilter) -> Vec<Thread> {
        let needle = filter.title_needle();
        self.threads
            .iter()
            .filter(|entry| {
                let thread = entry.value();
                filter.topic_id.map_or(true, |topic| thread.topic_id == topic)
                    && (filter.include_suspended || !thread.is_suspended())
                    && needle
                        .as_deref()
                        .map_or(true, |needle| thread.title.to_lowercase().contains(needle))
            })
            .map(|entry| entry.value().clone())
            .collect()
    }
}

fn compare(a: &Thread, b: &Thread, sort: ThreadSort) -> Ordering {
    let primary = match sort.field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
    };
    // v7 ids break ties in creation order, keeping pages stable
    let ordering = primary.then_with(|| a.id.cmp(&b.id));
    match sort.direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

#[async_trait]
impl ThreadRepository for MemoryThreadRepository {
    async fn insert(&self, thread: &Thread) -> Result<()> {
        self.threads.insert(thread.id, thread.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Thread>> {
        Ok(self.threads.get(&id).map(|thread| thread.clone()))
    }

    async fn update_content(&self, id: Uuid, changes: &ThreadChanges, at: DateTime<Utc>) -> Result<bool> {
        Ok(match self.threads.get_mut(&id) {
            Some(mut thread) => {
                thread.topic_id = changes.topic_id;
                thread.title = changes.title.clone();
                thread.description = changes.description.clone();
                if let Some(change) = &changes.suspension {
                    thread.suspension = change.resolve();
                }
                thread.updated_at = at;
                true
            }
            None => false,
        })
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.threads.remove(&id).is_some())
    }

    async fn push_like(&self, id: Uuid, like: Like) -> Result<ArrayMutation> {
        let Some(mut thread) = self.threads.get_mut(&id) else {
            return Ok(ArrayMutation::Missing);
        };
        if thread.is_liked_by(like.user_id) {
            return Ok(ArrayMutation::Unchanged);
        }
        thread.likes.push(like);
        Ok(ArrayMutation::Applied)
    }

    async fn pull_like(&self, id: Uuid, user_id: Uuid) -> Result<ArrayMutation> {
        let Some(mut thread) = self.threads.get_mut(&id) else {
            return Ok(ArrayMutation::Missing);
        };
        let before = thread.likes.len();
        thread.likes.retain(|like| like.user_id != user_id);
        Ok(if thread.likes.len() == before { ArrayMutation::Unchanged } else { ArrayMutation::Applied })
    }

    async fn pull_likes_by_user(&self, user_id: Uuid) -> Result<u64> {
        let mut touched = 0;
        for mut entry in self.threads.iter_mut() {
            let before = entry.likes.len();
            entry.likes.retain(|like| like.user_id != user_id);
            if entry.likes.len() != before {
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn set_suspension_by_creator(
        &self,
        creator_id: Uuid,
        suspension: Option<Suspension>,
        at: DateTime<Utc>,
    ) -> Result<u64> {
        let mut touched = 0;
        for mut entry in self.threads.iter_mut().filter(|entry| entry.creator_id == creator_id) {
            entry.suspension = suspension.clone();
            entry.updated_at = at;
            touched += 1;
        }
        Ok(touched)
    }

    async fn find_page(&self, filter: &ThreadFilter, sort: ThreadSort, skip: u64, limit: u64) -> Result<Vec<Thread>> {
        let mut threads = self.matching(filter);
        threads.sort_by(|a, b| compare(a, b, sort));
        Ok(slice_page(threads, skip, limit))
    }

    async fn count(&self, filter: &ThreadFilter) -> Result<u64> {
        Ok(self.matching(filter).len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::SuspensionChange;
    use std::sync::Arc;

    #[tokio::test]
    async fn concurrent_likes_all_land_once() {
        let repo = Arc::new(MemoryThreadRepository::default());
        let thread = Thread::new(Uuid::now_v7(), Uuid::now_v7(), "t", "d");
        let id = thread.id;
        repo.insert(&thread).await.unwrap();

        let likers: Vec<Uuid> = (0..32).map(|_| Uuid::now_v7()).collect();
        let mut tasks = Vec::new();
        for user in likers.iter().copied().chain(likers.iter().copied()) {
            let repo = repo.clone();
            tasks.push(tokio::spawn(async move { repo.push_like(id, Like::now(user)).await }));
        }
        let mut applied = 0;
        for task in tasks {
            if task.await.unwrap().unwrap() == ArrayMutation::Applied {
                applied += 1;
            }
        }

        assert_eq!(applied, 32);
        assert_eq!(repo.find_by_id(id).await.unwrap().unwrap().likes.len(), 32);
    }

    #[tokio::test]
    async fn suspended_threads_are_hidden_by_default() {
        let repo = MemoryThreadRepository::default();
        let creator = Uuid::now_v7();
        repo.insert(&Thread::new(creator, Uuid::now_v7(), "Hidden", "d")).await.unwrap();
        repo.insert(&Thread::new(Uuid::now_v7(), Uuid::now_v7(), "Visible", "d")).await.unwrap();
        repo.set_suspension_by_creator(creator, Some(Suspension::creator_suspended()), Utc::now())
            .await
            .unwrap();

        assert_eq!(repo.count(&ThreadFilter::default()).await.unwrap(), 1);
        let all = ThreadFilter { include_suspended: true, ..ThreadFilter::default() };
        assert_eq!(repo.count(&all).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn content_update_leaves_suspension_unless_asked() {
        let repo = MemoryThreadRepository::default();
        let thread = Thread::new(Uuid::now_v7(), Uuid::now_v7(), "t", "d");
        repo.insert(&thread).await.unwrap();
        let mut changes = ThreadChanges {
            topic_id: thread.topic_id,
            title: "t2".into(),
            description: "d".into(),
            suspension: Some(SuspensionChange::Suspend { detail: None }),
        };

        repo.update_content(thread.id, &changes, Utc::now()).await.unwrap();
        assert!(repo.find_by_id(thread.id).await.unwrap().unwrap().is_suspended());

        changes.suspension = None;
        repo.update_content(thread.id, &changes, Utc::now()).await.unwrap();
        assert!(repo.find_by_id(thread.id).await.unwrap().unwrap().is_suspended());

        changes.suspension = Some(SuspensionChange::Lift);
        repo.update_content(thread.id, &changes, Utc::now()).await.unwrap();
        assert!(!repo.find_by_id(thread.id).await.unwrap().unwrap().is_suspended());
    }

    #[tokio::test]
    async fn title_filter_is_case_insensitive_substring() {
        let repo = MemoryThreadRepository::default();
        for title in ["Async Rust", "borrow checker", "RUSTFMT tips"] {
            repo.insert(&Thread::new(Uuid::now_v7(), Uuid::now_v7(), title, "d")).await.unwrap();
        }
        let filter = ThreadFilter { title: Some(" rust ".into()), ..ThreadFilter::default() };
        let sort = ThreadSort { field: SortField::Title, direction: SortDirection::Asc };

        let page = repo.find_page(&filter, sort, 0, 10).await.unwrap();
        let titles: Vec<&str> = page.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Async Rust", "RUSTFMT tips"]);
    }
}
