//! Follow, bookmark and report stores. All three are keyed by their natural
//! pair, so the uniqueness rule is the map key itself.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{
    Bookmark, BookmarkRepository, FollowRelation, FollowRepository, Report, ReportRepository, ReportedType,
    Result,
};
use uuid::Uuid;

use super::slice_page;

fn insert_if_absent<V: Clone>(map: &DashMap<(Uuid, Uuid), V>, key: (Uuid, Uuid), value: &V) -> bool {
    match map.entry(key) {
        Entry::Occupied(_) => false,
        Entry::Vacant(slot) => {
            slot.insert(value.clone());
            true
        }
    }
}

fn remove_where<V>(map: &DashMap<(Uuid, Uuid), V>, predicate: impl Fn(&(Uuid, Uuid)) -> bool) -> u64 {
    let mut removed = 0;
    map.retain(|key, _| {
        let doomed = predicate(key);
        if doomed {
            removed += 1;
        }
        !doomed
    });
    removed
}

/// Keyed by `(user_id, thread_id)`.
#[derive(Default)]
pub struct MemoryFollowRepository {
    follows: DashMap<(Uuid, Uuid), FollowRelation>,
}

#[async_trait]
impl FollowRepository for MemoryFollowRepository {
    async fn insert_unique(&self, follow: &FollowRelation) -> Result<bool> {
        Ok(insert_if_absent(&self.follows, (follow.user_id, follow.thread_id), follow))
    }

    async fn find(&self, user_id: Uuid, thread_id: Uuid) -> Result<Option<FollowRelation>> {
        Ok(self.follows.get(&(user_id, thread_id)).map(|follow| follow.clone()))
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<FollowRelation>> {
        let mut follows: Vec<FollowRelation> = self
            .follows
            .iter()
            .filter(|entry| entry.key().0 == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        follows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(follows)
    }

    async fn delete(&self, user_id: Uuid, thread_id: Uuid) -> Result<bool> {
        Ok(self.follows.remove(&(user_id, thread_id)).is_some())
    }

    async fn delete_by_user(&self, user_id: Uuid) -> Result<u64> {
        Ok(remove_where(&self.follows, |(user, _)| *user == user_id))
    }

    async fn delete_by_thread(&self, thread_id: Uuid) -> Result<u64> {
        Ok(remove_where(&self.follows, |(_, thread)| *thread == thread_id))
    }

    async fn increment_notifications(&self, thread_id: Uuid, except: Option<Uuid>) -> Result<u64> {
        let now = Utc::now();
        let mut touched = 0;
        for mut entry in self.follows.iter_mut() {
            let (user, thread) = *entry.key();
            if thread != thread_id || except == Some(user) {
                continue;
            }
            entry.notification += 1;
            entry.updated_at = now;
            touched += 1;
        }
        Ok(touched)
    }

    async fn reset_notification(&self, user_id: Uuid, thread_id: Uuid) -> Result<bool> {
        Ok(match self.follows.get_mut(&(user_id, thread_id)) {
            Some(mut follow) => {
                follow.notification = 0;
                follow.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn count_by_thread(&self, thread_id: Uuid) -> Result<u64> {
        Ok(self.follows.iter().filter(|entry| entry.key().1 == thread_id).count() as u64)
    }
}

/// Keyed by `(user_id, thread_id)`.
#[derive(Default)]
pub struct MemoryBookmarkRepository {
    bookmarks: DashMap<(Uuid, Uuid), Bookmark>,
}

#[async_trait]
impl BookmarkRepository for MemoryBookmarkRepository {
    async fn insert_unique(&self, bookmark: &Bookmark) -> Result<bool> {
        Ok(insert_if_absent(&self.bookmarks, (bookmark.user_id, bookmark.thread_id), bookmark))
    }

    async fn find(&self, user_id: Uuid, thread_id: Uuid) -> Result<Option<Bookmark>> {
        Ok(self.bookmarks.get(&(user_id, thread_id)).map(|bookmark| bookmark.clone()))
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Bookmark>> {
        let mut bookmarks: Vec<Bookmark> = self
            .bookmarks
            .iter()
            .filter(|entry| entry.key().0 == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        bookmarks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookmarks)
    }

    async fn delete(&self, user_id: Uuid, thread_id: Uuid) -> Result<bool> {
        Ok(self.bookmarks.remove(&(user_id, thread_id)).is_some())
    }

    async fn delete_by_user(&self, user_id: Uuid) -> Result<u64> {
        Ok(remove_where(&self.bookmarks, |(user, _)| *user == user_id))
    }

    async fn delete_by_thread(&self, thread_id: Uuid) -> Result<u64> {
        Ok(remove_where(&self.bookmarks, |(_, thread)| *thread == thread_id))
    }

    async fn count_by_thread(&self, thread_id: Uuid) -> Result<u64> {
        Ok(self.bookmarks.iter().filter(|entry| entry.key().1 == thread_id).count() as u64)
    }
}

/// Keyed by `(reporter_id, reported_id)`.
#[derive(Default)]
pub struct MemoryReportRepository {
    reports: DashMap<(Uuid, Uuid), Report>,
}

impl MemoryReportRepository {
    fn count_where(&self, predicate: impl Fn(&Report) -> bool) -> u64 {
        self.reports.iter().filter(|entry| predicate(entry.value())).count() as u64
    }
}

#[async_trait]
impl ReportRepository for MemoryReportRepository {
    async fn insert_unique(&self, report: &Report) -> Result<bool> {
        Ok(insert_if_absent(&self.reports, (report.reporter_id, report.reported_id), report))
    }

    async fn delete_by_target(&self, reported_id: Uuid) -> Result<u64> {
        Ok(remove_where(&self.reports, |(_, target)| *target == reported_id))
    }

    async fn find_page(&self, reported_type: Option<ReportedType>, skip: u64, limit: u64) -> Result<Vec<Report>> {
        let mut reports: Vec<Report> = self
            .reports
            .iter()
            .filter(|entry| reported_type.map_or(true, |kind| entry.reported_type == kind))
            .map(|entry| entry.value().clone())
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(slice_page(reports, skip, limit))
    }

    async fn count_by_target(&self, reported_id: Uuid) -> Result<u64> {
        Ok(self.count_where(|report| report.reported_id == reported_id))
    }

    async fn count_all(&self) -> Result<u64> {
        Ok(self.reports.len() as u64)
    }

    async fn count_by_type(&self, reported_type: ReportedType) -> Result<u64> {
        Ok(self.count_where(|report| report.reported_type == reported_type))
    }
}
