//! Follows, bookmarks and reports. Pair uniqueness comes from the unique
//! indexes; `insert_unique` reports a conflict as `false`.

use async_trait::async_trait;
use domains::{
    Bookmark, BookmarkRepository, FollowRelation, FollowRepository, Report, ReportRepository, ReportedType,
    Result,
};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use super::{storage_error, to_i64, Db};

const FOLLOW_COLUMNS: &str = "id, user_id, thread_id, notification, created_at, updated_at";
const BOOKMARK_COLUMNS: &str = "id, user_id, thread_id, created_at, updated_at";
const REPORT_COLUMNS: &str = "id, reporter_id, reported_id, reported_type, report_detail, created_at, updated_at";

fn follow_from_row(row: &PgRow) -> std::result::Result<FollowRelation, sqlx::Error> {
    Ok(FollowRelation {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        thread_id: row.try_get("thread_id")?,
        notification: row.try_get("notification")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn bookmark_from_row(row: &PgRow) -> std::result::Result<Bookmark, sqlx::Error> {
    Ok(Bookmark {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        thread_id: row.try_get("thread_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn report_from_row(row: &PgRow) -> std::result::Result<Report, sqlx::Error> {
    let reported_type: String = row.try_get("reported_type")?;
    Ok(Report {
        id: row.try_get("id")?,
        reporter_id: row.try_get("reporter_id")?,
        reported_id: row.try_get("reported_id")?,
        reported_type: reported_type.parse().map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
        report_detail: row.try_get("report_detail")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

async fn count_by(db: &Db, op: &'static str, sql: &str, id: Uuid) -> Result<u64> {
    let total: i64 = db.run(op, sqlx::query_scalar(sql).bind(id).fetch_one(db.pool())).await?;
    Ok(total.max(0) as u64)
}

async fn delete_by(db: &Db, op: &'static str, sql: &str, id: Uuid) -> Result<u64> {
    let done = db.run(op, sqlx::query(sql).bind(id).execute(db.pool())).await?;
    Ok(done.rows_affected())
}

pub struct PgFollowRepository {
    db: Db,
}

impl PgFollowRepository {
    pub(crate) fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FollowRepository for PgFollowRepository {
    async fn insert_unique(&self, follow: &FollowRelation) -> Result<bool> {
        let sql = format!("INSERT INTO follows ({FOLLOW_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) ON CONFLICT DO NOTHING");
        let done = self
            .db
            .run(
                "follows.insert_unique",
                sqlx::query(&sql)
                    .bind(follow.id)
                    .bind(follow.user_id)
                    .bind(follow.thread_id)
                    .bind(follow.notification)
                    .bind(follow.created_at)
                    .bind(follow.updated_at)
                    .execute(self.db.pool()),
            )
            .await?;
        Ok(done.rows_affected() == 1)
    }

    async fn find(&self, user_id: Uuid, thread_id: Uuid) -> Result<Option<FollowRelation>> {
        let sql = format!("SELECT {FOLLOW_COLUMNS} FROM follows WHERE user_id = $1 AND thread_id = $2");
        let row = self
            .db
            .run("follows.find", sqlx::query(&sql).bind(user_id).bind(thread_id).fetch_optional(self.db.pool()))
            .await?;
        row.as_ref()
            .map(follow_from_row)
            .transpose()
            .map_err(|err| storage_error("follows.find", err))
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<FollowRelation>> {
        let sql = format!("SELECT {FOLLOW_COLUMNS} FROM follows WHERE user_id = $1 ORDER BY created_at DESC");
        let rows = self
            .db
            .run("follows.find_by_user", sqlx::query(&sql).bind(user_id).fetch_all(self.db.pool()))
            .await?;
        rows.iter()
            .map(follow_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(|err| storage_error("follows.find_by_user", err))
    }

    async fn delete(&self, user_id: Uuid, thread_id: Uuid) -> Result<bool> {
        let done = self
            .db
            .run(
                "follows.delete",
                sqlx::query("DELETE FROM follows WHERE user_id = $1 AND thread_id = $2")
                    .bind(user_id)
                    .bind(thread_id)
                    .execute(self.db.pool()),
            )
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_by_user(&self, user_id: Uuid) -> Result<u64> {
        delete_by(&self.db, "follows.delete_by_user", "DELETE FROM follows WHERE user_id = $1", user_id).await
    }

    async fn delete_by_thread(&self, thread_id: Uuid) -> Result<u64> {
        delete_by(&self.db, "follows.delete_by_thread", "DELETE FROM follows WHERE thread_id = $1", thread_id).await
    }

    async fn increment_notifications(&self, thread_id: Uuid, except: Option<Uuid>) -> Result<u64> {
        let done = self
            .db
            .run(
                "follows.increment_notifications",
                sqlx::query(
                    "UPDATE follows SET notification = notification + 1, updated_at = now() \
                     WHERE thread_id = $1 AND ($2::uuid IS NULL OR user_id <> $2)",
                )
                .bind(thread_id)
                .bind(except)
                .execute(self.db.pool()),
            )
            .await?;
        Ok(done.rows_affected())
    }

    async fn reset_notification(&self, user_id: Uuid, thread_id: Uuid) -> Result<bool> {
        let done = self
            .db
            .run(
                "follows.reset_notification",
                sqlx::query(
                    "UPDATE follows SET notification = 0, updated_at = now() WHERE user_id = $1 AND thread_id = $2",
                )
                .bind(user_id)
                .bind(thread_id)
                .execute(self.db.pool()),
            )
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn count_by_thread(&self, thread_id: Uuid) -> Result<u64> {
        count_by(&self.db, "follows.count_by_thread", "SELECT COUNT(*) FROM follows WHERE thread_id = $1", thread_id)
            .await
    }
}

pub struct PgBookmarkRepository {
    db: Db,
}

impl PgBookmarkRepository {
    pub(crate) fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookmarkRepository for PgBookmarkRepository {
    async fn insert_unique(&self, bookmark: &Bookmark) -> Result<bool> {
        let sql = format!("INSERT INTO bookmarks ({BOOKMARK_COLUMNS}) VALUES ($1, $2, $3, $4, $5) ON CONFLICT DO NOTHING");
        let done = self
            .db
            .run(
                "bookmarks.insert_unique",
                sqlx::query(&sql)
                    .bind(bookmark.id)
                    .bind(bookmark.user_id)
                    .bind(bookmark.thread_id)
                    .bind(bookmark.created_at)
                    .bind(bookmark.updated_at)
                    .execute(self.db.pool()),
            )
            .await?;
        Ok(done.rows_affected() == 1)
    }

    async fn find(&self, user_id: Uuid, thread_id: Uuid) -> Result<Option<Bookmark>> {
        let sql = format!("SELECT {BOOKMARK_COLUMNS} FROM bookmarks WHERE user_id = $1 AND thread_id = $2");
        let row = self
            .db
            .run("bookmarks.find", sqlx::query(&sql).bind(user_id).bind(thread_id).fetch_optional(self.db.pool()))
            .await?;
        row.as_ref()
            .map(bookmark_from_row)
            .transpose()
            .map_err(|err| storage_error("bookmarks.find", err))
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Bookmark>> {
        let sql = format!("SELECT {BOOKMARK_COLUMNS} FROM bookmarks WHERE user_id = $1 ORDER BY created_at DESC");
        let rows = self
            .db
            .run("bookmarks.find_by_user", sqlx::query(&sql).bind(user_id).fetch_all(self.db.pool()))
            .await?;
        rows.iter()
            .map(bookmark_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(|err| storage_error("bookmarks.find_by_user", err))
    }

    async fn delete(&self, user_id: Uuid, thread_id: Uuid) -> Result<bool> {
        let done = self
            .db
            .run(
                "bookmarks.delete",
                sqlx::query("DELETE FROM bookmarks WHERE user_id = $1 AND thread_id = $2")
                    .bind(user_id)
                    .bind(thread_id)
                    .execute(self.db.pool()),
            )
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_by_user(&self, user_id: Uuid) -> Result<u64> {
        delete_by(&self.db, "bookmarks.delete_by_user", "DELETE FROM bookmarks WHERE user_id = $1", user_id).await
    }

    async fn delete_by_thread(&self, thread_id: Uuid) -> Result<u64> {
        delete_by(&self.db, "bookmarks.delete_by_thread", "DELETE FROM bookmarks WHERE thread_id = $1", thread_id)
            .await
    }

    async fn count_by_thread(&self, thread_id: Uuid) -> Result<u64> {
        count_by(
            &self.db,
            "bookmarks.count_by_thread",
            "SELECT COUNT(*) FROM bookmarks WHERE thread_id = $1",
            thread_id,
        )
        .await
    }
}

pub struct PgReportRepository {
    db: Db,
}

impl PgReportRepository {
    pub(crate) fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReportRepository for PgReportRepository {
    async fn insert_unique(&self, report: &Report) -> Result<bool> {
        let sql =
            format!("INSERT INTO reports ({REPORT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) ON CONFLICT DO NOTHING");
        let done = self
            .db
            .run(
                "reports.insert_unique",
                sqlx::query(&sql)
                    .bind(report.id)
                    .bind(report.reporter_id)
                    .bind(report.reported_id)
                    .bind(report.reported_type.as_str())
                    .bind(&report.report_detail)
                    .bind(report.created_at)
                    .bind(report.updated_at)
                    .execute(self.db.pool()),
            )
            .await?;
        Ok(done.rows_affected() == 1)
    }

    async fn delete_by_target(&self, reported_id: Uuid) -> Result<u64> {
        delete_by(&self.db, "reports.delete_by_target", "DELETE FROM reports WHERE reported_id = $1", reported_id)
            .await
    }

    async fn find_page(&self, reported_type: Option<ReportedType>, skip: u64, limit: u64) -> Result<Vec<Report>> {
        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE ($1::text IS NULL OR reported_type = $1) \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let rows = self
            .db
            .run(
                "reports.find_page",
                sqlx::query(&sql)
                    .bind(reported_type.map(|kind| kind.as_str()))
                    .bind(to_i64(limit))
                    .bind(to_i64(skip))
                    .fetch_all(self.db.pool()),
            )
            .await?;
        rows.iter()
            .map(report_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(|err| storage_error("reports.find_page", err))
    }

    async fn count_by_target(&self, reported_id: Uuid) -> Result<u64> {
        count_by(
            &self.db,
            "reports.count_by_target",
            "SELECT COUNT(*) FROM reports WHERE reported_id = $1",
            reported_id,
        )
        .await
    }

    async fn count_all(&self) -> Result<u64> {
        let total: i64 = self
            .db
            .run("reports.count_all", sqlx::query_scalar("SELECT COUNT(*) FROM reports").fetch_one(self.db.pool()))
            .await?;
        Ok(total.max(0) as u64)
    }

    async fn count_by_type(&self, reported_type: ReportedType) -> Result<u64> {
        let total: i64 = self
            .db
            .run(
                "reports.count_by_type",
                sqlx::query_scalar("SELECT COUNT(*) FROM reports WHERE reported_type = $1")
                    .bind(reported_type.as_str())
                    .fetch_one(self.db.pool()),
            )
            .await?;
        Ok(total.max(0) as u64)
    }
}
