use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    ArrayMutation, Like, Result, SortDirection, SortField, Suspension, Thread, ThreadChanges, ThreadFilter,
    ThreadRepository, ThreadSort,
};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

use super::{storage_error, to_i64, Db};

const THREAD_COLUMNS: &str =
    "id, topic_id, creator_id, title, description, likes, suspension_status, suspension_detail, created_at, updated_at";

/// Matches a `likes` array holding an element for the user in `$n`.
fn liked_by(param: usize) -> String {
    format!("likes @> jsonb_build_array(jsonb_build_object('user_id', ${param}::text))")
}

fn thread_from_row(row: &PgRow) -> std::result::Result<Thread, sqlx::Error> {
    let Json(likes): Json<Vec<Like>> = row.try_get("likes")?;
    let status: Option<String> = row.try_get("suspension_status")?;
    let detail: Option<String> = row.try_get("suspension_detail")?;
    Ok(Thread {
        id: row.try_get("id")?,
        topic_id: row.try_get("topic_id")?,
        creator_id: row.try_get("creator_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        likes,
        suspension: status.map(|status| Suspension { status, detail: detail.unwrap_or_default() }),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// `%` and `_` in the user's needle are literals, not wildcards.
fn like_pattern(needle: &str) -> String {
    let escaped = needle.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ThreadFilter) {
    qb.push(" WHERE TRUE");
    if let Some(topic_id) = filter.topic_id {
        qb.push(" AND topic_id = ").push_bind(topic_id);
    }
    if !filter.include_suspended {
        qb.push(" AND suspension_status IS NULL");
    }
    if let Some(needle) = filter.title_needle() {
        qb.push(" AND lower(title) LIKE ").push_bind(like_pattern(&needle));
    }
}

fn order_by(sort: ThreadSort) -> String {
    let column = match sort.field {
        SortField::CreatedAt => "created_at",
        SortField::UpdatedAt => "updated_at",
        SortField::Title => "lower(title)",
    };
    let direction = match sort.direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    };
    format!(" ORDER BY {column} {direction}, id {direction}")
}

pub struct PgThreadRepository {
    db: Db,
}

impl PgThreadRepository {
    pub(crate) fn new(db: Db) -> Self {
        Self { db }
    }

    /// Tells `Unchanged` from `Missing` after a conditional update touched nothing.
    async fn untouched(&self, op: &'static str, id: Uuid) -> Result<ArrayMutation> {
        let exists: bool = self
            .db
            .run(
                op,
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM threads WHERE id = $1)")
                    .bind(id)
                    .fetch_one(self.db.pool()),
            )
            .await?;
        Ok(if exists { ArrayMutation::Unchanged } else { ArrayMutation::Missing })
    }
}

#[async_trait]
impl ThreadRepository for PgThreadRepository {
    async fn insert(&self, thread: &Thread) -> Result<()> {
        let sql = format!("INSERT INTO threads ({THREAD_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)");
        let suspension = thread.suspension.as_ref();
        self.db
            .run(
                "threads.insert",
                sqlx::query(&sql)
                    .bind(thread.id)
                    .bind(thread.topic_id)
                    .bind(thread.creator_id)
                    .bind(&thread.title)
                    .bind(&thread.description)
                    .bind(Json(&thread.likes))
                    .bind(suspension.map(|s| s.status.as_str()))
                    .bind(suspension.map(|s| s.detail.as_str()))
                    .bind(thread.created_at)
                    .bind(thread.updated_at)
                    .execute(self.db.pool()),
            )
            .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Thread>> {
        let sql = format!("SELECT {THREAD_COLUMNS} FROM threads WHERE id = $1");
        let row = self
            .db
            .run("threads.find_by_id", sqlx::query(&sql).bind(id).fetch_optional(self.db.pool()))
            .await?;
        row.as_ref()
            .map(thread_from_row)
            .transpose()
            .map_err(|err| storage_error("threads.find_by_id", err))
    }

    async fn update_content(&self, id: Uuid, changes: &ThreadChanges, at: DateTime<Utc>) -> Result<bool> {
        let touch_suspension = changes.suspension.is_some();
        let suspension = changes.suspension.as_ref().and_then(|change| change.resolve());
        let done = self
            .db
            .run(
                "threads.update_content",
                sqlx::query(
                    "UPDATE threads SET topic_id = $2, title = $3, description = $4, updated_at = $5, \
                     suspension_status = CASE WHEN $6 THEN $7 ELSE suspension_status END, \
                     suspension_detail = CASE WHEN $6 THEN $8 ELSE suspension_detail END \
                     WHERE id = $1",
                )
                .bind(id)
                .bind(changes.topic_id)
                .bind(&changes.title)
                .bind(&changes.description)
                .bind(at)
                .bind(touch_suspension)
                .bind(suspension.as_ref().map(|s| s.status.clone()))
                .bind(suspension.map(|s| s.detail))
                .execute(self.db.pool()),
            )
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let done = self
            .db
            .run("threads.delete", sqlx::query("DELETE FROM threads WHERE id = $1").bind(id).execute(self.db.pool()))
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn push_like(&self, id: Uuid, like: Like) -> Result<ArrayMutation> {
        let sql = format!(
            "UPDATE threads SET likes = likes || jsonb_build_array($2::jsonb) WHERE id = $1 AND NOT {}",
            liked_by(3)
        );
        let done = self
            .db
            .run(
                "threads.push_like",
                sqlx::query(&sql)
                    .bind(id)
                    .bind(Json(&like))
                    .bind(like.user_id.to_string())
                    .execute(self.db.pool()),
            )
            .await?;
        if done.rows_affected() > 0 {
            return Ok(ArrayMutation::Applied);
        }
        self.untouched("threads.push_like", id).await
    }

    async fn pull_like(&self, id: Uuid, user_id: Uuid) -> Result<ArrayMutation> {
        let sql = format!("{} WHERE id = $1 AND {}", without_user(2), liked_by(2));
        let done = self
            .db
            .run(
                "threads.pull_like",
                sqlx::query(&sql).bind(id).bind(user_id.to_string()).execute(self.db.pool()),
            )
            .await?;
        if done.rows_affected() > 0 {
            return Ok(ArrayMutation::Applied);
        }
        self.untouched("threads.pull_like", id).await
    }

    async fn pull_likes_by_user(&self, user_id: Uuid) -> Result<u64> {
        let sql = format!("{} WHERE {}", without_user(1), liked_by(1));
        let done = self
            .db
            .run(
                "threads.pull_likes_by_user",
                sqlx::query(&sql).bind(user_id.to_string()).execute(self.db.pool()),
            )
            .await?;
        Ok(done.rows_affected())
    }

    async fn set_suspension_by_creator(
        &self,
        creator_id: Uuid,
        suspension: Option<Suspension>,
        at: DateTime<Utc>,
    ) -> Result<u64> {
        let (status, detail) = match suspension {
            Some(s) => (Some(s.status), Some(s.detail)),
            None => (None, None),
        };
        let done = self
            .db
            .run(
                "threads.set_suspension_by_creator",
                sqlx::query(
                    "UPDATE threads SET suspension_status = $2, suspension_detail = $3, updated_at = $4 \
                     WHERE creator_id = $1",
                )
                .bind(creator_id)
                .bind(status)
                .bind(detail)
                .bind(at)
                .execute(self.db.pool()),
            )
            .await?;
        Ok(done.rows_affected())
    }

    async fn find_page(&self, filter: &ThreadFilter, sort: ThreadSort, skip: u64, limit: u64) -> Result<Vec<Thread>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {THREAD_COLUMNS} FROM threads"));
        push_filter(&mut qb, filter);
        qb.push(order_by(sort));
        qb.push(" LIMIT ").push_bind(to_i64(limit));
        qb.push(" OFFSET ").push_bind(to_i64(skip));

        let rows = self.db.run("threads.find_page", qb.build().fetch_all(self.db.pool())).await?;
        rows.iter()
            .map(thread_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(|err| storage_error("threads.find_page", err))
    }

    async fn count(&self, filter: &ThreadFilter) -> Result<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM threads");
        push_filter(&mut qb, filter);
        let total: i64 = self
            .db
            .run("threads.count", qb.build_query_scalar().fetch_one(self.db.pool()))
            .await?;
        Ok(total.max(0) as u64)
    }
}

/// Rebuilds `likes` without the user in `$n`, keeping the original order.
fn without_user(param: usize) -> String {
    format!(
        "UPDATE threads SET likes = COALESCE(\
         (SELECT jsonb_agg(elem ORDER BY ord) \
          FROM jsonb_array_elements(likes) WITH ORDINALITY AS t(elem, ord) \
          WHERE elem->>'user_id' <> ${param}::text), '[]'::jsonb)"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(like_pattern("100%_rust"), "%100\\%\\_rust%");
    }

    #[test]
    fn title_sort_is_case_insensitive_with_id_tiebreak() {
        let sort = ThreadSort { field: SortField::Title, direction: SortDirection::Asc };
        assert_eq!(order_by(sort), " ORDER BY lower(title) ASC, id ASC");
        assert_eq!(order_by(ThreadSort::default()), " ORDER BY created_at DESC, id DESC");
    }

    #[test]
    fn filter_hides_suspended_by_default() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM threads");
        push_filter(&mut qb, &ThreadFilter { title: Some("Rust".into()), ..ThreadFilter::default() });
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM threads WHERE TRUE AND suspension_status IS NULL AND lower(title) LIKE $1"
        );
    }
}
