use async_trait::async_trait;
use domains::{Comment, CommentRepository, Result};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use super::{storage_error, to_i64, Db};

const COMMENT_COLUMNS: &str = "id, thread_id, user_id, parent_id, content, image, created_at, updated_at";

fn comment_from_row(row: &PgRow) -> std::result::Result<Comment, sqlx::Error> {
    Ok(Comment {
        id: row.try_get("id")?,
        thread_id: row.try_get("thread_id")?,
        user_id: row.try_get("user_id")?,
        parent_id: row.try_get("parent_id")?,
        content: row.try_get("content")?,
        image: row.try_get("image")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub struct PgCommentRepository {
    db: Db,
}

impl PgCommentRepository {
    pub(crate) fn new(db: Db) -> Self {
        Self { db }
    }

    async fn fetch(&self, op: &'static str, predicate: &str, id: Uuid) -> Result<Vec<Comment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE {predicate} ORDER BY created_at, id");
        let rows = self.db.run(op, sqlx::query(&sql).bind(id).fetch_all(self.db.pool())).await?;
        rows.iter()
            .map(comment_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(|err| storage_error(op, err))
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn insert(&self, comment: &Comment) -> Result<()> {
        let sql = format!("INSERT INTO comments ({COMMENT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)");
        self.db
            .run(
                "comments.insert",
                sqlx::query(&sql)
                    .bind(comment.id)
                    .bind(comment.thread_id)
                    .bind(comment.user_id)
                    .bind(comment.parent_id)
                    .bind(&comment.content)
                    .bind(&comment.image)
                    .bind(comment.created_at)
                    .bind(comment.updated_at)
                    .execute(self.db.pool()),
            )
            .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        let row = self
            .db
            .run("comments.find_by_id", sqlx::query(&sql).bind(id).fetch_optional(self.db.pool()))
            .await?;
        row.as_ref()
            .map(comment_from_row)
            .transpose()
            .map_err(|err| storage_error("comments.find_by_id", err))
    }

    async fn update(&self, comment: &Comment) -> Result<bool> {
        let done = self
            .db
            .run(
                "comments.update",
                sqlx::query("UPDATE comments SET content = $2, image = $3, updated_at = $4 WHERE id = $1")
                    .bind(comment.id)
                    .bind(&comment.content)
                    .bind(&comment.image)
                    .bind(comment.updated_at)
                    .execute(self.db.pool()),
            )
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let done = self
            .db
            .run("comments.delete", sqlx::query("DELETE FROM comments WHERE id = $1").bind(id).execute(self.db.pool()))
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64> {
        let done = self
            .db
            .run(
                "comments.delete_many",
                sqlx::query("DELETE FROM comments WHERE id = ANY($1)").bind(ids).execute(self.db.pool()),
            )
            .await?;
        Ok(done.rows_affected())
    }

    async fn find_by_thread(&self, thread_id: Uuid) -> Result<Vec<Comment>> {
        self.fetch("comments.find_by_thread", "thread_id = $1", thread_id).await
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Comment>> {
        self.fetch("comments.find_by_user", "user_id = $1", user_id).await
    }

    async fn find_replies(&self, parent_ids: &[Uuid]) -> Result<Vec<Comment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE parent_id = ANY($1) ORDER BY created_at, id");
        let rows = self
            .db
            .run("comments.find_replies", sqlx::query(&sql).bind(parent_ids).fetch_all(self.db.pool()))
            .await?;
        rows.iter()
            .map(comment_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(|err| storage_error("comments.find_replies", err))
    }

    async fn find_page_by_thread(&self, thread_id: Uuid, skip: u64, limit: u64) -> Result<Vec<Comment>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE thread_id = $1 ORDER BY created_at, id LIMIT $2 OFFSET $3"
        );
        let rows = self
            .db
            .run(
                "comments.find_page_by_thread",
                sqlx::query(&sql)
                    .bind(thread_id)
                    .bind(to_i64(limit))
                    .bind(to_i64(skip))
                    .fetch_all(self.db.pool()),
            )
            .await?;
        rows.iter()
            .map(comment_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(|err| storage_error("comments.find_page_by_thread", err))
    }

    async fn count_by_thread(&self, thread_id: Uuid) -> Result<u64> {
        let total: i64 = self
            .db
            .run(
                "comments.count_by_thread",
                sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE thread_id = $1")
                    .bind(thread_id)
                    .fetch_one(self.db.pool()),
            )
            .await?;
        Ok(total.max(0) as u64)
    }
}
