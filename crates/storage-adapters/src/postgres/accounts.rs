use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{Result, Topic, TopicRepository, User, UserRepository};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use super::{storage_error, Db};

const USER_COLUMNS: &str = "id, username, email, profile_image, role, is_active, created_at, updated_at";
const TOPIC_COLUMNS: &str = "id, name, description, created_at, updated_at";

fn user_from_row(row: &PgRow) -> std::result::Result<User, sqlx::Error> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        profile_image: row.try_get("profile_image")?,
        role: role.parse().map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn topic_from_row(row: &PgRow) -> std::result::Result<Topic, sqlx::Error> {
    Ok(Topic {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub struct PgUserRepository {
    db: Db,
}

impl PgUserRepository {
    pub(crate) fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: &User) -> Result<()> {
        let sql = format!("INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)");
        self.db
            .run(
                "users.insert",
                sqlx::query(&sql)
                    .bind(user.id)
                    .bind(&user.username)
                    .bind(&user.email)
                    .bind(&user.profile_image)
                    .bind(user.role.as_str())
                    .bind(user.is_active)
                    .bind(user.created_at)
                    .bind(user.updated_at)
                    .execute(self.db.pool()),
            )
            .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = self
            .db
            .run("users.find_by_id", sqlx::query(&sql).bind(id).fetch_optional(self.db.pool()))
            .await?;
        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(|err| storage_error("users.find_by_id", err))
    }

    async fn set_active(&self, id: Uuid, is_active: bool, at: DateTime<Utc>) -> Result<bool> {
        let done = self
            .db
            .run(
                "users.set_active",
                sqlx::query("UPDATE users SET is_active = $2, updated_at = $3 WHERE id = $1")
                    .bind(id)
                    .bind(is_active)
                    .bind(at)
                    .execute(self.db.pool()),
            )
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let done = self
            .db
            .run("users.delete", sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(self.db.pool()))
            .await?;
        Ok(done.rows_affected() > 0)
    }
}

pub struct PgTopicRepository {
    db: Db,
}

impl PgTopicRepository {
    pub(crate) fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TopicRepository for PgTopicRepository {
    async fn insert_unique(&self, topic: &Topic) -> Result<bool> {
        let sql = format!("INSERT INTO topics ({TOPIC_COLUMNS}) VALUES ($1, $2, $3, $4, $5) ON CONFLICT DO NOTHING");
        let done = self
            .db
            .run(
                "topics.insert_unique",
                sqlx::query(&sql)
                    .bind(topic.id)
                    .bind(&topic.name)
                    .bind(&topic.description)
                    .bind(topic.created_at)
                    .bind(topic.updated_at)
                    .execute(self.db.pool()),
            )
            .await?;
        Ok(done.rows_affected() == 1)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Topic>> {
        let sql = format!("SELECT {TOPIC_COLUMNS} FROM topics WHERE id = $1");
        let row = self
            .db
            .run("topics.find_by_id", sqlx::query(&sql).bind(id).fetch_optional(self.db.pool()))
            .await?;
        row.as_ref()
            .map(topic_from_row)
            .transpose()
            .map_err(|err| storage_error("topics.find_by_id", err))
    }

    async fn list(&self) -> Result<Vec<Topic>> {
        let sql = format!("SELECT {TOPIC_COLUMNS} FROM topics ORDER BY name");
        let rows = self.db.run("topics.list", sqlx::query(&sql).fetch_all(self.db.pool())).await?;
        rows.iter()
            .map(topic_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(|err| storage_error("topics.list", err))
    }
}
