//! # PostgreSQL adapter
//!
//! sqlx with runtime-checked queries. Every call runs under the configured
//! deadline. Atomicity is per statement: the like list is edited with a
//! conditional `UPDATE`, and pair uniqueness is enforced by unique indexes
//! with `ON CONFLICT DO NOTHING`.

mod accounts;
mod comments;
mod relations;
mod threads;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use domains::{AppError, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{error, info};

use crate::timeout::bounded;

pub use accounts::{PgTopicRepository, PgUserRepository};
pub use comments::PgCommentRepository;
pub use relations::{PgBookmarkRepository, PgFollowRepository, PgReportRepository};
pub use threads::PgThreadRepository;

/// Pool plus deadline, shared by every repository.
#[derive(Clone)]
pub(crate) struct Db {
    pool: PgPool,
    timeout: Duration,
}

impl Db {
    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub(crate) async fn run<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        bounded(op, self.timeout, async { fut.await.map_err(|err| storage_error(op, err)) }).await
    }
}

pub(crate) fn storage_error(op: &'static str, err: sqlx::Error) -> AppError {
    error!(op, error = %err, "postgres call failed");
    AppError::Storage(format!("{op}: {err}"))
}

pub(crate) fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Every repository over one pool.
#[derive(Clone)]
pub struct PgStore {
    pub users: Arc<PgUserRepository>,
    pub topics: Arc<PgTopicRepository>,
    pub threads: Arc<PgThreadRepository>,
    pub comments: Arc<PgCommentRepository>,
    pub follows: Arc<PgFollowRepository>,
    pub bookmarks: Arc<PgBookmarkRepository>,
    pub reports: Arc<PgReportRepository>,
    db: Db,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32, timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(timeout)
            .connect(url)
            .await
            .map_err(|err| storage_error("postgres.connect", err))?;
        info!(max_connections, "postgres pool ready");
        Ok(Self::from_pool(pool, timeout))
    }

    pub fn from_pool(pool: PgPool, timeout: Duration) -> Self {
        let db = Db { pool, timeout };
        Self {
            users: Arc::new(PgUserRepository::new(db.clone())),
            topics: Arc::new(PgTopicRepository::new(db.clone())),
            threads: Arc::new(PgThreadRepository::new(db.clone())),
            comments: Arc::new(PgCommentRepository::new(db.clone())),
            follows: Arc::new(PgFollowRepository::new(db.clone())),
            bookmarks: Arc::new(PgBookmarkRepository::new(db.clone())),
            reports: Arc::new(PgReportRepository::new(db.clone())),
            db,
        }
    }

    /// Applies the bundled schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(self.db.pool())
            .await
            .map_err(|err| AppError::Storage(format!("migration failed: {err}")))?;
        info!("schema migrations applied");
        Ok(())
    }
}
