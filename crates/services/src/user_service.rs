//! User lookups and the account flag. Anything that also touches other
//! collections (suspension, deletion) is driven by the coordinator.

use std::sync::Arc;

use chrono::Utc;
use domains::{AppError, Result, Role, User, UserRepository};
use tracing::info;
use uuid::Uuid;

use crate::require_text;

pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Persists an account handed over by the registration flow.
    pub async fn create(&self, username: &str, email: &str, role: Role) -> Result<User> {
        let user = User::new(require_text("username", username)?, require_text("email", email)?, role);
        self.users.insert(&user).await?;
        info!(user_id = %user.id, role = role.as_str(), "user created");
        Ok(user)
    }

    pub async fn get(&self, user_id: Uuid) -> Result<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound(user_id))
    }

    pub async fn find(&self, user_id: Uuid) -> Result<Option<User>> {
        self.users.find_by_id(user_id).await
    }

    /// Toggles `is_active`. Admin accounts can never be deactivated.
    pub(crate) async fn set_active(&self, user: &User, is_active: bool) -> Result<()> {
        if user.is_admin() {
            return Err(AppError::CannotSuspendAdmin);
        }
        if !self.users.set_active(user.id, is_active, Utc::now()).await? {
            return Err(AppError::UserNotFound(user.id));
        }
        info!(user_id = %user.id, is_active, "account flag changed");
        Ok(())
    }

    pub(crate) async fn remove(&self, user_id: Uuid) -> Result<()> {
        if !self.users.delete(user_id).await? {
            return Err(AppError::UserNotFound(user_id));
        }
        Ok(())
    }
}
