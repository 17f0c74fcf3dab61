use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::FullName;
use crate::domain::user::models::MediaField;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

/// Process-local credential store.
///
/// Used for local development and the integration tests. Each write takes the
/// lock once, so the uniqueness check and the insert cannot interleave with
/// another registration.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn modify<F>(&self, id: &UserId, apply: F) -> Result<User, UserError>
    where
        F: FnOnce(&mut User) + Send,
    {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(id)
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;

        apply(user);
        user.updated_at = Utc::now();

        Ok(user.clone())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.username == user.username) {
            return Err(UserError::UsernameAlreadyExists(user.username.to_string()));
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(UserError::EmailAlreadyExists(user.email.to_string()));
        }

        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn find_by_username_or_email(
        &self,
        username: &Username,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| &u.username == username || &u.email == email)
            .cloned())
    }

    async fn set_refresh_token(
        &self,
        id: &UserId,
        token: Option<String>,
    ) -> Result<(), UserError> {
        self.modify(id, |user| user.refresh_token = token).await?;
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        id: &UserId,
        expected: &str,
        new: &str,
    ) -> Result<bool, UserError> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(id) else {
            return Ok(false);
        };

        if user.refresh_token.as_deref() != Some(expected) {
            return Ok(false);
        }

        user.refresh_token = Some(new.to_string());
        user.updated_at = Utc::now();

        Ok(true)
    }

    async fn update_profile(
        &self,
        id: &UserId,
        full_name: &FullName,
        email: &EmailAddress,
    ) -> Result<User, UserError> {
        let mut users = self.users.write().await;

        if users.values().any(|u| &u.email == email && &u.id != id) {
            return Err(UserError::EmailAlreadyExists(email.to_string()));
        }

        let user = users
            .get_mut(id)
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;
        user.full_name = full_name.clone();
        user.email = email.clone();
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn update_media(
        &self,
        id: &UserId,
        field: MediaField,
        url: &str,
    ) -> Result<User, UserError> {
        let url = url.to_string();
        self.modify(id, |user| match field {
            MediaField::Avatar => user.avatar = url,
            MediaField::CoverImage => user.cover_image = Some(url),
        })
        .await
    }

    async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<(), UserError> {
        let password_hash = password_hash.to_string();
        self.modify(id, |user| user.password_hash = password_hash)
            .await?;
        Ok(())
    }
}
