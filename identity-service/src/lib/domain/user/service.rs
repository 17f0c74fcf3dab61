use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use auth::TokenKind;
use auth::TokenPair;
use chrono::Utc;

use crate::domain::user::models::AuthenticatedSession;
use crate::domain::user::models::ChangePasswordCommand;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::MediaField;
use crate::domain::user::models::MediaFile;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;
use crate::user::errors::UserError;
use crate::user::ports::MediaUploader;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for the authentication and session lifecycle.
///
/// Concrete implementation of UserServicePort with dependency injection.
/// Holds no per-request state; the repository is the only shared mutable
/// resource, and no lock is held across two repository calls.
pub struct UserService<UR, MU>
where
    UR: UserRepository,
    MU: MediaUploader,
{
    repository: Arc<UR>,
    media_uploader: Arc<MU>,
    authenticator: Arc<Authenticator>,
}

impl<UR, MU> UserService<UR, MU>
where
    UR: UserRepository,
    MU: MediaUploader,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Credential store
    /// * `media_uploader` - Sink for profile images
    /// * `authenticator` - Password hashing and token issuing
    pub fn new(
        repository: Arc<UR>,
        media_uploader: Arc<MU>,
        authenticator: Arc<Authenticator>,
    ) -> Self {
        Self {
            repository,
            media_uploader,
            authenticator,
        }
    }

    // Argon2 is CPU-bound; keep it off the async workers.
    async fn hash_password(&self, password: String) -> Result<String, UserError> {
        let authenticator = Arc::clone(&self.authenticator);

        tokio::task::spawn_blocking(move || authenticator.hash_password(&password))
            .await
            .map_err(|e| UserError::Unknown(format!("Password hashing task failed: {}", e)))?
            .map_err(UserError::from)
    }

    async fn verify_password(&self, password: String, digest: String) -> Result<(), UserError> {
        let authenticator = Arc::clone(&self.authenticator);

        tokio::task::spawn_blocking(move || authenticator.verify_password(&password, &digest))
            .await
            .map_err(|e| UserError::Unknown(format!("Password verification task failed: {}", e)))?
            .map_err(UserError::from)
    }

    /// Mint a token pair and store its refresh half, replacing any previous one.
    async fn start_session(&self, id: &UserId) -> Result<TokenPair, UserError> {
        let tokens = self.authenticator.issue_tokens(&id.to_string())?;

        self.repository
            .set_refresh_token(id, Some(tokens.refresh.token.clone()))
            .await?;

        Ok(tokens)
    }

    async fn replace_media(
        &self,
        id: &UserId,
        field: MediaField,
        file: &MediaFile,
    ) -> Result<UserProfile, UserError> {
        let uploaded = self.media_uploader.upload(file).await.map_err(|e| {
            tracing::error!(user_id = %id, field = %field, error = %e, "Media upload failed");
            UserError::from(e)
        })?;

        let user = self
            .repository
            .update_media(id, field, &uploaded.url)
            .await?;

        tracing::info!(user_id = %id, field = %field, url = %uploaded.url, "Profile media updated");

        Ok(user.into())
    }
}

#[async_trait]
impl<UR, MU> UserServicePort for UserService<UR, MU>
where
    UR: UserRepository,
    MU: MediaUploader,
{
    async fn register(&self, command: RegisterUserCommand) -> Result<UserProfile, UserError> {
        if command.password.trim().is_empty() {
            return Err(UserError::MissingField("password"));
        }

        if let Some(existing) = self
            .repository
            .find_by_username_or_email(&command.username, &command.email)
            .await?
        {
            tracing::warn!(
                existing_user_id = %existing.id,
                username = %command.username,
                "Registration rejected: username or email already taken"
            );
            return Err(UserError::UserAlreadyExists);
        }

        let avatar_file = command.avatar.as_ref().ok_or(UserError::AvatarRequired)?;

        let avatar = self.media_uploader.upload(avatar_file).await.map_err(|e| {
            tracing::error!(username = %command.username, error = %e, "Avatar upload failed");
            UserError::from(e)
        })?;

        let cover_image = match &command.cover_image {
            Some(file) => match self.media_uploader.upload(file).await {
                Ok(uploaded) => Some(uploaded.url),
                Err(e) => {
                    tracing::warn!(
                        username = %command.username,
                        error = %e,
                        "Cover image upload failed, registering without it"
                    );
                    None
                }
            },
            None => None,
        };

        let password_hash = self.hash_password(command.password).await?;

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            username: command.username,
            email: command.email,
            full_name: command.full_name,
            password_hash,
            avatar: avatar.url,
            cover_image,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };

        let created_user = self.repository.create(user).await?;

        let stored_user = self
            .repository
            .find_by_id(&created_user.id)
            .await?
            .ok_or_else(|| {
                tracing::error!(user_id = %created_user.id, "Created user could not be read back");
                UserError::Unknown("Something went wrong while registering the user".to_string())
            })?;

        tracing::info!(
            user_id = %stored_user.id,
            username = %stored_user.username,
            "User registered"
        );

        Ok(stored_user.into())
    }

    async fn login(&self, command: LoginCommand) -> Result<AuthenticatedSession, UserError> {
        let user = self
            .repository
            .find_by_email(&command.email)
            .await?
            .ok_or_else(|| UserError::NotFound(command.email.to_string()))?;

        if let Err(e) = self
            .verify_password(command.password, user.password_hash.clone())
            .await
        {
            if matches!(e, UserError::InvalidCredentials) {
                tracing::warn!(user_id = %user.id, "Login rejected: invalid password");
            }
            return Err(e);
        }

        let tokens = self.start_session(&user.id).await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(AuthenticatedSession {
            user: user.into(),
            tokens,
        })
    }

    async fn logout(&self, id: &UserId) -> Result<(), UserError> {
        self.repository.set_refresh_token(id, None).await?;

        tracing::info!(user_id = %id, "User logged out");

        Ok(())
    }

    async fn refresh_access(&self, presented: Option<String>) -> Result<TokenPair, UserError> {
        let presented = presented
            .filter(|token| !token.trim().is_empty())
            .ok_or(UserError::MissingRefreshToken)?;

        let claims = self
            .authenticator
            .verify_token(&presented, TokenKind::Refresh)
            .map_err(|e| {
                tracing::warn!(error = %e, "Invalid refresh token presented");
                UserError::InvalidRefreshToken(e.to_string())
            })?;

        let user_id = UserId::from_string(&claims.sub)
            .map_err(|_| UserError::InvalidRefreshToken("unknown subject".to_string()))?;

        let user = self
            .repository
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(user_id = %user_id, "Refresh token subject no longer exists");
                UserError::InvalidRefreshToken("unknown subject".to_string())
            })?;

        if user.refresh_token.as_deref() != Some(presented.as_str()) {
            tracing::error!(
                user_id = %user.id,
                jti = %claims.jti,
                "SECURITY: superseded refresh token presented, possible token theft"
            );
            return Err(UserError::RefreshTokenReused);
        }

        let tokens = self.authenticator.issue_tokens(&user.id.to_string())?;

        let rotated = self
            .repository
            .rotate_refresh_token(&user.id, &presented, &tokens.refresh.token)
            .await?;
        if !rotated {
            tracing::error!(
                user_id = %user.id,
                jti = %claims.jti,
                "SECURITY: refresh token redeemed concurrently, possible token theft"
            );
            return Err(UserError::RefreshTokenReused);
        }

        tracing::info!(user_id = %user.id, "Access token refreshed");

        Ok(tokens)
    }

    async fn change_password(
        &self,
        id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), UserError> {
        if command.new_password.trim().is_empty() {
            return Err(UserError::MissingField("new_password"));
        }
        if command.new_password != command.confirm_password {
            return Err(UserError::PasswordMismatch);
        }

        let user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;

        if let Err(e) = self
            .verify_password(command.old_password, user.password_hash)
            .await
        {
            if matches!(e, UserError::InvalidCredentials) {
                tracing::warn!(user_id = %id, "Password change rejected: wrong old password");
            }
            return Err(e);
        }

        let password_hash = self.hash_password(command.new_password).await?;
        self.repository.update_password(id, &password_hash).await?;

        // Existing sessions must re-authenticate with the new password.
        self.repository.set_refresh_token(id, None).await?;

        tracing::info!(user_id = %id, "Password changed, refresh token revoked");

        Ok(())
    }

    async fn get_current_user(&self, id: &UserId) -> Result<UserProfile, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .map(UserProfile::from)
            .ok_or(UserError::NotFound(id.to_string()))
    }

    async fn update_profile(
        &self,
        id: &UserId,
        command: UpdateProfileCommand,
    ) -> Result<UserProfile, UserError> {
        let user = self
            .repository
            .update_profile(id, &command.full_name, &command.email)
            .await?;

        tracing::info!(user_id = %id, "Account details updated");

        Ok(user.into())
    }

    async fn update_avatar(&self, id: &UserId, file: MediaFile) -> Result<UserProfile, UserError> {
        self.replace_media(id, MediaField::Avatar, &file).await
    }

    async fn update_cover_image(
        &self,
        id: &UserId,
        file: MediaFile,
    ) -> Result<UserProfile, UserError> {
        self.replace_media(id, MediaField::CoverImage, &file).await
    }
}
