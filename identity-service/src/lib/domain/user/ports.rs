use async_trait::async_trait;
use auth::TokenPair;

use crate::domain::user::models::AuthenticatedSession;
use crate::domain::user::models::ChangePasswordCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::FullName;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::MediaField;
use crate::domain::user::models::MediaFile;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::UploadedMedia;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;
use crate::domain::user::models::Username;
use crate::user::errors::MediaUploadError;
use crate::user::errors::UserError;

/// Port for the authentication and session lifecycle.
///
/// Every operation ends in exactly one outcome: the success value or one
/// `UserError`.
#[async_trait]
pub trait UserServicePort: Send + Sync + 'static {
    /// Register a new user.
    ///
    /// # Errors
    /// * `MissingField` / value errors - Required input is empty or malformed
    /// * `UserAlreadyExists` - Username or email is taken
    /// * `AvatarRequired` - No avatar file supplied
    /// * `Upload` - Avatar upload failed
    async fn register(&self, command: RegisterUserCommand) -> Result<UserProfile, UserError>;

    /// Verify credentials and start a new session, superseding any previous one.
    ///
    /// # Errors
    /// * `NotFound` - No user with that email
    /// * `InvalidCredentials` - Wrong password
    async fn login(&self, command: LoginCommand) -> Result<AuthenticatedSession, UserError>;

    /// End the user's session. Idempotent.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn logout(&self, id: &UserId) -> Result<(), UserError>;

    /// Exchange the current refresh token for a new token pair (rotation).
    ///
    /// # Errors
    /// * `MissingRefreshToken` - Nothing presented
    /// * `InvalidRefreshToken` - Signature, expiry, kind, or subject check failed
    /// * `RefreshTokenReused` - Token is no longer the stored one
    async fn refresh_access(&self, presented: Option<String>) -> Result<TokenPair, UserError>;

    /// Replace the password and revoke the stored refresh token.
    ///
    /// # Errors
    /// * `PasswordMismatch` - New password and confirmation differ
    /// * `InvalidCredentials` - Old password is wrong
    async fn change_password(
        &self,
        id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), UserError>;

    /// Read the projection of an authenticated user.
    async fn get_current_user(&self, id: &UserId) -> Result<UserProfile, UserError>;

    /// Update display name and email.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email belongs to another user
    async fn update_profile(
        &self,
        id: &UserId,
        command: UpdateProfileCommand,
    ) -> Result<UserProfile, UserError>;

    /// Upload a new avatar and point the user at it.
    ///
    /// # Errors
    /// * `Upload` - Upload failed; the stored avatar is left unchanged
    async fn update_avatar(&self, id: &UserId, file: MediaFile) -> Result<UserProfile, UserError>;

    /// Upload a new cover image and point the user at it.
    ///
    /// # Errors
    /// * `Upload` - Upload failed; the stored cover image is left unchanged
    async fn update_cover_image(
        &self,
        id: &UserId,
        file: MediaFile,
    ) -> Result<UserProfile, UserError>;
}

/// Persistence operations for the user aggregate, including its single
/// refresh-token slot.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// Uniqueness of username and email is enforced here, atomically with the
    /// insert.
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Username is already taken
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: User) -> Result<User, UserError>;

    /// Retrieve user by identifier.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;

    /// Retrieve user by email address.
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError>;

    /// Retrieve the first user matching either the username or the email.
    async fn find_by_username_or_email(
        &self,
        username: &Username,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserError>;

    /// Replace the stored refresh token; `None` clears it.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn set_refresh_token(&self, id: &UserId, token: Option<String>)
        -> Result<(), UserError>;

    /// Swap the stored refresh token for `new` only if it still equals
    /// `expected`. Returns `false` when another rotation or a logout got there
    /// first.
    async fn rotate_refresh_token(
        &self,
        id: &UserId,
        expected: &str,
        new: &str,
    ) -> Result<bool, UserError>;

    /// Update display name and email.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `EmailAlreadyExists` - Email belongs to another user
    async fn update_profile(
        &self,
        id: &UserId,
        full_name: &FullName,
        email: &EmailAddress,
    ) -> Result<User, UserError>;

    /// Point a media slot at a new URL.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn update_media(
        &self,
        id: &UserId,
        field: MediaField,
        url: &str,
    ) -> Result<User, UserError>;

    /// Replace the password digest.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<(), UserError>;
}

/// External object storage that hosts profile media.
#[async_trait]
pub trait MediaUploader: Send + Sync + 'static {
    /// Upload a staged file and return its public URL.
    ///
    /// # Errors
    /// * `ReadFailed` - Staged file could not be read
    /// * `RequestFailed` / `Timeout` - Sink unreachable
    /// * `Rejected` - Sink refused the file
    /// * `InvalidResponse` - Sink answered with something unexpected
    async fn upload(&self, file: &MediaFile) -> Result<UploadedMedia, MediaUploadError>;
}
