use axum::extract::State;
use axum::http::StatusCode;
use thiserror::Error;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::FullName;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::Username;
use crate::inbound::http::multipart::ApiMultipart;
use crate::inbound::http::multipart::UploadForm;
use crate::inbound::http::router::AppState;
use crate::user::errors::EmailError;
use crate::user::errors::FullNameError;
use crate::user::errors::UsernameError;

/// Register a new user from a multipart form.
///
/// Staged files live as long as `form`, so they are removed once the handler
/// returns, on success and failure alike.
pub async fn register(
    State(state): State<AppState>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<ApiSuccess<UserData>, ApiError> {
    let form = UploadForm::read(multipart, &state.upload_dir).await?;
    let command = try_into_command(&form)?;

    state
        .user_service
        .register(command)
        .await
        .map_err(ApiError::from)
        .map(|ref user| {
            ApiSuccess::new(
                StatusCode::CREATED,
                user.into(),
                "User registered successfully",
            )
        })
}

#[derive(Debug, Clone, Error)]
enum ParseRegisterRequestError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("Invalid username: {0}")]
    Username(#[from] UsernameError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid full name: {0}")]
    FullName(#[from] FullNameError),
}

fn try_into_command(form: &UploadForm) -> Result<RegisterUserCommand, ParseRegisterRequestError> {
    let username = form
        .text("username")
        .ok_or(ParseRegisterRequestError::Missing("username"))?;
    let email = form
        .text("email")
        .ok_or(ParseRegisterRequestError::Missing("email"))?;
    let full_name = form
        .text("full_name")
        .ok_or(ParseRegisterRequestError::Missing("full_name"))?;
    let password = form
        .raw_text("password")
        .filter(|password| !password.trim().is_empty())
        .ok_or(ParseRegisterRequestError::Missing("password"))?;

    Ok(RegisterUserCommand::new(
        Username::new(username)?,
        EmailAddress::new(email)?,
        FullName::new(full_name)?,
        password,
        form.file("avatar").map(|staged| staged.media().clone()),
        form.file("cover_image").map(|staged| staged.media().clone()),
    ))
}

impl From<ParseRegisterRequestError> for ApiError {
    fn from(err: ParseRegisterRequestError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}
