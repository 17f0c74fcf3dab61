use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::Deserialize;
use thiserror::Error;

use super::ApiError;
use super::ApiJson;
use super::ApiSuccess;
use super::UserData;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::FullName;
use crate::domain::user::models::UpdateProfileCommand;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;
use crate::user::errors::EmailError;
use crate::user::errors::FullNameError;

pub async fn update_account(
    State(state): State<AppState>,
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    ApiJson(body): ApiJson<UpdateAccountRequestBody>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    state
        .user_service
        .update_profile(&authenticated_user.user_id, body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref user| {
            ApiSuccess::new(
                StatusCode::OK,
                user.into(),
                "Account details updated successfully",
            )
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateAccountRequestBody {
    full_name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Clone, Error)]
enum ParseUpdateAccountRequestError {
    #[error("full_name and email are required")]
    Missing,

    #[error("Invalid full name: {0}")]
    FullName(#[from] FullNameError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),
}

impl UpdateAccountRequestBody {
    fn try_into_command(self) -> Result<UpdateProfileCommand, ParseUpdateAccountRequestError> {
        match (self.full_name, self.email) {
            (Some(full_name), Some(email)) => Ok(UpdateProfileCommand {
                full_name: FullName::new(full_name)?,
                email: EmailAddress::new(email)?,
            }),
            _ => Err(ParseUpdateAccountRequestError::Missing),
        }
    }
}

impl From<ParseUpdateAccountRequestError> for ApiError {
    fn from(err: ParseUpdateAccountRequestError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}
