use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::Deserialize;

use super::ApiError;
use super::ApiJson;
use super::ApiSuccess;
use super::Empty;
use crate::domain::user::models::ChangePasswordCommand;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn change_password(
    State(state): State<AppState>,
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    ApiJson(body): ApiJson<ChangePasswordRequestBody>,
) -> Result<ApiSuccess<Empty>, ApiError> {
    state
        .user_service
        .change_password(&authenticated_user.user_id, body.into())
        .await
        .map_err(ApiError::from)
        .map(|_| ApiSuccess::new(StatusCode::OK, Empty {}, "Password changed successfully"))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangePasswordRequestBody {
    #[serde(default)]
    old_password: String,
    #[serde(default)]
    new_password: String,
    #[serde(default)]
    confirm_password: String,
}

impl From<ChangePasswordRequestBody> for ChangePasswordCommand {
    fn from(body: ChangePasswordRequestBody) -> Self {
        Self {
            old_password: body.old_password,
            new_password: body.new_password,
            confirm_password: body.confirm_password,
        }
    }
}
