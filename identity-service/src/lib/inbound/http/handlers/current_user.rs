use axum::http::StatusCode;
use axum::Extension;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::inbound::http::middleware::AuthenticatedUser;

/// The middleware already loaded the profile; echo it back.
pub async fn current_user(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    Ok(ApiSuccess::new(
        StatusCode::OK,
        (&authenticated_user.profile).into(),
        "Current user fetched successfully",
    ))
}
