use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::AppendHeaders;
use axum::response::IntoResponse;
use axum::Extension;

use super::ApiError;
use super::ApiSuccess;
use super::Empty;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn logout(
    State(state): State<AppState>,
    Extension(authenticated_user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .user_service
        .logout(&authenticated_user.user_id)
        .await?;

    let [access_cookie, refresh_cookie] = state.cookie_settings.cleared_cookies();

    Ok((
        AppendHeaders([(SET_COOKIE, access_cookie), (SET_COOKIE, refresh_cookie)]),
        ApiSuccess::new(StatusCode::OK, Empty {}, "User logged out"),
    ))
}
