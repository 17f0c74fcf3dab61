use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::AppendHeaders;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::cookies::get_cookie;
use crate::inbound::http::cookies::REFRESH_COOKIE_NAME;
use crate::inbound::http::router::AppState;

/// Rotate the session: the presented refresh token is exchanged for a new pair.
///
/// The `refresh_token` cookie wins over a `{refresh_token}` JSON body.
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let presented = get_cookie(&headers, REFRESH_COOKIE_NAME)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .or_else(|| token_from_body(&body));

    let tokens = state.user_service.refresh_access(presented).await?;

    let [access_cookie, refresh_cookie] = state.cookie_settings.session_cookies(&tokens);

    Ok((
        AppendHeaders([(SET_COOKIE, access_cookie), (SET_COOKIE, refresh_cookie)]),
        ApiSuccess::new(
            StatusCode::OK,
            RefreshResponseData {
                access_token: tokens.access.token,
                refresh_token: tokens.refresh.token,
            },
            "Access token refreshed",
        ),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct RefreshRequestBody {
    refresh_token: Option<String>,
}

fn token_from_body(body: &[u8]) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    serde_json::from_slice::<RefreshRequestBody>(body)
        .ok()
        .and_then(|body| body.refresh_token)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshResponseData {
    pub access_token: String,
    pub refresh_token: String,
}
