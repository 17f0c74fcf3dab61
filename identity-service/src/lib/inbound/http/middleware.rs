use auth::TokenKind;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use super::cookies::get_cookie;
use super::cookies::ACCESS_COOKIE_NAME;
use super::handlers::ApiError;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;

/// Extension type to store the authenticated user in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub profile: UserProfile,
}

/// Middleware that validates the access token and loads the user it names.
///
/// The token is read from `Authorization: Bearer` first, then from the
/// `access_token` cookie.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_access_token(req.headers()).ok_or_else(|| {
        ApiError::Unauthorized("Unauthorized request".to_string()).into_response()
    })?;

    let claims = state
        .authenticator
        .verify_token(token, TokenKind::Access)
        .map_err(|e| {
            tracing::warn!(error = %e, "Access token rejected");
            ApiError::Unauthorized("Invalid or expired access token".to_string()).into_response()
        })?;

    let user_id = UserId::from_string(&claims.sub).map_err(|e| {
        tracing::warn!(error = %e, "Access token carries a malformed subject");
        ApiError::Unauthorized("Invalid access token".to_string()).into_response()
    })?;

    let profile = state
        .user_service
        .get_current_user(&user_id)
        .await
        .map_err(|e| match e {
            UserError::NotFound(_) => {
                tracing::warn!(user_id = %user_id, "Access token subject no longer exists");
                ApiError::Unauthorized("Invalid access token".to_string()).into_response()
            }
            other => ApiError::from(other).into_response(),
        })?;

    req.extensions_mut()
        .insert(AuthenticatedUser { user_id, profile });

    Ok(next.run(req).await)
}

fn extract_access_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    bearer.or_else(|| get_cookie(headers, ACCESS_COOKIE_NAME).filter(|token| !token.is_empty()))
}
