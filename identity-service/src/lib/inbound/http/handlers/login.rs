use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::AppendHeaders;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiJson;
use super::ApiSuccess;
use super::UserData;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::LoginCommand;
use crate::inbound::http::router::AppState;

/// Verify credentials, start a session and hand out both tokens as cookies.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
    let command = body.try_into_command()?;

    let session = state.user_service.login(command).await?;

    let [access_cookie, refresh_cookie] = state.cookie_settings.session_cookies(&session.tokens);

    Ok((
        AppendHeaders([(SET_COOKIE, access_cookie), (SET_COOKIE, refresh_cookie)]),
        ApiSuccess::new(
            StatusCode::OK,
            LoginResponseData {
                user: (&session.user).into(),
                access_token: session.tokens.access.token,
            },
            "User logged in successfully",
        ),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequestBody {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

impl LoginRequestBody {
    fn try_into_command(self) -> Result<LoginCommand, ApiError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(ApiError::BadRequest(
                "email and password are required".to_string(),
            ));
        }

        let email = EmailAddress::new(self.email)
            .map_err(|e| ApiError::BadRequest(format!("Invalid email: {}", e)))?;

        Ok(LoginCommand {
            email,
            password: self.password,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponseData {
    pub user: UserData,
    pub access_token: String,
}
