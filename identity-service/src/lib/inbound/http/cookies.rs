//! Session cookies carrying the access and refresh tokens.

use auth::IssuedToken;
use auth::TokenPair;
use axum::http::header;
use axum::http::HeaderMap;

pub const ACCESS_COOKIE_NAME: &str = "access_token";
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Cookie attributes decided at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieSettings {
    /// Append `Secure` (HTTPS deployments)
    pub secure: bool,
}

impl CookieSettings {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    fn cookie(&self, name: &str, value: &str, max_age: i64) -> String {
        let secure = if self.secure { "; Secure" } else { "" };
        format!(
            "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}{}",
            name, value, max_age, secure
        )
    }

    fn token_cookie(&self, name: &str, token: &IssuedToken) -> String {
        self.cookie(name, &token.token, token.max_age_seconds())
    }

    /// `Set-Cookie` values for a freshly issued pair, access first.
    pub fn session_cookies(&self, tokens: &TokenPair) -> [String; 2] {
        [
            self.token_cookie(ACCESS_COOKIE_NAME, &tokens.access),
            self.token_cookie(REFRESH_COOKIE_NAME, &tokens.refresh),
        ]
    }

    /// `Set-Cookie` values that expire both session cookies.
    pub fn cleared_cookies(&self) -> [String; 2] {
        [
            self.cookie(ACCESS_COOKIE_NAME, "", 0),
            self.cookie(REFRESH_COOKIE_NAME, "", 0),
        ]
    }
}

/// Extract a cookie value from the request headers.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
}
