use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::token::TokenClaims;
use crate::token::TokenError;
use crate::token::TokenIssuer;
use crate::token::TokenIssuerConfig;
use crate::token::TokenKind;
use crate::token::TokenPair;

/// Authentication coordinator combining password verification and token issuing.
///
/// Provides high-level authentication operations by coordinating
/// the credential hasher and the token issuer.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_issuer: TokenIssuer,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),
}

impl Authenticator {
    /// Create a new authenticator with the default password hasher.
    ///
    /// # Arguments
    /// * `config` - Token secrets and lifetimes
    ///
    /// # Errors
    /// * `InvalidConfiguration` - Token configuration was rejected
    pub fn new(config: TokenIssuerConfig) -> Result<Self, TokenError> {
        Ok(Self {
            password_hasher: PasswordHasher::new(),
            token_issuer: TokenIssuer::new(config)?,
        })
    }

    /// Replace the password hasher (e.g. with cheaper parameters in tests).
    pub fn with_password_hasher(mut self, password_hasher: PasswordHasher) -> Self {
        self.password_hasher = password_hasher;
        self
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check a password against a stored digest.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Stored digest could not be used
    pub fn verify_password(
        &self,
        password: &str,
        stored_hash: &str,
    ) -> Result<(), AuthenticationError> {
        if self.password_hasher.verify(password, stored_hash)? {
            Ok(())
        } else {
            Err(AuthenticationError::InvalidCredentials)
        }
    }

    /// Issue a fresh access/refresh pair for `subject`.
    ///
    /// Callers verify the password or the presented refresh token first.
    pub fn issue_tokens(&self, subject: &str) -> Result<TokenPair, TokenError> {
        self.token_issuer.issue_pair(subject)
    }

    /// Verify a token of the expected kind.
    pub fn verify_token(&self, token: &str, kind: TokenKind) -> Result<TokenClaims, TokenError> {
        self.token_issuer.verify(token, kind)
    }

    pub fn token_issuer(&self) -> &TokenIssuer {
        &self.token_issuer
    }
}
