//! Authentication utilities library
//!
//! Provides the credential and token primitives used by the identity service:
//! - Password hashing (Argon2id)
//! - Access/refresh token issuing and verification (HS256, one secret per kind)
//! - Authentication coordination
//!
//! Persistence is not handled here: storing the current refresh token is
//! the caller's job.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash).unwrap());
//! assert!(!hasher.verify("other_password", &hash).unwrap());
//! ```
//!
//! ## Tokens
//! ```
//! use auth::{TokenIssuer, TokenIssuerConfig, TokenKind};
//!
//! let issuer = TokenIssuer::new(TokenIssuerConfig::new(
//!     b"access_secret_at_least_32_bytes_long!".to_vec(),
//!     b"refresh_secret_at_least_32_bytes_long!".to_vec(),
//! ))
//! .unwrap();
//!
//! let pair = issuer.issue_pair("user123").unwrap();
//! let claims = issuer.verify(&pair.refresh.token, TokenKind::Refresh).unwrap();
//! assert_eq!(claims.sub, "user123");
//! assert!(issuer.verify(&pair.refresh.token, TokenKind::Access).is_err());
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::{Authenticator, TokenIssuerConfig, TokenKind};
//!
//! let auth = Authenticator::new(TokenIssuerConfig::new(
//!     b"access_secret_at_least_32_bytes_long!".to_vec(),
//!     b"refresh_secret_at_least_32_bytes_long!".to_vec(),
//! ))
//! .unwrap();
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify, then mint tokens
//! auth.verify_password("password123", &hash).unwrap();
//! let pair = auth.issue_tokens("user123").unwrap();
//!
//! // Validate access token
//! let claims = auth.verify_token(&pair.access.token, TokenKind::Access).unwrap();
//! assert_eq!(claims.sub, "user123");
//! ```

pub mod authenticator;
pub mod password;
pub mod token;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use token::IssuedToken;
pub use token::TokenClaims;
pub use token::TokenError;
pub use token::TokenIssuer;
pub use token::TokenIssuerConfig;
pub use token::TokenKind;
pub use token::TokenPair;
