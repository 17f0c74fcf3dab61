pub mod claims;
pub mod errors;
pub mod issuer;

pub use claims::IssuedToken;
pub use claims::TokenClaims;
pub use claims::TokenKind;
pub use claims::TokenPair;
pub use errors::TokenError;
pub use issuer::TokenIssuer;
pub use issuer::TokenIssuerConfig;
