use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use uuid::Uuid;

use super::claims::IssuedToken;
use super::claims::TokenClaims;
use super::claims::TokenKind;
use super::claims::TokenPair;
use super::errors::TokenError;

const MIN_SECRET_LENGTH: usize = 32;

/// Settings for a [`TokenIssuer`].
///
/// Secrets are supplied by the caller at construction time; nothing here reads
/// the environment.
#[derive(Clone)]
pub struct TokenIssuerConfig {
    pub access_secret: Vec<u8>,
    pub refresh_secret: Vec<u8>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// Clock-skew tolerance applied when checking expiry
    pub leeway_seconds: u64,
}

impl TokenIssuerConfig {
    /// Create a configuration with default lifetimes (15 minutes access,
    /// 10 days refresh) and a 30 second leeway.
    pub fn new(access_secret: impl Into<Vec<u8>>, refresh_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(10),
            leeway_seconds: 30,
        }
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    pub fn with_leeway_seconds(mut self, leeway_seconds: u64) -> Self {
        self.leeway_seconds = leeway_seconds;
        self
    }
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Issues and verifies HS256 access and refresh tokens.
///
/// Each kind is signed with its own secret and carries a `typ` claim, so a
/// refresh token can never be replayed as an access token or vice versa.
/// Issuing is a pure operation: persisting the refresh token is up to the caller.
pub struct TokenIssuer {
    access_keys: SigningKeys,
    refresh_keys: SigningKeys,
    access_ttl: Duration,
    refresh_ttl: Duration,
    validation: Validation,
}

impl TokenIssuer {
    /// Build an issuer from its configuration.
    ///
    /// # Errors
    /// * `InvalidConfiguration` - A secret is shorter than 32 bytes, both
    ///   secrets are identical, or a lifetime is not positive
    pub fn new(config: TokenIssuerConfig) -> Result<Self, TokenError> {
        if config.access_secret.len() < MIN_SECRET_LENGTH
            || config.refresh_secret.len() < MIN_SECRET_LENGTH
        {
            return Err(TokenError::InvalidConfiguration(format!(
                "secrets must be at least {} bytes",
                MIN_SECRET_LENGTH
            )));
        }
        if config.access_secret == config.refresh_secret {
            return Err(TokenError::InvalidConfiguration(
                "access and refresh secrets must differ".to_string(),
            ));
        }
        if config.access_ttl <= Duration::zero() || config.refresh_ttl <= Duration::zero() {
            return Err(TokenError::InvalidConfiguration(
                "token lifetimes must be positive".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_seconds;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            access_keys: SigningKeys::from_secret(&config.access_secret),
            refresh_keys: SigningKeys::from_secret(&config.refresh_secret),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
            validation,
        })
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access_keys,
            TokenKind::Refresh => &self.refresh_keys,
        }
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    /// Issue a short-lived access token for `subject`.
    pub fn issue_access(&self, subject: &str) -> Result<IssuedToken, TokenError> {
        self.issue_at(subject, TokenKind::Access, Utc::now())
    }

    /// Issue a long-lived refresh token for `subject`.
    pub fn issue_refresh(&self, subject: &str) -> Result<IssuedToken, TokenError> {
        self.issue_at(subject, TokenKind::Refresh, Utc::now())
    }

    /// Issue an access and a refresh token for `subject`.
    pub fn issue_pair(&self, subject: &str) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access: self.issue_access(subject)?,
            refresh: self.issue_refresh(subject)?,
        })
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// Used to mint already-expired tokens in tests.
    pub fn issue_at(
        &self,
        subject: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let issued_at = now.timestamp();
        let expires_at = (now + self.ttl(kind)).timestamp();

        let claims = TokenClaims {
            sub: subject.to_string(),
            kind,
            iat: issued_at,
            exp: expires_at,
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.keys(kind).encoding,
        )
        .map_err(|e| TokenError::EncodingFailed(e.to_string()))?;

        Ok(IssuedToken {
            token,
            kind,
            issued_at,
            expires_at,
        })
    }

    /// Verify a token's signature, expiry, and kind.
    ///
    /// # Returns
    /// Decoded claims; `sub` is the verified subject
    ///
    /// # Errors
    /// * `Expired` - Signature is valid but the token is past expiry plus leeway
    /// * `BadSignature` - Not signed by this issuer
    /// * `WrongKind` - Signed by this issuer, but for the other kind
    /// * `Malformed` - Not a decodable token
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<TokenClaims, TokenError> {
        match decode::<TokenClaims>(token, &self.keys(kind).decoding, &self.validation) {
            Ok(data) if data.claims.kind != kind => Err(TokenError::WrongKind {
                expected: kind,
                found: data.claims.kind,
            }),
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                ErrorKind::InvalidSignature if self.is_signed_as(token, kind.other()) => {
                    Err(TokenError::WrongKind {
                        expected: kind,
                        found: kind.other(),
                    })
                }
                ErrorKind::InvalidSignature => Err(TokenError::BadSignature),
                _ => Err(TokenError::Malformed(e.to_string())),
            },
        }
    }

    fn is_signed_as(&self, token: &str, kind: TokenKind) -> bool {
        let mut validation = self.validation.clone();
        validation.validate_exp = false;

        decode::<TokenClaims>(token, &self.keys(kind).decoding, &validation).is_ok()
    }
}
