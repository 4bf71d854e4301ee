//! Signed session tokens.
//!
//! Tokens are compact HS256 JWTs carrying `{"user": {"email"}, "iat", "exp"?}`.
//! They are stateless: there is no revocation, and without a configured TTL
//! they never expire.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use slot_booking_core::{BookingUser, Email};

use super::clock::Clock;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Reasons a token is rejected or cannot be produced.
#[derive(Debug, Error)]
pub enum TokenError {
    /// No token was presented.
    #[error("missing token")]
    Missing,

    /// Not a decodable JWT with our claim shape.
    #[error("malformed token")]
    Malformed,

    /// Header names an algorithm other than HS256.
    #[error("unsupported algorithm")]
    UnsupportedAlgorithm,

    /// Signature does not match the payload under our secret.
    #[error("invalid signature")]
    InvalidSignature,

    /// The `exp` claim is in the past.
    #[error("token expired")]
    Expired,

    /// The signing key could not be loaded.
    #[error("invalid signing key")]
    InvalidKey,

    /// Claims could not be encoded while issuing.
    #[error("token encoding error: {0}")]
    Encoding(jsonwebtoken::errors::Error),
}

impl TokenError {
    /// Whether this error means the presented credential is bad, as opposed to
    /// a server-side failure while issuing.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Missing
                | Self::Malformed
                | Self::UnsupportedAlgorithm
                | Self::InvalidSignature
                | Self::Expired
        )
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        match error.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                Self::UnsupportedAlgorithm
            }
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidKeyFormat => Self::InvalidKey,
            _ => Self::Malformed,
        }
    }
}

/// The verified payload of a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user: BookingUser,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl SessionClaims {
    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.user.email
    }
}

/// Issues and verifies session tokens with a shared secret.
#[derive(Clone)]
pub struct TokenService {
    secret: SecretString,
    ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: SecretString, ttl: Option<Duration>, clock: Arc<dyn Clock>) -> Self {
        Self { secret, ttl, clock }
    }

    /// Sign a token asserting `email`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encoding` or `TokenError::InvalidKey`; neither
    /// depends on the input.
    pub fn issue(&self, email: &Email) -> Result<String, TokenError> {
        let now = self.clock.now();
        let exp = self
            .ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .map(|ttl| (now + ttl).timestamp());

        let claims = SessionClaims {
            user: BookingUser {
                email: email.clone(),
            },
            iat: now.timestamp(),
            exp,
        };
        sign(&claims, &self.secret)
    }

    /// Verify a token against the current time.
    ///
    /// # Errors
    ///
    /// Returns a rejecting `TokenError` for any malformed, foreign-signed or
    /// expired token.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        verify_at(token, &self.secret, self.clock.now())
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// Encode and sign `claims`.
///
/// # Errors
///
/// See [`TokenService::issue`].
pub fn sign(claims: &SessionClaims, secret: &SecretString) -> Result<String, TokenError> {
    let key = EncodingKey::from_secret(secret.expose_secret().as_bytes());
    jsonwebtoken::encode(&Header::new(ALGORITHM), claims, &key).map_err(|error| {
        if matches!(error.kind(), ErrorKind::InvalidKeyFormat) {
            TokenError::InvalidKey
        } else {
            TokenError::Encoding(error)
        }
    })
}

/// Verify `token` as of `now`. Pure: the outcome depends only on the arguments.
///
/// # Errors
///
/// Fails closed with a rejecting `TokenError` on any format, algorithm,
/// signature or expiry mismatch.
pub fn verify_at(
    token: &str,
    secret: &SecretString,
    now: DateTime<Utc>,
) -> Result<SessionClaims, TokenError> {
    // `exp` is optional and checked against the injected clock below.
    let mut validation = Validation::new(ALGORITHM);
    validation.validate_exp = false;
    validation.set_required_spec_claims::<&str>(&[]);

    let key = DecodingKey::from_secret(secret.expose_secret().as_bytes());
    let claims = jsonwebtoken::decode::<SessionClaims>(token.trim(), &key, &validation)?.claims;

    if let Some(exp) = claims.exp
        && now.timestamp() >= exp
    {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}
