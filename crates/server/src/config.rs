//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BOOKING_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `BOOKING_TOKEN_SECRET` - Session token signing secret (min 32 chars, high entropy)
//! - `SMTP_HOST` - SMTP relay hostname
//! - `SMTP_USERNAME` - SMTP account username
//! - `SMTP_PASSWORD` - SMTP account password
//! - `SMTP_FROM` - Sender address for OTP emails
//!
//! ## Optional
//! - `BOOKING_HOST` - Bind address (default: 127.0.0.1)
//! - `BOOKING_PORT` - Listen port (default: 5012)
//! - `BOOKING_REQUEST_TIMEOUT_SECS` - Whole-request timeout (default: 30)
//! - `BOOKING_CORS_ORIGIN` - Single allowed CORS origin (default: any)
//! - `BOOKING_LOG_JSON` - Emit JSON logs when set
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `SMTP_TIMEOUT_SECS` - SMTP send timeout (default: 10)
//! - `OTP_TTL_SECS` - Reject OTP codes older than this (default: never)
//! - `TOKEN_TTL_SECS` - Add an `exp` claim to session tokens (default: none)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use axum::http::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Values seen in sample `.env` files for the token secret (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &["changeme", "your-", "jwt_secret", "token-secret", "xxx"];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Booking server configuration.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Upper bound on handling a single request
    pub request_timeout: Duration,
    /// Allowed CORS origin; `None` allows any origin
    pub cors_origin: Option<HeaderValue>,
    /// Emit JSON-formatted logs
    pub log_json: bool,
    /// Session token settings
    pub token: TokenConfig,
    /// OTP settings
    pub otp: OtpConfig,
    /// Outbound mail settings
    pub email: EmailConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Session token configuration.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HMAC signing secret
    pub secret: SecretString,
    /// Lifetime stamped into the `exp` claim; `None` issues non-expiring tokens
    pub ttl: Option<Duration>,
}

/// One-time passcode configuration.
#[derive(Debug, Clone, Default)]
pub struct OtpConfig {
    /// Codes older than this fail verification; `None` keeps them valid until replaced
    pub ttl: Option<Duration>,
}

/// SMTP configuration for OTP delivery.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
    /// Upper bound on a single SMTP exchange
    pub timeout: Duration,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl BookingConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the token secret fails validation (length, placeholder, entropy).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("BOOKING_DATABASE_URL")?;
        let host = get_env_or_default("BOOKING_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BOOKING_HOST".to_string(), e.to_string()))?;
        let port = parse_env_or_default("BOOKING_PORT", 5012_u16)?;
        let request_timeout =
            Duration::from_secs(parse_env_or_default("BOOKING_REQUEST_TIMEOUT_SECS", 30_u64)?);
        let cors_origin = parse_cors_origin(get_optional_env("BOOKING_CORS_ORIGIN"))?;
        let log_json = get_optional_env("BOOKING_LOG_JSON").is_some();

        let token = TokenConfig::from_env()?;
        let otp = OtpConfig {
            ttl: get_optional_secs("OTP_TTL_SECS")?,
        };
        let email = EmailConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            database_url,
            host,
            port,
            request_timeout,
            cors_origin,
            log_json,
            token,
            otp,
            email,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl TokenConfig {
    /// Load token settings on their own.
    ///
    /// The CLI uses this to mint tokens without needing SMTP or database settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the secret is missing or weak.
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = get_validated_secret("BOOKING_TOKEN_SECRET")?;
        validate_secret_length(&secret, "BOOKING_TOKEN_SECRET")?;
        Ok(Self {
            secret,
            ttl: get_optional_secs("TOKEN_TTL_SECS")?,
        })
    }
}

impl EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            smtp_host: get_required_env("SMTP_HOST")?,
            smtp_port: parse_env_or_default("SMTP_PORT", 587_u16)?,
            smtp_username: get_required_env("SMTP_USERNAME")?,
            smtp_password: SecretString::from(get_required_env("SMTP_PASSWORD")?),
            from_address: get_required_env("SMTP_FROM")?,
            timeout: Duration::from_secs(parse_env_or_default("SMTP_TIMEOUT_SECS", 10_u64)?),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse the CORS origin restriction. An unusable value is an error rather
/// than "no restriction".
fn parse_cors_origin(raw: Option<String>) -> Result<Option<HeaderValue>, ConfigError> {
    raw.map(|origin| {
        if origin.is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "BOOKING_CORS_ORIGIN".to_string(),
                "must not be empty".to_string(),
            ));
        }
        HeaderValue::from_str(&origin).map_err(|e| {
            ConfigError::InvalidEnvVar("BOOKING_CORS_ORIGIN".to_string(), e.to_string())
        })
    })
    .transpose()
}

/// Parse an optional whole-seconds duration.
fn get_optional_secs(key: &str) -> Result<Option<Duration>, ConfigError> {
    get_optional_env(key)
        .map(|raw| {
            raw.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .transpose()
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
