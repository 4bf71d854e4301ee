//! Session token commands.
//!
//! # Usage
//!
//! ```bash
//! booking-cli token issue -e a@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `BOOKING_TOKEN_SECRET` - Signing secret, must match the server's
//! - `TOKEN_TTL_SECS` - Optional lifetime for the issued token

use std::sync::Arc;

use slot_booking_core::{Email, EmailError};
use slot_booking_server::config::{ConfigError, TokenConfig};
use slot_booking_server::services::{SystemClock, TokenError, TokenService};
use thiserror::Error;

/// Errors that can occur while issuing a token.
#[derive(Debug, Error)]
pub enum TokenCommandError {
    /// Token settings missing or insecure.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Signing failed.
    #[error("Token error: {0}")]
    Token(#[from] TokenError),
}

/// Print a signed session token for `email` to stdout.
///
/// # Errors
///
/// Returns `TokenCommandError` if the email or token settings are invalid.
pub fn issue(email: &str) -> Result<(), TokenCommandError> {
    dotenvy::dotenv().ok();

    let email = Email::parse(email)?;
    let token = mint(&email, TokenConfig::from_env()?)?;

    tracing::info!(email = %email, "Session token issued");

    #[allow(clippy::print_stdout)]
    {
        println!("{token}");
    }
    Ok(())
}

fn mint(email: &Email, config: TokenConfig) -> Result<String, TokenError> {
    TokenService::new(config.secret, config.ttl, Arc::new(SystemClock)).issue(email)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn test_minted_token_verifies_with_same_secret() {
        let config = TokenConfig {
            secret: SecretString::from("q8#Lm2!vR7$kT4@wZ1&nB6^cY3*hJ9%dF0"),
            ttl: None,
        };
        let service = TokenService::new(config.secret.clone(), None, Arc::new(SystemClock));
        let email = Email::parse("a@x.com").unwrap();

        let token = mint(&email, config).unwrap();
        assert_eq!(service.verify(&token).unwrap().email(), &email);
    }
}
