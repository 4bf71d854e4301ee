//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! booking-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `BOOKING_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/server/migrations/` and are embedded at build
//! time. The server never runs them on startup.

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed to apply.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run the booking database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the URL is unset, the database is unreachable,
/// or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = database_url()?;

    tracing::info!("Connecting to booking database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Running booking migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Booking migrations complete!");
    Ok(())
}

fn database_url() -> Result<SecretString, MigrationError> {
    std::env::var("BOOKING_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("BOOKING_DATABASE_URL"))
}
