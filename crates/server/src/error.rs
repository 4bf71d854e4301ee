//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding. Clients always get a status code and a small
//! JSON body; internal detail stays in the logs.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use slot_booking_core::Email;

use crate::db::RepositoryError;
use crate::services::{NotifyError, TokenError};

/// Generic message for anything the client cannot act on.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Booking storage failed.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// OTP email could not be sent.
    #[error("Notify error: {0}")]
    Notify(#[from] NotifyError),

    /// Session token was rejected, or could not be issued.
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Required input missing or unusable.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Token(err) if err.is_rejection() => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Repository(_) | Self::Notify(_) | Self::Token(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Token(err) if err.is_rejection() => "Invalid or expired token".to_string(),
            Self::Validation(msg) => msg.clone(),
            Self::Repository(_) | Self::Notify(_) | Self::Token(_) => {
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        }
    }

    /// Log the error, and capture it to Sentry if it is a server fault.
    pub fn report(&self) {
        if self.status().is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();
        (
            self.status(),
            Json(json!({ "error": self.public_message() })),
        )
            .into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the authenticated caller.
pub fn set_sentry_user(email: &Email) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
