//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Liveness
//! GET    /health/ready            - Readiness (checks booking store)
//!
//! # Sessions
//! POST   /api/send-otp            - Email a fresh code
//! POST   /api/verify-otp          - Exchange a code for a session token
//!
//! # Bookings
//! POST   /api/bookings            - Caller's bookings by date (token in body)
//! GET    /api/allbookings         - Every booking by date (dates in lexical order)
//! POST   /api/book                - Book a slot (token in body)
//! DELETE /api/cancel/{date}/{time} - Remove one booking for that slot
//! ```

pub mod bookings;
pub mod health;
pub mod otp;

use std::time::Duration;

use axum::{
    Router, middleware as axum_middleware,
    http::{HeaderValue, StatusCode},
    routing::{delete, get, post},
};
use tower_http::timeout::TimeoutLayer;

use crate::config::BookingConfig;
use crate::middleware::{cors_layer, request_id_middleware, trace_layer};
use crate::state::AppState;

/// Transport-level settings for the router.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Whole-request deadline; expired requests answer 408.
    pub request_timeout: Duration,
    /// Sole allowed CORS origin. `None` allows any.
    pub cors_origin: Option<HeaderValue>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            cors_origin: None,
        }
    }
}

impl From<&BookingConfig> for RouterOptions {
    fn from(config: &BookingConfig) -> Self {
        Self {
            request_timeout: config.request_timeout,
            cors_origin: config.cors_origin.clone(),
        }
    }
}

/// Create the `/api` routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/send-otp", post(otp::send_otp))
        .route("/verify-otp", post(otp::verify_otp))
        .route("/bookings", post(bookings::list_own))
        .route("/allbookings", get(bookings::list_all))
        .route("/book", post(bookings::book))
        .route("/cancel/{date}/{time}", delete(bookings::cancel))
}

/// Create the main application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
}

/// Build the complete application with its middleware stack.
///
/// Sentry layers are added by the binary so tests run without a hub.
pub fn app(state: AppState, options: &RouterOptions) -> Router {
    routes()
        .with_state(state)
        .layer(cors_layer(options.cors_origin.as_ref()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            options.request_timeout,
        ))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(trace_layer())
}
