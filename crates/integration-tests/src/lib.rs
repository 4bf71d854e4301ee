//! End-to-end tests for the slot booking server.
//!
//! [`TestContext`] serves the real router on an ephemeral local port, backed
//! by in-memory storage and a notifier that records codes instead of mailing
//! them. Tests talk to it over HTTP with `reqwest`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p slot-booking-integration-tests
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use reqwest::{Client, Response};
use secrecy::SecretString;
use serde_json::Value;

use slot_booking_server::db::MemoryBookingRepository;
use slot_booking_server::services::{ManualClock, OtpStore, TokenService};
use slot_booking_server::state::AppState;
pub use slot_booking_server::testing::RecordingNotifier;
use slot_booking_server::{RouterOptions, app};

/// Signing secret used by every test server.
pub const TEST_TOKEN_SECRET: &str = "Zx9!pQ2@rT5#vB8$nM1%kL4^hG7&dS0*wE3";

/// A running server plus handles on its collaborators.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub notifier: Arc<RecordingNotifier>,
    pub bookings: Arc<MemoryBookingRepository>,
    pub clock: Arc<ManualClock>,
}

impl TestContext {
    /// Start a server with a working notifier.
    pub async fn new() -> Self {
        Self::with_notifier(RecordingNotifier::new()).await
    }

    /// Start a server using `notifier`.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn with_notifier(notifier: RecordingNotifier) -> Self {
        let notifier = Arc::new(notifier);
        let bookings = Arc::new(MemoryBookingRepository::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));

        let state = AppState::new(
            bookings.clone(),
            notifier.clone(),
            OtpStore::new(None, clock.clone()),
            TokenService::new(SecretString::from(TEST_TOKEN_SECRET), None, clock.clone()),
        );
        let router = app(state, &RouterOptions::default());

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Test server failed");
        });

        Self {
            client: Client::new(),
            base_url: format!("http://{addr}"),
            notifier,
            bookings,
            clock,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// POST a JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST failed")
    }

    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed")
    }

    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("DELETE failed")
    }

    /// Run `send-otp` and `verify-otp` for `email`, returning the session token.
    ///
    /// # Panics
    ///
    /// Panics if either step fails.
    pub async fn login(&self, email: &str) -> String {
        let sent = self
            .post("/api/send-otp", &serde_json::json!({ "email": email }))
            .await;
        assert!(sent.status().is_success(), "send-otp failed: {}", sent.status());

        let code = self
            .notifier
            .last_code_for(email)
            .expect("No code was sent");
        let verified: Value = self
            .post(
                "/api/verify-otp",
                &serde_json::json!({ "email": email, "otp": code.value() }),
            )
            .await
            .json()
            .await
            .expect("verify-otp returned non-JSON");

        verified["authToken"]
            .as_str()
            .expect("verify-otp returned no token")
            .to_string()
    }
}
