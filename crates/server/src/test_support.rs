//! Fixtures for router tests: in-memory storage, a recording notifier and a
//! manual clock behind an in-process router.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::Utc;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use slot_booking_core::{BookingRecord, Email, Slot};

use crate::db::{BookingRepository, MemoryBookingRepository};
use crate::routes::{RouterOptions, app};
use crate::services::{ManualClock, OtpStore, TokenService};
use crate::state::AppState;
pub use crate::testing::RecordingNotifier;

pub const TEST_SECRET: &str = "q8#Lm2!vR7$kT4@wZ1&nB6^cY3*hJ9%dF0";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub repo: Arc<MemoryBookingRepository>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(RecordingNotifier::new(), None)
    }

    pub fn with_notifier(notifier: RecordingNotifier) -> Self {
        Self::build(notifier, None)
    }

    pub fn with_otp_ttl(ttl: Duration) -> Self {
        Self::build(RecordingNotifier::new(), Some(ttl))
    }

    fn build(notifier: RecordingNotifier, otp_ttl: Option<Duration>) -> Self {
        let repo = Arc::new(MemoryBookingRepository::new());
        let notifier = Arc::new(notifier);
        let clock = Arc::new(ManualClock::new(Utc::now()));

        let state = AppState::new(
            repo.clone(),
            notifier.clone(),
            OtpStore::new(otp_ttl, clock.clone()),
            TokenService::new(SecretString::from(TEST_SECRET), None, clock.clone()),
        );
        let router = app(state.clone(), &RouterOptions::default());

        Self {
            router,
            state,
            repo,
            notifier,
            clock,
        }
    }

    pub fn token_for(&self, email: &str) -> String {
        self.state
            .tokens()
            .issue(&Email::parse(email).unwrap())
            .unwrap()
    }

    pub async fn seed(&self, email: &str, date: &str, time: &str) {
        let record = BookingRecord::new(Email::parse(email).unwrap(), date, Slot::at(time));
        self.repo.insert(&record).await.unwrap();
    }

    /// Send a request with an optional JSON body; returns status and parsed
    /// JSON body (`Null` when the body is not JSON).
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = body.map_or_else(String::new, |b| b.to_string());
        self.request_raw(method, uri, &body).await
    }

    pub async fn request_raw(&self, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if !body.is_empty() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}
