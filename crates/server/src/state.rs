//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::BookingConfig;
use crate::db::BookingRepository;
use crate::services::{Clock, Notifier, OtpStore, TokenService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Every collaborator is passed
/// in explicitly, so tests can swap the repository, notifier and clock.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    bookings: Arc<dyn BookingRepository>,
    notifier: Arc<dyn Notifier>,
    otp: OtpStore,
    tokens: TokenService,
}

impl AppState {
    /// Assemble state from already-built collaborators.
    #[must_use]
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        notifier: Arc<dyn Notifier>,
        otp: OtpStore,
        tokens: TokenService,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                bookings,
                notifier,
                otp,
                tokens,
            }),
        }
    }

    /// Build state from configuration, sharing one clock between the OTP store
    /// and the token service.
    #[must_use]
    pub fn from_config(
        config: &BookingConfig,
        bookings: Arc<dyn BookingRepository>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let otp = OtpStore::new(config.otp.ttl, Arc::clone(&clock));
        let tokens = TokenService::new(config.token.secret.clone(), config.token.ttl, clock);
        Self::new(bookings, notifier, otp, tokens)
    }

    /// Get a reference to the booking repository.
    #[must_use]
    pub fn bookings(&self) -> &dyn BookingRepository {
        self.inner.bookings.as_ref()
    }

    /// Get a reference to the OTP notifier.
    #[must_use]
    pub fn notifier(&self) -> &dyn Notifier {
        self.inner.notifier.as_ref()
    }

    /// Get a reference to the OTP store.
    #[must_use]
    pub fn otp(&self) -> &OtpStore {
        &self.inner.otp
    }

    /// Get a reference to the session token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }
}
