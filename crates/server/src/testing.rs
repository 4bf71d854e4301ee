//! Test doubles shared by the router tests and the end-to-end suite.
//!
//! Compiled for this crate's own tests, and for other crates through the
//! `test-support` feature.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use slot_booking_core::{Email, OtpCode};

use crate::services::{Notifier, NotifyError};

/// Notifier that keeps every code it is handed, optionally failing afterwards.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(Email, OtpCode)>>,
    fail: bool,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every send fails after recording the code.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            fail: true,
        }
    }

    /// Most recent code sent to `email`.
    pub fn last_code_for(&self, email: &str) -> Option<OtpCode> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|(to, _)| to.as_str() == email)
            .map(|(_, code)| *code)
    }

    pub fn sent_count(&self) -> usize {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_otp(&self, to: &Email, code: OtpCode) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((to.clone(), code));
        if self.fail {
            return Err(NotifyError::InvalidAddress(to.to_string()));
        }
        Ok(())
    }
}
