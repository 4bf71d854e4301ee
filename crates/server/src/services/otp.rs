//! In-memory one-time passcode store.
//!
//! Holds at most one code per email. Issuing a new code replaces the previous
//! one, and verification never consumes a code, so a code stays valid until it
//! is replaced, it outlives the optional TTL, or the process restarts.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use rand::Rng;

use slot_booking_core::{Email, OtpCode};

use super::clock::Clock;

/// Upper bound on outstanding codes held in memory.
const MAX_OUTSTANDING_CODES: u64 = 100_000;

#[derive(Debug, Clone, Copy)]
struct OtpEntry {
    code: OtpCode,
    issued_at: DateTime<Utc>,
}

/// Process-lifetime mapping from email to its current code.
#[derive(Clone)]
pub struct OtpStore {
    codes: Cache<Email, OtpEntry>,
    ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
}

impl OtpStore {
    /// Create a store. With `ttl = None` codes never expire.
    #[must_use]
    pub fn new(ttl: Option<Duration>, clock: Arc<dyn Clock>) -> Self {
        Self {
            codes: Cache::builder().max_capacity(MAX_OUTSTANDING_CODES).build(),
            ttl,
            clock,
        }
    }

    /// Generate a fresh code for `email`, replacing any code it already had.
    pub async fn issue(&self, email: &Email) -> OtpCode {
        let value = rand::rng().random_range(OtpCode::MIN..=OtpCode::MAX);
        // The range above is exactly OtpCode's domain.
        let code = OtpCode::new(value).unwrap_or_else(|_| unreachable!("code {value} in range"));

        let entry = OtpEntry {
            code,
            issued_at: self.clock.now(),
        };
        self.codes.insert(email.clone(), entry).await;

        tracing::debug!(email = %email, "OTP issued");
        code
    }

    /// True iff `email` has a current, unexpired code equal to `code`.
    pub async fn verify(&self, email: &Email, code: OtpCode) -> bool {
        let Some(entry) = self.codes.get(email).await else {
            return false;
        };

        if self.is_expired(&entry) {
            tracing::debug!(email = %email, "OTP expired");
            return false;
        }

        entry.code == code
    }

    fn is_expired(&self, entry: &OtpEntry) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };
        let age = self.clock.now().signed_duration_since(entry.issued_at);
        age.to_std().is_ok_and(|age| age > ttl)
    }
}

impl std::fmt::Debug for OtpStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpStore")
            .field("outstanding", &self.codes.entry_count())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::services::clock::{ManualClock, SystemClock};

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    fn other_code(code: OtpCode) -> OtpCode {
        let next = if code.value() == OtpCode::MAX {
            OtpCode::MIN
        } else {
            code.value() + 1
        };
        OtpCode::new(next).unwrap()
    }

    #[tokio::test]
    async fn test_issued_code_is_in_range_and_verifies() {
        let store = OtpStore::new(None, Arc::new(SystemClock));
        let a = email("a@x.com");

        for _ in 0..50 {
            let code = store.issue(&a).await;
            assert!((OtpCode::MIN..=OtpCode::MAX).contains(&code.value()));
            assert!(store.verify(&a, code).await);
        }
    }

    #[tokio::test]
    async fn test_verify_without_issue_fails() {
        let store = OtpStore::new(None, Arc::new(SystemClock));
        assert!(!store.verify(&email("nobody@x.com"), OtpCode::new(1234).unwrap()).await);
    }

    #[tokio::test]
    async fn test_wrong_code_fails() {
        let store = OtpStore::new(None, Arc::new(SystemClock));
        let a = email("a@x.com");
        let code = store.issue(&a).await;
        assert!(!store.verify(&a, other_code(code)).await);
    }

    #[tokio::test]
    async fn test_code_is_not_consumed_by_verify() {
        let store = OtpStore::new(None, Arc::new(SystemClock));
        let a = email("a@x.com");
        let code = store.issue(&a).await;
        assert!(store.verify(&a, code).await);
        assert!(store.verify(&a, code).await);
    }

    #[tokio::test]
    async fn test_reissue_replaces_previous_code() {
        let store = OtpStore::new(None, Arc::new(SystemClock));
        let a = email("a@x.com");

        let mut first = store.issue(&a).await;
        let mut second = store.issue(&a).await;
        // Draw until the codes differ so the assertion is meaningful.
        while first == second {
            first = second;
            second = store.issue(&a).await;
        }

        assert!(!store.verify(&a, first).await);
        assert!(store.verify(&a, second).await);
    }

    #[tokio::test]
    async fn test_codes_are_per_email() {
        let store = OtpStore::new(None, Arc::new(SystemClock));
        let a = email("a@x.com");
        let b = email("b@x.com");

        let code = store.issue(&a).await;
        assert!(!store.verify(&b, code).await);
    }

    #[tokio::test]
    async fn test_ttl_expires_codes() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = OtpStore::new(Some(Duration::from_secs(300)), clock.clone());
        let a = email("a@x.com");

        let code = store.issue(&a).await;
        clock.advance(TimeDelta::seconds(300));
        assert!(store.verify(&a, code).await);

        clock.advance(TimeDelta::seconds(1));
        assert!(!store.verify(&a, code).await);
    }

    #[tokio::test]
    async fn test_no_ttl_never_expires() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = OtpStore::new(None, clock.clone());
        let a = email("a@x.com");

        let code = store.issue(&a).await;
        clock.advance(TimeDelta::days(365));
        assert!(store.verify(&a, code).await);
    }
}
