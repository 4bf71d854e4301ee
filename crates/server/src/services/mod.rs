//! Business logic services.
//!
//! # Services
//!
//! - `otp` - In-memory one-time passcode store
//! - `notifier` - OTP delivery over SMTP
//! - `token` - Signed, stateless session tokens
//! - `aggregate` - Date-grouped booking views
//! - `clock` - Injectable time source for expiry checks

pub mod aggregate;
pub mod clock;
pub mod notifier;
pub mod otp;
pub mod token;

pub use aggregate::group_by_date;
pub use clock::{Clock, ManualClock, SystemClock};
pub use notifier::{Notifier, NotifyError, SmtpNotifier};
pub use otp::OtpStore;
pub use token::{SessionClaims, TokenError, TokenService};
