//! Core types for the booking backend.

pub mod booking;
pub mod email;
pub mod otp;

pub use booking::{BookingRecord, BookingUser, BookingsByDate, Slot};
pub use email::{Email, EmailError};
pub use otp::{OtpCode, OtpCodeError};
