//! Slot Booking Core - Shared domain types.
//!
//! This crate provides the types shared by the booking server, the CLI and
//! the integration tests:
//! - [`Email`] - the identity a user authenticates as
//! - [`OtpCode`] - a 4-digit one-time passcode
//! - [`BookingRecord`], [`Slot`] and [`BookingsByDate`] - booking documents and
//!   their date-grouped view
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. Postgres encoding for [`Email`] is available behind the
//! `postgres` feature.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
