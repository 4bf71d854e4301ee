//! Slot booking server library.
//!
//! OTP email login, stateless session tokens and a flat booking store behind
//! a small JSON API. Exposed as a library so the router can be driven from
//! tests and the CLI can reuse configuration and token signing.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

#[cfg(test)]
mod test_support;

pub use routes::{RouterOptions, app};
