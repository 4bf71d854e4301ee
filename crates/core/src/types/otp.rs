//! One-time passcode type.

use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Errors that can occur when reading an [`OtpCode`] from client input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpCodeError {
    /// The input is not an integral number.
    #[error("otp must be a whole number")]
    NotANumber,
    /// The number is outside `1000..=9999`.
    #[error("otp must be between {min} and {max}", min = OtpCode::MIN, max = OtpCode::MAX)]
    OutOfRange,
}

/// A 4-digit one-time passcode in `1000..=9999`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct OtpCode(u16);

impl OtpCode {
    /// Smallest code ever issued.
    pub const MIN: u16 = 1000;
    /// Largest code ever issued.
    pub const MAX: u16 = 9999;

    /// Wrap a raw value.
    ///
    /// # Errors
    ///
    /// Returns [`OtpCodeError::OutOfRange`] when `value` is not 4 digits.
    pub const fn new(value: u16) -> Result<Self, OtpCodeError> {
        if value < Self::MIN || value > Self::MAX {
            return Err(OtpCodeError::OutOfRange);
        }
        Ok(Self(value))
    }

    /// Coerce a submitted string the way a numeric conversion would.
    ///
    /// Surrounding whitespace is ignored and integral decimal forms such as
    /// `"1234.0"` are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`OtpCodeError`] when the input is not an integral number in range.
    pub fn coerce_str(input: &str) -> Result<Self, OtpCodeError> {
        let trimmed = input.trim();
        if let Ok(value) = trimmed.parse::<u16>() {
            return Self::new(value);
        }
        let number = trimmed
            .parse::<f64>()
            .map_err(|_| OtpCodeError::NotANumber)?;
        Self::coerce_f64(number)
    }

    /// Coerce a JSON value (number or string).
    ///
    /// # Errors
    ///
    /// Returns [`OtpCodeError::NotANumber`] for any other JSON type.
    pub fn coerce_json(value: &Value) -> Result<Self, OtpCodeError> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .ok_or(OtpCodeError::NotANumber)
                .and_then(Self::coerce_f64),
            Value::String(s) => Self::coerce_str(s),
            _ => Err(OtpCodeError::NotANumber),
        }
    }

    fn coerce_f64(number: f64) -> Result<Self, OtpCodeError> {
        if !number.is_finite() || number.fract() != 0.0 {
            return Err(OtpCodeError::NotANumber);
        }
        if number < f64::from(Self::MIN) || number > f64::from(Self::MAX) {
            return Err(OtpCodeError::OutOfRange);
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // range checked above
        Self::new(number as u16)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }
}

impl fmt::Display for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for OtpCode {
    type Error = OtpCodeError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OtpCode> for u16 {
    fn from(code: OtpCode) -> Self {
        code.0
    }
}
