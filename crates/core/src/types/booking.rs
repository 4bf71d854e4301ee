//! Booking documents and the date-grouped view built from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::email::Email;

/// The owner of a booking, as stored in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingUser {
    pub email: Email,
}

/// A bookable time unit on a date.
///
/// Only `time` is interpreted by the server (cancellation matches on it).
/// Every other field the client sends is kept verbatim and echoed back in
/// listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub time: String,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Slot {
    /// A slot with no metadata.
    #[must_use]
    pub fn at(time: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            metadata: Map::new(),
        }
    }
}

/// One stored booking.
///
/// There is no booking ID: a booking is addressed by `(date, slot.time)` when
/// cancelled, and nothing prevents two records for the same slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub user: BookingUser,
    /// Calendar date key, kept exactly as the client sent it.
    pub date: String,
    pub updated_slot: Slot,
}

impl BookingRecord {
    #[must_use]
    pub fn new(email: Email, date: impl Into<String>, slot: Slot) -> Self {
        Self {
            user: BookingUser { email },
            date: date.into(),
            updated_slot: slot,
        }
    }

    /// Whether this record is the target of a cancel for `(date, time)`.
    #[must_use]
    pub fn matches_slot(&self, date: &str, time: &str) -> bool {
        self.date == date && self.updated_slot.time == time
    }
}

/// Slots grouped by their date key.
///
/// Dates serialize in ascending key order; slots within a date keep the order
/// in which their records were scanned.
pub type BookingsByDate = BTreeMap<String, Vec<Slot>>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_record_wire_shape() {
        let record = BookingRecord::new(
            Email::parse("a@x.com").unwrap(),
            "2024-01-01",
            Slot::at("10:00"),
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "user": { "email": "a@x.com" },
                "date": "2024-01-01",
                "updatedSlot": { "time": "10:00" }
            })
        );
    }

    #[test]
    fn test_slot_metadata_is_preserved() {
        let slot: Slot =
            serde_json::from_value(json!({ "time": "09:30", "room": "B", "seats": 2 })).unwrap();
        assert_eq!(slot.time, "09:30");
        assert_eq!(slot.metadata.get("room"), Some(&json!("B")));
        assert_eq!(
            serde_json::to_value(&slot).unwrap(),
            json!({ "time": "09:30", "room": "B", "seats": 2 })
        );
    }

    #[test]
    fn test_slot_requires_time() {
        assert!(serde_json::from_value::<Slot>(json!({ "room": "B" })).is_err());
    }

    #[test]
    fn test_matches_slot() {
        let record = BookingRecord::new(
            Email::parse("a@x.com").unwrap(),
            "2024-01-01",
            Slot::at("10:00"),
        );
        assert!(record.matches_slot("2024-01-01", "10:00"));
        assert!(!record.matches_slot("2024-01-01", "11:00"));
        assert!(!record.matches_slot("2024-01-02", "10:00"));
    }
}
