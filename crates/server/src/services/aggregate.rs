//! Date-grouped booking views.

use slot_booking_core::{BookingRecord, BookingsByDate};

/// Group slots under their record's date.
///
/// Slots within a date keep the order of `records`; an empty input yields an
/// empty map.
#[must_use]
pub fn group_by_date<I>(records: I) -> BookingsByDate
where
    I: IntoIterator<Item = BookingRecord>,
{
    let mut grouped = BookingsByDate::new();
    for record in records {
        grouped
            .entry(record.date)
            .or_default()
            .push(record.updated_slot);
    }
    grouped
}
