use crate::model::*;

use super::index::BookingIndex;

/// Probe every hourly slot without mutating anything; stop at the first
/// occupied one.
pub(crate) fn find_conflict(index: &BookingIndex, hourly: &[Booking]) -> Option<(SlotKey, Booking)> {
    hourly.iter().find_map(|b| {
        let key = b.slot_key();
        index.search(&key).map(|occupant| (key, occupant.clone()))
    })
}
