mod conflict;
mod history;
mod index;
mod mutations;
mod queries;
mod waitlist;

pub use history::{collect_by_date, collect_by_room, History};
pub use index::{BookingIndex, Iter};
pub use waitlist::Waitlists;

use tracing::warn;

use crate::model::*;

/// Owns the booking index and the waitlist table and coordinates every
/// operation across them. Performs no I/O.
#[derive(Debug, Default)]
pub struct Engine {
    index: BookingIndex,
    waitlists: Waitlists,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repopulate the index from persisted records via repeated `insert`.
    /// Returns how many were accepted; duplicates are skipped.
    pub fn load(&mut self, records: impl IntoIterator<Item = Booking>) -> usize {
        let mut accepted = 0;
        for booking in records {
            if self.index.insert(booking.clone()) {
                accepted += 1;
            } else {
                warn!("duplicate slot {} in persisted bookings, skipped", booking.slot_key());
            }
        }
        accepted
    }

    /// Re-apply a journalled waitlist event during startup.
    pub fn replay(&mut self, event: &Event) {
        match event {
            Event::Enqueued { booking } => {
                self.waitlists.enqueue(&booking.slot_key(), booking.clone());
            }
            Event::Promoted { key } => {
                // The promoted booking itself is already in the persisted index.
                if self.waitlists.dequeue_front(key).is_none() {
                    warn!("journal promotes {key} but its waitlist is empty");
                }
            }
        }
    }

    pub fn index(&self) -> &BookingIndex {
        &self.index
    }

    pub fn waitlists(&self) -> &Waitlists {
        &self.waitlists
    }
}
