use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical identity of a (date, hour, room) slot.
///
/// `date` is fixed width and the hour is zero-padded to two digits, so the room
/// suffix is unambiguous and distinct slots never collide. Ordering is plain
/// lexicographic order on the string, which is also the index order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotKey(String);

impl SlotKey {
    pub fn new(date: &str, hour: u8, room: &str) -> Self {
        Self(format!("{date}{hour:02}{room}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One hour of occupancy of one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub date: String,
    pub hour: u8,
    pub room: String,
    pub lecturer: String,
    pub course: String,
}

impl Booking {
    pub fn new(
        date: impl Into<String>,
        hour: u8,
        room: impl Into<String>,
        lecturer: impl Into<String>,
        course: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            hour,
            room: room.into(),
            lecturer: lecturer.into(),
            course: course.into(),
        }
    }

    pub fn slot_key(&self) -> SlotKey {
        SlotKey::new(&self.date, self.hour, &self.room)
    }
}

/// A (possibly multi-hour) class to reserve. Inputs are already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub date: String,
    pub start_hour: u8,
    pub duration: u8,
    pub room: String,
    pub lecturer: String,
    pub course: String,
}

impl Reservation {
    /// Decompose into one Booking per hour, `start_hour..start_hour + duration`.
    pub fn hourly(&self) -> Vec<Booking> {
        (0..self.duration)
            .map(|i| {
                Booking::new(
                    self.date.clone(),
                    self.start_hour + i,
                    self.room.clone(),
                    self.lecturer.clone(),
                    self.course.clone(),
                )
            })
            .collect()
    }
}

/// A contiguous block of slots in one room, used by cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRange {
    pub date: String,
    pub start_hour: u8,
    pub duration: u8,
    pub room: String,
}

impl SlotRange {
    pub fn keys(&self) -> impl Iterator<Item = (u8, SlotKey)> + '_ {
        (0..self.duration).map(move |i| {
            let hour = self.start_hour + i;
            (hour, SlotKey::new(&self.date, hour, &self.room))
        })
    }
}

/// Journal record for the waitlist table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    Enqueued { booking: Booking },
    Promoted { key: SlotKey },
}

// ── Operation results ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// Every hour was free and is now booked.
    Confirmed(Vec<Booking>),
    /// `slot` is held by `occupant`; nothing was committed.
    Conflict { slot: SlotKey, occupant: Booking },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    pub key: SlotKey,
    pub booking: Booking,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancelOutcome {
    pub removed: Vec<SlotKey>,
    pub promoted: Vec<Promotion>,
}

impl CancelOutcome {
    pub fn is_success(&self) -> bool {
        !self.removed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitlistView {
    pub entries: Vec<Booking>,
    pub count: usize,
}
