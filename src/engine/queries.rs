use crate::model::*;

use super::history::{collect_by_date, collect_by_room, History};
use super::{Engine, Iter};

impl Engine {
    pub fn search(&self, date: &str, hour: u8, room: &str) -> Option<&Booking> {
        self.index.search(&SlotKey::new(date, hour, room))
    }

    /// `None` means "no waitlist": no queue, or a drained one.
    pub fn view_waitlist(&self, date: &str, hour: u8, room: &str) -> Option<WaitlistView> {
        let key = SlotKey::new(date, hour, room);
        if !self.waitlists.has_pending(&key) {
            return None;
        }
        Some(WaitlistView {
            entries: self.waitlists.list_in_order(&key),
            count: self.waitlists.size(&key),
        })
    }

    /// Every confirmed booking in ascending slot order.
    pub fn list_all(&self) -> Iter<'_> {
        self.index.iter()
    }

    pub fn list_by_date(&self, date: &str) -> History {
        collect_by_date(&self.index, date)
    }

    pub fn list_by_room(&self, room: &str) -> History {
        collect_by_room(&self.index, room)
    }
}
