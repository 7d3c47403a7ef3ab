use crate::model::Booking;

use super::index::BookingIndex;

/// Last-in-first-out sequence of matching bookings, built per query.
///
/// Entries are pushed in ascending slot order, so iteration yields them in
/// descending slot order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    stack: Vec<Booking>,
}

impl History {
    pub fn push(&mut self, booking: Booking) {
        self.stack.push(booking);
    }

    pub fn pop(&mut self) -> Option<Booking> {
        self.stack.pop()
    }

    pub fn peek(&self) -> Option<&Booking> {
        self.stack.last()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Top of the stack first.
    pub fn iter(&self) -> impl Iterator<Item = &Booking> {
        self.stack.iter().rev()
    }
}

fn collect(index: &BookingIndex, predicate: impl Fn(&Booking) -> bool) -> History {
    let mut history = History::default();
    index.traverse_filtered(predicate, |b| history.push(b.clone()));
    history
}

pub fn collect_by_date(index: &BookingIndex, date: &str) -> History {
    collect(index, |b| b.date == date)
}

pub fn collect_by_room(index: &BookingIndex, room: &str) -> History {
    collect(index, |b| b.room == room)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> BookingIndex {
        let mut index = BookingIndex::new();
        for (date, hour, room) in [
            ("260102", 10, "1"),
            ("260102", 8, "2"),
            ("260103", 9, "1"),
            ("260102", 14, "1"),
        ] {
            index.insert(Booking::new(date, hour, room, "Tan", "CS101"));
        }
        index
    }

    #[test]
    fn by_date_is_reverse_key_order() {
        let index = seeded();
        let history = collect_by_date(&index, "260102");
        let hours: Vec<(u8, &str)> = history.iter().map(|b| (b.hour, b.room.as_str())).collect();
        assert_eq!(hours, vec![(14, "1"), (10, "1"), (8, "2")]);
    }

    #[test]
    fn by_room_is_reverse_key_order() {
        let index = seeded();
        let mut history = collect_by_room(&index, "1");
        assert_eq!(history.len(), 3);
        assert_eq!(history.peek().unwrap().date, "260103");
        assert_eq!(history.pop().unwrap().hour, 9);
        assert_eq!(history.pop().unwrap().hour, 14);
        assert_eq!(history.pop().unwrap().hour, 10);
        assert!(history.pop().is_none());
    }

    #[test]
    fn no_match_is_empty() {
        let index = seeded();
        assert!(collect_by_date(&index, "991231").is_empty());
        assert!(collect_by_room(&index, "20").is_empty());
    }

    #[test]
    fn history_does_not_alias_index() {
        let mut index = seeded();
        let history = collect_by_room(&index, "2");
        index.delete(&history.peek().unwrap().slot_key());
        assert_eq!(history.len(), 1);
        assert!(collect_by_room(&index, "2").is_empty());
    }
}
