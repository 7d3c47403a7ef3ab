use std::collections::{HashMap, VecDeque};

use crate::model::{Booking, SlotKey};

/// Per-slot FIFO queues of deferred booking requests.
///
/// Queues are created on first use and are never removed, even once drained, so
/// the table only grows for the lifetime of the process. Many distinct
/// once-used keys therefore retain one empty queue each. Empty queues are not
/// journalled on compaction, which bounds the growth across restarts.
#[derive(Debug, Default)]
pub struct Waitlists {
    queues: HashMap<SlotKey, VecDeque<Booking>>,
}

impl Waitlists {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create_queue(&mut self, key: &SlotKey) -> &mut VecDeque<Booking> {
        self.queues.entry(key.clone()).or_default()
    }

    /// True iff a queue exists for `key` and it is non-empty.
    pub fn has_pending(&self, key: &SlotKey) -> bool {
        self.queues.get(key).is_some_and(|q| !q.is_empty())
    }

    pub fn enqueue(&mut self, key: &SlotKey, booking: Booking) {
        self.get_or_create_queue(key).push_back(booking);
    }

    /// Pop the longest-waiting request. The (possibly now empty) queue stays.
    pub fn dequeue_front(&mut self, key: &SlotKey) -> Option<Booking> {
        self.queues.get_mut(key).and_then(VecDeque::pop_front)
    }

    /// The request `dequeue_front` would return, left in place.
    pub fn front(&self, key: &SlotKey) -> Option<&Booking> {
        self.queues.get(key).and_then(VecDeque::front)
    }

    pub fn size(&self, key: &SlotKey) -> usize {
        self.queues.get(key).map_or(0, VecDeque::len)
    }

    pub fn list_in_order(&self, key: &SlotKey) -> Vec<Booking> {
        self.queues
            .get(key)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of queues ever created, including drained ones.
    pub fn queue_count(&self) -> usize {
        self.queues.len()
    }

    /// All pending entries, queues in key order and each queue front to back.
    pub fn pending(&self) -> Vec<&Booking> {
        let mut keys: Vec<&SlotKey> = self
            .queues
            .iter()
            .filter(|(_, q)| !q.is_empty())
            .map(|(k, _)| k)
            .collect();
        keys.sort();
        keys.into_iter()
            .flat_map(|k| self.queues[k].iter())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SlotKey {
        SlotKey::new("260102", 11, "C301")
    }

    fn request(lecturer: &str) -> Booking {
        Booking::new("260102", 11, "C301", lecturer, "CS101")
    }

    #[test]
    fn never_used_key_has_nothing_pending() {
        let wl = Waitlists::new();
        assert!(!wl.has_pending(&key()));
        assert_eq!(wl.size(&key()), 0);
        assert!(wl.list_in_order(&key()).is_empty());
    }

    #[test]
    fn get_or_create_registers_empty_queue() {
        let mut wl = Waitlists::new();
        assert!(wl.get_or_create_queue(&key()).is_empty());
        assert_eq!(wl.queue_count(), 1);
        assert!(!wl.has_pending(&key()));
        // Same queue on second call
        wl.get_or_create_queue(&key()).push_back(request("Tan"));
        assert_eq!(wl.get_or_create_queue(&key()).len(), 1);
        assert_eq!(wl.queue_count(), 1);
    }

    #[test]
    fn dequeue_is_fifo() {
        let mut wl = Waitlists::new();
        for name in ["Tan", "Lee", "Ng"] {
            wl.enqueue(&key(), request(name));
        }
        assert_eq!(wl.size(&key()), 3);
        let order: Vec<String> = std::iter::from_fn(|| wl.dequeue_front(&key()))
            .map(|b| b.lecturer)
            .collect();
        assert_eq!(order, vec!["Tan", "Lee", "Ng"]);
    }

    #[test]
    fn drained_queue_reports_nothing_pending_but_is_kept() {
        let mut wl = Waitlists::new();
        wl.enqueue(&key(), request("Tan"));
        assert!(wl.has_pending(&key()));
        assert!(wl.dequeue_front(&key()).is_some());
        assert!(!wl.has_pending(&key()));
        assert!(wl.dequeue_front(&key()).is_none());
        assert_eq!(wl.queue_count(), 1);
    }

    #[test]
    fn front_peeks_without_removing() {
        let mut wl = Waitlists::new();
        assert!(wl.front(&key()).is_none());
        wl.enqueue(&key(), request("Tan"));
        wl.enqueue(&key(), request("Lee"));
        assert_eq!(wl.front(&key()).unwrap().lecturer, "Tan");
        assert_eq!(wl.size(&key()), 2);
        assert_eq!(wl.dequeue_front(&key()).unwrap().lecturer, "Tan");
    }

    #[test]
    fn dequeue_absent_key_is_none() {
        let mut wl = Waitlists::new();
        assert!(wl.dequeue_front(&key()).is_none());
        assert_eq!(wl.queue_count(), 0);
    }

    #[test]
    fn list_in_order_front_to_back() {
        let mut wl = Waitlists::new();
        wl.enqueue(&key(), request("Tan"));
        wl.enqueue(&key(), request("Lee"));
        let names: Vec<String> = wl.list_in_order(&key()).into_iter().map(|b| b.lecturer).collect();
        assert_eq!(names, vec!["Tan", "Lee"]);
        // Read-only
        assert_eq!(wl.size(&key()), 2);
    }

    #[test]
    fn pending_skips_empty_queues_and_sorts_keys() {
        let mut wl = Waitlists::new();
        let later = SlotKey::new("260103", 9, "1");
        wl.enqueue(&later, Booking::new("260103", 9, "1", "Ng", "PH110"));
        wl.enqueue(&key(), request("Tan"));
        wl.enqueue(&key(), request("Lee"));
        wl.get_or_create_queue(&SlotKey::new("260101", 8, "1"));
        let names: Vec<&str> = wl.pending().iter().map(|b| b.lecturer.as_str()).collect();
        assert_eq!(names, vec!["Tan", "Lee", "Ng"]);
    }
}
