use tracing::{debug, error, info};

use crate::model::*;

use super::conflict::find_conflict;
use super::Engine;

impl Engine {
    /// Probe every hour of `reservation` without touching the index.
    /// `Confirmed` carries the bookings `reserve` would insert.
    pub fn check_reserve(&self, reservation: &Reservation) -> ReserveOutcome {
        let hourly = reservation.hourly();
        match find_conflict(&self.index, &hourly) {
            Some((slot, occupant)) => ReserveOutcome::Conflict { slot, occupant },
            None => ReserveOutcome::Confirmed(hourly),
        }
    }

    /// All-or-nothing reservation of `duration` consecutive hours.
    ///
    /// The check phase probes every hour before anything is inserted, so a
    /// conflict on any hour leaves the index untouched.
    pub fn reserve(&mut self, reservation: &Reservation) -> ReserveOutcome {
        let outcome = self.check_reserve(reservation);
        let hourly = match &outcome {
            ReserveOutcome::Conflict { slot, occupant } => {
                debug!("reserve conflicts at {slot} (held by {})", occupant.lecturer);
                return outcome;
            }
            ReserveOutcome::Confirmed(hourly) => hourly,
        };

        for booking in hourly {
            let inserted = self.index.insert(booking.clone());
            debug_assert!(inserted, "slot {} free at check time", booking.slot_key());
        }
        info!(
            "reserved {} {}:00 x{} room {} for {}",
            reservation.date,
            reservation.start_hour,
            reservation.duration,
            reservation.room,
            reservation.lecturer
        );
        outcome
    }

    /// Queue every hour of the requested range, free hours included. Called by
    /// the operator after `reserve` reported a conflict and they chose to wait.
    pub fn join_waitlist(&mut self, reservation: &Reservation) -> Vec<Booking> {
        let hourly = reservation.hourly();
        for booking in &hourly {
            self.waitlists.enqueue(&booking.slot_key(), booking.clone());
        }
        info!(
            "waitlisted {} {}:00 x{} room {} for {}",
            reservation.date,
            reservation.start_hour,
            reservation.duration,
            reservation.room,
            reservation.lecturer
        );
        hourly
    }

    /// What `cancel(range)` would remove and promote, computed without
    /// mutating anything.
    pub fn plan_cancel(&self, range: &SlotRange) -> CancelOutcome {
        let mut plan = CancelOutcome::default();
        for (_, key) in range.keys() {
            if self.index.search(&key).is_none() {
                continue;
            }
            plan.removed.push(key.clone());
            if let Some(next) = self.waitlists.front(&key) {
                plan.promoted.push(Promotion {
                    key,
                    booking: next.clone(),
                });
            }
        }
        plan
    }

    /// Free every booked hour in `range`, promoting the head of each freed
    /// slot's waitlist into it before moving on to the next hour.
    pub fn cancel(&mut self, range: &SlotRange) -> CancelOutcome {
        let mut outcome = CancelOutcome::default();

        for (hour, key) in range.keys() {
            if !self.index.delete(&key) {
                debug!("cancel: {key} not booked");
                continue;
            }
            outcome.removed.push(key.clone());

            if !self.waitlists.has_pending(&key) {
                continue;
            }
            let Some(next) = self.waitlists.dequeue_front(&key) else {
                continue;
            };
            // The slot was vacated just above, so this insert cannot collide.
            let inserted = self.index.insert(next.clone());
            debug_assert!(inserted, "promotion into freshly vacated slot {key} failed");
            if !inserted {
                error!("promotion into {key} failed: slot occupied after delete");
                continue;
            }
            info!(
                "promoted {} ({}) into {} {hour}:00 room {}",
                next.lecturer, next.course, range.date, range.room
            );
            outcome.promoted.push(Promotion { key, booking: next });
        }

        outcome
    }
}
