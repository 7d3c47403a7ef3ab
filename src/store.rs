use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::engine::Engine;
use crate::journal::Journal;
use crate::model::*;
use crate::observability::*;
use crate::snapshot;

pub const BOOKINGS_FILE: &str = "bookings.txt";
pub const JOURNAL_FILE: &str = "waitlist.wal";

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

/// The engine plus its durable state: the booking file and the waitlist
/// journal in one data directory.
///
/// Every committed change is made durable before the call returns. Promotions
/// are journalled before the booking file is rewritten.
pub struct Store {
    engine: Engine,
    bookings_path: PathBuf,
    journal: Journal,
    compact_threshold: u64,
}

impl Store {
    pub fn open(data_dir: &Path, compact_threshold: u64) -> Result<Self, StoreError> {
        let bookings_path = data_dir.join(BOOKINGS_FILE);
        let journal_path = data_dir.join(JOURNAL_FILE);

        let mut engine = Engine::new();
        let records = snapshot::load(&bookings_path)?;
        let read = records.len();
        let loaded = engine.load(records);

        let events = Journal::replay(&journal_path)?;
        for event in &events {
            engine.replay(event);
        }
        let journal = Journal::open(&journal_path)?;

        info!(
            "opened {}: {loaded}/{read} bookings, {} journal events",
            data_dir.display(),
            events.len()
        );
        metrics::gauge!(BOOKINGS_ACTIVE).set(engine.index().len() as f64);

        let mut store = Self {
            engine,
            bookings_path,
            journal,
            compact_threshold,
        };
        // Replayed events count toward the threshold too.
        if events.len() as u64 > compact_threshold {
            store.compact_journal()?;
        }
        Ok(store)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Reserve after the booking file holds the new hours. A failed write
    /// leaves the engine as it was.
    pub fn reserve(&mut self, reservation: &Reservation) -> Result<ReserveOutcome, StoreError> {
        let outcome = self.engine.check_reserve(reservation);
        let ReserveOutcome::Confirmed(hourly) = &outcome else {
            metrics::counter!(RESERVATIONS_TOTAL, "outcome" => "conflict").increment(1);
            return Ok(outcome);
        };

        let rows: Vec<&Booking> = self.engine.list_all().chain(hourly).collect();
        save_bookings(&self.bookings_path, rows)?;

        let applied = self.engine.reserve(reservation);
        debug_assert_eq!(applied, outcome);
        metrics::counter!(RESERVATIONS_TOTAL, "outcome" => "confirmed").increment(1);
        metrics::gauge!(BOOKINGS_ACTIVE).set(self.engine.index().len() as f64);
        Ok(outcome)
    }

    pub fn join_waitlist(&mut self, reservation: &Reservation) -> Result<Vec<Booking>, StoreError> {
        let events: Vec<Event> = reservation
            .hourly()
            .into_iter()
            .map(|booking| Event::Enqueued { booking })
            .collect();
        self.commit_events(&events)?;

        let queued = self.engine.join_waitlist(reservation);
        metrics::counter!(WAITLIST_ENQUEUED_TOTAL).increment(queued.len() as u64);
        self.maybe_compact()?;
        Ok(queued)
    }

    /// Cancel once both the promotions are journalled and the booking file
    /// reflects the result. On failure the engine is unchanged and the journal
    /// is rewritten to match it.
    pub fn cancel(&mut self, range: &SlotRange) -> Result<CancelOutcome, StoreError> {
        let plan = self.engine.plan_cancel(range);
        if !plan.is_success() {
            return Ok(plan);
        }
        let events: Vec<Event> = plan
            .promoted
            .iter()
            .map(|p| Event::Promoted { key: p.key.clone() })
            .collect();
        self.commit_events(&events)?;

        let rows: Vec<&Booking> = self
            .engine
            .list_all()
            .filter(|b| !plan.removed.contains(&b.slot_key()))
            .chain(plan.promoted.iter().map(|p| &p.booking))
            .collect();
        if let Err(e) = save_bookings(&self.bookings_path, rows) {
            if !events.is_empty() {
                self.repair_journal();
            }
            return Err(e.into());
        }

        let outcome = self.engine.cancel(range);
        debug_assert_eq!(outcome, plan);
        metrics::counter!(CANCELLATIONS_TOTAL).increment(outcome.removed.len() as u64);
        metrics::counter!(PROMOTIONS_TOTAL).increment(outcome.promoted.len() as u64);
        metrics::gauge!(BOOKINGS_ACTIVE).set(self.engine.index().len() as f64);
        self.maybe_compact()?;
        Ok(outcome)
    }

    /// Final rewrite of the booking file and compaction of the journal.
    pub fn close(mut self) -> Result<(), StoreError> {
        let rows: Vec<&Booking> = self.engine.list_all().collect();
        save_bookings(&self.bookings_path, rows)?;
        self.compact_journal()?;
        info!("store closed");
        Ok(())
    }

    /// Commit `events`; a failed commit may leave a partial frame, so the
    /// journal is rebuilt from the engine before the error is returned.
    fn commit_events(&mut self, events: &[Event]) -> Result<(), StoreError> {
        if let Err(e) = self.journal.commit(events) {
            self.repair_journal();
            return Err(e.into());
        }
        Ok(())
    }

    fn repair_journal(&mut self) {
        if let Err(e) = self.compact_journal() {
            error!("could not rebuild {}: {e}", self.journal.path().display());
        }
    }

    fn maybe_compact(&mut self) -> Result<(), StoreError> {
        if self.journal.appends_since_compact() > self.compact_threshold {
            self.compact_journal()?;
        }
        Ok(())
    }

    /// Rewrite the journal as one `Enqueued` per pending request; drained
    /// queues leave nothing behind.
    fn compact_journal(&mut self) -> Result<(), StoreError> {
        let events: Vec<Event> = self
            .engine
            .waitlists()
            .pending()
            .into_iter()
            .map(|b| Event::Enqueued { booking: b.clone() })
            .collect();
        self.journal.compact(&events)?;
        metrics::counter!(JOURNAL_COMPACTIONS_TOTAL).increment(1);
        info!(
            "compacted {} to {} events",
            self.journal.path().display(),
            events.len()
        );
        Ok(())
    }
}

/// Rewrite the booking file with `rows` in slot order.
fn save_bookings(path: &Path, mut rows: Vec<&Booking>) -> io::Result<()> {
    rows.sort_by_cached_key(|b| b.slot_key());
    let written = snapshot::rewrite(path, rows)?;
    debug!("rewrote {} ({written} bookings)", path.display());
    Ok(())
}
