use std::io::{self, BufRead, Write};
use std::time::Instant;

use tracing::{debug, warn};

use crate::model::*;
use crate::observability::{COMMANDS_TOTAL, COMMAND_DURATION_SECONDS};
use crate::sql::{self, Command, SqlError};
use crate::store::{Store, StoreError};
use crate::validate::{self, ValidationError};

const RULE: &str = "===========================================================";
const HEADER: &str = "|  Date  | Time | Room   | Lecturer     | Course     |";

#[derive(Debug)]
pub enum ShellError {
    Sql(SqlError),
    Invalid(ValidationError),
    Store(StoreError),
    Io(io::Error),
}

impl std::fmt::Display for ShellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShellError::Sql(e) => write!(f, "{e}"),
            ShellError::Invalid(e) => write!(f, "{e}"),
            ShellError::Store(e) => write!(f, "{e}"),
            ShellError::Io(e) => write!(f, "terminal error: {e}"),
        }
    }
}

impl std::error::Error for ShellError {}

impl From<SqlError> for ShellError {
    fn from(e: SqlError) -> Self {
        ShellError::Sql(e)
    }
}

impl From<ValidationError> for ShellError {
    fn from(e: ValidationError) -> Self {
        ShellError::Invalid(e)
    }
}

impl From<StoreError> for ShellError {
    fn from(e: StoreError) -> Self {
        ShellError::Store(e)
    }
}

impl From<io::Error> for ShellError {
    fn from(e: io::Error) -> Self {
        ShellError::Io(e)
    }
}

/// Line-oriented operator console: one statement per line, read from `input`,
/// results written to `output`.
pub struct Shell<R, W> {
    store: Store,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(store: Store, input: R, output: W) -> Self {
        Self { store, input, output }
    }

    pub fn into_store(self) -> Store {
        self.store
    }

    /// Run until `\q`, `quit`, `exit` or end of input. Only terminal I/O
    /// failures end the loop early.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            write!(self.output, "roombook> ")?;
            self.output.flush()?;
            let Some(line) = self.read_line()? else {
                writeln!(self.output)?;
                return Ok(());
            };
            let line = line.trim().trim_end_matches(';').trim();
            if line.is_empty() {
                continue;
            }
            if matches!(line, "\\q" | "quit" | "exit") {
                return Ok(());
            }
            match self.execute(line) {
                Ok(()) => {}
                Err(ShellError::Io(e)) => return Err(e),
                Err(e) => {
                    warn!("command failed: {e}");
                    writeln!(self.output, "ERROR: {e}")?;
                }
            }
        }
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    /// Parse, validate and run one statement.
    pub fn execute(&mut self, statement: &str) -> Result<(), ShellError> {
        let start = Instant::now();
        let cmd = match sql::parse_sql(statement) {
            Ok(cmd) => cmd,
            Err(e) => {
                metrics::counter!(COMMANDS_TOTAL, "command" => "invalid", "status" => "error")
                    .increment(1);
                return Err(e.into());
            }
        };
        let label = cmd.label();
        debug!("executing {label}");

        let result = self.dispatch(cmd);

        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(COMMANDS_TOTAL, "command" => label, "status" => status).increment(1);
        metrics::histogram!(COMMAND_DURATION_SECONDS, "command" => label)
            .record(start.elapsed().as_secs_f64());
        result
    }

    fn dispatch(&mut self, cmd: Command) -> Result<(), ShellError> {
        match cmd {
            Command::Reserve(raw) => self.reserve(raw),
            Command::Cancel(raw) => self.cancel(raw),
            Command::Search { date, hour, room } => {
                let (date, hour, room) = checked_slot(&date, hour, &room)?;
                match self.store.engine().search(&date, hour, &room) {
                    Some(b) => {
                        writeln!(self.output, "\n--- Booking Found ---")?;
                        writeln!(self.output, "Lecturer: {}", b.lecturer)?;
                        writeln!(self.output, "Course: {}", b.course)?;
                    }
                    None => writeln!(self.output, "Booking not found.")?,
                }
                Ok(())
            }
            Command::ListAll => {
                render_table(&mut self.output, self.store.engine().list_all())?;
                Ok(())
            }
            Command::ListByDate { date } => {
                validate::date(&date)?;
                let history = self.store.engine().list_by_date(&date);
                if history.is_empty() {
                    writeln!(self.output, "\nNo booking history for date {date}.")?;
                } else {
                    render_table(&mut self.output, history.iter())?;
                }
                Ok(())
            }
            Command::ListByRoom { room } => {
                let room = validate::room(&room)?;
                let history = self.store.engine().list_by_room(&room);
                if history.is_empty() {
                    writeln!(self.output, "\nNo booking history for Room {room}.")?;
                } else {
                    render_table(&mut self.output, history.iter())?;
                }
                Ok(())
            }
            Command::ViewWaitlist { date, hour, room } => {
                let (date, hour, room) = checked_slot(&date, hour, &room)?;
                writeln!(
                    self.output,
                    "\n--- Waitlist for {date} at {hour}:00 in Room {room} ---"
                )?;
                match self.store.engine().view_waitlist(&date, hour, &room) {
                    Some(view) => {
                        for (pos, b) in view.entries.iter().enumerate() {
                            writeln!(
                                self.output,
                                "{}. Lecturer: {} | Course: {}",
                                pos + 1,
                                b.lecturer,
                                b.course
                            )?;
                        }
                        writeln!(self.output, "Total waiting: {}", view.count)?;
                    }
                    None => writeln!(self.output, "No waitlist exists for this slot.")?,
                }
                Ok(())
            }
        }
    }

    fn reserve(&mut self, raw: Reservation) -> Result<(), ShellError> {
        validate::date(&raw.date)?;
        validate::hour(raw.start_hour)?;
        validate::duration(raw.start_hour, raw.duration)?;
        let reservation = Reservation {
            room: validate::room(&raw.room)?,
            lecturer: validate::text("lecturer", &raw.lecturer)?,
            course: validate::text("course", &raw.course)?,
            ..raw
        };

        match self.store.reserve(&reservation)? {
            ReserveOutcome::Confirmed(_) => {
                writeln!(self.output, "Booking successful.")?;
            }
            ReserveOutcome::Conflict { occupant, .. } => {
                writeln!(
                    self.output,
                    "\nError: One or more time slots already booked ({} {}:00 Room {} by {}).",
                    occupant.date, occupant.hour, occupant.room, occupant.lecturer
                )?;
                write!(self.output, "Would you like to join the waitlist? (y/n): ")?;
                self.output.flush()?;
                let answer = self.read_line()?.unwrap_or_default();
                if matches!(answer.trim(), "y" | "Y") {
                    self.store.join_waitlist(&reservation)?;
                    writeln!(self.output, "Added to waitlist successfully!")?;
                } else {
                    writeln!(self.output, "Booking not added to waitlist.")?;
                }
            }
        }
        Ok(())
    }

    fn cancel(&mut self, raw: SlotRange) -> Result<(), ShellError> {
        validate::date(&raw.date)?;
        validate::hour(raw.start_hour)?;
        validate::duration(raw.start_hour, raw.duration)?;
        let range = SlotRange {
            room: validate::room(&raw.room)?,
            ..raw
        };

        let outcome = self.store.cancel(&range)?;
        for p in &outcome.promoted {
            writeln!(
                self.output,
                "\n[System] Waitlist found for slot {} {}:00 Room {}",
                p.booking.date, p.booking.hour, p.booking.room
            )?;
            writeln!(
                self.output,
                "[System] Automatically promoted: {} ({})",
                p.booking.lecturer, p.booking.course
            )?;
        }
        if outcome.is_success() {
            writeln!(self.output, "\nBooking cancelled successfully.")?;
        } else {
            writeln!(self.output, "No matching booking found.")?;
        }
        Ok(())
    }
}

fn checked_slot(date: &str, hour: u8, room: &str) -> Result<(String, u8, String), ShellError> {
    validate::date(date)?;
    validate::hour(hour)?;
    let room = validate::room(room)?;
    Ok((date.to_string(), hour, room))
}

pub fn render_row(out: &mut impl Write, b: &Booking) -> io::Result<()> {
    writeln!(
        out,
        "| {:>6} | {:>2}:00 | {:>6} | {:>12} | {:>10} |",
        b.date, b.hour, b.room, b.lecturer, b.course
    )
}

pub fn render_table<'a>(
    out: &mut impl Write,
    bookings: impl IntoIterator<Item = &'a Booking>,
) -> io::Result<()> {
    writeln!(out, "\n{RULE}")?;
    writeln!(out, "{HEADER}")?;
    writeln!(out, "{RULE}")?;
    for b in bookings {
        render_row(out, b)?;
    }
    writeln!(out, "{RULE}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_matches_column_widths() {
        let mut out = Vec::new();
        render_row(&mut out, &Booking::new("260102", 9, "5", "Tan", "CS101")).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "| 260102 |  9:00 |      5 |          Tan |      CS101 |\n"
        );
    }

    #[test]
    fn empty_table_has_frame_only() {
        let mut out = Vec::new();
        render_table(&mut out, std::iter::empty::<&Booking>()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().filter(|l| *l == RULE).count(), 3);
        assert!(text.contains(HEADER));
    }
}
