//! Flat-file dump of the booking index.
//!
//! One booking per line: `date,hour,room,lecturer,course`. There is no
//! escaping; the course is the remainder of the line, so only it may contain
//! the delimiter.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::warn;

use crate::limits::RECORD_DELIMITER;
use crate::model::Booking;
use crate::validate::{self, ValidationError};

pub fn encode_record(booking: &Booking) -> String {
    let d = RECORD_DELIMITER;
    format!(
        "{}{d}{}{d}{}{d}{}{d}{}",
        booking.date, booking.hour, booking.room, booking.lecturer, booking.course
    )
}

#[derive(Debug, PartialEq, Eq)]
pub enum RecordError {
    MissingField(&'static str),
    BadHour(String),
    /// Room is valid but not spelled the way the shell stores it (`"05"`).
    NonCanonicalRoom(String),
    Invalid(ValidationError),
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordError::MissingField(name) => write!(f, "missing field `{name}`"),
            RecordError::BadHour(h) => write!(f, "bad hour {h:?}"),
            RecordError::NonCanonicalRoom(r) => write!(f, "room {r:?} is not in canonical form"),
            RecordError::Invalid(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RecordError {}

impl From<ValidationError> for RecordError {
    fn from(e: ValidationError) -> Self {
        RecordError::Invalid(e)
    }
}

/// Parse one line. Date, hour and room must be exactly what the shell would
/// have stored, so that every loaded record has a distinct slot key.
pub fn parse_record(line: &str) -> Result<Booking, RecordError> {
    let mut fields = line.splitn(5, RECORD_DELIMITER);
    let mut next = |name: &'static str| fields.next().ok_or(RecordError::MissingField(name));
    let date = next("date")?;
    let hour = next("hour")?;
    let room = next("room")?;
    let lecturer = next("lecturer")?;
    let course = next("course")?;

    validate::date(date)?;
    let hour: u8 = hour
        .parse()
        .map_err(|_| RecordError::BadHour(hour.to_string()))?;
    validate::hour(hour)?;
    if validate::room(room)? != room {
        return Err(RecordError::NonCanonicalRoom(room.to_string()));
    }
    Ok(Booking::new(date, hour, room, lecturer, course))
}

/// Read every well-formed record. A missing file is an empty store; malformed
/// lines are skipped with a warning.
pub fn load(path: &Path) -> io::Result<Vec<Booking>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let mut bookings = Vec::new();
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        match parse_record(line) {
            Ok(b) => bookings.push(b),
            Err(e) => warn!("{}:{}: skipping record: {e}", path.display(), lineno + 1),
        }
    }
    Ok(bookings)
}

/// Replace the file with `bookings`: temp file, fsync, atomic rename.
pub fn rewrite<'a>(path: &Path, bookings: impl IntoIterator<Item = &'a Booking>) -> io::Result<usize> {
    let tmp_path = path.with_extension("txt.tmp");
    let mut count = 0;
    {
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        for booking in bookings {
            writeln!(writer, "{}", encode_record(booking))?;
            count += 1;
        }
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    fn tmp_path(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("roombook_test_snapshot_{}", Ulid::new()));
        fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn encode_matches_flat_format() {
        let b = Booking::new("260102", 9, "5", "Dr Tan", "CS101");
        assert_eq!(encode_record(&b), "260102,9,5,Dr Tan,CS101");
    }

    #[test]
    fn parse_keeps_commas_in_course() {
        let b = parse_record("260102,9,5,Tan,Data Structures, Part 2").unwrap();
        assert_eq!(b.hour, 9);
        assert_eq!(b.room, "5");
        assert_eq!(b.course, "Data Structures, Part 2");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert_eq!(parse_record("260102,9,5"), Err(RecordError::MissingField("lecturer")));
        assert_eq!(
            parse_record("260102,nine,5,Tan,CS101"),
            Err(RecordError::BadHour("nine".into()))
        );
        assert!(matches!(
            parse_record(",9,5,Tan,CS101"),
            Err(RecordError::Invalid(ValidationError::BadDate(_)))
        ));
    }

    #[test]
    fn parse_rejects_records_outside_the_slot_domain() {
        // 100 would produce the same key as hour 10 in room "05".
        assert_eq!(
            parse_record("260102,100,5,A,X"),
            Err(RecordError::Invalid(ValidationError::HourOutOfRange(100)))
        );
        assert_eq!(
            parse_record("260102,10,05,B,Y"),
            Err(RecordError::NonCanonicalRoom("05".into()))
        );
        assert!(matches!(
            parse_record("notadate,3,99,C,Z"),
            Err(RecordError::Invalid(ValidationError::BadDate(_)))
        ));
        assert!(matches!(
            parse_record("260102,10,21,D,W"),
            Err(RecordError::Invalid(ValidationError::BadRoom(_)))
        ));
        assert_eq!(
            parse_record("260102, 9,5,Tan,CS101"),
            Err(RecordError::BadHour(" 9".into()))
        );
    }

    #[test]
    fn rewrite_then_load() {
        let path = tmp_path("bookings.txt");
        let bookings = vec![
            Booking::new("260102", 9, "5", "Tan", "CS101"),
            Booking::new("260102", 10, "5", "Tan", "CS101"),
        ];
        assert_eq!(rewrite(&path, &bookings).unwrap(), 2);
        assert_eq!(load(&path).unwrap(), bookings);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_missing_file_is_empty() {
        let path = tmp_path("absent.txt");
        assert!(load(&path).unwrap().is_empty());
    }

    #[test]
    fn load_skips_bad_lines() {
        let path = tmp_path("mixed.txt");
        fs::write(
            &path,
            "260102,9,5,Tan,CS101\ngarbage\n\n260102,100,5,A,X\n260102,10,05,B,Y\n\
             notadate,3,99,C,Z\n260102,10,5,Lee,MA200\r\n",
        )
        .unwrap();
        let loaded = load(&path).unwrap();
        let keys: Vec<String> = loaded.iter().map(|b| b.slot_key().to_string()).collect();
        assert_eq!(keys, vec!["260102095", "260102105"]);
        assert_eq!(loaded[1].course, "MA200");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn rewrite_replaces_previous_contents() {
        let path = tmp_path("replace.txt");
        rewrite(&path, &[Booking::new("260102", 9, "5", "Tan", "CS101")]).unwrap();
        let none: Vec<Booking> = Vec::new();
        rewrite(&path, &none).unwrap();
        assert!(load(&path).unwrap().is_empty());
        assert!(!path.with_extension("txt.tmp").exists());
        let _ = fs::remove_file(&path);
    }
}
