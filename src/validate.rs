use crate::limits::*;

#[derive(Debug, PartialEq, Eq)]
pub enum ValidationError {
    BadDate(String),
    HourOutOfRange(u8),
    /// Class would run past closing (`start`, `duration`).
    PastClosing(u8, u8),
    ZeroDuration,
    BadRoom(String),
    EmptyField(&'static str),
    FieldTooLong(&'static str),
    ContainsDelimiter(&'static str),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::BadDate(d) => write!(f, "invalid date {d:?}: expected YYMMDD"),
            ValidationError::HourOutOfRange(h) => {
                write!(f, "invalid hour {h}: must be between {FIRST_HOUR} and {LAST_HOUR}")
            }
            ValidationError::PastClosing(start, duration) => write!(
                f,
                "class of {duration}h starting {start}:00 exceeds {}:00",
                LAST_HOUR + 1
            ),
            ValidationError::ZeroDuration => write!(f, "duration must be at least 1 hour"),
            ValidationError::BadRoom(r) => {
                write!(f, "invalid room {r:?}: choose an existing room (1-{MAX_ROOM})")
            }
            ValidationError::EmptyField(name) => write!(f, "{name} must not be empty"),
            ValidationError::FieldTooLong(name) => {
                write!(f, "{name} longer than {MAX_TEXT_LEN} bytes")
            }
            ValidationError::ContainsDelimiter(name) => {
                write!(f, "{name} must not contain {RECORD_DELIMITER:?}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// `YYMMDD` with month 1..=12 and day 1..=31.
pub fn date(d: &str) -> Result<(), ValidationError> {
    let bad = || ValidationError::BadDate(d.to_string());
    if d.len() != DATE_LEN || !d.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    let month: u8 = d[2..4].parse().map_err(|_| bad())?;
    let day: u8 = d[4..6].parse().map_err(|_| bad())?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(bad());
    }
    Ok(())
}

pub fn hour(h: u8) -> Result<(), ValidationError> {
    if (FIRST_HOUR..=LAST_HOUR).contains(&h) {
        Ok(())
    } else {
        Err(ValidationError::HourOutOfRange(h))
    }
}

pub fn duration(start: u8, duration: u8) -> Result<(), ValidationError> {
    if duration == 0 {
        return Err(ValidationError::ZeroDuration);
    }
    if u16::from(start) + u16::from(duration) - 1 > u16::from(LAST_HOUR) {
        return Err(ValidationError::PastClosing(start, duration));
    }
    Ok(())
}

/// Accepts `1..=MAX_ROOM` and returns the canonical spelling (`"05"` → `"5"`).
pub fn room(r: &str) -> Result<String, ValidationError> {
    let n: u32 = r
        .trim()
        .parse()
        .map_err(|_| ValidationError::BadRoom(r.to_string()))?;
    if !(1..=MAX_ROOM).contains(&n) {
        return Err(ValidationError::BadRoom(r.to_string()));
    }
    Ok(n.to_string())
}

/// Lecturer / course text; returned trimmed.
pub fn text(name: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::EmptyField(name));
    }
    if value.len() > MAX_TEXT_LEN {
        return Err(ValidationError::FieldTooLong(name));
    }
    if value.contains(RECORD_DELIMITER) {
        return Err(ValidationError::ContainsDelimiter(name));
    }
    Ok(value.to_string())
}
