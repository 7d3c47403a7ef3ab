/// First bookable hour of the day.
pub const FIRST_HOUR: u8 = 8;

/// Last bookable start hour; a class starting here ends at 17:00.
pub const LAST_HOUR: u8 = 16;

/// Rooms are numbered `1..=MAX_ROOM`.
pub const MAX_ROOM: u32 = 20;

/// Dates are `YYMMDD`.
pub const DATE_LEN: usize = 6;

/// Max bytes for lecturer / course fields.
pub const MAX_TEXT_LEN: usize = 64;

/// Field separator of the booking file.
pub const RECORD_DELIMITER: char = ',';
