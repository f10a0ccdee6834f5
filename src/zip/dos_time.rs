//! Packed MS-DOS date/time fields used by ZIP headers.
//!
//! - Time: bits 0-4 = seconds/2, bits 5-10 = minutes, bits 11-15 = hours
//! - Date: bits 0-4 = day, bits 5-8 = month, bits 9-15 = year-1980

use time::OffsetDateTime;

/// A DOS timestamp as written to the `last mod time`/`last mod date` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DosDateTime {
    pub time: u16,
    pub date: u16,
}

impl DosDateTime {
    /// ZIP epoch.
    pub const MIN_YEAR: i32 = 1980;
    /// Largest year the 7-bit year field can hold.
    pub const MAX_YEAR: i32 = 2107;

    /// Encode a calendar timestamp.
    ///
    /// Years outside `1980..=2107` are clamped into range. Seconds are
    /// truncated to the 2-second resolution of the format.
    pub fn from_calendar(year: i32, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        let year = year.clamp(Self::MIN_YEAR, Self::MAX_YEAR);
        let date = ((((year - Self::MIN_YEAR) as u16) & 0x7F) << 9)
            | ((month as u16 & 0x0F) << 5)
            | (day as u16 & 0x1F);
        let time = ((hour as u16 & 0x1F) << 11)
            | ((minute as u16 & 0x3F) << 5)
            | ((second as u16 / 2) & 0x1F);
        Self { time, date }
    }

    pub fn from_datetime(datetime: OffsetDateTime) -> Self {
        Self::from_calendar(
            datetime.year(),
            u8::from(datetime.month()),
            datetime.day(),
            datetime.hour(),
            datetime.minute(),
            datetime.second(),
        )
    }

    /// Current wall-clock time, in the local offset when it can be determined
    /// and UTC otherwise.
    pub fn now() -> Self {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        Self::from_datetime(now)
    }

    pub fn year(&self) -> u16 {
        ((self.date >> 9) & 0x7F) + Self::MIN_YEAR as u16
    }

    pub fn month(&self) -> u8 {
        ((self.date >> 5) & 0x0F) as u8
    }

    pub fn day(&self) -> u8 {
        (self.date & 0x1F) as u8
    }

    pub fn hour(&self) -> u8 {
        ((self.time >> 11) & 0x1F) as u8
    }

    pub fn minute(&self) -> u8 {
        ((self.time >> 5) & 0x3F) as u8
    }

    pub fn second(&self) -> u8 {
        ((self.time & 0x1F) * 2) as u8
    }
}
