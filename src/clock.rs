//! Calendar time and its on-screen format.

use core::{
    fmt::Write as _,
    ops::RangeInclusive,
};

use chrono::{
    Datelike,
    Timelike,
};
use heapless::String;

/// Weekday abbreviations, Sunday first.
pub const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Rendered width of the date string, `YYYY/MM/DD(Www)`.
pub const DATE_CHARS: usize = 15;

/// Rendered width of the time string, `HH:MM:SS`.
pub const TIME_CHARS: usize = 8;

/// Broken-down wall-clock time as read from an RTC.
///
/// Fields are stored as the RTC reports them and may be out of range; the
/// text forms show such fields as dashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    /// 0 = Sunday.
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTime {
    /// Convert Unix seconds (UTC) to a calendar date. `None` if chrono
    /// cannot represent the instant.
    pub fn from_unix(secs: u64) -> Option<Self> {
        let secs = i64::try_from(secs).ok()?;
        let utc = chrono::DateTime::from_timestamp(secs, 0)?;
        Some(Self {
            year: u16::try_from(utc.year()).unwrap_or(u16::MAX),
            month: utc.month() as u8,
            day: utc.day() as u8,
            weekday: utc.weekday().num_days_from_sunday() as u8,
            hour: utc.hour() as u8,
            minute: utc.minute() as u8,
            second: utc.second() as u8,
        })
    }

    pub fn weekday_name(&self) -> &'static str {
        WEEKDAY_NAMES.get(self.weekday as usize).copied().unwrap_or("ERR")
    }

    /// `YYYY/MM/DD(Www)`
    pub fn date_text(&self) -> String<DATE_CHARS> {
        let mut text = String::new();
        push_field(&mut text, self.year, 4, 0..=9999);
        let _ = text.push('/');
        push_field(&mut text, self.month.into(), 2, 1..=12);
        let _ = text.push('/');
        push_field(&mut text, self.day.into(), 2, 1..=31);
        let _ = write!(text, "({})", self.weekday_name());
        text
    }

    /// `HH:MM:SS`
    pub fn time_text(&self) -> String<TIME_CHARS> {
        let mut text = String::new();
        push_field(&mut text, self.hour.into(), 2, 0..=23);
        let _ = text.push(':');
        push_field(&mut text, self.minute.into(), 2, 0..=59);
        let _ = text.push(':');
        // 60 is a leap second.
        push_field(&mut text, self.second.into(), 2, 0..=60);
        text
    }
}

/// Append `value` zero-padded to `width`, or `width` dashes if it is outside
/// `valid`. Either way exactly `width` characters.
fn push_field<const N: usize>(text: &mut String<N>, value: u16, width: usize, valid: RangeInclusive<u16>) {
    if valid.contains(&value) {
        let _ = write!(text, "{value:0width$}");
    } else {
        for _ in 0..width {
            let _ = text.push('-');
        }
    }
}
