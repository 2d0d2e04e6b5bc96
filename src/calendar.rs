//! Calendar vocabulary and wall-clock helpers shared by filters and rules.

use std::fmt;
use std::str::FromStr;

use jiff::civil::{Date, Time};
use jiff::civil::DateTime;
use jiff::tz::{Offset, TimeZone};
use jiff::{Span, Timestamp, Zoned};

use crate::error::CadenceError;

/// Day of the week, numbered from Sunday = 0 to Saturday = 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sunday,
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
    Weekday::Saturday,
];

impl Weekday {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sunday => "sunday",
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
        }
    }

    pub fn short(self) -> &'static str {
        match self {
            Self::Sunday => "sun",
            Self::Monday => "mon",
            Self::Tuesday => "tue",
            Self::Wednesday => "wed",
            Self::Thursday => "thu",
            Self::Friday => "fri",
            Self::Saturday => "sat",
        }
    }

    /// Two-letter code used as the key of ordinal maps in the JSON form.
    pub fn code(self) -> &'static str {
        match self {
            Self::Sunday => "su",
            Self::Monday => "mo",
            Self::Tuesday => "tu",
            Self::Wednesday => "we",
            Self::Thursday => "th",
            Self::Friday => "fr",
            Self::Saturday => "sa",
        }
    }

    /// Sunday-based day number (Sunday = 0).
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        WEEKDAYS.get(usize::from(n)).copied()
    }

    pub fn to_jiff(self) -> jiff::civil::Weekday {
        match self {
            Self::Sunday => jiff::civil::Weekday::Sunday,
            Self::Monday => jiff::civil::Weekday::Monday,
            Self::Tuesday => jiff::civil::Weekday::Tuesday,
            Self::Wednesday => jiff::civil::Weekday::Wednesday,
            Self::Thursday => jiff::civil::Weekday::Thursday,
            Self::Friday => jiff::civil::Weekday::Friday,
            Self::Saturday => jiff::civil::Weekday::Saturday,
        }
    }

    pub fn from_jiff(wd: jiff::civil::Weekday) -> Self {
        match wd {
            jiff::civil::Weekday::Sunday => Self::Sunday,
            jiff::civil::Weekday::Monday => Self::Monday,
            jiff::civil::Weekday::Tuesday => Self::Tuesday,
            jiff::civil::Weekday::Wednesday => Self::Wednesday,
            jiff::civil::Weekday::Thursday => Self::Thursday,
            jiff::civil::Weekday::Friday => Self::Friday,
            jiff::civil::Weekday::Saturday => Self::Saturday,
        }
    }

    pub fn all() -> [Self; 7] {
        WEEKDAYS
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = CadenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_weekday(s).ok_or_else(|| CadenceError::config(format!("unknown weekday: {s}")))
    }
}

/// Parse an English weekday name: two-letter, three-letter or full.
pub fn parse_weekday(s: &str) -> Option<Weekday> {
    match s.to_lowercase().as_str() {
        "su" | "sun" | "sunday" => Some(Weekday::Sunday),
        "mo" | "mon" | "monday" => Some(Weekday::Monday),
        "tu" | "tue" | "tuesday" => Some(Weekday::Tuesday),
        "we" | "wed" | "wednesday" => Some(Weekday::Wednesday),
        "th" | "thu" | "thursday" => Some(Weekday::Thursday),
        "fr" | "fri" | "friday" => Some(Weekday::Friday),
        "sa" | "sat" | "saturday" => Some(Weekday::Saturday),
        _ => None,
    }
}

/// Parse an English month name into its number (January = 1).
pub fn parse_month(s: &str) -> Option<u8> {
    match s.to_lowercase().as_str() {
        "jan" | "january" => Some(1),
        "feb" | "february" => Some(2),
        "mar" | "march" => Some(3),
        "apr" | "april" => Some(4),
        "may" => Some(5),
        "jun" | "june" => Some(6),
        "jul" | "july" => Some(7),
        "aug" | "august" => Some(8),
        "sep" | "sept" | "september" => Some(9),
        "oct" | "october" => Some(10),
        "nov" | "november" => Some(11),
        "dec" | "december" => Some(12),
        _ => None,
    }
}

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Three-letter name of a month number, if it is in 1..=12.
pub fn month_abbrev(month: u8) -> Option<&'static str> {
    MONTH_ABBREVIATIONS.get(usize::from(month).checked_sub(1)?).copied()
}

/// Parse an instant written either as a zoned date-time
/// (`2000-01-31T09:00:00-05:00[America/New_York]`) or as an RFC 3339
/// timestamp (`2000-01-31T14:00:00Z`, `2000-01-31T09:00:00-05:00`).
///
/// A bare timestamp keeps its numeric offset as a fixed time zone; `Z` is UTC.
pub fn parse_instant(s: &str) -> Result<Zoned, jiff::Error> {
    let zoned_err = match s.parse::<Zoned>() {
        Ok(zoned) => return Ok(zoned),
        Err(e) => e,
    };
    let Ok(timestamp) = s.parse::<Timestamp>() else {
        return Err(zoned_err);
    };
    // civil parsing drops a numeric offset but rejects `Z`
    let tz = match s.parse::<DateTime>() {
        Ok(civil) => {
            let wall = civil.to_zoned(TimeZone::UTC)?.timestamp();
            TimeZone::fixed(Offset::try_from(wall.duration_since(timestamp))?)
        }
        Err(_) => TimeZone::UTC,
    };
    Ok(timestamp.to_zoned(tz))
}

/// Set the wall-clock time on a date in a time zone.
///
/// Times inside a DST gap resolve to the later offset, times inside a fold to
/// the earlier one.
pub(crate) fn at_time_on_date(date: Date, time: Time, tz: &TimeZone) -> Result<Zoned, CadenceError> {
    date.to_datetime(time)
        .to_zoned(tz.clone())
        .map_err(|e| CadenceError::calendar(format!("cannot create zoned datetime: {e}")))
}

/// Wall-clock time of day of an instant, truncated to seconds.
pub(crate) fn time_of_day(t: &Zoned) -> Time {
    Time::constant(t.hour(), t.minute(), t.second(), 0)
}

/// Last second of a civil day.
pub(crate) const END_OF_DAY: Time = Time::constant(23, 59, 59, 0);

/// Monday of the week containing `date`.
pub(crate) fn monday_of(date: Date) -> Result<Date, CadenceError> {
    let days_since_monday = i64::from(date.weekday().to_monday_zero_offset());
    Ok(date.checked_add(Span::new().days(-days_since_monday))?)
}

/// Count days between two dates (signed).
pub(crate) fn days_between(a: Date, b: Date) -> Result<i64, CadenceError> {
    Ok(i64::from(a.until(b)?.get_days()))
}

/// Count months between two dates (year*12+month arithmetic).
pub(crate) fn months_between(a: Date, b: Date) -> i64 {
    (i64::from(b.year()) * 12 + i64::from(b.month()))
        - (i64::from(a.year()) * 12 + i64::from(a.month()))
}
