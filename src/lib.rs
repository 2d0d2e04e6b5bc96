//! cadence: calendar recurrence rules.
//!
//! A [`Rule`] describes a repeating pattern (every 2 weeks on tuesday and
//! thursday, the last friday of every month, ...). An [`Occurrence`] anchors
//! a rule at a start time and answers queries over the resulting sequence:
//! next and previous occurrences, occurrences in an interval, and every
//! occurrence of a finite rule. A [`Schedule`] adds an optional end time, so
//! each occurrence covers a span that can be clipped to a query interval.
//!
//! Instants are [`jiff::Zoned`] values. Rules repeat on the wall clock of the
//! start time's zone, so a 09:00 meeting stays at 09:00 across DST changes.
//!
//! # Examples
//!
//! ```
//! use cadence::{Occurrence, Rule, Weekday};
//! use jiff::civil::date;
//! use jiff::tz::TimeZone;
//!
//! let rule = Rule::weekly(2)?
//!     .weekdays([Weekday::Tuesday, Weekday::Thursday])?
//!     .with_count(8);
//! let start = date(1997, 9, 2).at(9, 0, 0, 0).to_zoned(TimeZone::UTC)?;
//! let occurrence = Occurrence::new(rule, start)?;
//!
//! let all = occurrence.all()?;
//! assert_eq!(all.len(), 8);
//! assert_eq!(all[2].date(), date(1997, 9, 16));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod calendar;
mod display;
pub mod error;
pub mod filter;
pub mod occurrence;
pub mod rule;
pub mod schedule;
#[cfg(feature = "serde")]
pub mod serialize;
pub mod suboccurrence;

pub use calendar::Weekday;
pub use error::CadenceError;
pub use filter::{
    Constraint, Filter, FilterKind, MonthdaysFilter, MonthsFilter, WeekdaysFilter, YeardaysFilter,
};
pub use occurrence::{Occurrence, Occurrences};
pub use rule::{Frequency, Rule, Step};
pub use schedule::Schedule;
pub use suboccurrence::Suboccurrence;
