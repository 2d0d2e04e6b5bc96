//! Filters narrow the instants a rule produces: selected months, weekdays
//! (optionally by ordinal position within the rule's period), days of the
//! month and days of the year.
//!
//! Every filter answers the same four questions through [`Constraint`]:
//! does an instant match, what is the smallest calendar step that can change
//! the answer, and what is the nearest matching instant at or after (at or
//! before) a given one. Filters know nothing about the rule's interval or
//! base time; the rule combines them.

use std::collections::{BTreeMap, BTreeSet};

use jiff::civil::Date;
use jiff::{Span, Zoned};

use crate::calendar::{at_time_on_date, time_of_day, Weekday};
use crate::error::CadenceError;
use crate::rule::{Frequency, Step};

/// The capability shared by all filters.
///
/// `period` is the frequency of the enclosing rule. Only ordinal weekdays
/// look at it ("the 2nd monday" of a month or of a year).
pub trait Constraint {
    /// True if `t` satisfies this filter alone.
    fn matches(&self, t: &Zoned, period: Frequency) -> bool;

    /// Smallest step after which [`Constraint::matches`] can change.
    fn step(&self) -> Step;

    /// Nearest matching instant at or after `t`.
    fn next(&self, t: &Zoned, period: Frequency) -> Result<Zoned, CadenceError>;

    /// Nearest matching instant at or before `t`.
    fn previous(&self, t: &Zoned, period: Frequency) -> Result<Zoned, CadenceError>;
}

/// Filter kinds. A rule holds at most one filter of each kind, iterated in
/// this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterKind {
    Months,
    Weekdays,
    Monthdays,
    Yeardays,
}

impl FilterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Months => "months",
            Self::Weekdays => "weekdays",
            Self::Monthdays => "monthdays",
            Self::Yeardays => "yeardays",
        }
    }
}

/// A single filter of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Months(MonthsFilter),
    Weekdays(WeekdaysFilter),
    Monthdays(MonthdaysFilter),
    Yeardays(YeardaysFilter),
}

impl Filter {
    pub fn months(months: impl IntoIterator<Item = u8>) -> Result<Self, CadenceError> {
        MonthsFilter::new(months).map(Self::Months)
    }

    pub fn weekdays(weekdays: impl IntoIterator<Item = Weekday>) -> Result<Self, CadenceError> {
        WeekdaysFilter::new(weekdays, []).map(Self::Weekdays)
    }

    /// Weekdays filter with both plain weekdays and ordinal positions,
    /// e.g. every tuesday plus the first and last monday.
    pub fn weekdays_with_ordinals(
        weekdays: impl IntoIterator<Item = Weekday>,
        ordinals: impl IntoIterator<Item = (Weekday, i8)>,
    ) -> Result<Self, CadenceError> {
        WeekdaysFilter::new(weekdays, ordinals).map(Self::Weekdays)
    }

    pub fn monthdays(days: impl IntoIterator<Item = i8>) -> Result<Self, CadenceError> {
        MonthdaysFilter::new(days).map(Self::Monthdays)
    }

    pub fn yeardays(days: impl IntoIterator<Item = i16>) -> Result<Self, CadenceError> {
        YeardaysFilter::new(days).map(Self::Yeardays)
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            Self::Months(_) => FilterKind::Months,
            Self::Weekdays(_) => FilterKind::Weekdays,
            Self::Monthdays(_) => FilterKind::Monthdays,
            Self::Yeardays(_) => FilterKind::Yeardays,
        }
    }

    fn inner(&self) -> &dyn Constraint {
        match self {
            Self::Months(f) => f,
            Self::Weekdays(f) => f,
            Self::Monthdays(f) => f,
            Self::Yeardays(f) => f,
        }
    }
}

impl Constraint for Filter {
    fn matches(&self, t: &Zoned, period: Frequency) -> bool {
        self.inner().matches(t, period)
    }

    fn step(&self) -> Step {
        self.inner().step()
    }

    fn next(&self, t: &Zoned, period: Frequency) -> Result<Zoned, CadenceError> {
        self.inner().next(t, period)
    }

    fn previous(&self, t: &Zoned, period: Frequency) -> Result<Zoned, CadenceError> {
        self.inner().previous(t, period)
    }
}

/// Walk day by day from `t` until `filter` matches, at most `limit` days.
///
/// Adding calendar days keeps the wall-clock time across DST changes.
fn scan_days<C: Constraint + ?Sized>(
    filter: &C,
    t: &Zoned,
    period: Frequency,
    limit: i64,
    backward: bool,
) -> Result<Zoned, CadenceError> {
    let one_day = Span::new().days(if backward { -1 } else { 1 });
    let mut current = t.clone();
    for _ in 0..=limit {
        if filter.matches(&current, period) {
            return Ok(current);
        }
        current = current.checked_add(one_day)?;
    }
    Err(CadenceError::invariant(format!(
        "no day matching the filter within {limit} days of {t}"
    )))
}

fn non_empty<T>(set: &BTreeSet<T>, what: &str) -> Result<(), CadenceError> {
    if set.is_empty() {
        return Err(CadenceError::config(format!("specify at least one {what}")));
    }
    Ok(())
}

// --- Months ---

/// Selects whole months of the year (1 = January).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthsFilter {
    months: BTreeSet<u8>,
}

impl MonthsFilter {
    pub fn new(months: impl IntoIterator<Item = u8>) -> Result<Self, CadenceError> {
        let months: BTreeSet<u8> = months.into_iter().collect();
        non_empty(&months, "month")?;
        if let Some(bad) = months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(CadenceError::config(format!("month out of range: {bad}")));
        }
        Ok(Self { months })
    }

    pub fn months(&self) -> impl Iterator<Item = u8> + '_ {
        self.months.iter().copied()
    }
}

impl Constraint for MonthsFilter {
    fn matches(&self, t: &Zoned, _period: Frequency) -> bool {
        self.months.contains(&(t.month() as u8))
    }

    fn step(&self) -> Step {
        Step::months(1)
    }

    fn next(&self, t: &Zoned, period: Frequency) -> Result<Zoned, CadenceError> {
        if self.matches(t, period) {
            return Ok(t.clone());
        }
        let current = t.month() as u8;
        let date = match self.months.range(current + 1..).next() {
            Some(&m) => Date::new(t.year(), m as i8, 1)?,
            // Non-empty by construction
            None => {
                let first = self.months.first().copied().unwrap_or(1);
                Date::new(t.year() + 1, first as i8, 1)?
            }
        };
        at_time_on_date(date, time_of_day(t), t.time_zone())
    }

    fn previous(&self, t: &Zoned, period: Frequency) -> Result<Zoned, CadenceError> {
        if self.matches(t, period) {
            return Ok(t.clone());
        }
        let current = t.month() as u8;
        let date = match self.months.range(..current).next_back() {
            Some(&m) => Date::new(t.year(), m as i8, 1)?.last_of_month(),
            None => {
                let last = self.months.last().copied().unwrap_or(12);
                Date::new(t.year() - 1, last as i8, 1)?.last_of_month()
            }
        };
        at_time_on_date(date, time_of_day(t), t.time_zone())
    }
}

// --- Weekdays ---

/// Selects weekdays, either every such day or only at ordinal positions
/// within the rule's month or year (1 = first, -1 = last).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekdaysFilter {
    weekdays: BTreeSet<Weekday>,
    ordinals: BTreeMap<Weekday, BTreeSet<i8>>,
}

/// Maximum ordinal position: a year holds at most 53 of any weekday.
const MAX_ORDINAL: i8 = 53;

impl WeekdaysFilter {
    pub fn new(
        weekdays: impl IntoIterator<Item = Weekday>,
        ordinals: impl IntoIterator<Item = (Weekday, i8)>,
    ) -> Result<Self, CadenceError> {
        let weekdays: BTreeSet<Weekday> = weekdays.into_iter().collect();
        let mut map: BTreeMap<Weekday, BTreeSet<i8>> = BTreeMap::new();
        for (day, position) in ordinals {
            if position == 0 || !(-MAX_ORDINAL..=MAX_ORDINAL).contains(&position) {
                return Err(CadenceError::config(format!(
                    "ordinal position out of range for {day}: {position}"
                )));
            }
            map.entry(day).or_default().insert(position);
        }
        if weekdays.is_empty() && map.is_empty() {
            return Err(CadenceError::config("specify at least one weekday"));
        }
        Ok(Self {
            weekdays,
            ordinals: map,
        })
    }

    /// Plain weekdays (every occurrence in the period).
    pub fn weekdays(&self) -> impl Iterator<Item = Weekday> + '_ {
        self.weekdays.iter().copied()
    }

    /// Ordinal positions per weekday.
    pub fn ordinals(&self) -> &BTreeMap<Weekday, BTreeSet<i8>> {
        &self.ordinals
    }

    pub fn has_ordinals(&self) -> bool {
        !self.ordinals.is_empty()
    }

    /// Position of `t`'s weekday within its month or year, together with the
    /// number of such weekdays in that period.
    fn ordinal_position(t: &Zoned, period: Frequency) -> Option<(i16, i16)> {
        let (start, day, last) = match period {
            Frequency::Monthly => (
                t.date().first_of_month(),
                i16::from(t.day()),
                i16::from(t.days_in_month()),
            ),
            Frequency::Yearly => (t.date().first_of_year(), t.day_of_year(), t.days_in_year()),
            Frequency::Daily | Frequency::Weekly => return None,
        };
        let wday = i16::from(t.weekday().to_sunday_zero_offset());
        let start_wday = i16::from(start.weekday().to_sunday_zero_offset());
        let first = (7 + wday - start_wday) % 7 + 1;
        let position = (day - first) / 7 + 1;
        let total = (last - first) / 7 + 1;
        Some((position, total))
    }

    fn scan_limit(&self, period: Frequency) -> i64 {
        if self.ordinals.is_empty() {
            return 7;
        }
        match period {
            Frequency::Monthly => 366,
            // Some weekdays reach a 53rd occurrence only every eleven years
            Frequency::Yearly => 366 * 12,
            Frequency::Daily | Frequency::Weekly => 7,
        }
    }
}

impl Constraint for WeekdaysFilter {
    fn matches(&self, t: &Zoned, period: Frequency) -> bool {
        let wd = Weekday::from_jiff(t.weekday());
        if self.weekdays.contains(&wd) {
            return true;
        }
        let Some(positions) = self.ordinals.get(&wd) else {
            return false;
        };
        let Some((position, total)) = Self::ordinal_position(t, period) else {
            return false;
        };
        positions.iter().any(|&p| {
            let p = i16::from(p);
            p == position || p == position - total - 1
        })
    }

    fn step(&self) -> Step {
        Step::days(1)
    }

    fn next(&self, t: &Zoned, period: Frequency) -> Result<Zoned, CadenceError> {
        scan_days(self, t, period, self.scan_limit(period), false)
    }

    fn previous(&self, t: &Zoned, period: Frequency) -> Result<Zoned, CadenceError> {
        scan_days(self, t, period, self.scan_limit(period), true)
    }
}

// --- Monthdays ---

/// Selects days of the month; negative days count from the end (-1 = last).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthdaysFilter {
    days: BTreeSet<i8>,
}

impl MonthdaysFilter {
    pub fn new(days: impl IntoIterator<Item = i8>) -> Result<Self, CadenceError> {
        let days: BTreeSet<i8> = days.into_iter().collect();
        non_empty(&days, "day of the month")?;
        if let Some(bad) = days.iter().find(|d| **d == 0 || !(-31..=31).contains(*d)) {
            return Err(CadenceError::config(format!(
                "day of the month out of range: {bad}"
            )));
        }
        Ok(Self { days })
    }

    pub fn days(&self) -> impl Iterator<Item = i8> + '_ {
        self.days.iter().copied()
    }
}

impl Constraint for MonthdaysFilter {
    fn matches(&self, t: &Zoned, _period: Frequency) -> bool {
        let day = t.day();
        let last = t.days_in_month();
        self.days.contains(&day) || self.days.contains(&(day - last - 1))
    }

    fn step(&self) -> Step {
        Step::days(1)
    }

    // A selected day can be missing from one month (the 31st after march)
    // so the scan covers two months.
    fn next(&self, t: &Zoned, period: Frequency) -> Result<Zoned, CadenceError> {
        scan_days(self, t, period, 62, false)
    }

    fn previous(&self, t: &Zoned, period: Frequency) -> Result<Zoned, CadenceError> {
        scan_days(self, t, period, 62, true)
    }
}

// --- Yeardays ---

/// Selects days of the year; negative days count from the end (-1 = Dec 31).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YeardaysFilter {
    days: BTreeSet<i16>,
}

impl YeardaysFilter {
    pub fn new(days: impl IntoIterator<Item = i16>) -> Result<Self, CadenceError> {
        let days: BTreeSet<i16> = days.into_iter().collect();
        non_empty(&days, "day of the year")?;
        if let Some(bad) = days.iter().find(|d| **d == 0 || !(-366..=366).contains(*d)) {
            return Err(CadenceError::config(format!(
                "day of the year out of range: {bad}"
            )));
        }
        Ok(Self { days })
    }

    pub fn days(&self) -> impl Iterator<Item = i16> + '_ {
        self.days.iter().copied()
    }
}

impl Constraint for YeardaysFilter {
    fn matches(&self, t: &Zoned, _period: Frequency) -> bool {
        let day = t.day_of_year();
        let last = t.days_in_year();
        self.days.contains(&day) || self.days.contains(&(day - last - 1))
    }

    fn step(&self) -> Step {
        Step::days(1)
    }

    // Day 366 only exists in leap years, which can be eight years apart
    fn next(&self, t: &Zoned, period: Frequency) -> Result<Zoned, CadenceError> {
        scan_days(self, t, period, 366 * 8, false)
    }

    fn previous(&self, t: &Zoned, period: Frequency) -> Result<Zoned, CadenceError> {
        scan_days(self, t, period, 366 * 8, true)
    }
}
