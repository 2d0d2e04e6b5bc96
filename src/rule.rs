//! Recurrence rules: a frequency, an interval, optional filters and optional
//! limits (count or stop time).
//!
//! A rule does not carry its own anchor. Every query takes the `base` instant
//! the rule is anchored at; the interval is counted in periods from the base,
//! and the base's wall-clock time, weekday, day and month fill in whatever
//! the filters leave open.
//!
//! All computation happens in the base's time zone. Query instants in other
//! zones are converted first.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;

use jiff::civil::{Date, Time};
use jiff::{Span, Zoned};
use tracing::trace;

use crate::calendar::{
    at_time_on_date, days_between, monday_of, months_between, time_of_day, Weekday, END_OF_DAY,
};
use crate::error::CadenceError;
use crate::filter::{Constraint, Filter, FilterKind};

/// Upper bound on steps taken while searching for the next (or previous)
/// matching instant. Unsatisfiable rules end here with
/// [`CadenceError::Exhausted`].
const MAX_SEARCH_STEPS: usize = 1000;

/// Largest ordinal position allowed for weekdays of a monthly rule.
const MAX_MONTHLY_ORDINAL: i8 = 5;

/// Recurrence frequency, i.e. the unit the interval counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Singular unit name ("day", "week", ...).
    pub fn unit_name(self) -> &'static str {
        match self {
            Self::Daily => "day",
            Self::Weekly => "week",
            Self::Monthly => "month",
            Self::Yearly => "year",
        }
    }

    /// Average length in seconds, used only to order steps.
    fn approx_seconds(self) -> i64 {
        match self {
            Self::Daily => 86_400,
            Self::Weekly => 604_800,
            Self::Monthly => 2_629_746,
            Self::Yearly => 31_556_952,
        }
    }
}

impl FromStr for Frequency {
    type Err = CadenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            "yearly" | "year" => Ok(Self::Yearly),
            _ => Err(CadenceError::config(format!("unknown frequency: {s}"))),
        }
    }
}

/// A calendar step: `count` units of a frequency.
///
/// Steps are ordered by approximate length so the smallest one among a rule
/// and its filters can be picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Step {
    pub count: i64,
    pub unit: Frequency,
}

impl Step {
    pub fn days(count: i64) -> Self {
        Self {
            count,
            unit: Frequency::Daily,
        }
    }

    pub fn months(count: i64) -> Self {
        Self {
            count,
            unit: Frequency::Monthly,
        }
    }

    pub fn to_span(self) -> Result<Span, CadenceError> {
        let span = Span::new();
        let span = match self.unit {
            Frequency::Daily => span.try_days(self.count)?,
            Frequency::Weekly => span.try_weeks(self.count)?,
            Frequency::Monthly => span.try_months(self.count)?,
            Frequency::Yearly => span.try_years(self.count)?,
        };
        Ok(span)
    }

    /// Move `t` by this step, keeping the wall-clock time.
    pub(crate) fn apply(self, t: &Zoned, direction: Direction) -> Result<Zoned, CadenceError> {
        let span = self.to_span()?;
        let moved = match direction {
            Direction::Forward => t.checked_add(span)?,
            Direction::Backward => t.checked_sub(span)?,
        };
        Ok(moved)
    }

    fn approx_seconds(self) -> i64 {
        self.count.saturating_mul(self.unit.approx_seconds())
    }
}

impl PartialOrd for Step {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Step {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.approx_seconds(), self.unit, self.count).cmp(&(
            other.approx_seconds(),
            other.unit,
            other.count,
        ))
    }
}

/// Direction of a search or walk through time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn word(self) -> &'static str {
        match self {
            Self::Forward => "after",
            Self::Backward => "before",
        }
    }
}

/// A recurrence rule.
///
/// Build one with a frequency constructor and chain filters and limits:
///
/// ```
/// use cadence::{Rule, Weekday};
///
/// let rule = Rule::monthly(1)?
///     .ordinal_weekdays([(Weekday::Friday, 1)])?
///     .with_count(10);
/// assert_eq!(rule.to_string(), "every month on the 1st fri for 10 occurrences");
/// # Ok::<(), cadence::CadenceError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    frequency: Frequency,
    interval: u32,
    filters: BTreeMap<FilterKind, Filter>,
    count: Option<u32>,
    stop: Option<Zoned>,
}

impl Rule {
    pub fn new(frequency: Frequency, interval: u32) -> Result<Self, CadenceError> {
        if interval == 0 {
            return Err(CadenceError::config("interval must be at least 1"));
        }
        Ok(Self {
            frequency,
            interval,
            filters: BTreeMap::new(),
            count: None,
            stop: None,
        })
    }

    pub fn daily(interval: u32) -> Result<Self, CadenceError> {
        Self::new(Frequency::Daily, interval)
    }

    pub fn weekly(interval: u32) -> Result<Self, CadenceError> {
        Self::new(Frequency::Weekly, interval)
    }

    pub fn monthly(interval: u32) -> Result<Self, CadenceError> {
        Self::new(Frequency::Monthly, interval)
    }

    pub fn yearly(interval: u32) -> Result<Self, CadenceError> {
        Self::new(Frequency::Yearly, interval)
    }

    /// Limit the rule to `count` occurrences, counted from the base.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Produce no occurrences at or after `stop`.
    pub fn with_stop(mut self, stop: Zoned) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Add a filter. Each kind may be set once.
    pub fn with_filter(mut self, filter: Filter) -> Result<Self, CadenceError> {
        let kind = filter.kind();
        if self.filters.contains_key(&kind) {
            return Err(CadenceError::config(format!(
                "{} filter is already set",
                kind.as_str()
            )));
        }
        if let Filter::Weekdays(weekdays) = &filter {
            if weekdays.has_ordinals() {
                self.check_ordinals(weekdays.ordinals().values().flatten().copied())?;
            }
        }
        self.filters.insert(kind, filter);
        Ok(self)
    }

    pub fn months(self, months: impl IntoIterator<Item = u8>) -> Result<Self, CadenceError> {
        self.with_filter(Filter::months(months)?)
    }

    pub fn weekdays(self, weekdays: impl IntoIterator<Item = Weekday>) -> Result<Self, CadenceError> {
        self.with_filter(Filter::weekdays(weekdays)?)
    }

    /// Weekdays at ordinal positions within the month (monthly rules) or the
    /// year (yearly rules). Negative positions count from the end.
    pub fn ordinal_weekdays(
        self,
        ordinals: impl IntoIterator<Item = (Weekday, i8)>,
    ) -> Result<Self, CadenceError> {
        self.with_filter(Filter::weekdays_with_ordinals([], ordinals)?)
    }

    pub fn monthdays(self, days: impl IntoIterator<Item = i8>) -> Result<Self, CadenceError> {
        self.with_filter(Filter::monthdays(days)?)
    }

    pub fn yeardays(self, days: impl IntoIterator<Item = i16>) -> Result<Self, CadenceError> {
        self.with_filter(Filter::yeardays(days)?)
    }

    fn check_ordinals(&self, positions: impl Iterator<Item = i8>) -> Result<(), CadenceError> {
        match self.frequency {
            Frequency::Daily | Frequency::Weekly => Err(CadenceError::config(format!(
                "ordinal weekdays need a monthly or yearly rule, not {}",
                self.frequency.as_str()
            ))),
            Frequency::Monthly => {
                for p in positions {
                    if !(-MAX_MONTHLY_ORDINAL..=MAX_MONTHLY_ORDINAL).contains(&p) {
                        return Err(CadenceError::config(format!(
                            "a month has at most {MAX_MONTHLY_ORDINAL} of any weekday, got position {p}"
                        )));
                    }
                }
                Ok(())
            }
            Frequency::Yearly => Ok(()),
        }
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn count(&self) -> Option<u32> {
        self.count
    }

    pub fn stop(&self) -> Option<&Zoned> {
        self.stop.as_ref()
    }

    pub fn filter(&self, kind: FilterKind) -> Option<&Filter> {
        self.filters.get(&kind)
    }

    /// Filters in kind order.
    pub fn filters(&self) -> impl Iterator<Item = &Filter> + '_ {
        self.filters.values()
    }

    /// The rule's own step: `interval` units of its frequency.
    pub fn step(&self) -> Step {
        Step {
            count: i64::from(self.interval),
            unit: self.frequency,
        }
    }

    /// True if the rule has neither a count nor a stop time.
    pub fn is_infinite(&self) -> bool {
        self.count.is_none() && self.stop.is_none()
    }

    pub fn is_finite(&self) -> bool {
        !self.is_infinite()
    }

    /// True if `t` lies on the rule's grid anchored at `base` and passes every
    /// filter. Count and stop limits are not considered here.
    pub fn matches(&self, t: &Zoned, base: &Zoned) -> Result<bool, CadenceError> {
        let t = t.with_time_zone(base.time_zone().clone());
        if !self.aligned(&t, base)? {
            return Ok(false);
        }
        Ok(self
            .filters
            .values()
            .all(|filter| filter.matches(&t, self.frequency)))
    }

    /// True if `t` is a whole number of intervals from `base` and carries the
    /// base's time of day, plus the base's weekday, day or month wherever no
    /// filter takes over that role.
    pub fn aligned(&self, t: &Zoned, base: &Zoned) -> Result<bool, CadenceError> {
        let t = t.with_time_zone(base.time_zone().clone());
        let periods = self.periods_between(t.date(), base.date())?;
        if periods.rem_euclid(i64::from(self.interval)) != 0 {
            return Ok(false);
        }
        if time_of_day(&t) != time_of_day(base) {
            return Ok(false);
        }
        let day_ok = self.overrides_day() || t.day() == base.day();
        let aligned = match self.frequency {
            Frequency::Daily => true,
            Frequency::Weekly => self.overrides_day() || t.weekday() == base.weekday(),
            Frequency::Monthly => day_ok,
            Frequency::Yearly => day_ok && (self.overrides_month() || t.month() == base.month()),
        };
        Ok(aligned)
    }

    /// First matching instant strictly after `t`.
    pub fn next(&self, t: &Zoned, base: &Zoned) -> Result<Zoned, CadenceError> {
        self.search(t, base, Direction::Forward)
    }

    /// Last matching instant strictly before `t`.
    pub fn previous(&self, t: &Zoned, base: &Zoned) -> Result<Zoned, CadenceError> {
        self.search(t, base, Direction::Backward)
    }

    fn search(&self, t: &Zoned, base: &Zoned, direction: Direction) -> Result<Zoned, CadenceError> {
        let origin = t.with_time_zone(base.time_zone().clone());
        let min_step = self.min_step();
        let mut current = origin.clone();
        for _ in 0..MAX_SEARCH_STEPS {
            let beyond = match direction {
                Direction::Forward => current > origin,
                Direction::Backward => current < origin,
            };
            if beyond && self.matches(&current, base)? {
                return Ok(current);
            }
            let potential = self.potential(&current, base, direction)?;
            let mut candidate = self.align(&potential, base, direction)?;
            if candidate == current {
                candidate = min_step.apply(&candidate, direction)?;
            }
            trace!(%candidate, direction = direction.word(), "search step");
            current = candidate;
        }
        Err(CadenceError::exhausted(format!(
            "no occurrence of '{self}' {} {origin} within {MAX_SEARCH_STEPS} steps",
            direction.word()
        )))
    }

    /// Smallest step among the rule and its filters.
    fn min_step(&self) -> Step {
        self.filters
            .values()
            .map(|filter| filter.step())
            .fold(self.step(), Step::min)
    }

    /// Furthest filter bound from `current`, then moved onto a period that is
    /// a whole number of intervals from the base.
    fn potential(
        &self,
        current: &Zoned,
        base: &Zoned,
        direction: Direction,
    ) -> Result<Zoned, CadenceError> {
        let mut candidate = current.clone();
        for filter in self.filters.values() {
            let bound = match direction {
                Direction::Forward => filter.next(current, self.frequency)?,
                Direction::Backward => filter.previous(current, self.frequency)?,
            };
            let further = match direction {
                Direction::Forward => bound > candidate,
                Direction::Backward => bound < candidate,
            };
            if further {
                candidate = bound;
            }
        }

        let interval = i64::from(self.interval);
        let rem = self
            .periods_between(candidate.date(), base.date())?
            .rem_euclid(interval);
        if rem == 0 {
            return Ok(candidate);
        }
        let (date, time) = match direction {
            Direction::Forward => (self.period_start(candidate.date(), rem)?, Time::midnight()),
            Direction::Backward => (
                self.period_end(candidate.date(), rem - interval)?,
                END_OF_DAY,
            ),
        };
        at_time_on_date(date, time, base.time_zone())
    }

    /// Signed number of whole periods from `t` to `base`.
    fn periods_between(&self, t: Date, base: Date) -> Result<i64, CadenceError> {
        Ok(match self.frequency {
            Frequency::Daily => days_between(t, base)?,
            Frequency::Weekly => days_between(monday_of(t)?, monday_of(base)?)? / 7,
            Frequency::Monthly => months_between(t, base),
            Frequency::Yearly => i64::from(base.year()) - i64::from(t.year()),
        })
    }

    fn shift(&self, date: Date, periods: i64) -> Result<Date, CadenceError> {
        let span = Step {
            count: periods,
            unit: self.frequency,
        }
        .to_span()?;
        Ok(date.checked_add(span)?)
    }

    /// First day of the period `periods` away from the one holding `date`.
    fn period_start(&self, date: Date, periods: i64) -> Result<Date, CadenceError> {
        let shifted = self.shift(date, periods)?;
        Ok(match self.frequency {
            Frequency::Daily => shifted,
            Frequency::Weekly => monday_of(shifted)?,
            Frequency::Monthly => shifted.first_of_month(),
            Frequency::Yearly => shifted.first_of_year(),
        })
    }

    /// Last day of the period `periods` away from the one holding `date`.
    fn period_end(&self, date: Date, periods: i64) -> Result<Date, CadenceError> {
        let shifted = self.shift(date, periods)?;
        Ok(match self.frequency {
            Frequency::Daily => shifted,
            Frequency::Weekly => monday_of(shifted)?.checked_add(Span::new().days(6))?,
            Frequency::Monthly => shifted.last_of_month(),
            Frequency::Yearly => shifted.last_of_year(),
        })
    }

    /// Put `t` on the base's time of day and, unless a filter decides them,
    /// on the base's weekday, day of month and month.
    ///
    /// When the resulting date does not exist (the 31st of a short month,
    /// February 29th outside leap years) the search continues from the first
    /// day of the next month going forward, or the last day of the previous
    /// month going backward.
    fn align(&self, t: &Zoned, base: &Zoned, direction: Direction) -> Result<Zoned, CadenceError> {
        let date = t.date();
        let target = match self.frequency {
            Frequency::Daily => Ok(date),
            Frequency::Weekly => {
                if self.overrides_day() || date.weekday() == base.weekday() {
                    Ok(date)
                } else {
                    let offset = i64::from(base.weekday().to_monday_zero_offset());
                    Ok(monday_of(date)?.checked_add(Span::new().days(offset))?)
                }
            }
            Frequency::Monthly => {
                if self.overrides_day() {
                    Ok(date)
                } else {
                    Self::existing_date(date.year(), date.month(), base.day())
                }
            }
            Frequency::Yearly => {
                let day = if self.overrides_day() { date.day() } else { base.day() };
                let month = if self.overrides_month() {
                    date.month()
                } else {
                    base.month()
                };
                Self::existing_date(date.year(), month, day)
            }
        };
        let date = match target {
            Ok(date) => date,
            Err((year, month)) => {
                let first = Date::new(year, month, 1)?;
                match direction {
                    Direction::Forward => first.last_of_month().tomorrow()?,
                    Direction::Backward => first.yesterday()?,
                }
            }
        };
        at_time_on_date(date, time_of_day(base), base.time_zone())
    }

    /// The date, or the year and month it is missing from.
    fn existing_date(year: i16, month: i8, day: i8) -> Result<Date, (i16, i8)> {
        Date::new(year, month, day).map_err(|_| (year, month))
    }

    /// A weekday, day-of-month or day-of-year filter picks the day.
    fn overrides_day(&self) -> bool {
        self.filters.contains_key(&FilterKind::Weekdays)
            || self.filters.contains_key(&FilterKind::Monthdays)
            || self.filters.contains_key(&FilterKind::Yeardays)
    }

    /// A weekday, day-of-year or month filter picks the month.
    fn overrides_month(&self) -> bool {
        self.filters.contains_key(&FilterKind::Weekdays)
            || self.filters.contains_key(&FilterKind::Yeardays)
            || self.filters.contains_key(&FilterKind::Months)
    }
}
