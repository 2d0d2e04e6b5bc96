//! A rule bound to a start time: the anchored sequence of occurrences and the
//! queries over it.

use jiff::{SignedDuration, Zoned};
use tracing::{debug, trace};

use crate::error::CadenceError;
use crate::rule::{Direction, Rule};
use crate::suboccurrence::Suboccurrence;

/// A rule anchored at its first occurrence.
///
/// The anchor is the requested start when it matches the rule, otherwise the
/// first matching instant after it. The count limit is counted from the
/// anchor, and every occurrence has the same `duration`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    rule: Rule,
    start_time: Zoned,
    duration: SignedDuration,
}

impl Occurrence {
    pub fn new(rule: Rule, start: Zoned) -> Result<Self, CadenceError> {
        let start_time = if rule.matches(&start, &start)? {
            start
        } else {
            let anchor = rule.next(&start, &start)?;
            debug!(requested = %start, %anchor, "start does not match rule, anchoring at next match");
            anchor
        };
        Ok(Self {
            rule,
            start_time,
            duration: SignedDuration::ZERO,
        })
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    /// The anchor: first occurrence of the sequence.
    pub fn start_time(&self) -> &Zoned {
        &self.start_time
    }

    pub fn duration(&self) -> SignedDuration {
        self.duration
    }

    pub fn set_duration(&mut self, duration: SignedDuration) {
        self.duration = duration;
    }

    /// First occurrence at or after `after`.
    pub fn next_occurrence(&self, after: &Zoned) -> Result<Option<Zoned>, CadenceError> {
        Ok(self.next_occurrences(1, after)?.into_iter().next())
    }

    /// Up to `n` occurrences at or after `after`, in order.
    pub fn next_occurrences(&self, n: usize, after: &Zoned) -> Result<Vec<Zoned>, CadenceError> {
        if self.rule.stop().is_some_and(|stop| after > stop) {
            return Ok(Vec::new());
        }
        let seed = self.seed_at_or_after(after)?;
        self.list_occurrences(seed, Direction::Forward, take(n))
    }

    /// Last occurrence strictly before `before`.
    pub fn previous_occurrence(&self, before: &Zoned) -> Result<Option<Zoned>, CadenceError> {
        Ok(self.previous_occurrences(1, before)?.pop())
    }

    /// Up to `n` occurrences strictly before `before`, in chronological order.
    pub fn previous_occurrences(
        &self,
        n: usize,
        before: &Zoned,
    ) -> Result<Vec<Zoned>, CadenceError> {
        if before <= &self.start_time {
            return Ok(Vec::new());
        }
        let before = match self.rule.stop() {
            Some(stop) if before > stop => stop,
            _ => before,
        };
        let seed = self.rule.previous(before, &self.start_time)?;
        self.list_occurrences(seed, Direction::Backward, take(n))
    }

    /// Occurrences in the half-open interval `[t1, t2)`.
    pub fn occurrences_between(&self, t1: &Zoned, t2: &Zoned) -> Result<Vec<Zoned>, CadenceError> {
        check_interval(t1, t2)?;
        if t2 <= &self.start_time || self.rule.stop().is_some_and(|stop| t1 >= stop) {
            return Ok(Vec::new());
        }
        let seed = self.seed_at_or_after(t1)?;
        self.list_occurrences(seed, Direction::Forward, |t| t < t2)
    }

    /// Every occurrence of a finite rule.
    pub fn all(&self) -> Result<Vec<Zoned>, CadenceError> {
        let seed = self.start_time.clone();
        match (self.rule.stop(), self.rule.count()) {
            (Some(stop), _) => self.list_occurrences(seed, Direction::Forward, |t| t < stop),
            (None, Some(_)) => self.list_occurrences(seed, Direction::Forward, |_| true),
            (None, None) => Err(CadenceError::query(format!(
                "rule '{}' has neither count nor stop, list a bounded interval instead",
                self.rule
            ))),
        }
    }

    /// Parts of occurrences (of length `duration`) that overlap `[t1, t2)`,
    /// clipped to the interval.
    pub fn suboccurrences_between(
        &self,
        t1: &Zoned,
        t2: &Zoned,
    ) -> Result<Vec<Suboccurrence>, CadenceError> {
        check_interval(t1, t2)?;
        let window_start = t1.checked_sub(self.duration)?;
        let interval = t1.clone()..t2.clone();
        let mut parts = Vec::new();
        for start in self.occurrences_between(&window_start, t2)? {
            let end = start.checked_add(self.duration)?;
            if let Some(part) = Suboccurrence::find(&(start..end), &interval) {
                parts.push(part);
            }
        }
        Ok(parts)
    }

    /// Lazy iterator over occurrences at or after `after`.
    pub fn iter(&self, after: &Zoned) -> Result<Occurrences<'_>, CadenceError> {
        if self.rule.stop().is_some_and(|stop| after > stop) {
            return Ok(Occurrences::empty(self));
        }
        let seed = self.seed_at_or_after(after)?;
        self.walk(seed, Direction::Forward)
    }

    /// `t` (no earlier than the anchor) when it matches, else the next match.
    fn seed_at_or_after(&self, t: &Zoned) -> Result<Zoned, CadenceError> {
        let t = if t < &self.start_time {
            self.start_time.clone()
        } else {
            t.with_time_zone(self.start_time.time_zone().clone())
        };
        if self.rule.matches(&t, &self.start_time)? {
            Ok(t)
        } else {
            self.rule.next(&t, &self.start_time)
        }
    }

    /// Collect occurrences from `from` until the life span ends or `keep`
    /// rejects one. Always returned in chronological order.
    fn list_occurrences(
        &self,
        from: Zoned,
        direction: Direction,
        mut keep: impl FnMut(&Zoned) -> bool,
    ) -> Result<Vec<Zoned>, CadenceError> {
        let mut results = Vec::new();
        for current in self.walk(from, direction)? {
            let current = current?;
            if !keep(&current) {
                break;
            }
            results.push(current);
        }
        if direction == Direction::Backward {
            results.reverse();
        }
        debug!(count = results.len(), "listed occurrences");
        Ok(results)
    }

    fn walk(&self, from: Zoned, direction: Direction) -> Result<Occurrences<'_>, CadenceError> {
        if !self.rule.matches(&from, &self.start_time)? {
            return Err(CadenceError::invariant(format!(
                "seed {from} does not match rule '{}' anchored at {}",
                self.rule, self.start_time
            )));
        }
        let (remaining, from) = self.count_budget(from, direction)?;
        Ok(Occurrences {
            occurrence: self,
            direction,
            cursor: Some(Cursor::At(from)),
            remaining,
        })
    }

    /// Occurrences left in the count limit when walking from `from`, and the
    /// instant the walk should start at.
    ///
    /// Forward, the occurrences between the anchor and `from` are replayed to
    /// learn how many are used up. Backward, a seed beyond the last counted
    /// occurrence is pulled back onto it.
    fn count_budget(
        &self,
        from: Zoned,
        direction: Direction,
    ) -> Result<(Option<i64>, Zoned), CadenceError> {
        let Some(count) = self.rule.count() else {
            return Ok((None, from));
        };
        let count = i64::from(count);
        let mut current = self.start_time.clone();
        match direction {
            Direction::Forward => {
                let mut elapsed = 0;
                while current < from {
                    if elapsed >= count {
                        break;
                    }
                    elapsed += 1;
                    current = self.rule.next(&current, &self.start_time)?;
                }
                trace!(elapsed, count, "replayed count from anchor");
                Ok((Some(count - elapsed), current))
            }
            Direction::Backward => {
                if from < current {
                    return Ok((Some(count), from));
                }
                let mut seen = 0;
                while current < from {
                    seen += 1;
                    if seen >= count {
                        break;
                    }
                    current = self.rule.next(&current, &self.start_time)?;
                }
                trace!(seen, count, "clamped backward seed to count");
                Ok((Some(count), current))
            }
        }
    }

    /// Inside the life span: not before the anchor and before the stop time.
    fn within_life_span(&self, t: &Zoned) -> bool {
        t >= &self.start_time && self.rule.stop().map_or(true, |stop| t < stop)
    }
}

fn check_interval(t1: &Zoned, t2: &Zoned) -> Result<(), CadenceError> {
    if t2 <= t1 {
        return Err(CadenceError::query(format!(
            "empty time interval: {t1} .. {t2}"
        )));
    }
    Ok(())
}

/// Predicate accepting the first `n` instants it sees.
fn take(n: usize) -> impl FnMut(&Zoned) -> bool {
    let mut left = n;
    move |_| {
        if left == 0 {
            return false;
        }
        left -= 1;
        true
    }
}

#[derive(Debug, Clone)]
enum Cursor {
    /// Yield this instant next.
    At(Zoned),
    /// This instant was yielded; step from it.
    After(Zoned),
}

/// Lazy iterator over the occurrences of an [`Occurrence`].
///
/// Stops at the end of the life span (anchor, stop time, count) and after the
/// first error.
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    occurrence: &'a Occurrence,
    direction: Direction,
    cursor: Option<Cursor>,
    remaining: Option<i64>,
}

impl<'a> Occurrences<'a> {
    fn empty(occurrence: &'a Occurrence) -> Self {
        Self {
            occurrence,
            direction: Direction::Forward,
            cursor: None,
            remaining: None,
        }
    }
}

impl Iterator for Occurrences<'_> {
    type Item = Result<Zoned, CadenceError>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = match self.cursor.take()? {
            Cursor::At(t) => t,
            Cursor::After(t) => {
                if self.remaining.is_some_and(|remaining| remaining <= 0) {
                    return None;
                }
                let Occurrence {
                    rule, start_time, ..
                } = self.occurrence;
                let stepped = match self.direction {
                    Direction::Forward => rule.next(&t, start_time),
                    Direction::Backward => rule.previous(&t, start_time),
                };
                match stepped {
                    Ok(next) => next,
                    Err(e) => return Some(Err(e)),
                }
            }
        };
        if !self.occurrence.within_life_span(&current) {
            return None;
        }
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining <= 0 {
                return None;
            }
            *remaining -= 1;
        }
        self.cursor = Some(Cursor::After(current.clone()));
        Some(Ok(current))
    }
}
