//! A start time with an optional end time and an optional rule.
//!
//! Without a rule the schedule is a single event at its start time. With a
//! rule every occurrence lasts as long as the span from start to end.

use jiff::{SignedDuration, Zoned};

use crate::error::CadenceError;
use crate::occurrence::Occurrence;
use crate::rule::Rule;
use crate::suboccurrence::Suboccurrence;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    start_time: Zoned,
    end_time: Option<Zoned>,
    occurrence: Option<Occurrence>,
}

impl Schedule {
    /// With a rule the start time moves to the first occurrence.
    pub fn new(start_time: Zoned, rule: Option<Rule>) -> Result<Self, CadenceError> {
        let occurrence = rule
            .map(|rule| Occurrence::new(rule, start_time.clone()))
            .transpose()?;
        let start_time = match &occurrence {
            Some(occurrence) => occurrence.start_time().clone(),
            None => start_time,
        };
        Ok(Self {
            start_time,
            end_time: None,
            occurrence,
        })
    }

    /// A schedule for one event.
    pub fn single(start_time: Zoned) -> Self {
        Self {
            start_time,
            end_time: None,
            occurrence: None,
        }
    }

    pub fn start_time(&self) -> &Zoned {
        &self.start_time
    }

    pub fn end_time(&self) -> Option<&Zoned> {
        self.end_time.as_ref()
    }

    pub fn rule(&self) -> Option<&Rule> {
        self.occurrence.as_ref().map(Occurrence::rule)
    }

    pub fn occurrence(&self) -> Option<&Occurrence> {
        self.occurrence.as_ref()
    }

    /// Length of every occurrence: end time minus start time, or zero.
    pub fn duration(&self) -> SignedDuration {
        self.end_time
            .as_ref()
            .map_or(SignedDuration::ZERO, |end| self.start_time.duration_until(end))
    }

    pub fn set_end_time(&mut self, end_time: Zoned) -> Result<(), CadenceError> {
        if end_time < self.start_time {
            return Err(CadenceError::query(format!(
                "end time {end_time} is before start time {}",
                self.start_time
            )));
        }
        self.end_time = Some(end_time);
        let duration = self.duration();
        if let Some(occurrence) = self.occurrence.as_mut() {
            occurrence.set_duration(duration);
        }
        Ok(())
    }

    /// Replace the rule, anchoring it at the schedule's start time.
    pub fn set_rule(&mut self, rule: Option<Rule>) -> Result<(), CadenceError> {
        let duration = self.duration();
        self.occurrence = match rule {
            Some(rule) => {
                let mut occurrence = Occurrence::new(rule, self.start_time.clone())?;
                occurrence.set_duration(duration);
                Some(occurrence)
            }
            None => None,
        };
        Ok(())
    }

    /// The first `n` occurrences.
    pub fn first(&self, n: usize) -> Result<Vec<Zoned>, CadenceError> {
        match &self.occurrence {
            Some(occurrence) => occurrence.next_occurrences(n, &self.start_time),
            None => Ok(std::iter::once(self.start_time.clone()).take(n).collect()),
        }
    }

    pub fn next_occurrence(&self, after: &Zoned) -> Result<Option<Zoned>, CadenceError> {
        match &self.occurrence {
            Some(occurrence) => occurrence.next_occurrence(after),
            None => Ok((&self.start_time >= after).then(|| self.start_time.clone())),
        }
    }

    pub fn next_occurrences(&self, n: usize, after: &Zoned) -> Result<Vec<Zoned>, CadenceError> {
        match &self.occurrence {
            Some(occurrence) => occurrence.next_occurrences(n, after),
            None => Ok(self.next_occurrence(after)?.into_iter().take(n).collect()),
        }
    }

    pub fn previous_occurrence(&self, before: &Zoned) -> Result<Option<Zoned>, CadenceError> {
        match &self.occurrence {
            Some(occurrence) => occurrence.previous_occurrence(before),
            None => Ok((&self.start_time < before).then(|| self.start_time.clone())),
        }
    }

    pub fn previous_occurrences(
        &self,
        n: usize,
        before: &Zoned,
    ) -> Result<Vec<Zoned>, CadenceError> {
        match &self.occurrence {
            Some(occurrence) => occurrence.previous_occurrences(n, before),
            None => Ok(self.previous_occurrence(before)?.into_iter().take(n).collect()),
        }
    }

    /// Occurrences from the start time up to `end` (exclusive), or all of them
    /// when `end` is `None` and the rule is finite.
    pub fn occurrences(&self, end: Option<&Zoned>) -> Result<Vec<Zoned>, CadenceError> {
        match (end, &self.occurrence) {
            (Some(end), _) if end <= &self.start_time => Ok(Vec::new()),
            (Some(end), Some(occurrence)) => occurrence.occurrences_between(&self.start_time, end),
            (Some(_), None) | (None, None) => Ok(vec![self.start_time.clone()]),
            (None, Some(occurrence)) => occurrence.all(),
        }
    }

    /// Occurrences in `[t1, t2)`.
    pub fn occurrences_between(&self, t1: &Zoned, t2: &Zoned) -> Result<Vec<Zoned>, CadenceError> {
        match &self.occurrence {
            Some(occurrence) => occurrence.occurrences_between(t1, t2),
            None => {
                if t2 <= t1 {
                    return Err(CadenceError::query(format!(
                        "empty time interval: {t1} .. {t2}"
                    )));
                }
                let inside = &self.start_time >= t1 && &self.start_time < t2;
                Ok(inside.then(|| self.start_time.clone()).into_iter().collect())
            }
        }
    }

    /// Parts of occurrences overlapping `[t1, t2)`. Needs an end time.
    pub fn suboccurrences_between(
        &self,
        t1: &Zoned,
        t2: &Zoned,
    ) -> Result<Vec<Suboccurrence>, CadenceError> {
        let Some(end_time) = &self.end_time else {
            return Err(CadenceError::query(
                "suboccurrences need a schedule with an end time",
            ));
        };
        match &self.occurrence {
            Some(occurrence) => occurrence.suboccurrences_between(t1, t2),
            None => {
                if t2 <= t1 {
                    return Err(CadenceError::query(format!(
                        "empty time interval: {t1} .. {t2}"
                    )));
                }
                let part = Suboccurrence::find(
                    &(self.start_time.clone()..end_time.clone()),
                    &(t1.clone()..t2.clone()),
                );
                Ok(part.into_iter().collect())
            }
        }
    }
}
