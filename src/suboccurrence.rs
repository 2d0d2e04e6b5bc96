use std::ops::Range;

use jiff::Zoned;

/// The part of one occurrence that falls inside a query interval.
///
/// `occurrence_start` and `occurrence_end` tell whether the occurrence's own
/// boundaries were kept or the interval cut it short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suboccurrence {
    pub start: Zoned,
    pub end: Zoned,
    pub occurrence_start: bool,
    pub occurrence_end: bool,
}

impl Suboccurrence {
    /// Clip `occurrence` to `interval`, or `None` if they do not overlap.
    /// Both ranges are half-open.
    pub fn find(occurrence: &Range<Zoned>, interval: &Range<Zoned>) -> Option<Self> {
        if occurrence.end <= interval.start || occurrence.start >= interval.end {
            return None;
        }
        let (start, occurrence_start) = if occurrence.start < interval.start {
            (interval.start.clone(), false)
        } else {
            (occurrence.start.clone(), true)
        };
        let (end, occurrence_end) = if occurrence.end > interval.end {
            (interval.end.clone(), false)
        } else {
            (occurrence.end.clone(), true)
        };
        Some(Self {
            start,
            end,
            occurrence_start,
            occurrence_end,
        })
    }

    pub fn duration(&self) -> jiff::SignedDuration {
        self.start.duration_until(&self.end)
    }
}
