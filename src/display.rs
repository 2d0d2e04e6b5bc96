use std::fmt;

use crate::calendar::month_abbrev;
use crate::filter::Filter;
use crate::rule::Rule;

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.frequency().unit_name();
        if self.interval() == 1 {
            write!(f, "every {unit}")?;
        } else {
            write!(f, "every {} {unit}s", self.interval())?;
        }

        for filter in self.filters() {
            write!(f, " {filter}")?;
        }

        if let Some(count) = self.count() {
            let noun = if count == 1 { "occurrence" } else { "occurrences" };
            write!(f, " for {count} {noun}")?;
        }

        if let Some(stop) = self.stop() {
            write!(f, " until {stop}")?;
        }

        Ok(())
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Months(months) => {
                let names: Vec<&str> = months.months().filter_map(month_abbrev).collect();
                write!(f, "in {}", names.join(", "))
            }
            Filter::Weekdays(weekdays) => {
                let mut parts: Vec<String> =
                    weekdays.weekdays().map(|wd| wd.short().to_string()).collect();
                for (wd, positions) in weekdays.ordinals() {
                    for p in start_then_end(positions.iter().map(|&p| i16::from(p))) {
                        parts.push(format!("the {} {}", ordinal(p), wd.short()));
                    }
                }
                write!(f, "on {}", parts.join(", "))
            }
            Filter::Monthdays(days) => {
                let parts: Vec<String> = start_then_end(days.days().map(i16::from))
                    .into_iter()
                    .map(ordinal)
                    .collect();
                write!(f, "on the {} day of the month", parts.join(", "))
            }
            Filter::Yeardays(days) => {
                let parts: Vec<String> =
                    start_then_end(days.days()).into_iter().map(ordinal).collect();
                write!(f, "on the {} day of the year", parts.join(", "))
            }
        }
    }
}

/// Positions counted from the start of the period, then those counted from
/// its end (`2nd to last` before `last`).
fn start_then_end(positions: impl IntoIterator<Item = i16>) -> Vec<i16> {
    let mut positions: Vec<i16> = positions.into_iter().collect();
    positions.sort_unstable_by_key(|&p| (p < 0, p));
    positions
}

/// "1st", "22nd", "last", "3rd to last".
fn ordinal(n: i16) -> String {
    match n {
        -1 => "last".to_string(),
        n if n < 0 => format!("{} to last", ordinal(-n)),
        n => format!("{n}{}", ordinal_suffix(n.unsigned_abs())),
    }
}

fn ordinal_suffix(n: u16) -> &'static str {
    match n % 100 {
        11..=13 => "th",
        _ => match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    }
}
