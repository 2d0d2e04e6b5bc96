//! JSON form of rules and schedules.
//!
//! ```json
//! {"freq": "monthly", "interval": 1, "count": 10,
//!  "weekdays": [2, {"fr": [1, -1]}], "months": [1, 6]}
//! ```
//!
//! Plain weekdays are numbers (sunday = 0) and an ordinal map, keyed by
//! two-letter weekday codes, may follow as the last element. Decoding also
//! accepts weekday and month names. `stop` (and a schedule's `start` and
//! `end`) are zoned datetimes such as `2011-11-01T09:00:00-04:00[America/New_York]`
//! or RFC 3339 timestamps such as `2011-11-01T13:00:00Z`.

use std::collections::BTreeMap;

use jiff::Zoned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::calendar::{parse_instant, parse_month, parse_weekday, Weekday};
use crate::error::CadenceError;
use crate::filter::{Filter, FilterKind, WeekdaysFilter};
use crate::rule::{Frequency, Rule};
use crate::schedule::Schedule;

impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("freq", self.frequency().as_str())?;
        map.serialize_entry("interval", &self.interval())?;
        if let Some(count) = self.count() {
            map.serialize_entry("count", &count)?;
        }
        if let Some(stop) = self.stop() {
            map.serialize_entry("stop", &stop.to_string())?;
        }
        for filter in self.filters() {
            match filter {
                Filter::Months(f) => {
                    map.serialize_entry("months", &f.months().collect::<Vec<_>>())?
                }
                Filter::Weekdays(f) => map.serialize_entry("weekdays", &weekdays_to_json(f))?,
                Filter::Monthdays(f) => {
                    map.serialize_entry("monthdays", &f.days().collect::<Vec<_>>())?
                }
                Filter::Yeardays(f) => {
                    map.serialize_entry("yeardays", &f.days().collect::<Vec<_>>())?
                }
            }
        }
        map.end()
    }
}

fn weekdays_to_json(filter: &WeekdaysFilter) -> Value {
    let mut entries: Vec<Value> = filter
        .weekdays()
        .map(|wd| serde_json::json!(wd.number()))
        .collect();
    if filter.has_ordinals() {
        let ordinals: serde_json::Map<String, Value> = filter
            .ordinals()
            .iter()
            .map(|(wd, positions)| {
                (
                    wd.code().to_string(),
                    serde_json::json!(positions.iter().collect::<Vec<_>>()),
                )
            })
            .collect();
        entries.push(Value::Object(ordinals));
    }
    Value::Array(entries)
}

/// Raw shape of a rule as found in JSON, before validation.
#[derive(Debug, Deserialize)]
struct RuleRepr {
    freq: Option<String>,
    interval: Option<u32>,
    count: Option<u32>,
    stop: Option<String>,
    weekdays: Option<Vec<WeekdayEntry>>,
    monthdays: Option<Vec<i8>>,
    yeardays: Option<Vec<i16>>,
    months: Option<Vec<MonthEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WeekdayEntry {
    Number(u8),
    Name(String),
    Ordinals(BTreeMap<String, OneOrMany>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(i8),
    Many(Vec<i8>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<i8> {
        match self {
            Self::One(p) => vec![p],
            Self::Many(ps) => ps,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MonthEntry {
    Number(u8),
    Name(String),
}

impl RuleRepr {
    fn has_rule(&self) -> bool {
        self.freq.is_some() || self.interval.is_some()
    }
}

impl TryFrom<RuleRepr> for Rule {
    type Error = CadenceError;

    fn try_from(repr: RuleRepr) -> Result<Self, Self::Error> {
        let freq = repr
            .freq
            .ok_or_else(|| CadenceError::serialization("missing required key `freq`"))?;
        let frequency: Frequency = freq
            .parse()
            .map_err(|_| CadenceError::serialization(format!("unknown frequency: {freq}")))?;
        let interval = repr
            .interval
            .ok_or_else(|| CadenceError::serialization("missing required key `interval`"))?;

        let mut rule = Rule::new(frequency, interval)?;
        if let Some(count) = repr.count {
            rule = rule.with_count(count);
        }
        if let Some(stop) = repr.stop {
            rule = rule.with_stop(parse_zoned("stop", &stop)?);
        }
        if let Some(entries) = repr.weekdays {
            rule = rule.with_filter(decode_weekdays(entries)?)?;
        }
        if let Some(days) = repr.monthdays {
            rule = rule.with_filter(Filter::monthdays(days)?)?;
        }
        if let Some(days) = repr.yeardays {
            rule = rule.with_filter(Filter::yeardays(days)?)?;
        }
        if let Some(entries) = repr.months {
            let months = entries
                .into_iter()
                .map(|entry| match entry {
                    MonthEntry::Number(m) => Ok(m),
                    MonthEntry::Name(name) => parse_month(&name).ok_or_else(|| {
                        CadenceError::serialization(format!("unknown month: {name}"))
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?;
            rule = rule.with_filter(Filter::months(months)?)?;
        }
        Ok(rule)
    }
}

fn decode_weekdays(entries: Vec<WeekdayEntry>) -> Result<Filter, CadenceError> {
    let last = entries.len().saturating_sub(1);
    let mut plain = Vec::new();
    let mut ordinals = Vec::new();
    for (i, entry) in entries.into_iter().enumerate() {
        match entry {
            WeekdayEntry::Number(n) => plain.push(weekday_from_number(n)?),
            WeekdayEntry::Name(name) => plain.push(weekday_from_name(&name)?),
            WeekdayEntry::Ordinals(map) if i == last => {
                for (key, positions) in map {
                    let wd = match key.parse::<u8>() {
                        Ok(n) => weekday_from_number(n)?,
                        Err(_) => weekday_from_name(&key)?,
                    };
                    ordinals.extend(positions.into_vec().into_iter().map(|p| (wd, p)));
                }
            }
            WeekdayEntry::Ordinals(_) => {
                return Err(CadenceError::serialization(
                    "the ordinal weekday map must be the last entry of `weekdays`",
                ))
            }
        }
    }
    Filter::weekdays_with_ordinals(plain, ordinals)
}

fn weekday_from_number(n: u8) -> Result<Weekday, CadenceError> {
    Weekday::from_number(n)
        .ok_or_else(|| CadenceError::serialization(format!("weekday number out of range: {n}")))
}

fn weekday_from_name(name: &str) -> Result<Weekday, CadenceError> {
    parse_weekday(name)
        .ok_or_else(|| CadenceError::serialization(format!("unknown weekday: {name}")))
}

fn parse_zoned(key: &str, value: &str) -> Result<Zoned, CadenceError> {
    parse_instant(value)
        .map_err(|e| CadenceError::serialization(format!("invalid `{key}` time {value:?}: {e}")))
}

impl<'de> Deserialize<'de> for Rule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = RuleRepr::deserialize(deserializer)?;
        Rule::try_from(repr).map_err(serde::de::Error::custom)
    }
}

impl Rule {
    pub fn to_json(&self) -> Result<String, CadenceError> {
        serde_json::to_string(self).map_err(|e| CadenceError::serialization(e.to_string()))
    }

    /// Decode a rule. Configuration problems surface as
    /// [`CadenceError::Config`], malformed JSON as
    /// [`CadenceError::Serialization`].
    pub fn from_json(json: &str) -> Result<Self, CadenceError> {
        let repr: RuleRepr = serde_json::from_str(json)
            .map_err(|e| CadenceError::serialization(format!("invalid rule JSON: {e}")))?;
        Rule::try_from(repr)
    }
}

#[derive(Debug, Deserialize)]
struct ScheduleRepr {
    start: Option<String>,
    end: Option<String>,
    #[serde(flatten)]
    rule: RuleRepr,
}

impl Schedule {
    /// The rule's keys (if any) plus `start` and `end`.
    pub fn to_value(&self) -> Result<Value, CadenceError> {
        let mut value = match self.rule() {
            Some(rule) => serde_json::to_value(rule)
                .map_err(|e| CadenceError::serialization(e.to_string()))?,
            None => Value::Object(serde_json::Map::new()),
        };
        if let Value::Object(map) = &mut value {
            map.insert("start".into(), Value::String(self.start_time().to_string()));
            if let Some(end) = self.end_time() {
                map.insert("end".into(), Value::String(end.to_string()));
            }
        }
        Ok(value)
    }

    pub fn to_json(&self) -> Result<String, CadenceError> {
        Ok(self.to_value()?.to_string())
    }

    pub fn from_json(json: &str) -> Result<Self, CadenceError> {
        let repr: ScheduleRepr = serde_json::from_str(json)
            .map_err(|e| CadenceError::serialization(format!("invalid schedule JSON: {e}")))?;
        let start = repr
            .start
            .ok_or_else(|| CadenceError::serialization("missing required key `start`"))?;
        let start = parse_zoned("start", &start)?;
        let rule = if repr.rule.has_rule() {
            Some(Rule::try_from(repr.rule)?)
        } else {
            None
        };
        let mut schedule = Schedule::new(start, rule)?;
        if let Some(end) = repr.end {
            schedule.set_end_time(parse_zoned("end", &end)?)?;
        }
        Ok(schedule)
    }
}

impl Serialize for Schedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}
