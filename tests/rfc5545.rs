//! Recurrence examples from RFC 5545 section 3.8.5.3, evaluated in US Eastern
//! time (1997 rules) so daylight saving changes fall inside several of them.
//!
//! Skipped: BYSETPOS, BYWEEKNO, sub-daily frequencies, EXDATE/RDATE.

use cadence::{Occurrence, Rule, Schedule, Weekday};
use jiff::civil::date;
use jiff::tz::TimeZone;
use jiff::Zoned;

use Weekday::*;

fn eastern() -> TimeZone {
    TimeZone::posix("EST5EDT,M4.1.0,M10.5.0").unwrap()
}

fn local(y: i16, m: i8, d: i8, h: i8) -> Zoned {
    date(y, m, d).at(h, 0, 0, 0).to_zoned(eastern()).unwrap()
}

fn nine(y: i16, m: i8, d: i8) -> Zoned {
    local(y, m, d, 9)
}

/// 1997-09-02 09:00 EDT, the DTSTART of most examples.
fn dtstart() -> Zoned {
    nine(1997, 9, 2)
}

fn days(y: i16, m: i8, ds: impl IntoIterator<Item = i8>) -> Vec<Zoned> {
    ds.into_iter().map(|d| nine(y, m, d)).collect()
}

fn all(start: Zoned, rule: Rule) -> Vec<Zoned> {
    Occurrence::new(rule, start).unwrap().all().unwrap()
}

fn first(start: Zoned, rule: Rule, n: usize) -> Vec<Zoned> {
    Schedule::new(start, Some(rule)).unwrap().first(n).unwrap()
}

// =============================================================================
// Daily
// =============================================================================

#[test]
fn daily_for_10_occurrences() {
    let rule = Rule::daily(1).unwrap().with_count(10);
    assert_eq!(all(dtstart(), rule), days(1997, 9, 2..=11));
}

#[test]
fn daily_until_december_24() {
    let rule = Rule::daily(1).unwrap().with_stop(local(1997, 12, 24, 0));
    let mut expected = days(1997, 9, 2..=30);
    expected.extend(days(1997, 10, 1..=31));
    expected.extend(days(1997, 11, 1..=30));
    expected.extend(days(1997, 12, 1..=23));

    let occurrences = all(dtstart(), rule);
    assert_eq!(occurrences, expected);
    // crosses the end of daylight saving time on october 26
    assert!(occurrences.iter().all(|t| t.hour() == 9));
}

#[test]
fn every_other_day_forever() {
    let rule = Rule::daily(2).unwrap();
    let mut expected = days(1997, 9, (1..=15).map(|i| 2 * i));
    expected.extend(days(1997, 10, (1..=15).map(|i| 2 * i)));
    expected.extend(days(1997, 11, (1..=15).map(|i| 2 * i - 1)));

    let schedule = Schedule::new(dtstart(), Some(rule)).unwrap();
    assert_eq!(schedule.first(45).unwrap(), expected);
    assert_eq!(
        schedule.occurrences(Some(&local(1997, 12, 1, 0))).unwrap(),
        expected
    );
}

#[test]
fn every_10_days_5_occurrences() {
    let rule = Rule::daily(10).unwrap().with_count(5);
    let mut expected = days(1997, 9, [2, 12, 22]);
    expected.extend(days(1997, 10, [2, 12]));
    assert_eq!(all(dtstart(), rule), expected);
}

#[test]
fn every_day_in_january_for_3_years() {
    let stop = local(2000, 1, 31, 14);
    let mut expected = days(1998, 1, 1..=31);
    expected.extend(days(1999, 1, 1..=31));
    expected.extend(days(2000, 1, 1..=31));

    let daily = Rule::daily(1)
        .unwrap()
        .months([1])
        .unwrap()
        .with_stop(stop.clone());
    assert_eq!(all(nine(1998, 1, 1), daily), expected);

    let yearly = Rule::yearly(1)
        .unwrap()
        .months([1])
        .unwrap()
        .weekdays(Weekday::all())
        .unwrap()
        .with_stop(stop);
    assert_eq!(all(nine(1998, 1, 1), yearly), expected);
}

// =============================================================================
// Weekly
// =============================================================================

#[test]
fn weekly_for_10_occurrences() {
    let rule = Rule::weekly(1).unwrap().with_count(10);
    let mut expected = days(1997, 9, [2, 9, 16, 23, 30]);
    expected.extend(days(1997, 10, [7, 14, 21, 28]));
    expected.extend(days(1997, 11, [4]));
    assert_eq!(all(dtstart(), rule), expected);
}

#[test]
fn weekly_until_december_24() {
    let rule = Rule::weekly(1).unwrap().with_stop(local(1997, 12, 24, 0));
    let mut expected = days(1997, 9, [2, 9, 16, 23, 30]);
    expected.extend(days(1997, 10, [7, 14, 21, 28]));
    expected.extend(days(1997, 11, [4, 11, 18, 25]));
    expected.extend(days(1997, 12, [2, 9, 16, 23]));
    assert_eq!(all(dtstart(), rule), expected);
}

#[test]
fn every_other_week_forever() {
    let rule = Rule::weekly(2).unwrap();
    let mut expected = days(1997, 9, [2, 16, 30]);
    expected.extend(days(1997, 10, [14, 28]));
    expected.extend(days(1997, 11, [11, 25]));
    expected.extend(days(1997, 12, [9, 23]));
    expected.extend(days(1998, 1, [6, 20]));
    expected.extend(days(1998, 2, [3, 17]));
    assert_eq!(first(dtstart(), rule, 13), expected);
}

#[test]
fn weekly_on_tuesday_and_thursday_for_five_weeks() {
    let mut expected = days(1997, 9, [2, 4, 9, 11, 16, 18, 23, 25, 30]);
    expected.extend(days(1997, 10, [2]));

    let until = Rule::weekly(1)
        .unwrap()
        .weekdays([Tuesday, Thursday])
        .unwrap()
        .with_stop(local(1997, 10, 7, 0));
    assert_eq!(all(dtstart(), until), expected);

    let counted = Rule::weekly(1)
        .unwrap()
        .weekdays([Tuesday, Thursday])
        .unwrap()
        .with_count(10);
    assert_eq!(all(dtstart(), counted), expected);
}

#[test]
fn every_other_week_on_monday_wednesday_friday_until_december_24() {
    let rule = Rule::weekly(2)
        .unwrap()
        .weekdays([Monday, Wednesday, Friday])
        .unwrap()
        .with_stop(local(1997, 12, 24, 0));
    let mut expected = days(1997, 9, [1, 3, 5, 15, 17, 19, 29]);
    expected.extend(days(1997, 10, [1, 3, 13, 15, 17, 27, 29, 31]));
    expected.extend(days(1997, 11, [10, 12, 14, 24, 26, 28]));
    expected.extend(days(1997, 12, [8, 10, 12, 22]));
    assert_eq!(all(nine(1997, 9, 1), rule), expected);
}

#[test]
fn every_other_week_on_tuesday_and_thursday_for_8_occurrences() {
    let rule = Rule::weekly(2)
        .unwrap()
        .weekdays([Tuesday, Thursday])
        .unwrap()
        .with_count(8);
    let mut expected = days(1997, 9, [2, 4, 16, 18, 30]);
    expected.extend(days(1997, 10, [2, 14, 16]));
    assert_eq!(all(dtstart(), rule), expected);
}

// =============================================================================
// Monthly
// =============================================================================

#[test]
fn monthly_on_the_first_friday_for_10_occurrences() {
    let rule = Rule::monthly(1)
        .unwrap()
        .ordinal_weekdays([(Friday, 1)])
        .unwrap()
        .with_count(10);
    let expected = vec![
        nine(1997, 9, 5),
        nine(1997, 10, 3),
        nine(1997, 11, 7),
        nine(1997, 12, 5),
        nine(1998, 1, 2),
        nine(1998, 2, 6),
        nine(1998, 3, 6),
        nine(1998, 4, 3),
        nine(1998, 5, 1),
        nine(1998, 6, 5),
    ];
    assert_eq!(all(dtstart(), rule), expected);
}

#[test]
fn monthly_on_the_first_friday_until_december_24() {
    let rule = Rule::monthly(1)
        .unwrap()
        .ordinal_weekdays([(Friday, 1)])
        .unwrap()
        .with_stop(local(1997, 12, 24, 0));
    let expected = vec![
        nine(1997, 9, 5),
        nine(1997, 10, 3),
        nine(1997, 11, 7),
        nine(1997, 12, 5),
    ];
    assert_eq!(all(dtstart(), rule), expected);
}

#[test]
fn every_other_month_on_first_and_last_sunday_for_10_occurrences() {
    let rule = Rule::monthly(2)
        .unwrap()
        .ordinal_weekdays([(Sunday, 1), (Sunday, -1)])
        .unwrap()
        .with_count(10);
    let expected = vec![
        nine(1997, 9, 7),
        nine(1997, 9, 28),
        nine(1997, 11, 2),
        nine(1997, 11, 30),
        nine(1998, 1, 4),
        nine(1998, 1, 25),
        nine(1998, 3, 1),
        nine(1998, 3, 29),
        nine(1998, 5, 3),
        nine(1998, 5, 31),
    ];
    assert_eq!(all(dtstart(), rule), expected);
}

#[test]
fn monthly_on_the_second_to_last_monday_for_6_months() {
    let rule = Rule::monthly(1)
        .unwrap()
        .ordinal_weekdays([(Monday, -2)])
        .unwrap()
        .with_count(6);
    let expected = vec![
        nine(1997, 9, 22),
        nine(1997, 10, 20),
        nine(1997, 11, 17),
        nine(1997, 12, 22),
        nine(1998, 1, 19),
        nine(1998, 2, 16),
    ];
    assert_eq!(all(dtstart(), rule), expected);
}

#[test]
fn monthly_on_the_third_to_last_day_forever() {
    let rule = Rule::monthly(1).unwrap().monthdays([-3]).unwrap();
    let expected = vec![
        nine(1997, 9, 28),
        nine(1997, 10, 29),
        nine(1997, 11, 28),
        nine(1997, 12, 29),
        nine(1998, 1, 29),
        nine(1998, 2, 26),
    ];
    assert_eq!(first(dtstart(), rule, 6), expected);
}

#[test]
fn monthly_on_the_2nd_and_15th_for_10_occurrences() {
    let rule = Rule::monthly(1)
        .unwrap()
        .monthdays([2, 15])
        .unwrap()
        .with_count(10);
    let mut expected = Vec::new();
    for m in 9..=12 {
        expected.extend(days(1997, m, [2, 15]));
    }
    expected.extend(days(1998, 1, [2, 15]));
    assert_eq!(all(dtstart(), rule), expected);
}

#[test]
fn monthly_on_the_first_and_last_day_for_10_occurrences() {
    let rule = Rule::monthly(1)
        .unwrap()
        .monthdays([1, -1])
        .unwrap()
        .with_count(10);
    let expected = vec![
        nine(1997, 9, 30),
        nine(1997, 10, 1),
        nine(1997, 10, 31),
        nine(1997, 11, 1),
        nine(1997, 11, 30),
        nine(1997, 12, 1),
        nine(1997, 12, 31),
        nine(1998, 1, 1),
        nine(1998, 1, 31),
        nine(1998, 2, 1),
    ];
    assert_eq!(all(dtstart(), rule), expected);
}

#[test]
fn every_18_months_on_the_10th_thru_15th_for_10_occurrences() {
    let rule = Rule::monthly(18)
        .unwrap()
        .monthdays(10..=15)
        .unwrap()
        .with_count(10);
    let mut expected = days(1997, 9, 10..=15);
    expected.extend(days(1999, 3, 10..=13));
    assert_eq!(all(dtstart(), rule), expected);
}

#[test]
fn every_tuesday_every_other_month() {
    let rule = Rule::monthly(2).unwrap().weekdays([Tuesday]).unwrap();
    let mut expected = days(1997, 9, [2, 9, 16, 23, 30]);
    expected.extend(days(1997, 11, [4, 11, 18, 25]));
    expected.extend(days(1998, 1, [6, 13, 20, 27]));
    expected.extend(days(1998, 3, [3, 10, 17, 24, 31]));
    assert_eq!(first(dtstart(), rule, 18), expected);
}

#[test]
fn invalid_dates_are_skipped() {
    // february 30th does not exist
    let rule = Rule::monthly(1)
        .unwrap()
        .monthdays([15, 30])
        .unwrap()
        .with_count(5);
    let expected = vec![
        nine(2007, 1, 15),
        nine(2007, 1, 30),
        nine(2007, 2, 15),
        nine(2007, 3, 15),
        nine(2007, 3, 30),
    ];
    assert_eq!(all(nine(2007, 1, 15), rule), expected);
}

// =============================================================================
// Yearly
// =============================================================================

#[test]
fn yearly_in_june_and_july_for_10_occurrences() {
    let rule = Rule::yearly(1)
        .unwrap()
        .months([6, 7])
        .unwrap()
        .with_count(10);
    let expected: Vec<Zoned> = (1997..=2001)
        .flat_map(|y| [nine(y, 6, 10), nine(y, 7, 10)])
        .collect();
    assert_eq!(all(nine(1997, 6, 10), rule), expected);
}

#[test]
fn every_other_year_on_january_february_march_for_10_occurrences() {
    let rule = Rule::yearly(2)
        .unwrap()
        .months([1, 2, 3])
        .unwrap()
        .with_count(10);
    let mut expected = vec![nine(1997, 3, 10)];
    for y in [1999, 2001, 2003] {
        expected.extend((1..=3).map(|m| nine(y, m, 10)));
    }
    assert_eq!(all(nine(1997, 3, 10), rule), expected);
}

#[test]
fn every_third_year_on_the_1st_100th_200th_day_for_10_occurrences() {
    let rule = Rule::yearly(3)
        .unwrap()
        .yeardays([1, 100, 200])
        .unwrap()
        .with_count(10);
    let expected = vec![
        nine(1997, 1, 1),
        nine(1997, 4, 10),
        nine(1997, 7, 19),
        nine(2000, 1, 1),
        nine(2000, 4, 9),
        nine(2000, 7, 18),
        nine(2003, 1, 1),
        nine(2003, 4, 10),
        nine(2003, 7, 19),
        nine(2006, 1, 1),
    ];
    assert_eq!(all(nine(1997, 1, 1), rule), expected);
}

#[test]
fn every_20th_monday_of_the_year_forever() {
    let rule = Rule::yearly(1)
        .unwrap()
        .ordinal_weekdays([(Monday, 20)])
        .unwrap();
    let expected = vec![nine(1997, 5, 19), nine(1998, 5, 18), nine(1999, 5, 17)];
    assert_eq!(first(nine(1997, 5, 19), rule, 3), expected);
}

#[test]
fn every_thursday_in_march_forever() {
    let rule = Rule::yearly(1)
        .unwrap()
        .months([3])
        .unwrap()
        .weekdays([Thursday])
        .unwrap();
    let mut expected = days(1997, 3, [13, 20, 27]);
    expected.extend(days(1998, 3, [5, 12, 19, 26]));
    expected.extend(days(1999, 3, [4, 11, 18, 25]));
    assert_eq!(first(nine(1997, 3, 13), rule, 11), expected);
}

#[test]
fn every_thursday_in_june_july_august_forever() {
    let rule = Rule::yearly(1)
        .unwrap()
        .months([6, 7, 8])
        .unwrap()
        .weekdays([Thursday])
        .unwrap();
    let mut expected = days(1997, 6, [5, 12, 19, 26]);
    expected.extend(days(1997, 7, [3, 10, 17, 24, 31]));
    expected.extend(days(1997, 8, [7, 14, 21, 28]));
    expected.extend(days(1998, 6, [4, 11, 18, 25]));
    expected.extend(days(1998, 7, [2, 9, 16, 23, 30]));
    expected.extend(days(1998, 8, [6, 13, 20, 27]));
    expected.extend(days(1999, 6, [3, 10, 17, 24]));
    expected.extend(days(1999, 7, [1, 8, 15, 22, 29]));
    expected.extend(days(1999, 8, [5, 12, 19, 26]));
    assert_eq!(first(nine(1997, 6, 5), rule, 39), expected);
}

// =============================================================================
// Combined filters
// =============================================================================

#[test]
fn every_friday_the_13th_forever() {
    let rule = Rule::monthly(1)
        .unwrap()
        .weekdays([Friday])
        .unwrap()
        .monthdays([13])
        .unwrap();
    let expected = vec![
        nine(1998, 2, 13),
        nine(1998, 3, 13),
        nine(1998, 11, 13),
        nine(1999, 8, 13),
        nine(2000, 10, 13),
    ];
    assert_eq!(first(dtstart(), rule, 5), expected);
}

#[test]
fn first_saturday_following_the_first_sunday_forever() {
    let rule = Rule::monthly(1)
        .unwrap()
        .weekdays([Saturday])
        .unwrap()
        .monthdays(7..=13)
        .unwrap();
    let expected = vec![
        nine(1997, 9, 13),
        nine(1997, 10, 11),
        nine(1997, 11, 8),
        nine(1997, 12, 13),
        nine(1998, 1, 10),
        nine(1998, 2, 7),
        nine(1998, 3, 7),
        nine(1998, 4, 11),
        nine(1998, 5, 9),
        nine(1998, 6, 13),
    ];
    assert_eq!(first(nine(1997, 9, 13), rule, 10), expected);
}

#[test]
fn us_presidential_election_day() {
    // every 4 years, the first tuesday after a monday in november
    let rule = Rule::yearly(4)
        .unwrap()
        .months([11])
        .unwrap()
        .weekdays([Tuesday])
        .unwrap()
        .monthdays(2..=8)
        .unwrap();
    let expected = vec![nine(1996, 11, 5), nine(2000, 11, 7), nine(2004, 11, 2)];
    assert_eq!(first(nine(1996, 11, 5), rule, 3), expected);
}
