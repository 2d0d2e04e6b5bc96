//! Basic cadence API walkthrough: build, describe, evaluate, list.

use cadence::{Occurrence, Rule, Schedule, Weekday};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Every other week on Tuesday and Thursday, eight times
    let rule = Rule::weekly(2)?
        .weekdays([Weekday::Tuesday, Weekday::Thursday])?
        .with_count(8);
    println!("Rule: {rule}");

    let start: jiff::Zoned = "1997-09-02T09:00:00-04:00[America/New_York]".parse()?;
    let occurrence = Occurrence::new(rule.clone(), start.clone())?;

    println!("\nAll occurrences:");
    for dt in occurrence.all()? {
        println!("  {dt}");
    }

    // Queries outside the life span come back empty
    let later: jiff::Zoned = "1998-01-01T00:00:00-05:00[America/New_York]".parse()?;
    println!("\nNext after {later}: {:?}", occurrence.next_occurrence(&later)?);
    if let Some(last) = occurrence.previous_occurrence(&later)? {
        println!("Last before {later}: {last}");
    }

    // Matching is relative to the anchor's grid
    let off_week: jiff::Zoned = "1997-09-09T09:00:00-04:00[America/New_York]".parse()?;
    println!("\n{off_week} matches: {}", rule.matches(&off_week, &start)?);

    // The last Friday of every month, as an hour-long schedule
    let mut schedule = Schedule::new(
        "2025-01-31T17:00:00+00:00[UTC]".parse()?,
        Some(Rule::monthly(1)?.ordinal_weekdays([(Weekday::Friday, -1)])?),
    )?;
    schedule.set_end_time("2025-01-31T18:00:00+00:00[UTC]".parse()?)?;
    println!("\nSchedule: {}", schedule.rule().map(ToString::to_string).unwrap_or_default());
    for dt in schedule.first(4)? {
        println!("  {dt}");
    }

    // Rules and schedules round trip through JSON
    let json = schedule.to_json()?;
    println!("\nJSON: {json}");
    let decoded = Schedule::from_json(&json)?;
    assert_eq!(decoded.first(4)?, schedule.first(4)?);

    Ok(())
}
