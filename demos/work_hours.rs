//! Working-hours walkthrough: restrict a daily alarm, skip holidays, probe feasibility.

use alarm_triggers::{
    compute_triggers, may_occur_during_work, Alarm, HolidaySet, Reminder, Rule, TzTransitions,
    Weekday, WorkTimeConfig,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = WorkTimeConfig::default();
    println!("Working time: {config}");

    // A daily 09:00 alarm with a 15 minute reminder, only on working days.
    let alarm = Alarm::new("2026-01-05T09:00:00+00:00[UTC]".parse()?)
        .recurring(Rule::Daily { every: 1 })
        .with_reminder(Reminder::before(15))
        .work_hours_only();

    // Saturday morning: the plain trigger is today, the work trigger is Monday.
    let saturday: jiff::Zoned = "2026-01-10T08:00:00+00:00[UTC]".parse()?;
    let triggers = compute_triggers(
        &alarm,
        &config,
        &HolidaySet::new(),
        &TzTransitions::none(),
        &saturday,
    );
    println!("\nAfter {saturday}:\n{triggers}");

    // The same alarm with Monday declared a holiday.
    let holidays = HolidaySet::new().with_annual(1, 12);
    let alarm = alarm.excluding_holidays();
    let triggers = compute_triggers(
        &alarm,
        &config,
        &holidays,
        &TzTransitions::none(),
        &saturday,
    );
    println!("\nWith 2026-01-12 as a holiday:\n{triggers}");

    // A Saturday-only alarm can never fire on a working day.
    let weekend = Alarm::new("2026-01-03T10:00:00+00:00[UTC]".parse()?)
        .recurring(Rule::Weekly {
            every: 1,
            days: vec![Weekday::Saturday],
        })
        .work_hours_only();
    println!(
        "\nSaturday alarm may occur during work: {}",
        may_occur_during_work(&weekend, &config)
    );

    Ok(())
}
