//! Cheap probe for whether a fixed-time alarm can ever fire in working hours.

use crate::alarm::Alarm;
use crate::bounds::FEASIBILITY_REPEAT_LIMIT;
use crate::calendar::day_of;
use crate::recurrence::{Expander, Interval, RecurrenceSource};
use crate::worktime::WorkTimeConfig;

/// Whether the alarm may ever occur during working time, using the built-in
/// recurrence expansion.
///
/// `false` is definitive. `true` only means a full search is worth running:
/// repetitions are simulated for at most six steps.
pub fn may_occur_during_work(alarm: &Alarm, config: &WorkTimeConfig) -> bool {
    may_occur_during_work_with(alarm, config, &Expander)
}

/// [`may_occur_during_work`] with a caller-supplied recurrence source.
pub fn may_occur_during_work_with<S: RecurrenceSource + ?Sized>(
    alarm: &Alarm,
    config: &WorkTimeConfig,
    source: &S,
) -> bool {
    let same_time = alarm
        .active_repetition()
        .map_or(true, |rep| rep.interval.is_daily());
    if !alarm.date_only && same_time && !config.in_hours(alarm.start.time()) {
        return false;
    }
    let Some(rule) = &alarm.recurrence else {
        return true;
    };
    let weekly = source
        .regular_interval(rule)
        .is_some_and(|interval| interval.is_weekly());
    if !weekly {
        return true;
    }

    let work_days = config.work_days();
    let start_day = match source.by_day_positions(rule).as_slice() {
        [only] => only.weekday.index(),
        _ => day_of(&alarm.start),
    };
    let repeat_days = match alarm.active_repetition() {
        None => return work_days.contains_index(start_day),
        Some(rep) => match rep.interval {
            Interval::Days(d) if d % 7 == 0 => return work_days.contains_index(start_day),
            Interval::Days(d) => (d as usize, rep.count),
            Interval::Minutes(_) => return true,
        },
    };

    let (step, count) = repeat_days;
    let limit = count.min(FEASIBILITY_REPEAT_LIMIT) as usize;
    (0..=limit).any(|i| work_days.contains_index(start_day + i * step))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::{Repetition, Rule};
    use crate::worktime::{TimeOfDay, WorkDays, Weekday};
    use jiff::Zoned;

    fn saturday(time: &str) -> Zoned {
        format!("2026-01-10T{time}:00+00:00[UTC]").parse().unwrap()
    }

    fn weekly(start: Zoned) -> Alarm {
        Alarm::new(start).recurring(Rule::Weekly { every: 1, days: vec![] })
    }

    #[test]
    fn time_outside_window_is_infeasible() {
        let alarm = Alarm::new(saturday("07:00")).recurring(Rule::Daily { every: 1 });
        assert!(!may_occur_during_work(&alarm, &WorkTimeConfig::default()));
    }

    #[test]
    fn minute_repetitions_can_reach_the_window() {
        // 07:00 is early, but the 25-hour repetition is at 08:00, 09:00, ...
        let alarm = Alarm::new(saturday("07:00"))
            .recurring(Rule::Weekly { every: 1, days: vec![] })
            .repeating(Repetition {
                interval: Interval::Minutes(1500),
                count: 3,
            });
        assert!(may_occur_during_work(&alarm, &WorkTimeConfig::default()));
    }

    #[test]
    fn date_only_ignores_time_of_day() {
        let alarm = Alarm::new(saturday("07:00"))
            .date_only()
            .recurring(Rule::Daily { every: 1 });
        assert!(may_occur_during_work(&alarm, &WorkTimeConfig::default()));
    }

    #[test]
    fn weekly_on_non_work_day_is_infeasible() {
        let config = WorkTimeConfig::default();
        assert!(!may_occur_during_work(&weekly(saturday("10:00")), &config));

        let weekly_repeats = weekly(saturday("10:00")).repeating(Repetition {
            interval: Interval::Days(14),
            count: 4,
        });
        assert!(!may_occur_during_work(&weekly_repeats, &config));
    }

    #[test]
    fn weekly_on_work_day_is_feasible() {
        let monday: Zoned = "2026-01-05T10:00:00+00:00[UTC]".parse().unwrap();
        assert!(may_occur_during_work(&weekly(monday), &WorkTimeConfig::default()));
    }

    #[test]
    fn weekly_day_comes_from_the_rule() {
        let alarm = Alarm::new(saturday("10:00")).recurring(Rule::Weekly {
            every: 1,
            days: vec![Weekday::Monday],
        });
        assert!(may_occur_during_work(&alarm, &WorkTimeConfig::default()));
    }

    #[test]
    fn daily_repetition_reaching_a_work_day() {
        let config = WorkTimeConfig::default();
        // Saturday + 2 days = Monday.
        let alarm = weekly(saturday("10:00")).repeating(Repetition {
            interval: Interval::Days(2),
            count: 1,
        });
        assert!(may_occur_during_work(&alarm, &config));

        // Saturday + 1 day = Sunday only.
        let alarm = weekly(saturday("10:00")).repeating(Repetition {
            interval: Interval::Days(1),
            count: 1,
        });
        assert!(!may_occur_during_work(&alarm, &config));
    }

    #[test]
    fn repeat_simulation_is_capped() {
        // Friday is the sixth daily repetition after a Saturday.
        let config = WorkTimeConfig::new(
            WorkDays::from_days(&[Weekday::Friday]),
            TimeOfDay::new(9, 0).unwrap(),
            TimeOfDay::new(17, 0).unwrap(),
        )
        .unwrap();
        let six = weekly(saturday("10:00")).repeating(Repetition {
            interval: Interval::Days(1),
            count: 6,
        });
        assert!(may_occur_during_work(&six, &config));

        let five = weekly(saturday("10:00")).repeating(Repetition {
            interval: Interval::Days(1),
            count: 5,
        });
        assert!(!may_occur_during_work(&five, &config));
    }

    #[test]
    fn non_weekly_recurrence_is_assumed_feasible() {
        let alarm = Alarm::new(saturday("10:00")).recurring(Rule::Daily { every: 1 });
        assert!(may_occur_during_work(&alarm, &WorkTimeConfig::default()));
    }
}
