use std::sync::mpsc;
use std::time::Duration;

use alarm_triggers::{
    compute_triggers, is_working_time, Alarm, DayPos, DeferralKind, Expander, HolidayOracle, HolidaySet, Interval,
    RecurrenceSource, Reminder, Repetition, RepetitionMode, Rule, TimeOfDay, TriggerSet,
    TzTransitions, Weekday, WorkDays, WorkTimeConfig,
};
use jiff::tz::TimeZone;
use jiff::{SignedDuration, Span, Zoned};
use proptest::prelude::*;

fn arb_weekday() -> impl Strategy<Value = Weekday> {
    (0usize..7).prop_map(Weekday::from_index)
}

fn arb_rule() -> impl Strategy<Value = Rule> {
    prop_oneof![
        prop_oneof![Just(30u32), Just(90), Just(360), Just(1440)]
            .prop_map(|every| Rule::Minutely { every }),
        (1u32..4).prop_map(|every| Rule::Daily { every }),
        (1u32..3, prop::collection::vec(arb_weekday(), 0..3))
            .prop_map(|(every, days)| Rule::Weekly { every, days }),
        (
            1u32..3,
            prop::collection::vec(prop_oneof![1i8..=28, Just(-1i8)], 0..3)
        )
            .prop_map(|(every, days)| Rule::MonthlyByDay { every, days }),
        (1u32..3, arb_weekday(), prop_oneof![Just(0i8), 1i8..=4, Just(-1i8)]).prop_map(
            |(every, weekday, ordinal)| Rule::MonthlyByPos {
                every,
                positions: vec![DayPos::new(weekday, ordinal)],
            }
        ),
        (1i8..=12, 1i8..=28).prop_map(|(month, day)| Rule::AnnualByDate {
            every: 1,
            months: vec![month],
            day,
        }),
    ]
}

fn arb_repetition() -> impl Strategy<Value = Option<Repetition>> {
    prop_oneof![
        Just(None),
        (prop_oneof![Just(60u32), Just(120), Just(240)], 1u32..4).prop_map(|(m, count)| Some(
            Repetition {
                interval: Interval::Minutes(m),
                count,
            }
        )),
        (1u32..4, 1u32..4).prop_map(|(d, count)| Some(Repetition {
            interval: Interval::Days(d),
            count,
        })),
    ]
}

fn arb_zone() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("UTC"), Just("America/New_York")]
}

fn arb_start() -> impl Strategy<Value = Zoned> {
    (arb_zone(), 1i8..=12, 1i8..=28, 0i8..24, prop_oneof![Just(0i8), Just(30)]).prop_map(
        |(zone, month, day, hour, minute)| {
            let tz = TimeZone::get(zone).unwrap();
            jiff::civil::date(2026, month, day)
                .at(hour, minute, 0, 0)
                .to_zoned(tz)
                .unwrap()
        },
    )
}

#[derive(Debug, Clone)]
struct Case {
    alarm: Alarm,
    config: WorkTimeConfig,
    holidays: HolidaySet,
    now: Zoned,
}

impl Case {
    /// Asserts that no occurrence between `now` and the work trigger
    /// satisfies the alarm's restrictions. Long walks are cut short.
    fn check_no_earlier_working_occurrence(&self) -> Result<(), TestCaseError> {
        let Some(found) = self.triggers().main_work else {
            return Ok(());
        };
        let mut cursor = self.now.clone();
        for _ in 0..20_000 {
            let Some(occurrence) =
                Expander.next_occurrence(&self.alarm, &cursor, RepetitionMode::Return)
            else {
                break;
            };
            if occurrence.at >= found {
                break;
            }
            prop_assert!(
                !is_working_time(&self.alarm, &self.config, &self.holidays, &occurrence.at),
                "{} is in working time but the work trigger is {}",
                occurrence.at,
                found
            );
            cursor = occurrence.at;
        }
        Ok(())
    }

    fn triggers(&self) -> TriggerSet {
        let transitions =
            TzTransitions::for_zone(self.alarm.start.time_zone(), &self.now, 2).unwrap();
        compute_triggers(
            &self.alarm,
            &self.config,
            &self.holidays,
            &transitions,
            &self.now,
        )
    }
}

fn arb_config() -> impl Strategy<Value = WorkTimeConfig> {
    (prop::array::uniform7(any::<bool>()), 6u8..12, 1u8..10).prop_map(|(days, start, len)| {
        WorkTimeConfig::new(
            WorkDays::new(days),
            TimeOfDay::new(start, 0).unwrap(),
            TimeOfDay::new(start + len, 0).unwrap(),
        )
        .unwrap()
    })
}

fn arb_holidays() -> impl Strategy<Value = HolidaySet> {
    prop::collection::vec((1i8..=12, 1i8..=28), 0..4).prop_map(|days| {
        days.into_iter()
            .fold(HolidaySet::new(), |set, (m, d)| set.with_annual(m, d))
    })
}

fn arb_case() -> impl Strategy<Value = Case> {
    (
        arb_start(),
        any::<bool>(),
        arb_rule(),
        arb_repetition(),
        prop_oneof![Just(0i64), 5i64..120],
        any::<bool>(),
        any::<bool>(),
        arb_config(),
        arb_holidays(),
        (0i64..90, 0i64..24),
    )
        .prop_map(
            |(start, date_only, rule, repetition, reminder, work, holidays_excluded, config, holidays, (days, hours))| {
                let minutely = matches!(rule, Rule::Minutely { .. });
                let date_only = date_only && !minutely;
                let repetition = repetition
                    .filter(|r| !date_only || matches!(r.interval, Interval::Days(_)));
                let mut alarm = Alarm::new(start.clone()).recurring(rule);
                if date_only {
                    alarm = alarm.date_only();
                }
                alarm.repetition = repetition;
                if reminder != 0 {
                    alarm = alarm.with_reminder(Reminder::before(reminder));
                }
                alarm.work_time_only = work;
                alarm.holidays_excluded = holidays_excluded;
                let now = start
                    .checked_add(Span::new().days(days).hours(hours))
                    .unwrap();
                Case {
                    alarm,
                    config,
                    holidays,
                    now,
                }
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Without restrictions the work triggers equal the plain triggers.
    #[test]
    fn unrestricted_identity(mut case in arb_case()) {
        case.alarm.work_time_only = false;
        case.alarm.holidays_excluded = false;
        let set = case.triggers();
        prop_assert_eq!(&set.main_work, &set.main);
        prop_assert_eq!(&set.all_work, &set.all);
    }

    /// Without repetitions, `all` is exactly the reminder lead before `main`.
    #[test]
    fn reminder_offset(mut case in arb_case(), lead in 1i64..600) {
        case.alarm.repetition = None;
        case.alarm.reminder = Some(Reminder::before(lead));
        let set = case.triggers();
        if let Some(main) = &set.main {
            let expected = main.checked_sub(SignedDuration::from_mins(lead)).unwrap();
            prop_assert_eq!(set.all, Some(expected));
        }
    }

    /// A work trigger is on a working day and inside the working window.
    #[test]
    fn work_trigger_is_in_working_time(mut case in arb_case()) {
        case.alarm.work_time_only = true;
        let set = case.triggers();
        if let Some(at) = &set.main_work {
            prop_assert!(case.config.is_work_day(at), "{} is not a working day", at);
            if !case.alarm.date_only {
                prop_assert!(case.config.in_hours(at.time()), "{} is outside working hours", at);
            }
        }
    }

    /// A holiday-excluding alarm never has its work trigger on a holiday.
    #[test]
    fn work_trigger_avoids_holidays(mut case in arb_case()) {
        case.alarm.holidays_excluded = true;
        let set = case.triggers();
        if let Some(at) = &set.main_work {
            prop_assert!(!case.holidays.is_holiday(at.date()), "{} is a holiday", at);
        }
    }

    /// The work trigger is one of the alarm's own occurrences.
    #[test]
    fn work_trigger_is_an_occurrence(mut case in arb_case()) {
        case.alarm.work_time_only = true;
        let set = case.triggers();
        if let Some(at) = &set.main_work {
            let probe = at.checked_add(SignedDuration::from_secs(1)).unwrap();
            let previous = Expander.previous_occurrence(&case.alarm, &probe, RepetitionMode::Return);
            prop_assert_eq!(previous.map(|o| o.at), Some(at.clone()));
        }
    }

    /// No earlier occurrence is in working time than the work trigger.
    #[test]
    fn work_trigger_is_the_earliest(mut case in arb_case()) {
        case.alarm.work_time_only = true;
        case.alarm.holidays_excluded = false;
        case.check_no_earlier_working_occurrence()?;
    }

    /// The same holds when holidays are excluded as well.
    #[test]
    fn work_trigger_is_the_earliest_with_holidays(mut case in arb_case()) {
        case.alarm.holidays_excluded = true;
        case.check_no_earlier_working_occurrence()?;
    }

    /// A main deferral sets every trigger, whatever the restrictions.
    #[test]
    fn deferral_overrides(case in arb_case(), offset in 1i64..10_000) {
        let deferred = case.now.checked_add(SignedDuration::from_mins(offset)).unwrap();
        let alarm = case.alarm.clone().deferred(deferred.clone(), DeferralKind::Main);
        let case = Case { alarm, ..case };
        prop_assert_eq!(case.triggers(), TriggerSet::at(deferred));
    }

    /// Every computation finishes well within a generous time limit.
    #[test]
    fn computation_terminates(case in arb_case()) {
        let (tx, rx) = mpsc::channel();
        let worker = case.clone();
        std::thread::spawn(move || {
            let _ = tx.send(worker.triggers());
        });
        let result = rx.recv_timeout(Duration::from_secs(30));
        prop_assert!(result.is_ok(), "trigger computation did not finish: {:?}", case);
    }
}
