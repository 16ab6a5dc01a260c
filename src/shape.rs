//! Classification of an alarm into the search strategy that resolves it.
//!
//! Computed once per search so the resolver loops never re-test the alarm's
//! structure.

use crate::alarm::Alarm;
use crate::bounds::ALL_DAYS_MASK;
use crate::calendar::{day_bit, day_of};
use crate::recurrence::{RecurrenceSource, Repetition, Rule};
use crate::worktime::WorkDays;

/// How weekdays vary for a date-only alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekdayPattern {
    /// Every recurrence lands on one weekday; only repetitions can move off it.
    SameWeekday,
    /// Each recurrence has a weekday and its repetitions share it.
    FixedWeekday,
    /// Both recurrences and repetitions move across weekdays.
    VaryingWeekday,
}

/// Search strategy for a recurring alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchShape {
    DateOnly(WeekdayPattern),
    /// Every occurrence has the same wall-clock time.
    FixedTimeOfDay,
    /// The recurrence itself steps by minutes.
    VaryingRecurrenceTime,
    /// Recurrences are at a fixed time but repetitions step by minutes.
    VaryingRepetitionTime,
}

impl SearchShape {
    /// `None` for a non-recurring alarm.
    pub fn classify<S: RecurrenceSource + ?Sized>(alarm: &Alarm, source: &S) -> Option<Self> {
        let rule = alarm.recurrence.as_ref()?;
        let repetition = alarm.active_repetition();
        if alarm.date_only {
            let weekly_repeat = repetition.map_or(true, |r| r.interval.is_weekly());
            let weekly_recur = source
                .regular_interval(rule)
                .is_some_and(|i| i.is_weekly())
                || source.by_day_positions(rule).len() == 1;
            let pattern = if weekly_recur {
                WeekdayPattern::SameWeekday
            } else if weekly_repeat {
                WeekdayPattern::FixedWeekday
            } else {
                WeekdayPattern::VaryingWeekday
            };
            return Some(Self::DateOnly(pattern));
        }
        let recur_varies = matches!(rule, Rule::Minutely { .. });
        let repeat_varies = repetition.is_some_and(Repetition::is_subdaily);
        Some(match (recur_varies, repeat_varies) {
            (true, _) => Self::VaryingRecurrenceTime,
            (false, true) => Self::VaryingRepetitionTime,
            (false, false) => Self::FixedTimeOfDay,
        })
    }
}

/// Weekdays a recurrence can land on, Monday = bit 0, together with whether
/// any of them is a work day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceDays {
    pub mask: u8,
    pub any_work_day: bool,
}

impl RecurrenceDays {
    pub fn of<S: RecurrenceSource + ?Sized>(
        alarm: &Alarm,
        source: &S,
        work_days: &WorkDays,
    ) -> Self {
        let Some(rule) = &alarm.recurrence else {
            let day = day_of(&alarm.start);
            return Self {
                mask: day_bit(day),
                any_work_day: work_days.contains_index(day),
            };
        };
        let positions = source.by_day_positions(rule);
        if !positions.is_empty() {
            let mask = positions
                .iter()
                .fold(0u8, |mask, p| mask | day_bit(p.weekday.index()));
            return Self {
                mask,
                any_work_day: mask & work_days.mask() != 0,
            };
        }
        if source.regular_interval(rule).is_some_and(|i| i.is_weekly()) {
            let day = day_of(&alarm.start);
            return Self {
                mask: day_bit(day),
                any_work_day: work_days.contains_index(day),
            };
        }
        Self {
            mask: ALL_DAYS_MASK,
            any_work_day: !work_days.is_empty(),
        }
    }

    /// Whether `seen` covers every weekday the recurrence can land on.
    pub fn exhausted_by(&self, seen: u8) -> bool {
        seen & self.mask == self.mask
    }
}
