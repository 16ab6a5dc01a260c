//! Trigger computation: the four next-fire instants of an alarm.

use jiff::{SignedDuration, Zoned};
use tracing::trace;

use crate::alarm::{Alarm, Deferral, DeferralKind};
use crate::exclusion::HolidayResolver;
use crate::holiday::HolidayOracle;
use crate::recurrence::{Expander, Occurrence, RecurrenceSource, RepetitionMode};
use crate::resolver::WorkingTimeResolver;
use crate::transitions::TzTransitions;
use crate::worktime::{is_working_time, WorkTimeConfig};

/// Selects one trigger of a [`TriggerSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TriggerKind {
    /// Next occurrence, ignoring the reminder.
    Main,
    /// Next occurrence or its reminder, whichever fires first.
    All,
    /// `Main` restricted to working time and non-holidays.
    MainWork,
    /// `All` restricted to working time and non-holidays.
    AllWork,
    /// The time to show a user as the alarm's next firing.
    Display,
}

/// The next trigger instants of an alarm. `None` means no such trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TriggerSet {
    pub main: Option<Zoned>,
    pub all: Option<Zoned>,
    pub main_work: Option<Zoned>,
    pub all_work: Option<Zoned>,
}

impl TriggerSet {
    /// Every trigger at one instant.
    pub fn at(instant: Zoned) -> Self {
        Self {
            main: Some(instant.clone()),
            all: Some(instant.clone()),
            main_work: Some(instant.clone()),
            all_work: Some(instant),
        }
    }

    pub fn get(&self, kind: TriggerKind) -> Option<&Zoned> {
        match kind {
            TriggerKind::Main => self.main.as_ref(),
            TriggerKind::All => self.all.as_ref(),
            TriggerKind::MainWork | TriggerKind::Display => self.main_work.as_ref(),
            TriggerKind::AllWork => self.all_work.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.main.is_none()
            && self.all.is_none()
            && self.main_work.is_none()
            && self.all_work.is_none()
    }
}

/// Computes trigger sets against fixed working-time settings, holidays and
/// offset transitions.
pub struct TriggerCalculator<'a, S = Expander> {
    source: S,
    config: &'a WorkTimeConfig,
    holidays: &'a dyn HolidayOracle,
    transitions: &'a TzTransitions,
}

impl<'a> TriggerCalculator<'a, Expander> {
    pub fn new(
        config: &'a WorkTimeConfig,
        holidays: &'a dyn HolidayOracle,
        transitions: &'a TzTransitions,
    ) -> Self {
        Self::with_source(Expander, config, holidays, transitions)
    }
}

impl<'a, S: RecurrenceSource> TriggerCalculator<'a, S> {
    pub fn with_source(
        source: S,
        config: &'a WorkTimeConfig,
        holidays: &'a dyn HolidayOracle,
        transitions: &'a TzTransitions,
    ) -> Self {
        Self {
            source,
            config,
            holidays,
            transitions,
        }
    }

    /// The trigger set of `alarm` for occurrences strictly after `now`.
    pub fn compute(&self, alarm: &Alarm, now: &Zoned) -> TriggerSet {
        if alarm.template {
            return TriggerSet::default();
        }
        if let Some(Deferral {
            at,
            kind: DeferralKind::Main,
        }) = &alarm.deferral
        {
            return TriggerSet::at(at.clone());
        }

        let Some(main) = self
            .source
            .next_occurrence(alarm, now, RepetitionMode::Return)
        else {
            return TriggerSet::default();
        };
        let all = reminder_trigger(alarm, &main);

        if !alarm.is_restricted()
            || !alarm.recurs()
            || is_working_time(alarm, self.config, self.holidays, &main.at)
        {
            trace!(main = %main.at, "next occurrence needs no working-time search");
            return TriggerSet {
                main: Some(main.at.clone()),
                all: Some(all.clone()),
                main_work: Some(main.at),
                all_work: Some(all),
            };
        }

        let working = WorkingTimeResolver::new(&self.source, self.config, self.transitions);
        let found = if alarm.holidays_excluded {
            HolidayResolver::new(working, self.holidays).next_non_holiday_working_occurrence(alarm, now)
        } else {
            working.next_working_occurrence(alarm, now)
        };
        TriggerSet {
            main: Some(main.at),
            all: Some(all),
            all_work: found.as_ref().and_then(|o| work_reminder_trigger(alarm, o)),
            main_work: found.map(|o| o.at),
        }
    }
}

/// Triggers of `alarm` after `now` using the built-in recurrence expansion.
pub fn compute_triggers(
    alarm: &Alarm,
    config: &WorkTimeConfig,
    holidays: &dyn HolidayOracle,
    transitions: &TzTransitions,
    now: &Zoned,
) -> TriggerSet {
    TriggerCalculator::new(config, holidays, transitions).compute(alarm, now)
}

/// The reminder-or-occurrence trigger for the next occurrence.
fn reminder_trigger(alarm: &Alarm, main: &Occurrence) -> Zoned {
    if let Some(Deferral {
        at,
        kind: DeferralKind::Reminder,
    }) = &alarm.deferral
    {
        return at.clone();
    }
    if main.is_repetition() {
        return main.at.clone();
    }
    match alarm.reminder {
        Some(reminder) if reminder.is_active() => shift_minutes(&main.at, -reminder.minutes),
        _ => main.at.clone(),
    }
}

/// The reminder trigger for a later occurrence found by the working-time
/// search. Only reminders before the occurrence apply.
fn work_reminder_trigger(alarm: &Alarm, found: &Occurrence) -> Option<Zoned> {
    if found.is_repetition() {
        return Some(found.at.clone());
    }
    let minutes = alarm.reminder.map_or(0, |r| r.minutes.max(0));
    Some(shift_minutes(&found.at, -minutes))
}

fn shift_minutes(at: &Zoned, minutes: i64) -> Zoned {
    at.checked_add(SignedDuration::from_mins(minutes))
        .unwrap_or_else(|_| at.clone())
}
