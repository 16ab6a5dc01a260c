//! The alarm fields the scheduler reads.

use jiff::Zoned;

use crate::calendar::start_of_day;
use crate::error::TriggerError;
use crate::recurrence::{Interval, Repetition, Rule};

/// Whether the live reminder for the current occurrence has already fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ReminderState {
    #[default]
    Active,
    Shown,
}

/// Advance notice: positive minutes fire before the occurrence, negative after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reminder {
    pub minutes: i64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub state: ReminderState,
}

impl Reminder {
    pub fn before(minutes: i64) -> Self {
        Self {
            minutes,
            state: ReminderState::Active,
        }
    }

    pub fn shown(self) -> Self {
        Self {
            state: ReminderState::Shown,
            ..self
        }
    }

    pub fn is_active(&self) -> bool {
        self.minutes != 0 && self.state == ReminderState::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DeferralKind {
    /// The occurrence itself is postponed.
    Main,
    /// Only the reminder is postponed.
    Reminder,
}

/// A user-chosen instant replacing the next computed trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Deferral {
    pub at: Zoned,
    pub kind: DeferralKind,
}

/// An alarm definition.
///
/// The zone of `start` is the zone every occurrence is computed in.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Alarm {
    pub start: Zoned,
    #[cfg_attr(feature = "serde", serde(default))]
    pub date_only: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub recurrence: Option<Rule>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub repetition: Option<Repetition>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub reminder: Option<Reminder>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub work_time_only: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub holidays_excluded: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub deferral: Option<Deferral>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub template: bool,
}

impl Alarm {
    /// A one-shot timed alarm at `start`.
    pub fn new(start: Zoned) -> Self {
        Self {
            start,
            date_only: false,
            recurrence: None,
            repetition: None,
            reminder: None,
            work_time_only: false,
            holidays_excluded: false,
            deferral: None,
            template: false,
        }
    }

    pub fn date_only(mut self) -> Self {
        self.date_only = true;
        self
    }

    pub fn recurring(mut self, rule: Rule) -> Self {
        self.recurrence = Some(rule);
        self
    }

    pub fn repeating(mut self, repetition: Repetition) -> Self {
        self.repetition = Some(repetition);
        self
    }

    pub fn with_reminder(mut self, reminder: Reminder) -> Self {
        self.reminder = Some(reminder);
        self
    }

    pub fn work_hours_only(mut self) -> Self {
        self.work_time_only = true;
        self
    }

    pub fn excluding_holidays(mut self) -> Self {
        self.holidays_excluded = true;
        self
    }

    pub fn deferred(mut self, at: Zoned, kind: DeferralKind) -> Self {
        self.deferral = Some(Deferral { at, kind });
        self
    }

    pub fn as_template(mut self) -> Self {
        self.template = true;
        self
    }

    pub fn recurs(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Whether any working-time or holiday restriction applies.
    pub fn is_restricted(&self) -> bool {
        self.work_time_only || self.holidays_excluded
    }

    /// The first occurrence: `start`, or the start of its day when date-only.
    pub fn first_occurrence(&self) -> Option<Zoned> {
        if self.date_only {
            start_of_day(self.start.date(), self.start.time_zone())
        } else {
            Some(self.start.clone())
        }
    }

    /// The repetition, if it can fire at all.
    pub(crate) fn active_repetition(&self) -> Option<&Repetition> {
        self.recurrence.as_ref()?;
        self.repetition
            .as_ref()
            .filter(|r| r.count > 0 && !r.interval.is_zero())
    }

    pub fn validate(&self) -> Result<(), TriggerError> {
        if let Some(rule) = &self.recurrence {
            rule.validate()?;
            if self.date_only && matches!(rule, Rule::Minutely { .. }) {
                return Err(TriggerError::alarm("a date-only alarm cannot recur by minutes"));
            }
        }
        if let Some(repetition) = &self.repetition {
            if self.recurrence.is_none() {
                return Err(TriggerError::alarm("a repetition requires a recurrence"));
            }
            repetition.validate()?;
            if self.date_only && !matches!(repetition.interval, Interval::Days(_)) {
                return Err(TriggerError::alarm(
                    "a date-only alarm can only repeat in whole days",
                ));
            }
        }
        Ok(())
    }
}
