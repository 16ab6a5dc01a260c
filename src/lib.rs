//! alarm-triggers: next-fire computation for recurring alarms.
//!
//! Given an [`Alarm`] and a reference instant, [`compute_triggers`] returns the
//! alarm's next occurrence, its reminder trigger, and both of those restricted
//! to working hours and non-holidays when the alarm asks for it. Searches are
//! bounded: a restriction that can never be met yields `None` instead of
//! looping.
//!
//! # Examples
//!
//! ```
//! use alarm_triggers::{compute_triggers, Alarm, NoHolidays, Rule, TzTransitions, WorkTimeConfig};
//!
//! let start: jiff::Zoned = "2026-01-05T09:00:00+00:00[UTC]".parse().unwrap();
//! let alarm = Alarm::new(start)
//!     .recurring(Rule::Daily { every: 1 })
//!     .work_hours_only();
//!
//! // Saturday morning: the next working occurrence is Monday at 09:00.
//! let now: jiff::Zoned = "2026-01-10T08:00:00+00:00[UTC]".parse().unwrap();
//! let triggers = compute_triggers(
//!     &alarm,
//!     &WorkTimeConfig::default(),
//!     &NoHolidays,
//!     &TzTransitions::none(),
//!     &now,
//! );
//! assert_eq!(triggers.main_work.unwrap().to_string(), "2026-01-12T09:00:00+00:00[UTC]");
//! ```

pub mod alarm;
pub mod bounds;
mod calendar;
pub mod display;
pub mod error;
pub mod exclusion;
pub mod feasibility;
pub mod holiday;
pub mod recurrence;
pub mod resolver;
pub mod shape;
pub mod transitions;
pub mod trigger;
pub mod worktime;

pub use alarm::{Alarm, Deferral, DeferralKind, Reminder, ReminderState};
pub use error::TriggerError;
pub use exclusion::HolidayResolver;
pub use feasibility::{may_occur_during_work, may_occur_during_work_with};
pub use holiday::{HolidayOracle, HolidaySet, HolidaySpec, NoHolidays};
pub use recurrence::{
    DayPos, Expander, Interval, Occurrence, RecurrenceKind, RecurrenceSource, Repetition,
    RepetitionMode, Rule,
};
pub use resolver::WorkingTimeResolver;
pub use shape::{SearchShape, WeekdayPattern};
pub use transitions::TzTransitions;
pub use trigger::{compute_triggers, TriggerCalculator, TriggerKind, TriggerSet};
pub use worktime::{is_working_time, TimeOfDay, Weekday, WorkDays, WorkTimeConfig};
