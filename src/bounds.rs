//! Iteration caps for the bounded searches.
//!
//! Searches that hit one of these give up and report no occurrence. The caps
//! are not a completeness guarantee.

/// Repetitions simulated by the feasibility probe.
pub const FEASIBILITY_REPEAT_LIMIT: u32 = 6;

/// Distinct weekdays; a scan stops once it has seen all of them.
pub const WEEKDAYS: usize = 7;

/// Mask with every weekday bit set (Monday = bit 0).
pub const ALL_DAYS_MASK: u8 = 0x7F;

/// Recurrences walked when only the repetition time of day varies, counted
/// afresh after each jump to an offset transition.
pub const REPETITION_TIME_STEPS: u32 = 10;

/// Candidates tried while skipping holidays.
pub const HOLIDAY_RETRIES: u32 = 20;

/// Steps tried when the recurrence time of day varies: one week of minutes.
pub const RECURRENCE_TIME_STEPS: u32 = 7 * 24 * 60;

/// How far ahead of the search start offset transitions are used.
pub const TRANSITION_SEARCH_YEARS: i64 = 1;

/// Periods scanned by the built-in expander for one occurrence.
pub const PERIOD_SEARCH_LIMIT: u32 = 1000;
