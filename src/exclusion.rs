//! Holiday exclusion on top of the working-time search.

use jiff::Zoned;
use tracing::debug;

use crate::alarm::Alarm;
use crate::bounds::HOLIDAY_RETRIES;
use crate::calendar::end_of_day;
use crate::holiday::HolidayOracle;
use crate::recurrence::{Occurrence, RecurrenceSource, RepetitionMode};
use crate::resolver::WorkingTimeResolver;
use crate::worktime::is_working_time;

/// Finds the next occurrence that is not on a holiday and, for alarms
/// restricted to working time, also inside working time.
pub struct HolidayResolver<'a, S: ?Sized> {
    working: WorkingTimeResolver<'a, S>,
    holidays: &'a dyn HolidayOracle,
}

impl<'a, S: RecurrenceSource + ?Sized> HolidayResolver<'a, S> {
    pub fn new(working: WorkingTimeResolver<'a, S>, holidays: &'a dyn HolidayOracle) -> Self {
        Self { working, holidays }
    }

    /// First qualifying occurrence strictly after `after`. Gives up after a
    /// fixed number of holiday hits.
    pub fn next_non_holiday_working_occurrence(
        &self,
        alarm: &Alarm,
        after: &Zoned,
    ) -> Option<Occurrence> {
        let found = if alarm.work_time_only {
            self.next_working(alarm, after)
        } else {
            self.next_any(alarm, after)
        };
        if found.is_none() {
            debug!(%after, "no occurrence outside holidays within search bounds");
        }
        found
    }

    fn next_working(&self, alarm: &Alarm, after: &Zoned) -> Option<Occurrence> {
        let source = self.working.source();
        let config = self.working.config();
        let mut cursor = after.clone();
        for _ in 0..HOLIDAY_RETRIES {
            let found = self.working.next_working_occurrence(alarm, &cursor)?;
            if !self.holidays.is_holiday(found.at.date()) {
                return Some(found);
            }
            // Skip the rest of the holiday and try the very next occurrence.
            let day_end = end_of_day(&found.at)?;
            let candidate = source.next_occurrence(alarm, &day_end, RepetitionMode::Return)?;
            if is_working_time(alarm, config, self.holidays, &candidate.at) {
                return Some(candidate);
            }
            cursor = candidate.at;
        }
        None
    }

    fn next_any(&self, alarm: &Alarm, after: &Zoned) -> Option<Occurrence> {
        let source = self.working.source();
        let mut cursor = after.clone();
        for _ in 0..HOLIDAY_RETRIES {
            let found = source.next_occurrence(alarm, &cursor, RepetitionMode::Return)?;
            if !self.holidays.is_holiday(found.at.date()) {
                return Some(found);
            }
            cursor = end_of_day(&found.at)?;
        }
        None
    }
}
