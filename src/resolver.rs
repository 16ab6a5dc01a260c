//! Bounded search for the next occurrence that falls inside working time.
//!
//! The search never leaves the recurrence grid: every result is an
//! occurrence (base or repetition) produced by the [`RecurrenceSource`] or by
//! the same interval arithmetic it uses. Each strategy stops once it can tell
//! that further occurrences only repeat weekdays it has already rejected, and
//! every loop shares one step budget.

use jiff::civil::Time;
use jiff::{SignedDuration, Span, Timestamp, Zoned};
use tracing::{debug, trace, warn};

use crate::alarm::Alarm;
use crate::bounds::{RECURRENCE_TIME_STEPS, REPETITION_TIME_STEPS, TRANSITION_SEARCH_YEARS, WEEKDAYS};
use crate::calendar::{add_days, at_time_on_date, day_bit, day_of, seconds_between};
use crate::feasibility::may_occur_during_work_with;
use crate::recurrence::{Interval, Occurrence, RecurrenceSource, Repetition, RepetitionMode, Rule};
use crate::shape::{RecurrenceDays, SearchShape, WeekdayPattern};
use crate::transitions::TzTransitions;
use crate::worktime::WorkTimeConfig;

/// Finds the next occurrence of an alarm on a working day and, for timed
/// alarms, inside the working-hours window. Holidays are not considered.
#[derive(Debug)]
pub struct WorkingTimeResolver<'a, S: ?Sized> {
    source: &'a S,
    config: &'a WorkTimeConfig,
    transitions: &'a TzTransitions,
}

impl<'a, S: RecurrenceSource + ?Sized> WorkingTimeResolver<'a, S> {
    pub fn new(source: &'a S, config: &'a WorkTimeConfig, transitions: &'a TzTransitions) -> Self {
        Self {
            source,
            config,
            transitions,
        }
    }

    pub fn source(&self) -> &'a S {
        self.source
    }

    pub fn config(&self) -> &'a WorkTimeConfig {
        self.config
    }

    /// First occurrence strictly after `after` inside working time, or `None`
    /// when none is found within the search bounds.
    pub fn next_working_occurrence(&self, alarm: &Alarm, after: &Zoned) -> Option<Occurrence> {
        let work_days = self.config.work_days();
        if work_days.is_empty() {
            debug!("no working days configured");
            return None;
        }
        let next = self
            .source
            .next_occurrence(alarm, after, RepetitionMode::Return)?;
        if self.works(alarm, &next.at) {
            return Some(next);
        }
        let shape = SearchShape::classify(alarm, self.source)?;
        let days = RecurrenceDays::of(alarm, self.source, &work_days);
        if !days.any_work_day && alarm.active_repetition().is_none() {
            debug!(mask = days.mask, "recurrence never lands on a working day");
            return None;
        }

        let mut search = Search {
            resolver: self,
            alarm,
            after,
            days,
            budget: RECURRENCE_TIME_STEPS,
        };
        let found = match shape {
            SearchShape::DateOnly(WeekdayPattern::SameWeekday) => search.same_weekday(),
            SearchShape::DateOnly(WeekdayPattern::FixedWeekday) => search.fixed(),
            SearchShape::DateOnly(WeekdayPattern::VaryingWeekday) => search.varying_weekday(),
            SearchShape::FixedTimeOfDay => {
                if may_occur_during_work_with(alarm, self.config, self.source) {
                    search.fixed()
                } else {
                    debug!("fixed time of day can never fall in working hours");
                    None
                }
            }
            SearchShape::VaryingRecurrenceTime => search.varying_recurrence_time(),
            SearchShape::VaryingRepetitionTime => search.varying_repetition_time(),
        };
        if found.is_none() {
            let kind = alarm.recurrence.as_ref().map(Rule::kind);
            debug!(?shape, ?kind, %after, steps = RECURRENCE_TIME_STEPS - search.budget, "no working occurrence within search bounds");
        }
        found
    }

    fn works(&self, alarm: &Alarm, at: &Zoned) -> bool {
        self.config.is_work_day(at) && (alarm.date_only || self.config.in_hours(at.time()))
    }
}

/// Wall-clock position of a recurrence; equal marks under the same offset
/// mean the weekly pattern has started over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Mark {
    time: Time,
    day: usize,
    offset: i32,
}

impl Mark {
    fn of(at: &Zoned) -> Self {
        Self {
            time: at.time(),
            day: day_of(at),
            offset: at.offset().seconds(),
        }
    }
}

struct Search<'r, 'a, S: ?Sized> {
    resolver: &'r WorkingTimeResolver<'a, S>,
    alarm: &'r Alarm,
    after: &'r Zoned,
    days: RecurrenceDays,
    budget: u32,
}

impl<S: RecurrenceSource + ?Sized> Search<'_, '_, S> {
    fn spend(&mut self) -> bool {
        match self.budget.checked_sub(1) {
            Some(left) => {
                self.budget = left;
                true
            }
            None => false,
        }
    }

    fn works(&self, at: &Zoned) -> bool {
        self.resolver.works(self.alarm, at)
    }

    fn next_base(&self, after: &Zoned) -> Option<Zoned> {
        self.resolver
            .source
            .next_occurrence(self.alarm, after, RepetitionMode::Ignore)
            .map(|o| o.at)
    }

    fn base_at_or_before(&self, at: &Zoned) -> Option<Zoned> {
        let probe = at.checked_add(SignedDuration::from_secs(1)).ok()?;
        self.resolver
            .source
            .previous_occurrence(self.alarm, &probe, RepetitionMode::Ignore)
            .map(|o| o.at)
    }

    /// The base recurrence the search starts from and the index of its last
    /// repetition at or before `after`.
    fn locate(&self, repetition: &Repetition) -> Option<(Zoned, u32)> {
        if let Some(base) = self.base_at_or_before(self.after) {
            let index = repetitions_up_to(repetition, &base, self.after);
            return Some((base, index));
        }
        let first = self.alarm.first_occurrence()?;
        if first <= *self.after {
            warn!(after = %self.after, "recurring alarm has no occurrence before the search start");
            return None;
        }
        // Starts before the first recurrence, which the caller has already rejected.
        Some((self.next_base(self.after)?, 0))
    }

    /// Every recurrence falls on one weekday, so cycle once through the
    /// repetitions of one recurrence.
    fn same_weekday(&mut self) -> Option<Occurrence> {
        let repetition = *self.alarm.active_repetition()?;
        if repetition.interval.is_weekly() {
            return None;
        }
        let (mut base, mut index) = self.locate(&repetition)?;
        let mut next_base = self.next_base(&base);
        for _ in 0..=repetition.count {
            if !self.spend() {
                return None;
            }
            index += 1;
            let candidate = (index <= repetition.count)
                .then(|| repetition.at(&base, index))
                .flatten()
                .filter(|at| next_base.as_ref().map_or(true, |next| at < next));
            match candidate {
                Some(at) => {
                    if self.works(&at) {
                        return Some(Occurrence::repetition(at, index));
                    }
                }
                None => {
                    base = next_base?;
                    if self.works(&base) {
                        return Some(Occurrence::base(base));
                    }
                    index = 0;
                    next_base = self.next_base(&base);
                }
            }
        }
        None
    }

    /// Walk occurrences in order. Repetitions share their recurrence's weekday
    /// or time of day, so the walk ends once a recurrence repeats a weekday
    /// after every possible weekday has been seen.
    fn fixed(&mut self) -> Option<Occurrence> {
        let mut seen = 0u8;
        let mut cursor = self.after.clone();
        while self.spend() {
            let occurrence =
                self.resolver
                    .source
                    .next_occurrence(self.alarm, &cursor, RepetitionMode::Return)?;
            if self.works(&occurrence.at) {
                return Some(occurrence);
            }
            if !occurrence.is_repetition() {
                let bit = day_bit(day_of(&occurrence.at));
                if seen & bit != 0 && self.days.exhausted_by(seen) {
                    return None;
                }
                seen |= bit;
            }
            cursor = occurrence.at;
        }
        None
    }

    /// Date-only recurrence on varying weekdays with repetitions a whole
    /// number of days apart: test repetition weekdays arithmetically and only
    /// build the instant for one that lands on a working day.
    fn varying_weekday(&mut self) -> Option<Occurrence> {
        let repetition = *self.alarm.active_repetition()?;
        let step = repetition.interval.days()? as usize;
        let work_days = self.resolver.config.work_days();
        let (mut base, mut index) = self.locate(&repetition)?;
        let mut seen = 0u8;
        while self.spend() {
            let next_base = self.next_base(&base);
            let day = day_of(&base);
            for i in index + 1..=repetition.count {
                if !work_days.contains_index(day + step * i as usize) {
                    continue;
                }
                let at = repetition.at(&base, i)?;
                if next_base.as_ref().is_some_and(|next| at >= *next) {
                    break;
                }
                return Some(Occurrence::repetition(at, i));
            }
            let bit = day_bit(day);
            if seen & bit != 0 && self.days.exhausted_by(seen) {
                return None;
            }
            seen |= bit;
            base = next_base?;
            if self.works(&base) {
                return Some(Occurrence::base(base));
            }
            index = 0;
        }
        None
    }

    /// Recurrence stepping by minutes: advance by direct arithmetic from the
    /// first recurrence. A pattern that wraps round to the same wall-clock
    /// position without a hit only changes at the next offset transition.
    fn varying_recurrence_time(&mut self) -> Option<Occurrence> {
        let Some(Rule::Minutely { every }) = &self.alarm.recurrence else {
            return None;
        };
        let step = *every as i64 * 60;
        if step == 0 {
            return None;
        }
        let first = self.alarm.first_occurrence()?;
        let origin = first.timestamp().as_second();
        let tz = first.time_zone().clone();
        let base_at = |k: i64| {
            Timestamp::from_second(origin + k * step)
                .ok()
                .map(|ts| ts.to_zoned(tz.clone()))
        };
        let limit = self.transition_limit()?;
        let repetition = self.alarm.active_repetition().copied();

        let mut k = (self.after.timestamp().as_second() - origin)
            .div_euclid(step)
            .max(0);
        let mut mark: Option<Mark> = None;
        let mut mark_from = self.after.timestamp();
        while self.spend() {
            let base = base_at(k)?;
            if base > *self.after && self.works(&base) {
                return Some(Occurrence::base(base));
            }
            if let Some(repetition) = &repetition {
                let next = base_at(k + 1);
                if let Some(found) = self.repetition_in_hours(repetition, &base, next.as_ref()) {
                    return Some(found);
                }
            }
            if base.timestamp() > mark_from {
                let here = Mark::of(&base);
                match mark {
                    None => mark = Some(here),
                    Some(start) if start == here => {
                        let transition = self.transition_after(&base, limit)?;
                        trace!(%transition, "recurrence pattern wrapped; resuming at transition");
                        k = (transition.as_second() - origin).div_euclid(step);
                        mark = None;
                        mark_from = transition;
                        continue;
                    }
                    Some(_) => {}
                }
            }
            k += 1;
        }
        None
    }

    /// Recurrences at a fixed time of day with repetitions stepping by
    /// minutes. At most `REPETITION_TIME_STEPS` recurrences are walked; a walk
    /// whose weekdays start over under one offset resumes at the next
    /// transition with a fresh step count.
    fn varying_repetition_time(&mut self) -> Option<Occurrence> {
        let repetition = *self.alarm.active_repetition()?;
        let limit = self.transition_limit()?;
        let (mut base, _) = self.locate(&repetition)?;
        let mut offset = base.offset();
        let mut seen = 0u8;
        let mut steps = 0;
        while self.spend() {
            if steps >= REPETITION_TIME_STEPS {
                debug!(steps, "recurrence step limit reached");
                return None;
            }
            steps += 1;
            if base.offset() != offset {
                offset = base.offset();
                seen = 0;
            }

            let next_base = self.next_base(&base);
            if base > *self.after && self.works(&base) {
                return Some(Occurrence::base(base));
            }
            if let Some(found) = self.repetition_in_hours(&repetition, &base, next_base.as_ref()) {
                return Some(found);
            }

            // The recurrence at or before the start was only partly scanned.
            if base > *self.after {
                let bit = day_bit(day_of(&base));
                if seen & bit != 0 && self.days.exhausted_by(seen) {
                    let transition = self.transition_after(&base, limit)?;
                    trace!(%transition, "repetition pattern wrapped; resuming at transition");
                    let at = transition.to_zoned(base.time_zone().clone());
                    base = self.base_at_or_before(&at)?;
                    offset = base.offset();
                    seen = 0;
                    steps = 0;
                    continue;
                }
                seen |= bit;
            }
            base = next_base?;
        }
        None
    }

    /// First repetition of `base` after the search start that is in working
    /// time and before `next_base`.
    fn repetition_in_hours(
        &mut self,
        repetition: &Repetition,
        base: &Zoned,
        next_base: Option<&Zoned>,
    ) -> Option<Occurrence> {
        let mut index = repetitions_up_to(repetition, base, self.after) + 1;
        while index <= repetition.count {
            if !self.spend() {
                return None;
            }
            let at = repetition.at(base, index)?;
            if next_base.is_some_and(|next| at >= *next) {
                return None;
            }
            if self.works(&at) {
                return Some(Occurrence::repetition(at, index));
            }
            index = index.saturating_add(self.repetitions_to_work_start(repetition, &at));
        }
        None
    }

    /// Repetition steps from a repetition outside working time to the first
    /// one at or after the next start of working hours. At least 1.
    fn repetitions_to_work_start(&self, repetition: &Repetition, at: &Zoned) -> u32 {
        let Interval::Minutes(minutes) = repetition.interval else {
            return 1;
        };
        let step = minutes as i64 * 60;
        let Some(start) = self.next_work_start(at) else {
            return 1;
        };
        let gap = seconds_between(at, &start);
        if step == 0 || gap <= 0 {
            return 1;
        }
        u32::try_from((gap + step - 1) / step).unwrap_or(u32::MAX).max(1)
    }

    /// The next start of working hours strictly after `at`.
    fn next_work_start(&self, at: &Zoned) -> Option<Zoned> {
        let config = self.resolver.config;
        let tz = at.time_zone();
        (0..=WEEKDAYS as i64).find_map(|offset| {
            let date = add_days(at.date(), offset)?;
            let start = at_time_on_date(date, config.start_time(), tz)?;
            (start > *at && config.is_work_day(&start)).then_some(start)
        })
    }

    fn transition_limit(&self) -> Option<Timestamp> {
        self.after
            .checked_add(Span::new().years(TRANSITION_SEARCH_YEARS))
            .ok()
            .map(|z| z.timestamp())
    }

    /// The first offset transition after `at`, if one comes before `limit`.
    fn transition_after(&self, at: &Zoned, limit: Timestamp) -> Option<Timestamp> {
        let transitions = self.resolver.transitions;
        let next = transitions
            .next_index(at.timestamp())
            .and_then(|i| transitions.get(i))
            .filter(|ts| *ts <= limit);
        if next.is_none() {
            debug!(at = %at, "no offset transition left to search");
        }
        next
    }
}

/// Number of repetitions of `base` at or before `at`, at most `count`.
fn repetitions_up_to(repetition: &Repetition, base: &Zoned, at: &Zoned) -> u32 {
    match repetition.interval {
        Interval::Minutes(minutes) => {
            let step = (minutes as i64 * 60).max(1);
            let steps = seconds_between(base, at).div_euclid(step);
            steps.clamp(0, repetition.count as i64) as u32
        }
        Interval::Days(_) => (1..=repetition.count)
            .take_while(|i| repetition.at(base, *i).is_some_and(|t| t <= *at))
            .last()
            .unwrap_or(0),
    }
}
