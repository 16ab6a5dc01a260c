//! Recurrence rules, sub-repetitions and occurrence expansion.
//!
//! The scheduler only talks to recurrences through [`RecurrenceSource`].
//! [`Expander`] is the built-in source: it expands the [`Rule`] variants an
//! alarm can carry, anchored on the alarm's start.

use std::fmt;

use jiff::civil::Date;
use jiff::{SignedDuration, Span, Timestamp, Zoned};

use crate::alarm::Alarm;
use crate::bounds::PERIOD_SEARCH_LIMIT;
use crate::calendar::{
    add_days, at_time_on_date, day_in_month, days_between, monday_of, month_start_after,
    months_between_ym, start_of_day, weekday_positions_in_month,
};
use crate::error::TriggerError;
use crate::worktime::Weekday;

/// Recurrence kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RecurrenceKind {
    None,
    Minutely,
    Daily,
    Weekly,
    MonthlyByDay,
    MonthlyByPos,
    AnnualByDate,
    AnnualByPos,
}

/// A weekday constrained by its position within a month.
///
/// Ordinal 1..=5 counts from the start of the month, -1..=-5 from the end,
/// and 0 matches every such weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DayPos {
    pub weekday: Weekday,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ordinal: i8,
}

impl DayPos {
    pub fn new(weekday: Weekday, ordinal: i8) -> Self {
        Self { weekday, ordinal }
    }

    /// Every `weekday` of the period.
    pub fn every(weekday: Weekday) -> Self {
        Self::new(weekday, 0)
    }
}

/// A recurrence rule. Times of day come from the alarm's start.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Rule {
    /// Every `every` minutes of elapsed time.
    Minutely { every: u32 },
    /// Every `every` days.
    Daily { every: u32 },
    /// Every `every` weeks on the given days (the start's weekday if empty).
    Weekly {
        every: u32,
        #[cfg_attr(feature = "serde", serde(default))]
        days: Vec<Weekday>,
    },
    /// Every `every` months on the given days of the month (the start's day if
    /// empty). Negative days count from the end of the month.
    MonthlyByDay {
        every: u32,
        #[cfg_attr(feature = "serde", serde(default))]
        days: Vec<i8>,
    },
    /// Every `every` months on weekday positions, e.g. the last Friday.
    MonthlyByPos { every: u32, positions: Vec<DayPos> },
    /// Every `every` years on a day of the given months (the start's month if empty).
    AnnualByDate {
        every: u32,
        #[cfg_attr(feature = "serde", serde(default))]
        months: Vec<i8>,
        day: i8,
    },
    /// Every `every` years on weekday positions within the given months.
    AnnualByPos {
        every: u32,
        #[cfg_attr(feature = "serde", serde(default))]
        months: Vec<i8>,
        positions: Vec<DayPos>,
    },
}

impl Rule {
    pub fn kind(&self) -> RecurrenceKind {
        match self {
            Self::Minutely { .. } => RecurrenceKind::Minutely,
            Self::Daily { .. } => RecurrenceKind::Daily,
            Self::Weekly { .. } => RecurrenceKind::Weekly,
            Self::MonthlyByDay { .. } => RecurrenceKind::MonthlyByDay,
            Self::MonthlyByPos { .. } => RecurrenceKind::MonthlyByPos,
            Self::AnnualByDate { .. } => RecurrenceKind::AnnualByDate,
            Self::AnnualByPos { .. } => RecurrenceKind::AnnualByPos,
        }
    }

    pub fn every(&self) -> u32 {
        match self {
            Self::Minutely { every }
            | Self::Daily { every }
            | Self::Weekly { every, .. }
            | Self::MonthlyByDay { every, .. }
            | Self::MonthlyByPos { every, .. }
            | Self::AnnualByDate { every, .. }
            | Self::AnnualByPos { every, .. } => *every,
        }
    }

    /// The fixed period between consecutive occurrences, when there is one.
    pub fn regular_interval(&self) -> Option<Interval> {
        match self {
            Self::Minutely { every } => Some(Interval::Minutes(*every)),
            Self::Daily { every } => Some(Interval::Days(*every)),
            Self::Weekly { every, days } if days.len() <= 1 => Some(Interval::Days(every.saturating_mul(7))),
            _ => None,
        }
    }

    /// Weekday constraints of the rule. Weekly days have ordinal 0.
    pub fn by_day_positions(&self) -> Vec<DayPos> {
        match self {
            Self::Weekly { days, .. } => {
                let mut days = days.clone();
                days.sort();
                days.dedup();
                days.into_iter().map(DayPos::every).collect()
            }
            Self::MonthlyByPos { positions, .. } | Self::AnnualByPos { positions, .. } => {
                positions.clone()
            }
            _ => Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), TriggerError> {
        if self.every() == 0 {
            return Err(TriggerError::alarm("recurrence interval must be at least 1"));
        }
        let check_day = |d: i8| {
            if d == 0 || !(-31..=31).contains(&d) {
                Err(TriggerError::alarm(format!("day of month {d} is out of range")))
            } else {
                Ok(())
            }
        };
        let check_months = |months: &[i8]| {
            months.iter().try_for_each(|m| {
                if (1..=12).contains(m) {
                    Ok(())
                } else {
                    Err(TriggerError::alarm(format!("month {m} is out of range")))
                }
            })
        };
        let check_positions = |positions: &[DayPos]| {
            if positions.is_empty() {
                return Err(TriggerError::alarm("at least one weekday position is required"));
            }
            positions.iter().try_for_each(|p| {
                if (-5..=5).contains(&p.ordinal) {
                    Ok(())
                } else {
                    Err(TriggerError::alarm(format!(
                        "weekday ordinal {} is out of range",
                        p.ordinal
                    )))
                }
            })
        };
        match self {
            Self::Minutely { .. } | Self::Daily { .. } | Self::Weekly { .. } => Ok(()),
            Self::MonthlyByDay { days, .. } => days.iter().try_for_each(|d| check_day(*d)),
            Self::MonthlyByPos { positions, .. } => check_positions(positions),
            Self::AnnualByDate { months, day, .. } => {
                check_months(months)?;
                check_day(*day)
            }
            Self::AnnualByPos {
                months, positions, ..
            } => {
                check_months(months)?;
                check_positions(positions)
            }
        }
    }
}

/// A sub-repetition or recurrence period.
///
/// Day intervals keep the wall-clock time across offset changes; minute
/// intervals are elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Interval {
    Minutes(u32),
    Days(u32),
}

impl Interval {
    pub fn is_daily(&self) -> bool {
        matches!(self, Self::Days(_))
    }

    /// Whole days for a day interval.
    pub fn days(&self) -> Option<i64> {
        match self {
            Self::Days(d) => Some(*d as i64),
            Self::Minutes(_) => None,
        }
    }

    /// Whether every step lands on the same weekday.
    pub fn is_weekly(&self) -> bool {
        matches!(self, Self::Days(d) if d % 7 == 0)
    }

    /// Nominal length in seconds (a day counts as 24 hours).
    pub fn seconds(&self) -> i64 {
        match self {
            Self::Minutes(m) => *m as i64 * 60,
            Self::Days(d) => *d as i64 * 86_400,
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Minutes(0) | Self::Days(0))
    }

    /// `from` advanced by `steps` intervals.
    pub fn advance(&self, from: &Zoned, steps: i64) -> Option<Zoned> {
        match self {
            Self::Minutes(m) => from
                .checked_add(SignedDuration::from_mins(*m as i64 * steps))
                .ok(),
            Self::Days(d) => from.checked_add(Span::new().days(*d as i64 * steps)).ok(),
        }
    }
}

/// Secondary firings evenly spaced after each base recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Repetition {
    pub interval: Interval,
    pub count: u32,
}

impl Repetition {
    pub fn new(interval: Interval, count: u32) -> Result<Self, TriggerError> {
        let repetition = Self { interval, count };
        repetition.validate()?;
        Ok(repetition)
    }

    /// Whether the repetitions happen more than once a day.
    pub fn is_subdaily(&self) -> bool {
        self.interval.seconds() < 86_400
    }

    /// The `index`th repetition after `base` (index 0 is the base itself).
    pub fn at(&self, base: &Zoned, index: u32) -> Option<Zoned> {
        self.interval.advance(base, index as i64)
    }

    pub fn validate(&self) -> Result<(), TriggerError> {
        if self.count == 0 {
            return Err(TriggerError::alarm("repetition count must be at least 1"));
        }
        if self.interval.is_zero() {
            return Err(TriggerError::alarm("repetition interval must be non-zero"));
        }
        Ok(())
    }
}

/// One firing of an alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub at: Zoned,
    /// Sub-repetition index; 0 for a base recurrence.
    pub repetition: u32,
}

impl Occurrence {
    pub fn base(at: Zoned) -> Self {
        Self { at, repetition: 0 }
    }

    pub fn repetition(at: Zoned, index: u32) -> Self {
        Self {
            at,
            repetition: index,
        }
    }

    pub fn is_repetition(&self) -> bool {
        self.repetition > 0
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_repetition() {
            write!(f, "{} (repetition {})", self.at, self.repetition)
        } else {
            write!(f, "{}", self.at)
        }
    }
}

/// Whether occurrence searches fold in sub-repetitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepetitionMode {
    Return,
    Ignore,
}

/// Expands an alarm's recurrence.
pub trait RecurrenceSource {
    /// First occurrence strictly after `after`.
    fn next_occurrence(&self, alarm: &Alarm, after: &Zoned, mode: RepetitionMode)
        -> Option<Occurrence>;

    /// Last occurrence strictly before `before`.
    fn previous_occurrence(
        &self,
        alarm: &Alarm,
        before: &Zoned,
        mode: RepetitionMode,
    ) -> Option<Occurrence>;

    fn regular_interval(&self, rule: &Rule) -> Option<Interval> {
        rule.regular_interval()
    }

    fn by_day_positions(&self, rule: &Rule) -> Vec<DayPos> {
        rule.by_day_positions()
    }
}

impl<S: RecurrenceSource + ?Sized> RecurrenceSource for &S {
    fn next_occurrence(
        &self,
        alarm: &Alarm,
        after: &Zoned,
        mode: RepetitionMode,
    ) -> Option<Occurrence> {
        (**self).next_occurrence(alarm, after, mode)
    }

    fn previous_occurrence(
        &self,
        alarm: &Alarm,
        before: &Zoned,
        mode: RepetitionMode,
    ) -> Option<Occurrence> {
        (**self).previous_occurrence(alarm, before, mode)
    }

    fn regular_interval(&self, rule: &Rule) -> Option<Interval> {
        (**self).regular_interval(rule)
    }

    fn by_day_positions(&self, rule: &Rule) -> Vec<DayPos> {
        (**self).by_day_positions(rule)
    }
}

/// Built-in recurrence expansion.
#[derive(Debug, Clone, Copy, Default)]
pub struct Expander;

impl RecurrenceSource for Expander {
    fn next_occurrence(
        &self,
        alarm: &Alarm,
        after: &Zoned,
        mode: RepetitionMode,
    ) -> Option<Occurrence> {
        let first = alarm.first_occurrence()?;
        let Some(rule) = &alarm.recurrence else {
            return (first > *after).then(|| Occurrence::base(first));
        };
        let next_base = next_base(alarm, rule, &first, after);
        let repetition = match (mode, alarm.active_repetition()) {
            (RepetitionMode::Return, Some(r)) => r,
            _ => return next_base.map(Occurrence::base),
        };

        // A repetition of the latest base at or before `after` may come first.
        let at_or_before = after.checked_add(SignedDuration::from_secs(1)).ok()?;
        if let Some(base) = previous_base(alarm, rule, &first, &at_or_before) {
            if let Some(rep) = first_repetition_after(repetition, &base, after) {
                if next_base.as_ref().map_or(true, |next| rep.at < *next) {
                    return Some(rep);
                }
            }
        }
        next_base.map(Occurrence::base)
    }

    fn previous_occurrence(
        &self,
        alarm: &Alarm,
        before: &Zoned,
        mode: RepetitionMode,
    ) -> Option<Occurrence> {
        let first = alarm.first_occurrence()?;
        let Some(rule) = &alarm.recurrence else {
            return (first < *before).then(|| Occurrence::base(first));
        };
        let base = previous_base(alarm, rule, &first, before)?;
        let repetition = match (mode, alarm.active_repetition()) {
            (RepetitionMode::Return, Some(r)) => r,
            _ => return Some(Occurrence::base(base)),
        };
        let following = next_base(alarm, rule, &first, &base);
        for index in (1..=repetition.count).rev() {
            let Some(at) = repetition.at(&base, index) else {
                continue;
            };
            let truncated = following.as_ref().is_some_and(|next| at >= *next);
            if at < *before && !truncated {
                return Some(Occurrence::repetition(at, index));
            }
        }
        Some(Occurrence::base(base))
    }
}

/// First repetition of `base` strictly after `after`.
fn first_repetition_after(
    repetition: &Repetition,
    base: &Zoned,
    after: &Zoned,
) -> Option<Occurrence> {
    if repetition.interval.is_zero() {
        return None;
    }
    match repetition.interval {
        Interval::Minutes(m) => {
            let step = m as i64 * 60;
            let elapsed = after.timestamp().as_second() - base.timestamp().as_second();
            let index = (elapsed.div_euclid(step) + 1).max(1);
            if index > repetition.count as i64 {
                return None;
            }
            let at = repetition.at(base, index as u32)?;
            Some(Occurrence::repetition(at, index as u32))
        }
        Interval::Days(_) => (1..=repetition.count).find_map(|index| {
            let at = repetition.at(base, index)?;
            (at > *after).then(|| Occurrence::repetition(at, index))
        }),
    }
}

/// Next base recurrence strictly after `after`.
fn next_base(alarm: &Alarm, rule: &Rule, first: &Zoned, after: &Zoned) -> Option<Zoned> {
    if let Rule::Minutely { every } = rule {
        return next_minutely(*every, first, after);
    }
    if *after < *first {
        return Some(first.clone());
    }
    let local = after.with_time_zone(first.time_zone().clone()).date();
    let mut period = (period_of(rule, first.date(), local) - 1).max(0);
    for _ in 0..PERIOD_SEARCH_LIMIT {
        for date in period_dates(rule, first.date(), period) {
            if let Some(at) = occurrence_on(alarm, first, date) {
                if at > *after {
                    return Some(at);
                }
            }
        }
        period += 1;
    }
    None
}

/// Latest base recurrence strictly before `before`.
fn previous_base(alarm: &Alarm, rule: &Rule, first: &Zoned, before: &Zoned) -> Option<Zoned> {
    if let Rule::Minutely { every } = rule {
        return previous_minutely(*every, first, before);
    }
    if *before <= *first {
        return None;
    }
    let local = before.with_time_zone(first.time_zone().clone()).date();
    let mut period = period_of(rule, first.date(), local) + 1;
    for _ in 0..PERIOD_SEARCH_LIMIT {
        if period < 0 {
            break;
        }
        for date in period_dates(rule, first.date(), period).into_iter().rev() {
            if let Some(at) = occurrence_on(alarm, first, date) {
                if at < *before {
                    return Some(at);
                }
            }
        }
        period -= 1;
    }
    // The start always fires, even off the rule's days.
    Some(first.clone())
}

fn next_minutely(every: u32, first: &Zoned, after: &Zoned) -> Option<Zoned> {
    if every == 0 {
        return None;
    }
    if *after < *first {
        return Some(first.clone());
    }
    let step = every as i64 * 60;
    let elapsed = after.timestamp().as_second() - first.timestamp().as_second();
    let k = elapsed.div_euclid(step) + 1;
    minutely_at(first, k * step)
}

fn previous_minutely(every: u32, first: &Zoned, before: &Zoned) -> Option<Zoned> {
    if every == 0 || *before <= *first {
        return None;
    }
    let step = every as i64 * 60;
    let elapsed = before.timestamp().as_second() - first.timestamp().as_second();
    let k = (elapsed - 1).max(0).div_euclid(step);
    minutely_at(first, k * step)
}

fn minutely_at(first: &Zoned, offset_seconds: i64) -> Option<Zoned> {
    let ts = Timestamp::from_second(first.timestamp().as_second() + offset_seconds).ok()?;
    Some(ts.to_zoned(first.time_zone().clone()))
}

/// The period (day, week, month or year step) containing `date`, counted
/// from the period containing the start. Negative before the start.
fn period_of(rule: &Rule, start: Date, date: Date) -> i64 {
    let every = rule.every().max(1) as i64;
    let raw = match rule {
        Rule::Minutely { .. } | Rule::Daily { .. } => days_between(start, date),
        Rule::Weekly { .. } => match (monday_of(start), monday_of(date)) {
            (Some(a), Some(b)) => days_between(a, b) / 7,
            _ => 0,
        },
        Rule::MonthlyByDay { .. } | Rule::MonthlyByPos { .. } => months_between_ym(start, date),
        Rule::AnnualByDate { .. } | Rule::AnnualByPos { .. } => {
            date.year() as i64 - start.year() as i64
        }
    };
    raw.div_euclid(every)
}

/// Candidate dates of one period, ascending, never before the start.
fn period_dates(rule: &Rule, start: Date, period: i64) -> Vec<Date> {
    let every = rule.every() as i64;
    let mut dates: Vec<Date> = match rule {
        Rule::Minutely { .. } => Vec::new(),
        Rule::Daily { .. } => add_days(start, period * every).into_iter().collect(),
        Rule::Weekly { days, .. } => {
            let Some(monday) = monday_of(start).and_then(|m| add_days(m, period * every * 7))
            else {
                return Vec::new();
            };
            if days.is_empty() {
                add_days(monday, start.weekday().to_monday_zero_offset() as i64)
                    .into_iter()
                    .collect()
            } else {
                days.iter()
                    .filter_map(|d| add_days(monday, d.index() as i64))
                    .collect()
            }
        }
        Rule::MonthlyByDay { days, .. } => {
            let Some(first) = month_start_after(start, period * every) else {
                return Vec::new();
            };
            if days.is_empty() {
                day_in_month(first, start.day()).into_iter().collect()
            } else {
                days.iter().filter_map(|d| day_in_month(first, *d)).collect()
            }
        }
        Rule::MonthlyByPos { positions, .. } => {
            let Some(first) = month_start_after(start, period * every) else {
                return Vec::new();
            };
            positions_in_month(first, positions)
        }
        Rule::AnnualByDate { months, day, .. } => year_months(start, months, period * every)
            .into_iter()
            .filter_map(|first| day_in_month(first, *day))
            .collect(),
        Rule::AnnualByPos {
            months, positions, ..
        } => year_months(start, months, period * every)
            .into_iter()
            .flat_map(|first| positions_in_month(first, positions))
            .collect(),
    };
    dates.retain(|d| *d >= start);
    dates.sort();
    dates.dedup();
    dates
}

fn positions_in_month(first: Date, positions: &[DayPos]) -> Vec<Date> {
    positions
        .iter()
        .flat_map(|p| weekday_positions_in_month(first, p.weekday.to_jiff(), p.ordinal))
        .collect()
}

/// First days of the selected months in the year `years` after the start's.
fn year_months(start: Date, months: &[i8], years: i64) -> Vec<Date> {
    let Ok(year) = i16::try_from(start.year() as i64 + years) else {
        return Vec::new();
    };
    if months.is_empty() {
        return Date::new(year, start.month(), 1).ok().into_iter().collect();
    }
    months
        .iter()
        .filter_map(|m| Date::new(year, *m, 1).ok())
        .collect()
}

/// The occurrence on `date`: start of day for date-only alarms, otherwise the
/// start's wall-clock time.
fn occurrence_on(alarm: &Alarm, first: &Zoned, date: Date) -> Option<Zoned> {
    let tz = first.time_zone();
    if alarm.date_only {
        start_of_day(date, tz)
    } else {
        at_time_on_date(date, first.time(), tz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zoned(s: &str) -> Zoned {
        s.parse().unwrap()
    }

    fn utc(s: &str) -> Zoned {
        zoned(&format!("{s}+00:00[UTC]"))
    }

    fn next(alarm: &Alarm, after: &str) -> Option<Occurrence> {
        Expander.next_occurrence(alarm, &utc(after), RepetitionMode::Return)
    }

    #[test]
    fn non_recurring_fires_once() {
        let alarm = Alarm::new(utc("2026-02-01T10:00:00"));
        assert_eq!(next(&alarm, "2026-01-01T00:00:00").unwrap().at, utc("2026-02-01T10:00:00"));
        assert_eq!(next(&alarm, "2026-02-01T10:00:00"), None);
    }

    #[test]
    fn daily_every_two_days() {
        let alarm = Alarm::new(utc("2026-01-01T09:00:00")).recurring(Rule::Daily { every: 2 });
        assert_eq!(next(&alarm, "2026-01-02T12:00:00").unwrap().at, utc("2026-01-03T09:00:00"));
        assert_eq!(next(&alarm, "2026-01-03T09:00:00").unwrap().at, utc("2026-01-05T09:00:00"));
        assert_eq!(next(&alarm, "2025-06-01T00:00:00").unwrap().at, utc("2026-01-01T09:00:00"));
    }

    #[test]
    fn weekly_on_several_days() {
        // 2026-01-05 is a Monday.
        let alarm = Alarm::new(utc("2026-01-05T08:00:00")).recurring(Rule::Weekly {
            every: 2,
            days: vec![Weekday::Monday, Weekday::Thursday],
        });
        assert_eq!(next(&alarm, "2026-01-05T08:00:00").unwrap().at, utc("2026-01-08T08:00:00"));
        assert_eq!(next(&alarm, "2026-01-08T08:00:00").unwrap().at, utc("2026-01-19T08:00:00"));
        let prev = Expander
            .previous_occurrence(&alarm, &utc("2026-01-19T08:00:00"), RepetitionMode::Ignore)
            .unwrap();
        assert_eq!(prev.at, utc("2026-01-08T08:00:00"));
    }

    #[test]
    fn monthly_last_day_and_skipped_31st() {
        let last = Alarm::new(utc("2026-01-31T07:00:00")).recurring(Rule::MonthlyByDay {
            every: 1,
            days: vec![-1],
        });
        assert_eq!(next(&last, "2026-01-31T07:00:00").unwrap().at, utc("2026-02-28T07:00:00"));

        let day31 = Alarm::new(utc("2026-01-31T07:00:00")).recurring(Rule::MonthlyByDay {
            every: 1,
            days: vec![],
        });
        assert_eq!(next(&day31, "2026-01-31T07:00:00").unwrap().at, utc("2026-03-31T07:00:00"));
    }

    #[test]
    fn monthly_by_position() {
        let alarm = Alarm::new(utc("2026-01-02T10:00:00")).recurring(Rule::MonthlyByPos {
            every: 1,
            positions: vec![DayPos::new(Weekday::Friday, -1)],
        });
        assert_eq!(next(&alarm, "2026-01-02T10:00:00").unwrap().at, utc("2026-01-30T10:00:00"));
        assert_eq!(next(&alarm, "2026-01-30T10:00:00").unwrap().at, utc("2026-02-27T10:00:00"));
    }

    #[test]
    fn annual_feb_29_skips_common_years() {
        let alarm = Alarm::new(utc("2024-02-29T12:00:00")).recurring(Rule::AnnualByDate {
            every: 1,
            months: vec![],
            day: 29,
        });
        assert_eq!(next(&alarm, "2024-03-01T00:00:00").unwrap().at, utc("2028-02-29T12:00:00"));
    }

    #[test]
    fn annual_by_position() {
        // Fourth Thursday of November.
        let alarm = Alarm::new(utc("2026-01-01T18:00:00")).recurring(Rule::AnnualByPos {
            every: 1,
            months: vec![11],
            positions: vec![DayPos::new(Weekday::Thursday, 4)],
        });
        assert_eq!(next(&alarm, "2026-01-01T18:00:00").unwrap().at, utc("2026-11-26T18:00:00"));
    }

    #[test]
    fn minutely_steps_by_elapsed_time() {
        let alarm = Alarm::new(utc("2026-01-01T00:10:00")).recurring(Rule::Minutely { every: 45 });
        assert_eq!(next(&alarm, "2026-01-01T01:00:00").unwrap().at, utc("2026-01-01T01:40:00"));
        assert_eq!(next(&alarm, "2026-01-01T00:55:00").unwrap().at, utc("2026-01-01T01:40:00"));
        let prev = Expander
            .previous_occurrence(&alarm, &utc("2026-01-01T00:55:00"), RepetitionMode::Ignore)
            .unwrap();
        assert_eq!(prev.at, utc("2026-01-01T00:10:00"));
    }

    #[test]
    fn minutely_crosses_offset_change_in_elapsed_time() {
        let start = zoned("2026-03-07T08:30:00-05:00[America/New_York]");
        let alarm = Alarm::new(start).recurring(Rule::Minutely { every: 1440 });
        let after = zoned("2026-03-07T08:30:00-05:00[America/New_York]");
        let next = Expander
            .next_occurrence(&alarm, &after, RepetitionMode::Ignore)
            .unwrap();
        assert_eq!(next.at, zoned("2026-03-08T09:30:00-04:00[America/New_York]"));
    }

    #[test]
    fn daily_keeps_wall_time_across_offset_change() {
        let start = zoned("2026-03-07T08:30:00-05:00[America/New_York]");
        let alarm = Alarm::new(start.clone()).recurring(Rule::Daily { every: 1 });
        let next = Expander
            .next_occurrence(&alarm, &start, RepetitionMode::Ignore)
            .unwrap();
        assert_eq!(next.at, zoned("2026-03-08T08:30:00-04:00[America/New_York]"));
    }

    #[test]
    fn repetitions_come_between_recurrences() {
        let alarm = Alarm::new(utc("2026-01-05T09:00:00"))
            .recurring(Rule::Daily { every: 1 })
            .repeating(Repetition::new(Interval::Minutes(240), 3).unwrap());

        let rep = next(&alarm, "2026-01-05T09:00:00").unwrap();
        assert_eq!(rep, Occurrence::repetition(utc("2026-01-05T13:00:00"), 1));
        let rep = next(&alarm, "2026-01-05T18:00:00").unwrap();
        assert_eq!(rep, Occurrence::repetition(utc("2026-01-05T21:00:00"), 3));
        let base = next(&alarm, "2026-01-05T21:00:00").unwrap();
        assert_eq!(base, Occurrence::base(utc("2026-01-06T09:00:00")));

        let ignored = Expander
            .next_occurrence(&alarm, &utc("2026-01-05T09:00:00"), RepetitionMode::Ignore)
            .unwrap();
        assert_eq!(ignored.at, utc("2026-01-06T09:00:00"));
    }

    #[test]
    fn repetitions_are_truncated_by_next_recurrence() {
        let alarm = Alarm::new(utc("2026-01-05T09:00:00"))
            .recurring(Rule::Daily { every: 1 })
            .repeating(Repetition::new(Interval::Minutes(600), 3).unwrap());
        // 19:00 is the only repetition before the next day's 09:00.
        assert_eq!(next(&alarm, "2026-01-05T09:00:00").unwrap().at, utc("2026-01-05T19:00:00"));
        assert_eq!(next(&alarm, "2026-01-05T19:00:00").unwrap().at, utc("2026-01-06T09:00:00"));

        let prev = Expander
            .previous_occurrence(&alarm, &utc("2026-01-06T09:00:00"), RepetitionMode::Return)
            .unwrap();
        assert_eq!(prev, Occurrence::repetition(utc("2026-01-05T19:00:00"), 1));
    }

    #[test]
    fn zero_interval_repetition_is_inactive() {
        let mut alarm = Alarm::new(utc("2026-01-05T09:00:00")).recurring(Rule::Daily { every: 1 });
        alarm.repetition = Some(Repetition { interval: Interval::Minutes(0), count: 2 });
        assert_eq!(next(&alarm, "2026-01-05T09:00:00"), Some(Occurrence::base(utc("2026-01-06T09:00:00"))));
        let prev = Expander.previous_occurrence(&alarm, &utc("2026-01-06T10:00:00"), RepetitionMode::Return);
        assert_eq!(prev, Some(Occurrence::base(utc("2026-01-06T09:00:00"))));
        assert_eq!(
            first_repetition_after(&Repetition { interval: Interval::Minutes(0), count: 2 }, &utc("2026-01-05T09:00:00"), &utc("2026-01-05T09:30:00")),
            None
        );
    }

    #[test]
    fn date_only_occurrences_start_the_day() {
        let alarm = Alarm::new(utc("2026-01-05T00:00:00"))
            .date_only()
            .recurring(Rule::Daily { every: 3 });
        assert_eq!(next(&alarm, "2026-01-05T12:00:00").unwrap().at, utc("2026-01-08T00:00:00"));
    }

    #[test]
    fn regular_interval_and_positions() {
        assert_eq!(
            Rule::Weekly { every: 2, days: vec![Weekday::Saturday] }.regular_interval(),
            Some(Interval::Days(14))
        );
        assert_eq!(
            Rule::Weekly { every: 1, days: vec![Weekday::Monday, Weekday::Friday] }
                .regular_interval(),
            None
        );
        assert_eq!(
            Rule::Weekly { every: 1, days: vec![Weekday::Friday, Weekday::Monday] }
                .by_day_positions(),
            vec![DayPos::every(Weekday::Monday), DayPos::every(Weekday::Friday)]
        );
        assert!(Rule::MonthlyByDay { every: 1, days: vec![1] }.by_day_positions().is_empty());
    }

    #[test]
    fn validation_rejects_bad_rules() {
        assert!(Rule::Daily { every: 0 }.validate().is_err());
        assert!(Rule::MonthlyByDay { every: 1, days: vec![32] }.validate().is_err());
        assert!(Rule::AnnualByDate { every: 1, months: vec![13], day: 1 }.validate().is_err());
        assert!(Rule::MonthlyByPos { every: 1, positions: vec![] }.validate().is_err());
        assert!(Repetition::new(Interval::Days(0), 2).is_err());
        assert!(Repetition::new(Interval::Days(1), 0).is_err());
    }
}
