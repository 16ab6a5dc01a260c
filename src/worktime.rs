//! Working week and working-hours configuration.

use std::fmt;
use std::str::FromStr;

use jiff::civil::Time;
use jiff::Zoned;
#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::alarm::Alarm;
use crate::calendar::day_of;
use crate::error::TriggerError;
use crate::holiday::HolidayOracle;

/// Weekday with lowercase serde, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }

    pub fn short(self) -> &'static str {
        &self.as_str()[..3]
    }

    /// Monday = 0 ... Sunday = 6.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 7]
    }

    pub fn to_jiff(self) -> jiff::civil::Weekday {
        match self {
            Self::Monday => jiff::civil::Weekday::Monday,
            Self::Tuesday => jiff::civil::Weekday::Tuesday,
            Self::Wednesday => jiff::civil::Weekday::Wednesday,
            Self::Thursday => jiff::civil::Weekday::Thursday,
            Self::Friday => jiff::civil::Weekday::Friday,
            Self::Saturday => jiff::civil::Weekday::Saturday,
            Self::Sunday => jiff::civil::Weekday::Sunday,
        }
    }
}

impl FromStr for Weekday {
    type Err = TriggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monday" | "mon" => Ok(Self::Monday),
            "tuesday" | "tue" => Ok(Self::Tuesday),
            "wednesday" | "wed" => Ok(Self::Wednesday),
            "thursday" | "thu" => Ok(Self::Thursday),
            "friday" | "fri" => Ok(Self::Friday),
            "saturday" | "sat" => Ok(Self::Saturday),
            "sunday" | "sun" => Ok(Self::Sunday),
            _ => Err(TriggerError::input("unknown weekday", s)),
        }
    }
}

#[cfg(feature = "serde")]
impl Serialize for Weekday {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Weekday {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The working week as a fixed array indexed Monday = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkDays([bool; 7]);

impl WorkDays {
    pub fn new(days: [bool; 7]) -> Self {
        Self(days)
    }

    /// Monday to Friday.
    pub fn weekdays() -> Self {
        Self([true, true, true, true, true, false, false])
    }

    pub fn none() -> Self {
        Self([false; 7])
    }

    pub fn from_days(days: &[Weekday]) -> Self {
        let mut set = [false; 7];
        for day in days {
            set[day.index()] = true;
        }
        Self(set)
    }

    /// Whether the Monday-zero day index is a working day. Wraps modulo 7.
    pub fn contains_index(&self, day: usize) -> bool {
        self.0[day % 7]
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0[day.index()]
    }

    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|&d| d)
    }

    /// Bit mask with bit 0 = Monday.
    pub fn mask(&self) -> u8 {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .fold(0, |m, (i, _)| m | (1 << i))
    }

    pub fn days(&self) -> impl Iterator<Item = Weekday> + '_ {
        Weekday::ALL.into_iter().filter(|d| self.contains(*d))
    }
}

impl FromStr for WorkDays {
    type Err = TriggerError;

    /// Parse a comma-separated weekday list such as `mon,tue,wed`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let days = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<Weekday>, _>>()?;
        Ok(Self::from_days(&days))
    }
}

#[cfg(feature = "serde")]
impl Serialize for WorkDays {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.days())
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for WorkDays {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let days = Vec::<Weekday>::deserialize(deserializer)?;
        Ok(Self::from_days(&days))
    }
}

/// Time of day (hours and minutes). Only built through [`TimeOfDay::new`]
/// and [`TimeOfDay::parse`], so it is always a valid wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self, TriggerError> {
        if hour > 23 || minute > 59 {
            return Err(TriggerError::input(
                "invalid time of day",
                format!("{hour:02}:{minute:02}"),
            ));
        }
        Ok(Self { hour, minute })
    }

    /// Parse `HH:MM`.
    pub fn parse(s: &str) -> Result<Self, TriggerError> {
        let (h, m) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| TriggerError::input("expected HH:MM", s))?;
        let hour = h
            .parse()
            .map_err(|_| TriggerError::input("invalid hour", s))?;
        let minute = m
            .parse()
            .map_err(|_| TriggerError::input("invalid minute", s))?;
        Self::new(hour, minute).map_err(|_| TriggerError::input("invalid time of day", s))
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }

    pub fn to_time(self) -> Time {
        Time::new(self.hour as i8, self.minute as i8, 0, 0).unwrap_or(Time::midnight())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[cfg(feature = "serde")]
impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Resolved working-time settings: the working week and the half-open
/// daily window `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawWorkTimeConfig"))]
pub struct WorkTimeConfig {
    work_days: WorkDays,
    start: TimeOfDay,
    end: TimeOfDay,
}

impl WorkTimeConfig {
    pub fn new(work_days: WorkDays, start: TimeOfDay, end: TimeOfDay) -> Result<Self, TriggerError> {
        if end <= start {
            return Err(TriggerError::config(format!(
                "working day must end after it starts ({start} - {end})"
            )));
        }
        Ok(Self {
            work_days,
            start,
            end,
        })
    }

    pub fn work_days(&self) -> WorkDays {
        self.work_days
    }

    pub fn start_time(&self) -> Time {
        self.start.to_time()
    }

    pub fn end_time(&self) -> Time {
        self.end.to_time()
    }

    /// Start and end of the working day.
    pub fn window(&self) -> (TimeOfDay, TimeOfDay) {
        (self.start, self.end)
    }

    pub fn with_work_days(mut self, work_days: WorkDays) -> Self {
        self.work_days = work_days;
        self
    }

    /// Whether a time of day lies inside the working window.
    pub fn in_hours(&self, time: Time) -> bool {
        time >= self.start_time() && time < self.end_time()
    }

    /// Whether the instant falls on a working day, in the zone it carries.
    pub fn is_work_day(&self, zdt: &Zoned) -> bool {
        self.work_days.contains_index(day_of(zdt))
    }
}

impl Default for WorkTimeConfig {
    /// Monday to Friday, 09:00 to 17:00.
    fn default() -> Self {
        Self {
            work_days: WorkDays::weekdays(),
            start: TimeOfDay { hour: 9, minute: 0 },
            end: TimeOfDay { hour: 17, minute: 0 },
        }
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawWorkTimeConfig {
    work_days: WorkDays,
    start: TimeOfDay,
    end: TimeOfDay,
}

#[cfg(feature = "serde")]
impl TryFrom<RawWorkTimeConfig> for WorkTimeConfig {
    type Error = TriggerError;

    fn try_from(raw: RawWorkTimeConfig) -> Result<Self, Self::Error> {
        Self::new(raw.work_days, raw.start, raw.end)
    }
}

/// Whether an alarm occurrence at `at` satisfies the alarm's working-time
/// and holiday restrictions.
///
/// Date-only occurrences only need to land on a working day.
pub fn is_working_time(
    alarm: &Alarm,
    config: &WorkTimeConfig,
    holidays: &dyn HolidayOracle,
    at: &Zoned,
) -> bool {
    if alarm.work_time_only && !config.is_work_day(at) {
        return false;
    }
    if alarm.holidays_excluded && holidays.is_holiday(at.date()) {
        return false;
    }
    if !alarm.work_time_only {
        return true;
    }
    alarm.date_only || config.in_hours(at.time())
}
