//! Holiday predicates consumed by the scheduler.

use std::collections::BTreeSet;
use std::str::FromStr;

use jiff::civil::Date;

use crate::error::TriggerError;

/// Answers whether a civil date is a holiday.
pub trait HolidayOracle {
    fn is_holiday(&self, date: Date) -> bool;
}

/// No date is ever a holiday.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHolidays;

impl HolidayOracle for NoHolidays {
    fn is_holiday(&self, _date: Date) -> bool {
        false
    }
}

impl<F> HolidayOracle for F
where
    F: Fn(Date) -> bool,
{
    fn is_holiday(&self, date: Date) -> bool {
        self(date)
    }
}

/// A holiday calendar made of one-off dates and dates recurring every year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HolidaySet {
    #[cfg_attr(feature = "serde", serde(default))]
    dates: BTreeSet<Date>,
    /// (month, day) pairs matched in every year.
    #[cfg_attr(feature = "serde", serde(default))]
    annual: BTreeSet<(i8, i8)>,
}

impl HolidaySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date(mut self, date: Date) -> Self {
        self.dates.insert(date);
        self
    }

    /// Add a holiday falling on the same month and day every year.
    pub fn with_annual(mut self, month: i8, day: i8) -> Self {
        self.annual.insert((month, day));
        self
    }

    pub fn insert(&mut self, holiday: HolidaySpec) {
        match holiday {
            HolidaySpec::Date(date) => {
                self.dates.insert(date);
            }
            HolidaySpec::Annual { month, day } => {
                self.annual.insert((month, day));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() && self.annual.is_empty()
    }
}

impl HolidayOracle for HolidaySet {
    fn is_holiday(&self, date: Date) -> bool {
        self.dates.contains(&date) || self.annual.contains(&(date.month(), date.day()))
    }
}

impl Extend<HolidaySpec> for HolidaySet {
    fn extend<I: IntoIterator<Item = HolidaySpec>>(&mut self, iter: I) {
        for holiday in iter {
            self.insert(holiday);
        }
    }
}

/// A single holiday as written on the command line or in settings:
/// either an ISO date (`2026-12-25`) or a recurring `dec 25`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HolidaySpec {
    Date(Date),
    Annual { month: i8, day: i8 },
}

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

impl FromStr for HolidaySpec {
    type Err = TriggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(date) = trimmed.parse::<Date>() {
            return Ok(Self::Date(date));
        }
        let (month, day) = trimmed
            .split_once(' ')
            .ok_or_else(|| TriggerError::input("expected YYYY-MM-DD or '<month> <day>'", s))?;
        let month = month.to_lowercase();
        let month = MONTHS
            .iter()
            .position(|m| month.starts_with(m))
            .ok_or_else(|| TriggerError::input("unknown month", s))?;
        let day: i8 = day
            .trim()
            .parse()
            .map_err(|_| TriggerError::input("invalid day", s))?;
        // 2024 is a leap year, so feb 29 is accepted.
        Date::new(2024, month as i8 + 1, day).map_err(|_| TriggerError::input("invalid day", s))?;
        Ok(Self::Annual {
            month: month as i8 + 1,
            day,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    #[test]
    fn set_matches_dates_and_annual() {
        let set = HolidaySet::new()
            .with_date(date(2026, 4, 3))
            .with_annual(12, 25);
        assert!(set.is_holiday(date(2026, 4, 3)));
        assert!(!set.is_holiday(date(2027, 4, 3)));
        assert!(set.is_holiday(date(2031, 12, 25)));
        assert!(!set.is_holiday(date(2031, 12, 24)));
    }

    #[test]
    fn closures_are_oracles() {
        let fridays = |d: Date| d.weekday() == jiff::civil::Weekday::Friday;
        assert!(fridays.is_holiday(date(2026, 1, 9)));
        assert!(!NoHolidays.is_holiday(date(2026, 1, 9)));
    }

    #[test]
    fn parse_specs() {
        assert_eq!(
            "2026-12-25".parse::<HolidaySpec>().unwrap(),
            HolidaySpec::Date(date(2026, 12, 25))
        );
        assert_eq!(
            "Dec 26".parse::<HolidaySpec>().unwrap(),
            HolidaySpec::Annual { month: 12, day: 26 }
        );
        assert_eq!(
            "february 29".parse::<HolidaySpec>().unwrap(),
            HolidaySpec::Annual { month: 2, day: 29 }
        );
        assert!("feb 30".parse::<HolidaySpec>().is_err());
        assert!("someday".parse::<HolidaySpec>().is_err());
    }

    #[test]
    fn extend_from_specs() {
        let mut set = HolidaySet::new();
        set.extend(["2026-01-01", "jul 4"].iter().map(|s| s.parse().unwrap()));
        assert!(set.is_holiday(date(2026, 1, 1)));
        assert!(set.is_holiday(date(2030, 7, 4)));
    }
}
