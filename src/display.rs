use std::fmt;

use crate::recurrence::{DayPos, Interval, RecurrenceKind, Repetition, Rule};
use crate::trigger::{TriggerKind, TriggerSet};
use crate::worktime::{WorkDays, WorkTimeConfig, Weekday};

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for WorkDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        for (i, day) in self.days().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(day.short())?;
        }
        Ok(())
    }
}

impl fmt::Display for WorkTimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start, end) = self.window();
        write!(f, "{} {start}-{end}", self.work_days())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Interval::Minutes(m) if m % 60 == 0 => plural(f, (m / 60) as i64, "hour"),
            Interval::Minutes(m) => plural(f, m as i64, "minute"),
            Interval::Days(d) if d % 7 == 0 => plural(f, (d / 7) as i64, "week"),
            Interval::Days(d) => plural(f, d as i64, "day"),
        }
    }
}

impl fmt::Display for Repetition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} times every {}", self.count, self.interval)
    }
}

impl fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecurrenceKind::None => "none",
            RecurrenceKind::Minutely => "minutely",
            RecurrenceKind::Daily => "daily",
            RecurrenceKind::Weekly => "weekly",
            RecurrenceKind::MonthlyByDay => "monthly by day",
            RecurrenceKind::MonthlyByPos => "monthly by position",
            RecurrenceKind::AnnualByDate => "annual by date",
            RecurrenceKind::AnnualByPos => "annual by position",
        })
    }
}

impl fmt::Display for DayPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ordinal {
            0 => write!(f, "every {}", self.weekday),
            -1 => write!(f, "last {}", self.weekday),
            n if n < 0 => write!(f, "{} last {}", ordinal(-(n as i64)), self.weekday),
            n => write!(f, "{} {}", ordinal(n as i64), self.weekday),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Minutely { every } => every_unit(f, *every, "minute"),
            Rule::Daily { every } => every_unit(f, *every, "day"),
            Rule::Weekly { every, days } => {
                every_unit(f, *every, "week")?;
                if !days.is_empty() {
                    f.write_str(" on ")?;
                    list(f, days)?;
                }
                Ok(())
            }
            Rule::MonthlyByDay { every, days } => {
                every_unit(f, *every, "month")?;
                if !days.is_empty() {
                    f.write_str(" on the ")?;
                    let days: Vec<String> = days.iter().map(|d| day_of_month(*d)).collect();
                    list(f, &days)?;
                }
                Ok(())
            }
            Rule::MonthlyByPos { every, positions } => {
                every_unit(f, *every, "month")?;
                f.write_str(" on the ")?;
                list(f, positions)
            }
            Rule::AnnualByDate { every, months, day } => {
                every_unit(f, *every, "year")?;
                write!(f, " on the {}", day_of_month(*day))?;
                in_months(f, months)
            }
            Rule::AnnualByPos {
                every,
                months,
                positions,
            } => {
                every_unit(f, *every, "year")?;
                f.write_str(" on the ")?;
                list(f, positions)?;
                in_months(f, months)
            }
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TriggerKind::Main => "main",
            TriggerKind::All => "all",
            TriggerKind::MainWork => "main_work",
            TriggerKind::AllWork => "all_work",
            TriggerKind::Display => "display",
        })
    }
}

impl fmt::Display for TriggerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds = [
            TriggerKind::Main,
            TriggerKind::All,
            TriggerKind::MainWork,
            TriggerKind::AllWork,
        ];
        for (i, kind) in kinds.into_iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match self.get(kind) {
                Some(at) => write!(f, "{:<9} {at}", kind.to_string())?,
                None => write!(f, "{:<9} none", kind.to_string())?,
            }
        }
        Ok(())
    }
}

fn every_unit(f: &mut fmt::Formatter<'_>, every: u32, unit: &str) -> fmt::Result {
    if every == 1 {
        write!(f, "every {unit}")
    } else {
        write!(f, "every {every} {unit}s")
    }
}

fn plural(f: &mut fmt::Formatter<'_>, n: i64, unit: &str) -> fmt::Result {
    if n == 1 {
        write!(f, "1 {unit}")
    } else {
        write!(f, "{n} {unit}s")
    }
}

fn list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn in_months(f: &mut fmt::Formatter<'_>, months: &[i8]) -> fmt::Result {
    const NAMES: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    if months.is_empty() {
        return Ok(());
    }
    f.write_str(" of ")?;
    let names: Vec<&str> = months
        .iter()
        .filter_map(|m| NAMES.get((*m as usize).wrapping_sub(1)).copied())
        .collect();
    list(f, &names)
}

fn day_of_month(day: i8) -> String {
    match day {
        -1 => "last day".to_string(),
        d if d < 0 => format!("{} last day", ordinal(-(d as i64))),
        d => ordinal(d as i64),
    }
}

fn ordinal(n: i64) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}
