//! UTC offset transition tables.

use jiff::tz::TimeZone;
use jiff::{Span, Timestamp, Zoned};

use crate::error::TriggerError;

/// Ordered UTC instants at which a zone's offset changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TzTransitions {
    instants: Vec<Timestamp>,
}

impl TzTransitions {
    /// Build from an arbitrary list of instants; sorted and deduplicated.
    pub fn new(mut instants: Vec<Timestamp>) -> Self {
        instants.sort();
        instants.dedup();
        Self { instants }
    }

    /// No transitions: a fixed-offset zone.
    pub fn none() -> Self {
        Self::default()
    }

    /// Transitions of `tz` strictly after `from` and up to `years` later.
    pub fn for_zone(tz: &TimeZone, from: &Zoned, years: i64) -> Result<Self, TriggerError> {
        let until = from
            .checked_add(Span::new().years(years))
            .map_err(|e| TriggerError::time_zone(format!("cannot bound transition table: {e}")))?
            .timestamp();
        let instants = tz
            .following(from.timestamp())
            .map(|t| t.timestamp())
            .take_while(|ts| *ts <= until)
            .collect();
        Ok(Self { instants })
    }

    /// Index of the last transition at or before `at`.
    pub fn transition_index(&self, at: Timestamp) -> Option<usize> {
        self.instants.partition_point(|t| *t <= at).checked_sub(1)
    }

    /// Index of the first transition strictly after `at`.
    pub fn next_index(&self, at: Timestamp) -> Option<usize> {
        let i = self.instants.partition_point(|t| *t <= at);
        (i < self.instants.len()).then_some(i)
    }

    pub fn get(&self, index: usize) -> Option<Timestamp> {
        self.instants.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.instants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Timestamp> + '_ {
        self.instants.iter().copied()
    }
}

impl FromIterator<Timestamp> for TzTransitions {
    fn from_iter<I: IntoIterator<Item = Timestamp>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
