use std::fmt;

/// Errors produced while building or decoding scheduling inputs.
///
/// Trigger computation itself never fails: a search that finds nothing
/// returns `None`. These errors only come from validating alarms and
/// configuration before they reach the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TriggerError {
    /// An alarm definition is inconsistent (zero interval, bad day number, ...).
    Alarm { message: String },

    /// Working-hours or holiday configuration is unusable.
    Config { message: String },

    /// A time zone could not be resolved or its transitions enumerated.
    TimeZone { message: String },

    /// Textual input (times, dates, weekday lists, JSON) could not be decoded.
    Input { message: String, input: String },
}

impl fmt::Display for TriggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alarm { message } => write!(f, "invalid alarm: {message}"),
            Self::Config { message } => write!(f, "invalid configuration: {message}"),
            Self::TimeZone { message } => write!(f, "time zone error: {message}"),
            Self::Input { message, input } => write!(f, "{message}: '{input}'"),
        }
    }
}

impl std::error::Error for TriggerError {}

impl TriggerError {
    pub fn alarm(message: impl Into<String>) -> Self {
        Self::Alarm {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn time_zone(message: impl Into<String>) -> Self {
        Self::TimeZone {
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>, input: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            input: input.into(),
        }
    }

    /// Format the error for terminal output, prefixed like a compiler diagnostic.
    pub fn display_rich(&self) -> String {
        match self {
            Self::Input { message, input } => {
                format!("error: {message}\n  {input}\n  {}", "^".repeat(input.len().max(1)))
            }
            other => format!("error: {other}"),
        }
    }
}
