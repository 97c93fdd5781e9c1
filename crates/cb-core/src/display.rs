//! How time cells are rendered, and the per-context toggle that switches it.
//!
//! [`DisplayModes`] is the only state that outlives a single report. Report
//! assembly only reads it; the toggle command is its only writer.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::billing::format_hours;
use crate::duration::format_duration;

/// Rendering of time cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeDisplay {
    /// Decimal billable hours, e.g. `1.583`.
    #[default]
    Hours,
    /// Raw clocked duration, e.g. `1:35`.
    Duration,
}

impl TimeDisplay {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hours => "hours",
            Self::Duration => "duration",
        }
    }

    /// The other mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Hours => Self::Duration,
            Self::Duration => Self::Hours,
        }
    }

    /// Renders a (minutes, rounded hours) pair.
    pub fn render(self, minutes: u64, hours: f64, accuracy: u32) -> String {
        match self {
            Self::Hours => format_hours(hours, accuracy),
            Self::Duration => format_duration(minutes),
        }
    }
}

impl fmt::Display for TimeDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimeDisplay {
    type Err = UnknownTimeDisplay;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hours" => Ok(Self::Hours),
            "duration" => Ok(Self::Duration),
            _ => Err(UnknownTimeDisplay(s.to_string())),
        }
    }
}

/// Error type for unknown time display strings.
#[derive(Debug, Clone)]
pub struct UnknownTimeDisplay(String);

impl fmt::Display for UnknownTimeDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown time display: {} (expected hours or duration)", self.0)
    }
}

impl std::error::Error for UnknownTimeDisplay {}

/// Toggled display modes keyed by editing context.
///
/// A context with no recorded toggle uses the caller's default, so toggling
/// in one context never changes another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayModes {
    #[serde(default)]
    contexts: BTreeMap<String, TimeDisplay>,
}

impl DisplayModes {
    /// The recorded mode for `context`, if it was ever toggled.
    pub fn get(&self, context: &str) -> Option<TimeDisplay> {
        self.contexts.get(context).copied()
    }

    /// The mode for `context`, falling back to `default`.
    pub fn resolve(&self, context: &str, default: TimeDisplay) -> TimeDisplay {
        self.get(context).unwrap_or(default)
    }

    /// Flips the mode for `context` and returns the new mode.
    pub fn toggle(&mut self, context: &str, default: TimeDisplay) -> TimeDisplay {
        let next = self.resolve(context, default).toggled();
        self.contexts.insert(context.to_string(), next);
        next
    }

    /// Recorded contexts in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, TimeDisplay)> {
        self.contexts.iter().map(|(name, mode)| (name.as_str(), *mode))
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_hours_and_duration() {
        assert_eq!(TimeDisplay::Hours.render(95, 1.583, 3), "1.583");
        assert_eq!(TimeDisplay::Duration.render(95, 1.583, 3), "1:35");
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("hours".parse::<TimeDisplay>().unwrap(), TimeDisplay::Hours);
        assert_eq!(
            "duration".parse::<TimeDisplay>().unwrap(),
            TimeDisplay::Duration
        );
        assert!("minutes".parse::<TimeDisplay>().is_err());
        assert_eq!(TimeDisplay::Duration.to_string(), "duration");
    }

    #[test]
    fn test_toggle_twice_restores_rendering() {
        let mut modes = DisplayModes::default();
        let before = modes.resolve("invoice.org", TimeDisplay::Hours);

        modes.toggle("invoice.org", TimeDisplay::Hours);
        let after = modes.toggle("invoice.org", TimeDisplay::Hours);

        assert_eq!(before, after);
        assert_eq!(before.render(95, 1.583, 3), after.render(95, 1.583, 3));
    }

    #[test]
    fn test_toggle_does_not_leak_across_contexts() {
        let mut modes = DisplayModes::default();
        assert_eq!(
            modes.toggle("a.org", TimeDisplay::Hours),
            TimeDisplay::Duration
        );

        assert_eq!(modes.resolve("a.org", TimeDisplay::Hours), TimeDisplay::Duration);
        assert_eq!(modes.resolve("b.org", TimeDisplay::Hours), TimeDisplay::Hours);
        assert_eq!(modes.get("b.org"), None);
    }

    #[test]
    fn test_modes_serialize_by_name() {
        let mut modes = DisplayModes::default();
        modes.toggle("a.org", TimeDisplay::Hours);

        let json = serde_json::to_string(&modes).unwrap();
        assert_eq!(json, r#"{"contexts":{"a.org":"duration"}}"#);

        let parsed: DisplayModes = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, modes);
    }
}
