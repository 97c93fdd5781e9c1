//! Billing arithmetic: rounding policy, rate application and aggregation.
//!
//! Every rounded value is computed from raw minutes, never from other rounded
//! values. A source subtotal is converted from the source's own total minutes,
//! so it can differ from the sum of its entry rows in the last digit.

use serde::Serialize;

use crate::record::{BillableEntry, BillableSource, RawEntry, RawSource};

/// Hourly rate used when a report does not set one.
pub const DEFAULT_RATE: f64 = 80.0;

/// Decimal digits kept for hours and cost when a report does not set them.
pub const DEFAULT_ACCURACY: u32 = 3;

/// Accuracy is capped here; `f64` carries no more significant decimal digits.
pub const MAX_ACCURACY: u32 = 15;

#[allow(clippy::cast_possible_wrap)]
fn scale(accuracy: u32) -> f64 {
    10f64.powi(accuracy.min(MAX_ACCURACY) as i32)
}

/// Rounds half away from zero to `accuracy` decimal digits.
fn round_to(value: f64, accuracy: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let scale = scale(accuracy);
    (value * scale).round() / scale
}

/// Converts clocked minutes to billable hours.
#[allow(clippy::cast_precision_loss)]
pub fn hours_from_minutes(minutes: u64, accuracy: u32) -> f64 {
    round_to(minutes as f64 / 60.0, accuracy)
}

/// Prices billable hours. A non-finite rate bills nothing.
pub fn cost_from_hours(hours: f64, rate: f64, accuracy: u32) -> f64 {
    if !rate.is_finite() {
        return 0.0;
    }
    round_to(hours * rate, accuracy)
}

/// Picks the rate a report bills at: the override if it is a number, else
/// the default if it is a number, else 0.
pub fn effective_rate(requested: Option<f64>, default: f64) -> f64 {
    requested
        .filter(|r| r.is_finite())
        .or_else(|| Some(default).filter(|r| r.is_finite()))
        .unwrap_or(0.0)
}

/// Fixed-point rendering with exactly `accuracy` fraction digits.
pub fn format_hours(hours: f64, accuracy: u32) -> String {
    let precision = accuracy.min(MAX_ACCURACY) as usize;
    format!("{hours:.precision$}")
}

/// Currency rendering, always two fraction digits.
pub fn format_currency(cost: f64) -> String {
    format!("${cost:.2}")
}

/// Prices a single clocked entry.
pub fn bill_entry(entry: &RawEntry, rate: f64, accuracy: u32) -> BillableEntry {
    let hours = hours_from_minutes(entry.minutes, accuracy);
    BillableEntry {
        level: entry.level,
        headline: entry.headline.clone(),
        minutes: entry.minutes,
        hours,
        cost: cost_from_hours(hours, rate, accuracy),
        properties: entry.properties.clone(),
    }
}

/// Drops sources with no clocked time and prices the rest, keeping order.
pub fn aggregate(sources: &[RawSource], rate: f64, accuracy: u32) -> Vec<BillableSource> {
    sources
        .iter()
        .filter_map(|source| {
            let total_minutes = source
                .total_minutes
                .filter(|m| *m > 0)
                .and_then(|m| u64::try_from(m).ok())?;
            let total_hours = hours_from_minutes(total_minutes, accuracy);
            Some(BillableSource {
                file: source.file.clone(),
                total_minutes,
                total_hours,
                total_cost: cost_from_hours(total_hours, rate, accuracy),
                entries: source
                    .entries
                    .iter()
                    .map(|entry| bill_entry(entry, rate, accuracy))
                    .collect(),
            })
        })
        .collect()
}

/// Report-wide totals, summed from the per-source subtotals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrandTotals {
    pub minutes: u64,
    pub hours: f64,
    pub cost: f64,
}

impl GrandTotals {
    /// Sums the subtotals. Returns `None` when nothing was clocked.
    ///
    /// The minute count saturates at `u64::MAX`.
    pub fn from_sources(sources: &[BillableSource]) -> Option<Self> {
        let minutes = sources
            .iter()
            .fold(0u64, |acc, s| acc.saturating_add(s.total_minutes));
        if minutes == 0 {
            return None;
        }
        Some(Self {
            minutes,
            hours: sources.iter().map(|s| s.total_hours).sum(),
            cost: sources.iter().map(|s| s.total_cost).sum(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn entry(level: u32, headline: &str, minutes: u64) -> RawEntry {
        RawEntry {
            level,
            headline: headline.to_string(),
            minutes,
            properties: BTreeMap::new(),
        }
    }

    fn source(total: Option<i64>, entries: Vec<RawEntry>) -> RawSource {
        RawSource {
            file: None,
            total_minutes: total,
            entries,
        }
    }

    #[test]
    fn test_known_entry_pricing() {
        let billed = bill_entry(&entry(1, "Design", 95), 80.0, 3);
        assert!((billed.hours - 1.583).abs() < 1e-9);
        assert!((billed.cost - 126.64).abs() < 1e-9);
        assert_eq!(format_currency(billed.cost), "$126.64");
        assert_eq!(format_hours(billed.hours, 3), "1.583");
    }

    #[test]
    fn test_zero_minutes_is_zero_hours() {
        assert!(hours_from_minutes(0, 3).abs() < f64::EPSILON);
        assert_eq!(format_hours(hours_from_minutes(0, 3), 3), "0.000");
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        // 3 minutes = 0.05h, which rounds up at one digit
        assert!((hours_from_minutes(3, 1) - 0.1).abs() < 1e-12);
        // 30 minutes = 0.5h, which rounds up at zero digits
        assert!((hours_from_minutes(30, 0) - 1.0).abs() < 1e-12);
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn test_hours_stay_within_half_unit_of_exact() {
        for accuracy in 0..=6 {
            let unit = 10f64.powi(-i32::try_from(accuracy).unwrap());
            for minutes in (0..2_000).step_by(7) {
                let hours = hours_from_minutes(minutes, accuracy);
                let exact = minutes as f64 / 60.0;
                assert!(
                    (hours - exact).abs() <= unit / 2.0 + 1e-12,
                    "{minutes}m at {accuracy} digits gave {hours}"
                );
                // No digits beyond the requested accuracy
                let scaled = hours / unit;
                assert!((scaled - scaled.round()).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_cost_monotonic_in_hours() {
        let mut previous = 0.0;
        for minutes in 0..600 {
            let cost = cost_from_hours(hours_from_minutes(minutes, 2), 37.5, 2);
            assert!(cost >= previous, "cost dropped at {minutes}m");
            previous = cost;
        }
    }

    #[test]
    fn test_non_finite_rate_bills_nothing() {
        assert!(cost_from_hours(2.0, f64::NAN, 3).abs() < f64::EPSILON);
        assert!(cost_from_hours(2.0, f64::INFINITY, 3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_effective_rate_fallbacks() {
        assert!((effective_rate(Some(120.0), 80.0) - 120.0).abs() < f64::EPSILON);
        assert!((effective_rate(None, 80.0) - 80.0).abs() < f64::EPSILON);
        assert!((effective_rate(Some(f64::NAN), 80.0) - 80.0).abs() < f64::EPSILON);
        assert!(effective_rate(None, f64::NAN).abs() < f64::EPSILON);
    }

    #[test]
    fn test_format_hours_pads_digits() {
        assert_eq!(format_hours(1.5, 3), "1.500");
        assert_eq!(format_hours(1.5, 0), "2");
        assert_eq!(format_currency(3.0), "$3.00");
    }

    #[test]
    fn test_aggregate_drops_empty_sources() {
        let sources = vec![
            source(Some(60), vec![entry(1, "a", 60)]),
            source(Some(0), vec![entry(1, "b", 0)]),
            source(Some(30), vec![entry(1, "c", 30)]),
            source(None, vec![]),
            source(Some(-15), vec![]),
        ];
        let billed = aggregate(&sources, 80.0, 3);

        assert_eq!(billed.len(), 2);
        assert_eq!(billed[0].entries[0].headline, "a");
        assert_eq!(billed[1].entries[0].headline, "c");
    }

    #[test]
    fn test_aggregate_empty_input() {
        assert!(aggregate(&[], 80.0, 3).is_empty());
    }

    #[test]
    fn test_subtotal_converts_source_minutes() {
        // Two 10-minute rows round to 0.167h each, but 20 minutes is 0.333h.
        let sources = vec![source(
            Some(20),
            vec![entry(1, "a", 10), entry(1, "b", 10)],
        )];
        let billed = aggregate(&sources, 60.0, 3);

        let entry_sum: f64 = billed[0].entries.iter().map(|e| e.hours).sum();
        assert!((entry_sum - 0.334).abs() < 1e-9);
        assert!((billed[0].total_hours - 0.333).abs() < 1e-9);
        assert!((billed[0].total_cost - 19.98).abs() < 1e-9);
    }

    #[test]
    fn test_grand_totals_sum_sources() {
        let sources = vec![
            source(Some(95), vec![entry(1, "a", 95)]),
            source(Some(0), vec![]),
            source(Some(45), vec![entry(1, "b", 45)]),
        ];
        let billed = aggregate(&sources, 80.0, 3);
        let totals = GrandTotals::from_sources(&billed).unwrap();

        assert_eq!(totals.minutes, 140);
        assert!((totals.hours - (1.583 + 0.75)).abs() < 1e-9);
        assert!((totals.cost - (126.64 + 60.0)).abs() < 1e-9);
    }

    #[test]
    fn test_grand_totals_saturate_minutes() {
        let sources = vec![
            source(Some(i64::MAX), vec![]),
            source(Some(i64::MAX), vec![]),
            source(Some(i64::MAX), vec![]),
        ];
        let billed = aggregate(&sources, 80.0, 0);
        let totals = GrandTotals::from_sources(&billed).unwrap();

        assert_eq!(totals.minutes, u64::MAX);
        assert!(totals.hours.is_finite());
    }

    #[test]
    fn test_grand_totals_none_when_nothing_clocked() {
        assert!(GrandTotals::from_sources(&[]).is_none());
    }
}
