//! Clock-style duration strings.

use std::sync::LazyLock;

use regex::Regex;

/// `H:MM` or `H:MM:SS`.
static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):([0-5]\d)(?::([0-5]\d))?$").unwrap());

/// One or more `<number><unit>` terms, e.g. `1d 2h 30min`.
static UNITS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+(?:\.\d+)?\s*(?:min|h|d|w|m|y)\s*)+$").unwrap()
});

static UNIT_TERM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(min|h|d|w|m|y)").unwrap());

static PLAIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)?$").unwrap());

/// Minutes per duration unit.
fn unit_minutes(unit: &str) -> f64 {
    match unit {
        "h" => 60.0,
        "d" => 1_440.0,
        "w" => 10_080.0,
        "m" => 43_200.0,
        "y" => 525_960.0,
        _ => 1.0,
    }
}

/// Formats minutes as `H:MM`.
pub fn format_duration(minutes: u64) -> String {
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

/// Parses an effort-style duration into whole minutes.
///
/// Accepts `H:MM`, `H:MM:SS`, unit terms (`1h 30min`, `2d`, `1.5h`) and bare
/// numbers, which count minutes. Returns `None` for anything else.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn parse_duration(s: &str) -> Option<u64> {
    let s = s.trim();

    let minutes = if let Some(caps) = CLOCK_RE.captures(s) {
        let hours: f64 = caps[1].parse().ok()?;
        let mins: f64 = caps[2].parse().ok()?;
        let secs: f64 = caps.get(3).map_or(Ok(0.0), |m| m.as_str().parse()).ok()?;
        hours * 60.0 + mins + secs / 60.0
    } else if UNITS_RE.is_match(s) {
        UNIT_TERM_RE
            .captures_iter(s)
            .map(|caps| {
                let n: f64 = caps[1].parse().unwrap_or(0.0);
                n * unit_minutes(&caps[2])
            })
            .sum()
    } else if PLAIN_RE.is_match(s) {
        s.parse().ok()?
    } else {
        return None;
    };

    (minutes.is_finite() && minutes < u64::MAX as f64).then(|| minutes.round() as u64)
}
