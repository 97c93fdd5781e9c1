//! Date ranges named by the `block` option, used in report captions.

use chrono::{Datelike, Duration, Months, NaiveDate};

/// A half-open `[start, end)` range of days with its caption text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Span {
    Day,
    Week,
    Month,
    Year,
}

/// Resolves a block keyword or explicit date against `today`.
///
/// `wstart` is the first day of the week (1 = Monday .. 7 = Sunday) and
/// `mstart` the first day of the month; out-of-range values fall back to 1.
/// Returns `None` for blocks this tool does not understand.
pub fn resolve_block(block: &str, today: NaiveDate, wstart: u32, mstart: u32) -> Option<DateRange> {
    let wstart = if (1..=7).contains(&wstart) { wstart } else { 1 };
    // Day 29 and later don't exist in every month
    let mstart = if (1..=28).contains(&mstart) { mstart } else { 1 };

    let (span, start) = match block {
        "today" => (Span::Day, today),
        "yesterday" => (Span::Day, today - Duration::days(1)),
        "thisweek" => (Span::Week, week_start(today, wstart)),
        "lastweek" => (Span::Week, week_start(today, wstart) - Duration::days(7)),
        "thismonth" => (Span::Month, month_start(today, mstart)?),
        "lastmonth" => (
            Span::Month,
            month_start(today, mstart)?.checked_sub_months(Months::new(1))?,
        ),
        "thisyear" => (Span::Year, NaiveDate::from_ymd_opt(today.year(), 1, 1)?),
        "lastyear" => (Span::Year, NaiveDate::from_ymd_opt(today.year() - 1, 1, 1)?),
        explicit => explicit_block(explicit)?,
    };

    let end = match span {
        Span::Day => start + Duration::days(1),
        Span::Week => start + Duration::days(7),
        Span::Month => start.checked_add_months(Months::new(1))?,
        Span::Year => start.checked_add_months(Months::new(12))?,
    };

    let description = match span {
        Span::Day => start.format("%A, %B %d, %Y").to_string(),
        Span::Week => start.format("week %V").to_string(),
        Span::Month => start.format("%B %Y").to_string(),
        Span::Year => start.format("the year %Y").to_string(),
    };

    Some(DateRange {
        start,
        end,
        description,
    })
}

/// Start of the week containing `today`.
fn week_start(today: NaiveDate, wstart: u32) -> NaiveDate {
    let days_since_start = (today.weekday().number_from_monday() + 7 - wstart) % 7;
    today - Duration::days(i64::from(days_since_start))
}

/// Start of the billing month containing `today`.
fn month_start(today: NaiveDate, mstart: u32) -> Option<NaiveDate> {
    let anchor = today.with_day(mstart)?;
    if today.day() >= mstart {
        Some(anchor)
    } else {
        anchor.checked_sub_months(Months::new(1))
    }
}

/// `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
fn explicit_block(block: &str) -> Option<(Span, NaiveDate)> {
    let parts: Vec<&str> = block.split('-').collect();
    let numbers: Vec<u32> = parts
        .iter()
        .map(|p| p.parse().ok())
        .collect::<Option<_>>()?;
    let year = i32::try_from(*numbers.first()?).ok()?;

    match numbers.as_slice() {
        [_] if parts[0].len() == 4 => Some((Span::Year, NaiveDate::from_ymd_opt(year, 1, 1)?)),
        [_, month] => Some((Span::Month, NaiveDate::from_ymd_opt(year, *month, 1)?)),
        [_, month, day] => Some((Span::Day, NaiveDate::from_ymd_opt(year, *month, *day)?)),
        _ => None,
    }
}
