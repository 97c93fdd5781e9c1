//! Invoice table assembly.
//!
//! [`build_report`] runs the whole pipeline: option parsing, rate and accuracy
//! resolution, aggregation and rendering. The text is complete before anything
//! is written, so a configuration error never leaves partial output behind.

use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::billing::{
    self, DEFAULT_ACCURACY, DEFAULT_RATE, GrandTotals, effective_rate, format_currency,
    hours_from_minutes,
};
use crate::display::TimeDisplay;
use crate::duration::parse_duration;
use crate::options::{ColumnSchema, InvoiceConfig, OptionalColumn, caption_phrase};
use crate::record::{BillableEntry, BillableSource, RawSource};

/// Marker repeated once per outline level below the top.
pub const INDENT_MARKER: char = '-';

/// Row separator emitted before each top-level group.
pub const ROW_SEPARATOR: &str = "|-";

/// Report construction errors.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The `formula` option was set to something other than a string.
    #[error("invalid invoice option: formula must be a string, got {found}")]
    FormulaNotString { found: String },
    /// A block parameter line could not be tokenized.
    #[error("invalid block parameters: {0}")]
    InvalidParams(String),
    /// Writing the finished report failed.
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything a report needs from outside the option map.
#[derive(Debug, Clone)]
pub struct ReportContext {
    /// Timestamp shown in the generated caption.
    pub generated_at: NaiveDateTime,
    /// Human-readable description of the clocked date range, if any.
    pub range: Option<String>,
    pub default_rate: f64,
    pub default_accuracy: u32,
    /// Mode used when the options do not set `timeDisplay`.
    pub time_display: TimeDisplay,
}

impl ReportContext {
    pub fn new(generated_at: NaiveDateTime) -> Self {
        Self {
            generated_at,
            range: None,
            default_rate: DEFAULT_RATE,
            default_accuracy: DEFAULT_ACCURACY,
            time_display: TimeDisplay::default(),
        }
    }
}

/// Follow-up work the host should do after inserting the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostRequests {
    /// Re-align the table columns.
    pub align: bool,
    /// Recalculate the table formula.
    pub recalculate: bool,
}

/// A rendered invoice report.
#[derive(Debug, Clone)]
pub struct Report {
    pub text: String,
    pub requests: HostRequests,
    pub rate: f64,
    pub accuracy: u32,
    pub sources: Vec<BillableSource>,
    pub totals: Option<GrandTotals>,
}

/// Parses `options`, prices `sources` and renders the invoice table.
pub fn build_report(
    sources: &[RawSource],
    options: &Map<String, Value>,
    ctx: &ReportContext,
) -> Result<Report, ReportError> {
    let config = InvoiceConfig::from_options(options)?;
    Ok(build_from_config(sources, &config, ctx))
}

/// Prices `sources` and renders the table for already-validated options.
pub fn build_from_config(
    sources: &[RawSource],
    config: &InvoiceConfig,
    ctx: &ReportContext,
) -> Report {
    let rate = effective_rate(config.rate, ctx.default_rate);
    let accuracy = config.accuracy.unwrap_or(ctx.default_accuracy);

    let billable = billing::aggregate(sources, rate, accuracy);
    tracing::debug!(
        sources = sources.len(),
        billable = billable.len(),
        rate,
        accuracy,
        "aggregated clock sources"
    );

    assemble(billable, config, rate, accuracy, ctx)
}

/// Renders already-priced sources.
pub fn assemble(
    sources: Vec<BillableSource>,
    config: &InvoiceConfig,
    rate: f64,
    accuracy: u32,
    ctx: &ReportContext,
) -> Report {
    let renderer = RowRenderer {
        columns: config.columns(),
        mode: config.time_display.unwrap_or(ctx.time_display),
        emphasize: config.emphasize,
        accuracy,
    };

    let mut text = String::new();
    push_line(&mut text, &caption(config, ctx));
    push_row(&mut text, renderer.columns.headers());

    let totals = GrandTotals::from_sources(&sources);
    if let Some(totals) = totals {
        for entry in sources.iter().flat_map(|s| &s.entries) {
            if entry.level <= 1 {
                push_line(&mut text, ROW_SEPARATOR);
            }
            push_row(&mut text, renderer.entry_row(entry));
        }
        push_row(&mut text, renderer.totals_row(&totals));
    } else {
        tracing::debug!("no billable time, emitting header only");
    }

    if let Some(formula) = &config.formula {
        push_line(&mut text, &format!("#+TBLFM: {formula}"));
    }

    Report {
        text,
        requests: HostRequests {
            align: true,
            recalculate: config.formula.is_some(),
        },
        rate,
        accuracy,
        sources,
        totals,
    }
}

/// Writes the finished report to `writer`.
pub fn write_report<W: std::io::Write>(writer: &mut W, report: &Report) -> Result<(), ReportError> {
    writer.write_all(report.text.as_bytes())?;
    Ok(())
}

/// Splices the report into `document` at byte `position`.
///
/// Positions past the end append; positions inside a multi-byte character
/// move back to the start of that character. Returns the insertion offset.
pub fn insert_report(document: &mut String, position: usize, report: &Report) -> usize {
    let mut at = position.min(document.len());
    while !document.is_char_boundary(at) {
        at -= 1;
    }
    document.insert_str(at, &report.text);
    at
}

fn caption(config: &InvoiceConfig, ctx: &ReportContext) -> String {
    if let Some(header) = &config.header {
        return header.trim_end_matches('\n').to_string();
    }
    let phrase = caption_phrase(config.lang.as_deref());
    let stamp = ctx.generated_at.format("[%Y-%m-%d %a %H:%M]");
    match &ctx.range {
        Some(range) => format!("#+CAPTION: {phrase} {stamp}, for {range}."),
        None => format!("#+CAPTION: {phrase} {stamp}"),
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

fn push_row<S: AsRef<str>>(out: &mut String, cells: impl IntoIterator<Item = S>) {
    out.push('|');
    for cell in cells {
        out.push(' ');
        out.push_str(cell.as_ref());
        out.push_str(" |");
    }
    out.push('\n');
}

fn bold(text: &str) -> String {
    format!("*{text}*")
}

fn emphasized(text: String, strong: bool) -> String {
    if strong { bold(&text) } else { text }
}

struct RowRenderer {
    columns: ColumnSchema,
    mode: TimeDisplay,
    emphasize: bool,
    accuracy: u32,
}

impl RowRenderer {
    fn entry_row(&self, entry: &BillableEntry) -> Vec<String> {
        let strong = self.emphasize && entry.level <= 1;
        let mut cells = Vec::with_capacity(5);

        let indent = indent(entry.level);
        cells.push(emphasized(format!("{indent}{}", entry.headline), strong));

        if self.columns.contains(OptionalColumn::Effort) {
            cells.push(self.effort_cell(entry));
        }

        cells.push(emphasized(
            self.mode.render(entry.minutes, entry.hours, self.accuracy),
            strong,
        ));
        cells.push(emphasized(format_currency(entry.cost), strong));

        if self.columns.contains(OptionalColumn::Comment) {
            cells.push(
                entry
                    .properties
                    .get(OptionalColumn::Comment.property())
                    .cloned()
                    .unwrap_or_default(),
            );
        }

        cells
    }

    fn effort_cell(&self, entry: &BillableEntry) -> String {
        let Some(raw) = entry.properties.get(OptionalColumn::Effort.property()) else {
            return String::new();
        };
        let minutes = parse_duration(raw).unwrap_or_else(|| {
            tracing::warn!(headline = %entry.headline, effort = %raw, "unreadable effort, using 0");
            0
        });
        let hours = hours_from_minutes(minutes, self.accuracy);
        bold(&self.mode.render(minutes, hours, self.accuracy))
    }

    fn totals_row(&self, totals: &GrandTotals) -> Vec<String> {
        let mut cells = vec![emphasized("Totals".to_string(), self.emphasize)];
        if self.columns.contains(OptionalColumn::Effort) {
            cells.push(String::new());
        }
        cells.push(emphasized(
            self.mode.render(totals.minutes, totals.hours, self.accuracy),
            self.emphasize,
        ));
        cells.push(emphasized(format_currency(totals.cost), self.emphasize));
        if self.columns.contains(OptionalColumn::Comment) {
            cells.push(String::new());
        }
        cells
    }
}

fn indent(level: u32) -> String {
    if level <= 1 {
        return String::new();
    }
    let depth = usize::try_from(level - 1).unwrap_or(0);
    let mut prefix = INDENT_MARKER.to_string().repeat(depth);
    prefix.push(' ');
    prefix
}
