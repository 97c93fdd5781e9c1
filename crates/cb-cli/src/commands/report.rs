//! Report command for rendering invoice tables.
//!
//! This module implements `cb report`: it loads clock data and options,
//! resolves the caption date range and display mode, builds the table and
//! either prints it, splices it into a file, or prints JSON.

use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use cb_core::report::{insert_report, write_report};
use cb_core::{
    BillableSource, GrandTotals, InvoiceConfig, RawSource, Report, ReportContext,
    build_from_config, parse_params,
};
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::align::align_tables;
use crate::cli::ReportArgs;
use crate::range::{DateRange, resolve_block};
use crate::{Config, state};

/// A built report plus the host-side details that went into it.
#[derive(Debug)]
pub struct Rendered {
    pub generated_at: NaiveDateTime,
    pub range: Option<DateRange>,
    pub report: Report,
}

// ========== Input ==========

/// Reads clock sources from a JSON file, or stdin for `-`.
pub fn load_sources(path: &Path) -> Result<Vec<RawSource>> {
    let content = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read clock data from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&content).context("failed to parse clock data")
}

/// Collects invoice options from `--options` or `--params`.
pub fn load_options(args: &ReportArgs) -> Result<Map<String, Value>> {
    if let Some(json) = &args.render.options {
        let value: Value = serde_json::from_str(json).context("failed to parse --options")?;
        let Value::Object(map) = value else {
            bail!("--options must be a JSON object");
        };
        return Ok(map);
    }
    if let Some(line) = &args.render.params {
        return Ok(parse_params(line)?);
    }
    Ok(Map::new())
}

// ========== Report Generation ==========

/// Builds the report for `args` as of `now`.
///
/// Fails before producing any text if the options are invalid.
pub fn generate(args: &ReportArgs, config: &Config, now: NaiveDateTime) -> Result<Rendered> {
    let options = load_options(args)?;
    let invoice = InvoiceConfig::from_options(&options)?;
    let sources = load_sources(&args.input)?;

    let modes = state::load_display_modes(&config.state_path)?;
    let time_display = modes.resolve(&args.context, config.time_display);

    let range = invoice.block.as_deref().and_then(|block| {
        let range = resolve_block(
            block,
            now.date(),
            invoice.wstart.unwrap_or(1),
            invoice.mstart.unwrap_or(1),
        );
        if range.is_none() {
            tracing::warn!(block, "unrecognized block, caption has no date range");
        }
        range
    });

    let ctx = ReportContext {
        generated_at: now,
        range: range.as_ref().map(|r| r.description.clone()),
        default_rate: config.default_rate,
        default_accuracy: config.default_accuracy,
        time_display,
    };

    let mut report = build_from_config(&sources, &invoice, &ctx);
    if report.requests.align && !args.render.no_align {
        report.text = align_tables(&report.text);
    }

    Ok(Rendered {
        generated_at: now,
        range,
        report,
    })
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub generated_at: String,
    pub rate: f64,
    pub accuracy: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<JsonPeriod>,
    pub sources: &'a [BillableSource],
    pub totals: Option<GrandTotals>,
}

#[derive(Debug, Serialize)]
pub struct JsonPeriod {
    pub start: String,
    pub end: String,
    pub description: String,
}

/// Formats report data as JSON.
pub fn format_report_json(rendered: &Rendered) -> Result<String> {
    let report = &rendered.report;
    let json = JsonReport {
        generated_at: rendered.generated_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
        rate: report.rate,
        accuracy: report.accuracy,
        period: rendered.range.as_ref().map(|r| JsonPeriod {
            start: r.start.format("%Y-%m-%d").to_string(),
            // Inclusive last day of the half-open range
            end: (r.end - chrono::Duration::days(1))
                .format("%Y-%m-%d")
                .to_string(),
            description: r.description.clone(),
        }),
        sources: &report.sources,
        totals: report.totals,
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

// ========== Public Interface ==========

/// Runs the report command.
pub fn run<W: Write>(writer: &mut W, args: &ReportArgs, config: &Config) -> Result<()> {
    let rendered = generate(args, config, Local::now().naive_local())?;

    if args.json {
        writeln!(writer, "{}", format_report_json(&rendered)?)?;
        return Ok(());
    }

    let report = &rendered.report;
    if report.requests.recalculate {
        tracing::info!("table has a formula; recalculate it after inserting");
    }

    match &args.render.output {
        Some(path) => {
            let mut document = match std::fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
                Err(e) => {
                    return Err(e).with_context(|| format!("failed to read {}", path.display()));
                }
            };
            let position = args.render.at.unwrap_or(document.len());
            let at = insert_report(&mut document, position, report);
            std::fs::write(path, document)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::debug!(path = %path.display(), at, "inserted report");
        }
        None => write_report(writer, report)?,
    }

    Ok(())
}
