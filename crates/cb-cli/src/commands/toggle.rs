//! Toggle command for switching the time display of an editing context.

use std::io::Write;
use std::path::Path;

use anyhow::Result;

use crate::cli::{RenderArgs, ReportArgs};
use crate::{Config, state};

use super::report;

/// Flips the display mode for `context` and optionally regenerates a report.
///
/// The regenerated report uses the same `render` options and placement a
/// `report` run would.
pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    context: &str,
    input: Option<&Path>,
    render: &RenderArgs,
) -> Result<()> {
    let mut modes = state::load_display_modes(&config.state_path)?;
    let mode = modes.toggle(context, config.time_display);
    state::save_display_modes(&config.state_path, &modes)?;
    tracing::info!(context, %mode, "toggled time display");

    writeln!(writer, "Time display for {context}: {mode}")?;

    if let Some(input) = input {
        let args = ReportArgs::new(input.to_path_buf(), context.to_string(), render.clone());
        report::run(writer, &args, config)?;
    }

    Ok(())
}
