//! Status command for showing effective defaults and toggled display modes.

use std::io::Write;

use anyhow::Result;

use crate::{Config, state};

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let modes = state::load_display_modes(&config.state_path)?;

    writeln!(writer, "Invoice defaults")?;
    writeln!(writer, "Rate: {}", config.default_rate)?;
    writeln!(writer, "Accuracy: {}", config.default_accuracy)?;
    writeln!(writer, "Time display: {}", config.time_display)?;
    writeln!(writer, "State: {}", config.state_path.display())?;

    if modes.is_empty() {
        writeln!(writer, "No toggled contexts.")?;
        return Ok(());
    }

    writeln!(writer, "Contexts:")?;
    for (context, mode) in modes.iter() {
        writeln!(writer, "- {context}: {mode}")?;
    }

    Ok(())
}
