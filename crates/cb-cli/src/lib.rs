//! Invoice CLI library.
//!
//! This crate hosts the billing core: it loads clock data and configuration,
//! aligns the rendered tables, and persists the display-mode toggle.

pub mod align;
mod cli;
pub mod commands;
mod config;
pub mod range;
pub mod state;

pub use cli::{Cli, Commands, DEFAULT_CONTEXT, RenderArgs, ReportArgs};
pub use config::Config;
