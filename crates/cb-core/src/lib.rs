//! Core billing logic for clocked time.
//!
//! This crate contains:
//! - Records: clock data supplied by the host and the priced values derived from it
//! - Billing: rounding policy, rate application and per-source aggregation
//! - Report: invoice table assembly with optional columns and totals
//! - Display: decimal-hours vs. duration rendering and its per-context toggle

pub mod billing;
pub mod display;
pub mod duration;
pub mod options;
mod record;
pub mod report;

pub use billing::GrandTotals;
pub use display::{DisplayModes, TimeDisplay, UnknownTimeDisplay};
pub use options::{ColumnSchema, InvoiceConfig, OptionalColumn, parse_params};
pub use record::{BillableEntry, BillableSource, RawEntry, RawSource};
pub use report::{
    HostRequests, Report, ReportContext, ReportError, build_from_config, build_report,
};
