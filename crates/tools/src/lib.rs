//! Developer Tooling: report inspection and drop accounting.
//!
//! # Invariants
//! - Tools only observe; nothing here feeds back into what gets reported.

mod counters;
mod inspector;

pub use counters::DropCounters;
pub use inspector::{ReportInspector, ReportSummary};
