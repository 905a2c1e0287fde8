//! Radar server: turns a sensor id into a report of visible blips.
//!
//! # Invariants
//! - Stateless between requests; every request triggers a fresh scan.
//! - Nothing fails loudly. Unknown sensors and vanished entities degrade to
//!   "no data", observable only through a [`DropObserver`](radarsync_common::DropObserver).

mod aggregate;
mod handler;

pub use aggregate::assemble_report;
pub use handler::{RadarServer, Reply};
