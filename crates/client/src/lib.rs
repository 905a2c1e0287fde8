//! Radar client: throttled requests, a per-sensor report cache and
//! reconstruction of world positions from grid-relative entries.
//!
//! # Invariants
//! - One throttle window is shared by every sensor of a session.
//! - Cached reports are replaced wholesale, never merged or edited.
//! - Staleness is decided at read time; expired reports read as empty.

mod cache;
mod config;
mod session;
mod throttle;

pub use cache::{BlipCache, CachedReport, ReportState, SensorKey, WorldBlip, reconstruct_world};
pub use config::{ClientConfig, ConfigError};
pub use session::RadarClient;
pub use throttle::RequestThrottle;
