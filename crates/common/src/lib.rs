//! Shared value types for radar blip synchronization.
//!
//! Everything in here is plain data: identifiers, 2D transforms, colors,
//! blip shapes, timestamps and the drop diagnostics hook. Server and client
//! crates both build on these.

pub mod diagnostics;
pub mod time;
pub mod types;

pub use diagnostics::{DropObserver, DropReason, NoopObserver};
pub use time::{Clock, ManualClock, MonotonicClock, Timestamp};
pub use types::{BlipShape, EntityId, MapId, Rgba8, Transform2};
