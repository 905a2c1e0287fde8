//! Sync Protocol: the two radar messages and how they travel.
//!
//! # Invariants
//! - `GiveBlips` is only ever sent in reply to a `RequestBlips`, and only to
//!   the session that asked.
//! - A report entry with a grid carries a grid-local position; without a grid
//!   the position is world-space.

pub mod channel;
pub mod codec;
pub mod messages;

pub use channel::{LoopbackChannel, SessionId};
pub use codec::{ProtocolError, decode, encode};
pub use messages::{BlipEntry, GiveBlips, RadarMessage, RequestBlips};
