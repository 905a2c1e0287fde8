use std::time::Duration;

use radarsync_common::{EntityId, Timestamp};
use radarsync_protocol::RequestBlips;

/// Global request cooldown for one client session.
///
/// A single `last_request` is shared by every sensor, bounding the outbound
/// rate no matter how many consoles the UI polls each frame.
#[derive(Debug, Clone)]
pub struct RequestThrottle {
    interval: Duration,
    last_request: Option<Timestamp>,
}

impl RequestThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_request(&self) -> Option<Timestamp> {
        self.last_request
    }

    /// Emit a request for `sensor` unless one went out less than `interval` ago.
    pub fn maybe_request(&mut self, sensor: EntityId, now: Timestamp) -> Option<RequestBlips> {
        if let Some(last) = self.last_request {
            if now.saturating_since(last) < self.interval {
                tracing::trace!(%sensor, "request throttled");
                return None;
            }
        }
        self.last_request = Some(now);
        Some(RequestBlips {
            sensor: Some(sensor),
        })
    }

    /// Forget the last request time (session teardown).
    pub fn reset(&mut self) {
        self.last_request = None;
    }
}

impl Default for RequestThrottle {
    fn default() -> Self {
        Self::new(Duration::from_millis(250))
    }
}
