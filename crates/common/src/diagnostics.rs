//! Drop diagnostics.
//!
//! Every failure in the sync path degrades to "no data". Callers never see an
//! error, but operators can count what was dropped and why by plugging a
//! [`DropObserver`] into the server or client.

use serde::{Deserialize, Serialize};

/// Why a blip, request or report was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DropReason {
    /// Blip source is switched off.
    Disabled,
    /// Projectile on another map than the sensor, or its shooter on another map.
    CrossMapProjectile,
    /// Farther from the sensor than its maximum range.
    OutOfRange,
    /// Shield generator that is not attached to any grid.
    OrphanedShield,
    /// Source requires no grid but is attached to one.
    HasGrid,
    /// Source is on a different grid than the sensor.
    GridMismatch,
    /// Candidate entity no longer resolves.
    Unresolved,
    /// Request named a sensor that is missing or has no console.
    UnknownSensor,
    /// Client could not resolve the grid of a grid-relative entry.
    MissingGrid,
    /// Client request suppressed by the throttle window.
    Throttled,
    /// Cached report read after the staleness threshold.
    Stale,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::Disabled => "disabled",
            DropReason::CrossMapProjectile => "cross_map_projectile",
            DropReason::OutOfRange => "out_of_range",
            DropReason::OrphanedShield => "orphaned_shield",
            DropReason::HasGrid => "has_grid",
            DropReason::GridMismatch => "grid_mismatch",
            DropReason::Unresolved => "unresolved",
            DropReason::UnknownSensor => "unknown_sensor",
            DropReason::MissingGrid => "missing_grid",
            DropReason::Throttled => "throttled",
            DropReason::Stale => "stale",
        }
    }
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives a notification for every silent drop.
pub trait DropObserver {
    fn on_drop(&mut self, reason: DropReason);
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl DropObserver for NoopObserver {
    fn on_drop(&mut self, _reason: DropReason) {}
}

impl<O: DropObserver + ?Sized> DropObserver for &mut O {
    fn on_drop(&mut self, reason: DropReason) {
        (**self).on_drop(reason);
    }
}

impl<O: DropObserver + ?Sized> DropObserver for Box<O> {
    fn on_drop(&mut self, reason: DropReason) {
        (**self).on_drop(reason);
    }
}
