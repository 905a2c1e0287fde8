use glam::Vec2;
use radarsync_common::{BlipShape, EntityId, Rgba8};
use serde::{Deserialize, Serialize};

/// One visible blip in a report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlipEntry {
    /// Grid whose local frame `position` is expressed in. `None` means world-space.
    pub grid: Option<EntityId>,
    pub position: Vec2,
    pub scale: f32,
    pub color: Rgba8,
    pub shape: BlipShape,
}

impl BlipEntry {
    pub fn is_grid_relative(&self) -> bool {
        self.grid.is_some()
    }
}

/// Client asks for the blips visible from `sensor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestBlips {
    pub sensor: Option<EntityId>,
}

/// Server's answer to a [`RequestBlips`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiveBlips {
    pub from_sensor: Option<EntityId>,
    pub entries: Vec<BlipEntry>,
}

/// Everything that crosses the radar channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RadarMessage {
    RequestBlips(RequestBlips),
    GiveBlips(GiveBlips),
}

impl From<RequestBlips> for RadarMessage {
    fn from(msg: RequestBlips) -> Self {
        RadarMessage::RequestBlips(msg)
    }
}

impl From<GiveBlips> for RadarMessage {
    fn from(msg: GiveBlips) -> Self {
        RadarMessage::GiveBlips(msg)
    }
}
