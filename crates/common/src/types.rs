use glam::{Affine2, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, stable identifier for an entity.
///
/// Ids travel across the network and are resolved independently on each
/// side. Holding an id says nothing about whether the entity still exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.8}", &self.0.to_string()[..8])
    }
}

/// Identifier of the map (disjoint world space) an entity lives on.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct MapId(pub u32);

/// Planar transform: position plus counter-clockwise rotation in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2 {
    pub position: Vec2,
    pub rotation: f32,
}

impl Transform2 {
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            rotation: 0.0,
        }
    }

    pub fn new(position: Vec2, rotation: f32) -> Self {
        Self { position, rotation }
    }

    /// Local-to-parent matrix (rotate, then translate).
    pub fn matrix(&self) -> Affine2 {
        Affine2::from_angle_translation(self.rotation, self.position)
    }
}

impl Default for Transform2 {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
        }
    }
}

/// 8-bit RGBA color as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    pub const CYAN: Self = Self::rgb(0, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Rgba8 {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Glyph a blip is drawn with.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum BlipShape {
    #[default]
    Circle,
    Square,
    Triangle,
    Star,
    Diamond,
    Hexagon,
    Arrow,
    Ring,
}

impl BlipShape {
    pub const ALL: [BlipShape; 8] = [
        BlipShape::Circle,
        BlipShape::Square,
        BlipShape::Triangle,
        BlipShape::Star,
        BlipShape::Diamond,
        BlipShape::Hexagon,
        BlipShape::Arrow,
        BlipShape::Ring,
    ];
}
