//! Component model for radar visibility.
//!
//! Components are stored in BTreeMap for deterministic iteration order.
//! Each component type has its own storage keyed by EntityId.
//!
//! # Invariants
//! - Iteration order is deterministic (BTreeMap).
//! - Components carry no positions; those come from the transform kernel.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use radarsync_common::{BlipShape, EntityId, Rgba8};

/// Marks an entity as visible on radar consoles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlipSource {
    pub enabled: bool,
    pub scale: f32,
    pub color: Rgba8,
    pub shape: BlipShape,
    /// Only show while not attached to any grid.
    pub require_no_grid: bool,
    /// Show even when on a different grid than the console.
    pub visible_from_other_grids: bool,
}

impl Default for BlipSource {
    fn default() -> Self {
        Self {
            enabled: true,
            scale: 1.0,
            color: Rgba8::RED,
            shape: BlipShape::Circle,
            require_no_grid: false,
            visible_from_other_grids: false,
        }
    }
}

/// A sensor. Its position and grid define the query origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadarConsole {
    /// Inclusive detection radius in world units.
    pub max_range: f32,
}

impl Default for RadarConsole {
    fn default() -> Self {
        Self { max_range: 256.0 }
    }
}

/// An in-flight projectile and who fired it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projectile {
    pub shooter: Option<EntityId>,
}

/// Component storage for everything the radar cares about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentStore {
    blip_sources: BTreeMap<EntityId, BlipSource>,
    radar_consoles: BTreeMap<EntityId, RadarConsole>,
    projectiles: BTreeMap<EntityId, Projectile>,
    shields: BTreeSet<EntityId>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- BlipSource ---
    pub fn set_blip_source(&mut self, entity: EntityId, source: BlipSource) {
        self.blip_sources.insert(entity, source);
    }

    pub fn remove_blip_source(&mut self, entity: EntityId) -> Option<BlipSource> {
        self.blip_sources.remove(&entity)
    }

    pub fn get_blip_source(&self, entity: EntityId) -> Option<&BlipSource> {
        self.blip_sources.get(&entity)
    }

    pub fn get_blip_source_mut(&mut self, entity: EntityId) -> Option<&mut BlipSource> {
        self.blip_sources.get_mut(&entity)
    }

    /// All blip sources in id order.
    pub fn blip_sources(&self) -> impl Iterator<Item = (EntityId, &BlipSource)> {
        self.blip_sources.iter().map(|(id, source)| (*id, source))
    }

    // --- RadarConsole ---
    pub fn set_radar_console(&mut self, entity: EntityId, console: RadarConsole) {
        self.radar_consoles.insert(entity, console);
    }

    pub fn remove_radar_console(&mut self, entity: EntityId) -> Option<RadarConsole> {
        self.radar_consoles.remove(&entity)
    }

    pub fn get_radar_console(&self, entity: EntityId) -> Option<&RadarConsole> {
        self.radar_consoles.get(&entity)
    }

    pub fn radar_consoles(&self) -> impl Iterator<Item = (EntityId, &RadarConsole)> {
        self.radar_consoles.iter().map(|(id, console)| (*id, console))
    }

    // --- Projectile ---
    pub fn set_projectile(&mut self, entity: EntityId, projectile: Projectile) {
        self.projectiles.insert(entity, projectile);
    }

    pub fn remove_projectile(&mut self, entity: EntityId) -> Option<Projectile> {
        self.projectiles.remove(&entity)
    }

    pub fn get_projectile(&self, entity: EntityId) -> Option<&Projectile> {
        self.projectiles.get(&entity)
    }

    // --- Shield tag ---
    pub fn tag_shield(&mut self, entity: EntityId) {
        self.shields.insert(entity);
    }

    pub fn untag_shield(&mut self, entity: EntityId) -> bool {
        self.shields.remove(&entity)
    }

    pub fn is_shield(&self, entity: EntityId) -> bool {
        self.shields.contains(&entity)
    }

    /// Remove all components for an entity.
    pub fn remove_entity(&mut self, entity: EntityId) {
        self.remove_blip_source(entity);
        self.remove_radar_console(entity);
        self.remove_projectile(entity);
        self.untag_shield(entity);
    }
}
