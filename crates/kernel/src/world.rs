use glam::Affine2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use radarsync_common::{EntityId, MapId, Transform2};

use crate::source::{ResolvedTransform, TransformSource};

/// Errors from world mutations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
    #[error("parenting {child} under {parent} would create a cycle")]
    ParentCycle { child: EntityId, parent: EntityId },
}

/// Per-entity data stored in the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityData {
    /// Transform relative to `parent`, or to the map origin when unparented.
    pub transform: Transform2,
    pub parent: Option<EntityId>,
    /// Only meaningful on root entities; children live on their root's map.
    pub map: MapId,
    /// Whether this entity is a grid (a movable local frame).
    pub is_grid: bool,
}

/// Reference entity store implementing [`TransformSource`].
///
/// Entities form parent chains; a chain may pass through grids. Uses BTreeMap
/// for deterministic iteration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    entities: BTreeMap<EntityId, EntityData>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entities in the world.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Read-only access to all entities (BTreeMap for deterministic iteration).
    pub fn entities(&self) -> &BTreeMap<EntityId, EntityData> {
        &self.entities
    }

    pub fn get(&self, id: EntityId) -> Option<&EntityData> {
        self.entities.get(&id)
    }

    /// Spawn a root entity on `map`.
    pub fn spawn(&mut self, map: MapId, transform: Transform2) -> EntityId {
        let id = EntityId::new();
        self.insert(
            id,
            EntityData {
                transform,
                parent: None,
                map,
                is_grid: false,
            },
        );
        id
    }

    /// Spawn a root grid on `map`.
    pub fn spawn_grid(&mut self, map: MapId, transform: Transform2) -> EntityId {
        let id = EntityId::new();
        self.insert(
            id,
            EntityData {
                transform,
                parent: None,
                map,
                is_grid: true,
            },
        );
        id
    }

    /// Spawn an entity whose transform is local to `parent`.
    pub fn spawn_child(
        &mut self,
        parent: EntityId,
        transform: Transform2,
    ) -> Result<EntityId, WorldError> {
        let map = self
            .entities
            .get(&parent)
            .ok_or(WorldError::EntityNotFound(parent))?
            .map;
        let id = EntityId::new();
        self.insert(
            id,
            EntityData {
                transform,
                parent: Some(parent),
                map,
                is_grid: false,
            },
        );
        Ok(id)
    }

    /// Insert an entity under a known id (mirroring a remote world).
    ///
    /// The parent must already exist and must not descend from `id`.
    pub fn spawn_with_id(&mut self, id: EntityId, data: EntityData) -> Result<(), WorldError> {
        if let Some(parent) = data.parent {
            self.check_parent(id, parent)?;
        }
        self.insert(id, data);
        Ok(())
    }

    fn insert(&mut self, id: EntityId, data: EntityData) {
        tracing::trace!(%id, is_grid = data.is_grid, "spawn");
        self.entities.insert(id, data);
    }

    /// Remove an entity and everything parented beneath it.
    pub fn despawn(&mut self, id: EntityId) -> Option<EntityData> {
        let data = self.entities.remove(&id)?;
        let children: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|(_, d)| d.parent == Some(id))
            .map(|(child, _)| *child)
            .collect();
        for child in children {
            self.despawn(child);
        }
        tracing::trace!(%id, "despawn");
        Some(data)
    }

    pub fn set_transform(
        &mut self,
        id: EntityId,
        transform: Transform2,
    ) -> Result<(), WorldError> {
        let data = self
            .entities
            .get_mut(&id)
            .ok_or(WorldError::EntityNotFound(id))?;
        data.transform = transform;
        Ok(())
    }

    /// Move a root entity to another map.
    pub fn set_map(&mut self, id: EntityId, map: MapId) -> Result<(), WorldError> {
        let data = self
            .entities
            .get_mut(&id)
            .ok_or(WorldError::EntityNotFound(id))?;
        data.map = map;
        Ok(())
    }

    /// Re-parent an entity. The local transform is kept as-is.
    pub fn set_parent(
        &mut self,
        child: EntityId,
        parent: Option<EntityId>,
    ) -> Result<(), WorldError> {
        if !self.entities.contains_key(&child) {
            return Err(WorldError::EntityNotFound(child));
        }
        if let Some(parent) = parent {
            self.check_parent(child, parent)?;
        }
        if let Some(data) = self.entities.get_mut(&child) {
            data.parent = parent;
        }
        Ok(())
    }

    /// Fails if `parent` is unknown or if `child` appears in its ancestry.
    fn check_parent(&self, child: EntityId, parent: EntityId) -> Result<(), WorldError> {
        if parent == child {
            return Err(WorldError::ParentCycle { child, parent });
        }
        if !self.entities.contains_key(&parent) {
            return Err(WorldError::EntityNotFound(parent));
        }
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(WorldError::ParentCycle { child, parent });
            }
            cursor = self.entities.get(&current).and_then(|d| d.parent);
        }
        Ok(())
    }

    /// Walk the parent chain, composing local matrices into a world matrix.
    /// Returns `None` if any link in the chain is missing, or if the chain is
    /// longer than the world holds entities.
    fn compose(&self, id: EntityId) -> Option<(Affine2, f32, Option<EntityId>, MapId)> {
        let mut data = self.entities.get(&id)?;
        let mut matrix = data.transform.matrix();
        let mut rotation = data.transform.rotation;
        let mut grid = data.is_grid.then_some(id);
        let mut depth = 0;
        while let Some(parent) = data.parent {
            depth += 1;
            if depth > self.entities.len() {
                tracing::debug!(%id, "parent chain does not terminate");
                return None;
            }
            data = self.entities.get(&parent)?;
            matrix = data.transform.matrix() * matrix;
            rotation += data.transform.rotation;
            if grid.is_none() && data.is_grid {
                grid = Some(parent);
            }
        }
        Some((matrix, rotation, grid, data.map))
    }
}

impl TransformSource for World {
    fn resolve(&self, id: EntityId) -> Option<ResolvedTransform> {
        let (matrix, rotation, grid, map) = self.compose(id)?;
        Some(ResolvedTransform {
            id,
            position: matrix.translation,
            rotation,
            grid,
            map,
        })
    }

    fn world_matrix(&self, id: EntityId) -> Option<Affine2> {
        self.compose(id).map(|(matrix, ..)| matrix)
    }
}
