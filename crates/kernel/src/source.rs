use glam::{Affine2, Vec2};
use radarsync_common::{EntityId, MapId};

/// World-space view of one entity at the moment it was resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedTransform {
    pub id: EntityId,
    pub position: Vec2,
    /// Counter-clockwise, radians.
    pub rotation: f32,
    /// Grid the entity is attached to, if any. A grid is its own grid.
    pub grid: Option<EntityId>,
    pub map: MapId,
}

impl ResolvedTransform {
    /// Local-to-world matrix.
    pub fn matrix(&self) -> Affine2 {
        Affine2::from_angle_translation(self.rotation, self.position)
    }

    /// World-to-local matrix.
    pub fn inverse_matrix(&self) -> Affine2 {
        self.matrix().inverse()
    }
}

/// Coordinate lookups the sync core consumes from its host.
///
/// Server and client each implement this against their own view of the
/// world; ids resolved on one side may be gone on the other.
pub trait TransformSource {
    /// Resolve an id into its current world-space transform, or `None` if the
    /// entity no longer exists.
    fn resolve(&self, id: EntityId) -> Option<ResolvedTransform>;

    fn world_matrix(&self, id: EntityId) -> Option<Affine2> {
        self.resolve(id).map(|t| t.matrix())
    }

    fn world_position(&self, id: EntityId) -> Option<Vec2> {
        self.resolve(id).map(|t| t.position)
    }

    fn world_rotation(&self, id: EntityId) -> Option<f32> {
        self.resolve(id).map(|t| t.rotation)
    }

    fn grid_of(&self, id: EntityId) -> Option<EntityId> {
        self.resolve(id).and_then(|t| t.grid)
    }
}

impl<T: TransformSource + ?Sized> TransformSource for &T {
    fn resolve(&self, id: EntityId) -> Option<ResolvedTransform> {
        (**self).resolve(id)
    }
}
