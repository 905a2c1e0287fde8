//! Transform Kernel: world-space lookups for entities, grids and maps.
//!
//! # Invariants
//! - An [`EntityId`](radarsync_common::EntityId) is never a live handle; every
//!   lookup resolves it and may fail once the entity is gone.
//! - Parent chains are acyclic, so world transforms always terminate.

pub mod source;
pub mod world;

pub use source::{ResolvedTransform, TransformSource};
pub use world::{EntityData, World, WorldError};
