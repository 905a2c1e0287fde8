use radarsync_common::{DropObserver, DropReason, EntityId, MapId};
use radarsync_ecs::{BlipSource, ComponentStore};
use radarsync_kernel::{ResolvedTransform, TransformSource};
use radarsync_protocol::BlipEntry;

/// Frame a surviving candidate is reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    World,
    /// Local to the candidate's own grid.
    Grid(EntityId),
}

/// Build the report of blips visible from `sensor`.
///
/// Scans every blip source linearly. Returns an empty report when the sensor
/// does not resolve or has no radar console. Result order follows the scan
/// and carries no meaning.
pub fn assemble_report<T, O>(
    sensor: EntityId,
    transforms: &T,
    components: &ComponentStore,
    observer: &mut O,
) -> Vec<BlipEntry>
where
    T: TransformSource + ?Sized,
    O: DropObserver + ?Sized,
{
    let _span = tracing::info_span!("assemble_report", %sensor).entered();

    let Some(console) = components.get_radar_console(sensor) else {
        tracing::debug!("sensor has no radar console");
        return Vec::new();
    };
    let Some(origin) = transforms.resolve(sensor) else {
        tracing::debug!("sensor does not resolve");
        return Vec::new();
    };

    let mut entries = Vec::new();
    let mut scanned = 0usize;
    for (id, source) in components.blip_sources() {
        scanned += 1;
        if !source.enabled {
            observer.on_drop(DropReason::Disabled);
            continue;
        }
        let Some(candidate) = transforms.resolve(id) else {
            observer.on_drop(DropReason::Unresolved);
            continue;
        };

        let frame = classify(
            &origin,
            console.max_range,
            &candidate,
            source,
            components,
            transforms,
        );
        let frame = match frame {
            Ok(frame) => frame,
            Err(reason) => {
                tracing::trace!(%id, %reason, "blip dropped");
                observer.on_drop(reason);
                continue;
            }
        };

        entries.push(to_entry(&candidate, frame, source, transforms));
    }

    tracing::debug!(scanned, emitted = entries.len(), "report assembled");
    entries
}

/// Apply the visibility filters in order, stopping at the first that fails.
/// `source.enabled` has already been checked.
fn classify<T>(
    origin: &ResolvedTransform,
    max_range: f32,
    candidate: &ResolvedTransform,
    source: &BlipSource,
    components: &ComponentStore,
    transforms: &T,
) -> Result<Frame, DropReason>
where
    T: TransformSource + ?Sized,
{
    if let Some(projectile) = components.get_projectile(candidate.id) {
        let shooter_map: Option<MapId> = projectile
            .shooter
            .and_then(|shooter| transforms.resolve(shooter))
            .map(|shooter| shooter.map);
        if candidate.map != origin.map || shooter_map.is_some_and(|map| map != candidate.map) {
            return Err(DropReason::CrossMapProjectile);
        }
    }

    if candidate.position.distance(origin.position) > max_range {
        return Err(DropReason::OutOfRange);
    }

    if candidate.grid.is_none() && components.is_shield(candidate.id) {
        return Err(DropReason::OrphanedShield);
    }

    if source.require_no_grid {
        return match candidate.grid {
            Some(_) => Err(DropReason::HasGrid),
            None => Ok(Frame::World),
        };
    }

    if !source.visible_from_other_grids && candidate.grid != origin.grid {
        return Err(DropReason::GridMismatch);
    }

    Ok(match candidate.grid {
        Some(grid) => Frame::Grid(grid),
        None => Frame::World,
    })
}

fn to_entry<T>(
    candidate: &ResolvedTransform,
    frame: Frame,
    source: &BlipSource,
    transforms: &T,
) -> BlipEntry
where
    T: TransformSource + ?Sized,
{
    let (grid, position) = match frame {
        Frame::Grid(grid) => match transforms.resolve(grid) {
            Some(grid_frame) => (
                Some(grid),
                grid_frame.inverse_matrix().transform_point2(candidate.position),
            ),
            None => {
                // Grid vanished between lookups; world-space is still correct.
                tracing::trace!(%grid, "grid unresolved, reporting world position");
                (None, candidate.position)
            }
        },
        Frame::World => (None, candidate.position),
    };

    BlipEntry {
        grid,
        position,
        scale: source.scale,
        color: source.color,
        shape: source.shape,
    }
}
