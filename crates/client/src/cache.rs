use std::collections::BTreeMap;
use std::time::Duration;

use glam::Vec2;
use radarsync_common::{
    BlipShape, DropObserver, DropReason, EntityId, NoopObserver, Rgba8, Timestamp,
};
use radarsync_kernel::TransformSource;
use radarsync_protocol::BlipEntry;

/// Cache slot key. Reports that name no sensor share the `Unspecified` slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SensorKey {
    Unspecified,
    Sensor(EntityId),
}

impl From<EntityId> for SensorKey {
    fn from(id: EntityId) -> Self {
        SensorKey::Sensor(id)
    }
}

impl From<Option<EntityId>> for SensorKey {
    fn from(id: Option<EntityId>) -> Self {
        id.map_or(SensorKey::Unspecified, SensorKey::Sensor)
    }
}

/// The last report received for one sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedReport {
    pub received_at: Timestamp,
    pub entries: Vec<BlipEntry>,
}

/// A blip with its position resolved to world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBlip {
    pub position: Vec2,
    pub scale: f32,
    pub color: Rgba8,
    pub shape: BlipShape,
}

/// Readability of a cache slot at some instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportState {
    Missing,
    Stale,
    Fresh,
}

/// Most recent report per sensor, with read-time expiry.
#[derive(Debug, Clone)]
pub struct BlipCache {
    stale_after: Duration,
    reports: BTreeMap<SensorKey, CachedReport>,
}

impl Default for BlipCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}

impl BlipCache {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            stale_after,
            reports: BTreeMap::new(),
        }
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    /// Replace the slot for `from_sensor` with a fresh report.
    pub fn on_report_received(
        &mut self,
        from_sensor: Option<EntityId>,
        entries: Vec<BlipEntry>,
        now: Timestamp,
    ) {
        let key = SensorKey::from(from_sensor);
        tracing::trace!(?key, entries = entries.len(), "report cached");
        self.reports.insert(
            key,
            CachedReport {
                received_at: now,
                entries,
            },
        );
    }

    pub fn report_state(&self, sensor: impl Into<SensorKey>, now: Timestamp) -> ReportState {
        match self.reports.get(&sensor.into()) {
            None => ReportState::Missing,
            Some(report) if self.is_fresh(report, now) => ReportState::Fresh,
            Some(_) => ReportState::Stale,
        }
    }

    fn is_fresh(&self, report: &CachedReport, now: Timestamp) -> bool {
        now.saturating_since(report.received_at) <= self.stale_after
    }

    fn fresh(&self, key: SensorKey, now: Timestamp) -> Option<&CachedReport> {
        self.reports
            .get(&key)
            .filter(|report| self.is_fresh(report, now))
    }

    /// Entries for `sensor` exactly as received, or empty if missing or stale.
    pub fn get_report(&self, sensor: impl Into<SensorKey>, now: Timestamp) -> &[BlipEntry] {
        self.fresh(sensor.into(), now)
            .map(|report| report.entries.as_slice())
            .unwrap_or(&[])
    }

    /// Entries for `sensor` converted to world space. Entries whose grid no
    /// longer resolves are left out.
    pub fn get_reconstructed_world<T>(
        &self,
        sensor: impl Into<SensorKey>,
        now: Timestamp,
        transforms: &T,
    ) -> Vec<WorldBlip>
    where
        T: TransformSource + ?Sized,
    {
        reconstruct_world(self.get_report(sensor, now), transforms, &mut NoopObserver)
    }

    /// Slot used when the caller names no sensor: the most recently received
    /// report, ties going to the smallest key. Only meant for callers that
    /// predate multi-sensor consoles; with several sensors cached, which one
    /// answers depends purely on arrival order.
    pub fn most_recent(&self) -> Option<SensorKey> {
        self.reports
            .iter()
            .max_by(|(ka, a), (kb, b)| a.received_at.cmp(&b.received_at).then(kb.cmp(ka)))
            .map(|(key, _)| *key)
    }

    /// [`get_report`](Self::get_report) on the [`most_recent`](Self::most_recent) slot.
    pub fn get_any_report(&self, now: Timestamp) -> &[BlipEntry] {
        match self.most_recent() {
            Some(key) => self.get_report(key, now),
            None => &[],
        }
    }

    /// [`get_reconstructed_world`](Self::get_reconstructed_world) on the
    /// [`most_recent`](Self::most_recent) slot.
    pub fn get_any_reconstructed_world<T>(&self, now: Timestamp, transforms: &T) -> Vec<WorldBlip>
    where
        T: TransformSource + ?Sized,
    {
        reconstruct_world(self.get_any_report(now), transforms, &mut NoopObserver)
    }

    /// Raw slot access, ignoring staleness.
    pub fn get(&self, sensor: impl Into<SensorKey>) -> Option<&CachedReport> {
        self.reports.get(&sensor.into())
    }

    pub fn remove(&mut self, sensor: impl Into<SensorKey>) -> Option<CachedReport> {
        self.reports.remove(&sensor.into())
    }

    pub fn sensors(&self) -> impl Iterator<Item = SensorKey> + '_ {
        self.reports.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Drop every cached report.
    pub fn clear(&mut self) {
        self.reports.clear();
    }
}

/// Convert entries to world space using each grid's current transform:
/// `grid_position + rotate(entry.position, grid_rotation)`. Gridless entries
/// pass through; entries on unresolvable grids are dropped.
pub fn reconstruct_world<T, O>(
    entries: &[BlipEntry],
    transforms: &T,
    observer: &mut O,
) -> Vec<WorldBlip>
where
    T: TransformSource + ?Sized,
    O: DropObserver + ?Sized,
{
    entries
        .iter()
        .filter_map(|entry| {
            let position = match entry.grid {
                None => entry.position,
                Some(grid) => {
                    let Some(frame) = transforms.resolve(grid) else {
                        tracing::trace!(%grid, "grid unresolved, blip skipped");
                        observer.on_drop(DropReason::MissingGrid);
                        return None;
                    };
                    frame.position + Vec2::from_angle(frame.rotation).rotate(entry.position)
                }
            };
            Some(WorldBlip {
                position,
                scale: entry.scale,
                color: entry.color,
                shape: entry.shape,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use radarsync_common::{MapId, Transform2};
    use radarsync_kernel::World;
    use std::f32::consts::FRAC_PI_2;

    fn entry(grid: Option<EntityId>, x: f32, y: f32) -> BlipEntry {
        BlipEntry {
            grid,
            position: Vec2::new(x, y),
            scale: 1.0,
            color: Rgba8::WHITE,
            shape: BlipShape::Circle,
        }
    }

    fn secs(s: f32) -> Timestamp {
        Timestamp::from_secs_f32(s)
    }

    #[test]
    fn report_is_returned_verbatim_while_fresh() {
        let mut cache = BlipCache::default();
        let a = EntityId::new();
        let grid = EntityId::new();
        let entries = vec![entry(Some(grid), 1.0, 0.0), entry(None, 5.0, 5.0)];
        cache.on_report_received(Some(a), entries.clone(), Timestamp::ZERO);

        assert_eq!(cache.get_report(a, secs(1.0)), entries.as_slice());
        assert_eq!(cache.get_report(a, secs(3.0)), entries.as_slice());
        assert_eq!(cache.report_state(a, secs(3.0)), ReportState::Fresh);
    }

    #[test]
    fn report_expires_after_threshold() {
        let mut cache = BlipCache::default();
        let a = EntityId::new();
        cache.on_report_received(Some(a), vec![entry(None, 0.0, 0.0)], Timestamp::ZERO);

        assert!(cache.get_report(a, secs(3.001)).is_empty());
        assert_eq!(cache.report_state(a, secs(3.001)), ReportState::Stale);
        // Expired, not deleted.
        assert_eq!(cache.len(), 1);
        assert!(cache.get(a).is_some());
    }

    #[test]
    fn fresh_response_resets_the_timer() {
        let mut cache = BlipCache::default();
        let a = EntityId::new();
        cache.on_report_received(
            Some(a),
            vec![entry(None, 1.0, 1.0), entry(None, 2.0, 2.0)],
            Timestamp::ZERO,
        );
        assert!(cache.get_report(a, secs(4.0)).is_empty());

        let newer = vec![entry(None, 9.0, 9.0)];
        cache.on_report_received(Some(a), newer.clone(), secs(4.0));
        assert_eq!(cache.get_report(a, secs(6.0)), newer.as_slice());
    }

    #[test]
    fn reports_replace_rather_than_merge() {
        let mut cache = BlipCache::default();
        let a = EntityId::new();
        cache.on_report_received(Some(a), vec![entry(None, 1.0, 1.0)], Timestamp::ZERO);
        cache.on_report_received(Some(a), Vec::new(), secs(0.5));
        assert!(cache.get_report(a, secs(0.6)).is_empty());
        assert_eq!(cache.report_state(a, secs(0.6)), ReportState::Fresh);
    }

    #[test]
    fn missing_sensor_reads_empty() {
        let cache = BlipCache::default();
        let a = EntityId::new();
        assert!(cache.get_report(a, Timestamp::ZERO).is_empty());
        assert_eq!(cache.report_state(a, Timestamp::ZERO), ReportState::Missing);
        assert!(cache.get_any_report(Timestamp::ZERO).is_empty());
    }

    #[test]
    fn sensorless_report_uses_placeholder_slot() {
        let mut cache = BlipCache::default();
        cache.on_report_received(None, vec![entry(None, 1.0, 2.0)], Timestamp::ZERO);
        assert_eq!(cache.get_report(SensorKey::Unspecified, Timestamp::ZERO).len(), 1);
        assert_eq!(cache.get_report(None::<EntityId>, Timestamp::ZERO).len(), 1);
        assert_eq!(cache.sensors().collect::<Vec<_>>(), vec![SensorKey::Unspecified]);
    }

    #[test]
    fn reconstruct_rotated_grid() {
        let mut world = World::new();
        let grid = world.spawn_grid(MapId(0), Transform2::new(Vec2::new(10.0, 0.0), FRAC_PI_2));
        let mut cache = BlipCache::default();
        let a = EntityId::new();
        cache.on_report_received(Some(a), vec![entry(Some(grid), 1.0, 0.0)], Timestamp::ZERO);

        let blips = cache.get_reconstructed_world(a, Timestamp::ZERO, &world);
        assert_eq!(blips.len(), 1);
        assert!((blips[0].position - Vec2::new(10.0, 1.0)).length() < 1e-4);
    }

    #[test]
    fn gridless_entries_pass_through() {
        let world = World::new();
        let blips = reconstruct_world(&[entry(None, 5.0, 5.0)], &world, &mut NoopObserver);
        assert_eq!(blips[0].position, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn vanished_grid_drops_only_its_entries() {
        let mut world = World::new();
        let grid = world.spawn_grid(MapId(0), Transform2::default());
        let gone = EntityId::new();
        let entries = [
            entry(Some(gone), 1.0, 1.0),
            entry(Some(grid), 2.0, 0.0),
            entry(None, 3.0, 3.0),
        ];

        struct Missing(usize);
        impl DropObserver for Missing {
            fn on_drop(&mut self, reason: DropReason) {
                assert_eq!(reason, DropReason::MissingGrid);
                self.0 += 1;
            }
        }
        let mut missing = Missing(0);
        let blips = reconstruct_world(&entries, &world, &mut missing);
        assert_eq!(blips.len(), 2);
        assert_eq!(missing.0, 1);
        assert!((blips[0].position - Vec2::new(2.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn any_report_prefers_most_recent() {
        let mut cache = BlipCache::default();
        let a = EntityId::new();
        let b = EntityId::new();
        cache.on_report_received(Some(a), vec![entry(None, 1.0, 0.0)], secs(1.0));
        cache.on_report_received(Some(b), vec![entry(None, 2.0, 0.0); 2], secs(2.0));
        assert_eq!(cache.most_recent(), Some(SensorKey::Sensor(b)));
        assert_eq!(cache.get_any_report(secs(2.5)).len(), 2);

        cache.on_report_received(Some(a), vec![entry(None, 1.0, 0.0)], secs(3.0));
        assert_eq!(cache.most_recent(), Some(SensorKey::Sensor(a)));

        let world = World::new();
        let blips = cache.get_any_reconstructed_world(secs(3.0), &world);
        assert_eq!(blips.len(), 1);
        assert_eq!(blips[0].position, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn any_report_ties_go_to_smallest_key() {
        let mut cache = BlipCache::default();
        let mut ids = [EntityId::new(), EntityId::new()];
        ids.sort();
        cache.on_report_received(Some(ids[1]), Vec::new(), Timestamp::ZERO);
        cache.on_report_received(Some(ids[0]), Vec::new(), Timestamp::ZERO);
        assert_eq!(cache.most_recent(), Some(SensorKey::Sensor(ids[0])));

        cache.on_report_received(None, Vec::new(), Timestamp::ZERO);
        assert_eq!(cache.most_recent(), Some(SensorKey::Unspecified));
    }

    #[test]
    fn clear_and_remove() {
        let mut cache = BlipCache::default();
        let a = EntityId::new();
        let b = EntityId::new();
        cache.on_report_received(Some(a), Vec::new(), Timestamp::ZERO);
        cache.on_report_received(Some(b), Vec::new(), Timestamp::ZERO);
        assert!(cache.remove(a).is_some());
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.most_recent(), None);
    }
}
