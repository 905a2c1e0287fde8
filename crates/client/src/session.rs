use radarsync_common::{Clock, DropObserver, DropReason, EntityId, NoopObserver};
use radarsync_kernel::TransformSource;
use radarsync_protocol::{
    BlipEntry, GiveBlips, LoopbackChannel, ProtocolError, RadarMessage, RequestBlips, SessionId,
};

use crate::cache::{BlipCache, ReportState, SensorKey, WorldBlip, reconstruct_world};
use crate::config::ClientConfig;
use crate::throttle::RequestThrottle;

/// Radar state for one client session.
///
/// Created at session start and dropped, or reset with
/// [`end_session`](Self::end_session), at session end. All mutation goes
/// through `&mut self`, so the cache has a single owner; a multi-threaded host
/// must keep it behind its own lock.
#[derive(Debug)]
pub struct RadarClient<C, O = NoopObserver> {
    config: ClientConfig,
    clock: C,
    throttle: RequestThrottle,
    cache: BlipCache,
    observer: O,
}

impl<C: Clock> RadarClient<C, NoopObserver> {
    pub fn new(config: ClientConfig, clock: C) -> Self {
        Self::with_observer(config, clock, NoopObserver)
    }
}

impl<C: Clock, O: DropObserver> RadarClient<C, O> {
    pub fn with_observer(config: ClientConfig, clock: C, observer: O) -> Self {
        Self {
            throttle: RequestThrottle::new(config.request_interval()),
            cache: BlipCache::new(config.stale_after()),
            config,
            clock,
            observer,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn cache(&self) -> &BlipCache {
        &self.cache
    }

    pub fn throttle(&self) -> &RequestThrottle {
        &self.throttle
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Ask for a fresh report from `sensor`, subject to the session throttle.
    /// Returns the message to send, or `None` if throttled.
    pub fn request_blips(&mut self, sensor: EntityId) -> Option<RequestBlips> {
        let request = self.throttle.maybe_request(sensor, self.clock.now());
        if request.is_none() {
            self.observer.on_drop(DropReason::Throttled);
        }
        request
    }

    /// [`request_blips`](Self::request_blips), sending the request on `channel`.
    /// Returns whether a request went out.
    pub fn request_via(
        &mut self,
        channel: &mut LoopbackChannel,
        session: SessionId,
        sensor: EntityId,
    ) -> Result<bool, ProtocolError> {
        let Some(request) = self.request_blips(sensor) else {
            return Ok(false);
        };
        channel.send_to_server(session, &RadarMessage::RequestBlips(request))?;
        Ok(true)
    }

    /// Store a report. Late replies are accepted like any other.
    pub fn on_report(&mut self, report: GiveBlips) {
        let now = self.clock.now();
        tracing::debug!(
            sensor = ?report.from_sensor,
            entries = report.entries.len(),
            "report received"
        );
        self.cache
            .on_report_received(report.from_sensor, report.entries, now);
    }

    /// Route an inbound message. Returns whether a report was cached.
    pub fn handle_message(&mut self, message: RadarMessage) -> bool {
        match message {
            RadarMessage::GiveBlips(report) => {
                self.on_report(report);
                true
            }
            RadarMessage::RequestBlips(_) => {
                tracing::debug!("ignoring request sent to client");
                false
            }
        }
    }

    /// Drain every reply waiting for `session`. Returns the number cached.
    pub fn pump(
        &mut self,
        channel: &mut LoopbackChannel,
        session: SessionId,
    ) -> Result<usize, ProtocolError> {
        let mut cached = 0;
        while let Some(message) = channel.poll_client(session)? {
            if self.handle_message(message) {
                cached += 1;
            }
        }
        Ok(cached)
    }

    fn resolve_key(&self, sensor: Option<EntityId>) -> Option<SensorKey> {
        match sensor {
            Some(sensor) => Some(SensorKey::Sensor(sensor)),
            None => self.cache.most_recent(),
        }
    }

    fn readable_entries(&mut self, sensor: Option<EntityId>) -> &[BlipEntry] {
        let now = self.clock.now();
        let Some(key) = self.resolve_key(sensor) else {
            return &[];
        };
        if self.cache.report_state(key, now) == ReportState::Stale {
            self.observer.on_drop(DropReason::Stale);
        }
        self.cache.get_report(key, now)
    }

    /// Cached entries as received. `None` picks the most recently updated
    /// sensor; see [`BlipCache::most_recent`].
    pub fn raw_blips(&mut self, sensor: Option<EntityId>) -> Vec<BlipEntry> {
        self.readable_entries(sensor).to_vec()
    }

    /// Cached entries in world space, using `transforms` for current grid poses.
    pub fn current_world_blips<T>(
        &mut self,
        sensor: Option<EntityId>,
        transforms: &T,
    ) -> Vec<WorldBlip>
    where
        T: TransformSource + ?Sized,
    {
        let entries = self.readable_entries(sensor).to_vec();
        reconstruct_world(&entries, transforms, &mut self.observer)
    }

    /// Session teardown: forget every report and the throttle window.
    pub fn end_session(&mut self) {
        tracing::debug!(cached = self.cache.len(), "radar session ended");
        self.cache.clear();
        self.throttle.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use radarsync_common::{BlipShape, ManualClock, MapId, Rgba8, Timestamp, Transform2};
    use radarsync_kernel::World;
    use std::collections::BTreeMap;
    use std::time::Duration;

    #[derive(Default)]
    struct Tally(BTreeMap<DropReason, usize>);

    impl DropObserver for Tally {
        fn on_drop(&mut self, reason: DropReason) {
            *self.0.entry(reason).or_default() += 1;
        }
    }

    fn entry(grid: Option<EntityId>, x: f32, y: f32) -> BlipEntry {
        BlipEntry {
            grid,
            position: Vec2::new(x, y),
            scale: 1.0,
            color: Rgba8::RED,
            shape: BlipShape::Triangle,
        }
    }

    #[test]
    fn request_blips_is_throttled_and_observed() {
        let clock = ManualClock::new(Timestamp::ZERO);
        let mut client =
            RadarClient::with_observer(ClientConfig::default(), &clock, Tally::default());
        let sensor = EntityId::new();

        assert!(client.request_blips(sensor).is_some());
        clock.advance(Duration::from_millis(100));
        assert!(client.request_blips(sensor).is_none());
        clock.advance(Duration::from_millis(150));
        assert!(client.request_blips(sensor).is_some());

        assert_eq!(client.observer().0.get(&DropReason::Throttled), Some(&1));
    }

    #[test]
    fn stale_read_is_empty_and_observed() {
        let clock = ManualClock::new(Timestamp::ZERO);
        let mut client =
            RadarClient::with_observer(ClientConfig::default(), &clock, Tally::default());
        let sensor = EntityId::new();
        client.on_report(GiveBlips {
            from_sensor: Some(sensor),
            entries: vec![entry(None, 1.0, 1.0), entry(None, 2.0, 2.0)],
        });

        clock.set(Timestamp::from_secs_f32(4.0));
        assert!(client.raw_blips(Some(sensor)).is_empty());
        assert_eq!(client.observer().0.get(&DropReason::Stale), Some(&1));

        client.on_report(GiveBlips {
            from_sensor: Some(sensor),
            entries: vec![entry(None, 3.0, 3.0)],
        });
        clock.set(Timestamp::from_secs_f32(6.0));
        assert_eq!(client.raw_blips(Some(sensor)).len(), 1);
    }

    #[test]
    fn current_world_blips_reconstructs_and_drops_missing_grids() {
        let clock = ManualClock::new(Timestamp::ZERO);
        let mut client =
            RadarClient::with_observer(ClientConfig::default(), &clock, Tally::default());
        let mut world = World::new();
        let grid = world.spawn_grid(
            MapId(0),
            Transform2::new(Vec2::new(10.0, 0.0), std::f32::consts::FRAC_PI_2),
        );
        let sensor = EntityId::new();
        client.on_report(GiveBlips {
            from_sensor: Some(sensor),
            entries: vec![entry(Some(grid), 1.0, 0.0), entry(Some(EntityId::new()), 0.0, 0.0)],
        });

        let blips = client.current_world_blips(Some(sensor), &world);
        assert_eq!(blips.len(), 1);
        assert!((blips[0].position - Vec2::new(10.0, 1.0)).length() < 1e-4);
        assert_eq!(client.observer().0.get(&DropReason::MissingGrid), Some(&1));
    }

    #[test]
    fn unspecified_sensor_reads_most_recent() {
        let clock = ManualClock::new(Timestamp::ZERO);
        let mut client = RadarClient::new(ClientConfig::default(), &clock);
        let a = EntityId::new();
        let b = EntityId::new();
        client.on_report(GiveBlips {
            from_sensor: Some(a),
            entries: vec![entry(None, 1.0, 0.0)],
        });
        clock.advance(Duration::from_millis(10));
        client.on_report(GiveBlips {
            from_sensor: Some(b),
            entries: vec![entry(None, 2.0, 0.0), entry(None, 3.0, 0.0)],
        });

        assert_eq!(client.raw_blips(None).len(), 2);
        assert_eq!(client.raw_blips(Some(a)).len(), 1);
        let world = World::new();
        assert_eq!(client.current_world_blips(None, &world).len(), 2);
    }

    #[test]
    fn end_session_clears_everything() {
        let clock = ManualClock::new(Timestamp::ZERO);
        let mut client = RadarClient::new(ClientConfig::default(), &clock);
        let sensor = EntityId::new();
        assert!(client.request_blips(sensor).is_some());
        client.on_report(GiveBlips {
            from_sensor: Some(sensor),
            entries: vec![entry(None, 0.0, 0.0)],
        });

        client.end_session();
        assert!(client.cache().is_empty());
        assert!(client.raw_blips(None).is_empty());
        assert!(client.request_blips(sensor).is_some());
    }

    #[test]
    fn config_drives_throttle_and_staleness() {
        let clock = ManualClock::new(Timestamp::ZERO);
        let config = ClientConfig {
            request_interval_ms: 1000,
            stale_after_ms: 500,
        };
        let mut client = RadarClient::new(config, &clock);
        let sensor = EntityId::new();
        assert_eq!(client.throttle().interval(), Duration::from_secs(1));
        assert_eq!(client.cache().stale_after(), Duration::from_millis(500));

        client.on_report(GiveBlips {
            from_sensor: Some(sensor),
            entries: vec![entry(None, 0.0, 0.0)],
        });
        clock.advance(Duration::from_millis(600));
        assert!(client.raw_blips(Some(sensor)).is_empty());
    }

    #[test]
    fn requests_sent_to_client_are_ignored() {
        let clock = ManualClock::new(Timestamp::ZERO);
        let mut client = RadarClient::new(ClientConfig::default(), &clock);
        assert!(!client.handle_message(RadarMessage::RequestBlips(RequestBlips { sensor: None })));
        assert!(client.cache().is_empty());
    }
}
