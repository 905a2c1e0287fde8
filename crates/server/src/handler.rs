use radarsync_common::{DropObserver, DropReason, NoopObserver};
use radarsync_ecs::ComponentStore;
use radarsync_kernel::TransformSource;
use radarsync_protocol::{
    GiveBlips, LoopbackChannel, ProtocolError, RadarMessage, RequestBlips, SessionId,
};

use crate::aggregate::assemble_report;

/// A report addressed to the session that asked for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub session: SessionId,
    pub message: GiveBlips,
}

/// Serves `RequestBlips` from any number of sessions.
///
/// Holds no world state; the only thing it owns is the drop observer.
#[derive(Debug, Default)]
pub struct RadarServer<O = NoopObserver> {
    observer: O,
}

impl RadarServer<NoopObserver> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<O: DropObserver> RadarServer<O> {
    pub fn with_observer(observer: O) -> Self {
        Self { observer }
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Answer one request.
    ///
    /// Replies even when nothing is visible, so the client's receipt time is
    /// refreshed. A request with no sensor, or naming an entity that is gone or
    /// has no radar console, is dropped without a reply.
    pub fn handle_request<T>(
        &mut self,
        session: SessionId,
        request: RequestBlips,
        transforms: &T,
        components: &ComponentStore,
    ) -> Option<Reply>
    where
        T: TransformSource + ?Sized,
    {
        let Some(sensor) = request.sensor else {
            tracing::debug!(%session, "request without sensor dropped");
            self.observer.on_drop(DropReason::UnknownSensor);
            return None;
        };
        if components.get_radar_console(sensor).is_none() || transforms.resolve(sensor).is_none() {
            tracing::debug!(%session, %sensor, "request for unknown sensor dropped");
            self.observer.on_drop(DropReason::UnknownSensor);
            return None;
        }

        let entries = assemble_report(sensor, transforms, components, &mut self.observer);
        Some(Reply {
            session,
            message: GiveBlips {
                from_sensor: Some(sensor),
                entries,
            },
        })
    }

    /// Route any inbound message. Reports sent to the server are ignored.
    pub fn handle_message<T>(
        &mut self,
        session: SessionId,
        message: RadarMessage,
        transforms: &T,
        components: &ComponentStore,
    ) -> Option<Reply>
    where
        T: TransformSource + ?Sized,
    {
        match message {
            RadarMessage::RequestBlips(request) => {
                self.handle_request(session, request, transforms, components)
            }
            RadarMessage::GiveBlips(_) => {
                tracing::debug!(%session, "ignoring report sent to server");
                None
            }
        }
    }

    /// Drain every pending request on `channel` and send the replies.
    /// Returns the number of replies sent.
    pub fn pump<T>(
        &mut self,
        channel: &mut LoopbackChannel,
        transforms: &T,
        components: &ComponentStore,
    ) -> Result<usize, ProtocolError>
    where
        T: TransformSource + ?Sized,
    {
        let mut sent = 0;
        while let Some((session, message)) = channel.poll_server()? {
            if let Some(reply) = self.handle_message(session, message, transforms, components) {
                channel.send_to_client(reply.session, &RadarMessage::GiveBlips(reply.message))?;
                sent += 1;
            }
        }
        Ok(sent)
    }
}
