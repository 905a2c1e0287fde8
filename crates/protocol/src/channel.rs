use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::codec::{self, ProtocolError};
use crate::messages::RadarMessage;

/// Identifies one connected client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// In-memory, reliable, ordered request/response channel.
///
/// Every message is CBOR-encoded on send and decoded on receive, so the
/// loopback exercises the same bytes a real transport would carry. Server
/// replies are queued per session and never broadcast.
#[derive(Debug, Default)]
pub struct LoopbackChannel {
    next_session: u64,
    to_server: VecDeque<(SessionId, Vec<u8>)>,
    to_client: BTreeMap<SessionId, VecDeque<Vec<u8>>>,
}

impl LoopbackChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new session.
    pub fn connect(&mut self) -> SessionId {
        self.next_session += 1;
        let session = SessionId(self.next_session);
        self.to_client.insert(session, VecDeque::new());
        tracing::debug!(%session, "session connected");
        session
    }

    /// Close a session, discarding anything still in flight for or from it.
    pub fn disconnect(&mut self, session: SessionId) -> bool {
        self.to_server.retain(|(from, _)| *from != session);
        let existed = self.to_client.remove(&session).is_some();
        if existed {
            tracing::debug!(%session, "session disconnected");
        }
        existed
    }

    pub fn is_connected(&self, session: SessionId) -> bool {
        self.to_client.contains_key(&session)
    }

    /// Client side: queue a message for the server.
    pub fn send_to_server(
        &mut self,
        session: SessionId,
        message: &RadarMessage,
    ) -> Result<(), ProtocolError> {
        if !self.is_connected(session) {
            return Err(ProtocolError::UnknownSession(session));
        }
        let bytes = codec::encode(message)?;
        tracing::trace!(%session, len = bytes.len(), "client -> server");
        self.to_server.push_back((session, bytes));
        Ok(())
    }

    /// Server side: take the next inbound message, oldest first.
    pub fn poll_server(&mut self) -> Result<Option<(SessionId, RadarMessage)>, ProtocolError> {
        let Some((session, bytes)) = self.to_server.pop_front() else {
            return Ok(None);
        };
        Ok(Some((session, codec::decode(&bytes)?)))
    }

    /// Server side: queue a reply for exactly one session.
    pub fn send_to_client(
        &mut self,
        session: SessionId,
        message: &RadarMessage,
    ) -> Result<(), ProtocolError> {
        let queue = self
            .to_client
            .get_mut(&session)
            .ok_or(ProtocolError::UnknownSession(session))?;
        let bytes = codec::encode(message)?;
        tracing::trace!(%session, len = bytes.len(), "server -> client");
        queue.push_back(bytes);
        Ok(())
    }

    /// Client side: take the next reply addressed to `session`.
    pub fn poll_client(
        &mut self,
        session: SessionId,
    ) -> Result<Option<RadarMessage>, ProtocolError> {
        let queue = self
            .to_client
            .get_mut(&session)
            .ok_or(ProtocolError::UnknownSession(session))?;
        queue.pop_front().map(|bytes| codec::decode(&bytes)).transpose()
    }

    /// Number of messages waiting for the server.
    pub fn pending_for_server(&self) -> usize {
        self.to_server.len()
    }
}
