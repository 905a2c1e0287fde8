use crate::messages::RadarMessage;

/// Errors from encoding, decoding or routing radar messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("CBOR serialization error: {0}")]
    CborEncode(String),
    #[error("CBOR deserialization error: {0}")]
    CborDecode(String),
    #[error("session {0} is not connected")]
    UnknownSession(crate::channel::SessionId),
}

/// Serialize a message to CBOR bytes.
pub fn encode(message: &RadarMessage) -> Result<Vec<u8>, ProtocolError> {
    let mut buf = Vec::new();
    ciborium::into_writer(message, &mut buf)
        .map_err(|e| ProtocolError::CborEncode(e.to_string()))?;
    Ok(buf)
}

/// Parse a message from CBOR bytes.
pub fn decode(data: &[u8]) -> Result<RadarMessage, ProtocolError> {
    ciborium::from_reader(data).map_err(|e| ProtocolError::CborDecode(e.to_string()))
}
