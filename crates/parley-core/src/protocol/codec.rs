//! JSON wire codec for transports that move bytes.
//!
//! Transports are free to serialize envelopes however they like; this is the
//! default encoding. Decoding is strict: unknown fields and envelopes carrying
//! both a payload and a progress string are rejected.

use bytes::Bytes;

use crate::error::{ParleyError, Result};
use crate::protocol::envelope::Envelope;

/// Encode an envelope into a JSON frame.
pub fn encode(env: &Envelope) -> Result<Bytes> {
    let v = serde_json::to_vec(env)
        .map_err(|e| ParleyError::Codec(format!("envelope encode failed: {e}")))?;
    Ok(Bytes::from(v))
}

/// Decode a JSON frame into an envelope.
pub fn decode(buf: &[u8]) -> Result<Envelope> {
    let env: Envelope = serde_json::from_slice(buf)
        .map_err(|e| ParleyError::Codec(format!("invalid envelope json: {e}")))?;
    if env.is_progress() && env.payload().is_some() {
        return Err(ParleyError::Codec(
            "envelope carries both payload and progress".into(),
        ));
    }
    if env.is_progress() && env.is_exception() {
        return Err(ParleyError::Codec(
            "progress envelope must not be an exception".into(),
        ));
    }
    Ok(env)
}
