// File: cbpoller-core/src/events/decoder.rs

use cbpoller_common::models::EventsApiResponse;
use cbpoller_common::DecodeError;

/// Parse one response body into typed events.
///
/// The whole batch fails if any single event is invalid; there is no
/// partial recovery. Unknown fields are ignored.
pub fn decode(body: &[u8]) -> Result<EventsApiResponse, DecodeError> {
    let mut de = serde_json::Deserializer::from_slice(body);
    let response: EventsApiResponse = serde_path_to_error::deserialize(&mut de)?;
    de.end()
        .map_err(|e| DecodeError::new(".", format!("trailing data after document: {e}")))?;
    Ok(response)
}

pub fn decode_str(body: &str) -> Result<EventsApiResponse, DecodeError> {
    decode(body.as_bytes())
}
