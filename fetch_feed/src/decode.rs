//! Turns feed responses into [`AirQualityReading`]s.
//!
//! Two quirks of the service are tolerated: `aqi` may be a placeholder
//! string, and `city.geo` may not hold a full coordinate pair. Anything else
//! that does not match the expected shape is an error.

use json_structs::output::AirQualityReading;
use json_structs::remote_data::{from_object, Envelope, Reading};
use serde_json::Value;
use tracing::warn;

use crate::error::{FeedError, Result};

const STATUS_OK: &str = "ok";

/// Parses a response body into a generic JSON tree.
pub fn parse_json(body: &[u8]) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(FeedError::EmptyResponse);
    }
    serde_json::from_slice(body).map_err(FeedError::Parse)
}

/// Reads the `status`/`data` envelope and decodes the reading inside it.
pub fn decode_response(root: Value) -> Result<AirQualityReading> {
    let envelope: Envelope = from_object(root).map_err(FeedError::Shape)?;

    if envelope.status == STATUS_OK {
        let reading: Reading = from_object(envelope.data).map_err(FeedError::Shape)?;
        return Ok(reading.into());
    }

    let message: String = serde_json::from_value(envelope.data).map_err(FeedError::Shape)?;
    warn!("feed answered {:?}: {}", envelope.status, message);
    Err(FeedError::ErrorResponse(message))
}
