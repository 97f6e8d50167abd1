//! Client for the World Air Quality Index feed.
//!
//! Build a [`LocationRequest`] from a [`CityRequest`] or [`GeoRequest`],
//! then run it through a [`FeedClient`] either blocking
//! ([`FeedClient::request_sync`]) or on the client's worker pool
//! ([`FeedClient::request_async`]):
//!
//! ```no_run
//! use fetch_feed::{CityRequest, FeedClient, FeedConfig};
//!
//! # fn main() -> fetch_feed::Result<()> {
//! let client = FeedClient::new(&FeedConfig::from_env()?)?;
//! let request = CityRequest::with_name("my-token", "istanbul")?.into();
//! let reading = client.request_sync(&request)?;
//! println!("{} -> {}", reading.station_id(), reading.aqi());
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod decode;
mod error;
mod request;
mod transport;

pub use crate::client::{FeedClient, PendingCall};
pub use crate::config::{FeedConfig, DEFAULT_BASE_URL};
pub use crate::decode::{decode_response, parse_json};
pub use crate::error::{FeedError, Result};
pub use crate::request::{CityKind, CityRequest, GeoRequest, LocationRequest, ValidationError};
pub use crate::transport::{HttpTransport, Query, Transport, USER_AGENT};

pub use json_structs::output::{AirQualityReading, Attribution, City, Geo, NO_READING};
pub use tokio_util::sync::CancellationToken;
