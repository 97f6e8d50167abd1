//! Location descriptors and the feed endpoints they map to.
//!
//! Inputs are checked when a request is built, so a request that exists
//! always produces a usable path (with the one exception of
//! [`CityKind::Unset`], which is reported when the request is executed).

use thiserror::Error;
use tracing::debug;

use crate::error::{FeedError, Result};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("access token must not be empty")]
    EmptyToken,
    #[error("city name must not be empty")]
    EmptyCityName,
    #[error("city name must contain letters only: {0:?}")]
    InvalidCityName(String),
    #[error("city id must not be empty")]
    EmptyCityId,
    #[error("city id must contain digits only: {0:?}")]
    InvalidCityId(String),
    #[error("coordinate must not be empty")]
    EmptyCoordinate,
    #[error("coordinate must be a plain decimal number: {0:?}")]
    InvalidCoordinate(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CityKind {
    #[default]
    Unset,
    Name,
    Id,
}

impl CityKind {
    pub fn code(self) -> u32 {
        match self {
            CityKind::Unset => 0,
            CityKind::Name => 1,
            CityKind::Id => 2,
        }
    }
}

fn checked_token(token: &str) -> Result<String, ValidationError> {
    if token.is_empty() {
        return Err(ValidationError::EmptyToken);
    }
    Ok(token.to_string())
}

fn checked_coordinate(value: &str) -> Result<String, ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyCoordinate);
    }
    let digits = value.chars().filter(char::is_ascii_digit).count();
    let points = value.chars().filter(|&c| c == '.').count();
    if digits == 0 || points > 1 || digits + points != value.chars().count() {
        debug!("{:?} is invalid for a coordinate", value);
        return Err(ValidationError::InvalidCoordinate(value.to_string()));
    }
    Ok(value.to_string())
}

/// Query by city name or station id: `/feed/{city}/` or `/feed/@{id}/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityRequest {
    token: String,
    kind: CityKind,
    city: String,
}

impl CityRequest {
    /// Builds a request with an explicit kind, checking only the token.
    ///
    /// `city` is used verbatim in the path. A [`CityKind::Unset`] request is
    /// accepted here but fails with [`FeedError::InvalidTypeCode`] when run.
    pub fn new(token: &str, kind: CityKind, city: &str) -> Result<Self, ValidationError> {
        Ok(CityRequest {
            token: checked_token(token)?,
            kind,
            city: city.to_string(),
        })
    }

    /// `name` must be non-empty ASCII letters; the feed's city slugs never
    /// carry accents, spaces or punctuation.
    pub fn with_name(token: &str, name: &str) -> Result<Self, ValidationError> {
        let token = checked_token(token)?;
        if name.is_empty() {
            return Err(ValidationError::EmptyCityName);
        }
        if !name.chars().all(|c| c.is_ascii_alphabetic()) {
            debug!("{:?} is invalid for a city name", name);
            return Err(ValidationError::InvalidCityName(name.to_string()));
        }

        Ok(CityRequest {
            token,
            kind: CityKind::Name,
            city: name.to_string(),
        })
    }

    pub fn with_id(token: &str, id: &str) -> Result<Self, ValidationError> {
        let token = checked_token(token)?;
        if id.is_empty() {
            return Err(ValidationError::EmptyCityId);
        }
        if !id.chars().all(|c| c.is_ascii_digit()) {
            debug!("{:?} is invalid for a city id", id);
            return Err(ValidationError::InvalidCityId(id.to_string()));
        }

        Ok(CityRequest {
            token,
            kind: CityKind::Id,
            city: format!("@{}", id),
        })
    }

    pub fn kind(&self) -> CityKind {
        self.kind
    }

    /// Name or `@`-prefixed id as it appears in the path.
    pub fn city(&self) -> &str {
        &self.city
    }

    fn endpoint(&self) -> Result<String> {
        match self.kind {
            CityKind::Name | CityKind::Id => Ok(format!("/feed/{}/", self.city)),
            CityKind::Unset => Err(FeedError::InvalidTypeCode(self.kind.code())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum GeoTarget {
    Here,
    LatLng { lat: String, lng: String },
}

/// Query by position: the caller's IP address or a latitude/longitude pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoRequest {
    token: String,
    target: GeoTarget,
}

impl GeoRequest {
    /// Lets the service geolocate the caller's IP address.
    pub fn with_ip(token: &str) -> Result<Self, ValidationError> {
        Ok(GeoRequest {
            token: checked_token(token)?,
            target: GeoTarget::Here,
        })
    }

    /// `lat` and `lng` are unsigned decimal numerals such as `"41.014722"`.
    pub fn with_lat_lng(token: &str, lat: &str, lng: &str) -> Result<Self, ValidationError> {
        Ok(GeoRequest {
            token: checked_token(token)?,
            target: GeoTarget::LatLng {
                lat: checked_coordinate(lat)?,
                lng: checked_coordinate(lng)?,
            },
        })
    }

    /// `None` for an IP based request.
    pub fn lat_lng(&self) -> Option<(&str, &str)> {
        match &self.target {
            GeoTarget::Here => None,
            GeoTarget::LatLng { lat, lng } => Some((lat, lng)),
        }
    }

    fn endpoint(&self) -> String {
        match &self.target {
            GeoTarget::Here => "/feed/here/".to_string(),
            GeoTarget::LatLng { lat, lng } => format!("/feed/geo:{};{}/", lat, lng),
        }
    }
}

/// Any query the feed understands. Immutable, so one value can be run
/// repeatedly and from several threads at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationRequest {
    City(CityRequest),
    Geo(GeoRequest),
}

impl LocationRequest {
    pub fn access_token(&self) -> &str {
        match self {
            LocationRequest::City(city) => &city.token,
            LocationRequest::Geo(geo) => &geo.token,
        }
    }

    /// Path below the service base URL.
    pub fn endpoint(&self) -> Result<String> {
        match self {
            LocationRequest::City(city) => city.endpoint(),
            LocationRequest::Geo(geo) => Ok(geo.endpoint()),
        }
    }

    /// Query parameters besides the token.
    pub fn parameters(&self) -> Vec<(String, String)> {
        match self {
            LocationRequest::City(_) | LocationRequest::Geo(_) => Vec::new(),
        }
    }
}

impl From<CityRequest> for LocationRequest {
    fn from(request: CityRequest) -> Self {
        LocationRequest::City(request)
    }
}

impl From<GeoRequest> for LocationRequest {
    fn from(request: GeoRequest) -> Self {
        LocationRequest::Geo(request)
    }
}
