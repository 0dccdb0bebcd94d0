//! Location detection via reverse geocoding. Coordinates come from the caller
//! (there is no browser geolocation here); the provider turns them into a city
//! that the directory search can filter on.

use crate::carelink::api::{ApiClient, ApiError, RequestOptions};
use serde_json::Value;
use std::{fmt, str::FromStr};
use tracing::instrument;

pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// # Errors
    /// Returns a message when either value is out of range or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, String> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(format!("latitude out of range: {latitude}"));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(format!("longitude out of range: {longitude}"));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl FromStr for Coordinates {
    type Err = String;

    /// Parses `"LAT,LON"`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = value
            .split_once(',')
            .ok_or_else(|| format!("expected LAT,LON, got: {value}"))?;
        let lat = lat
            .trim()
            .parse::<f64>()
            .map_err(|err| format!("invalid latitude: {err}"))?;
        let lon = lon
            .trim()
            .parse::<f64>()
            .map_err(|err| format!("invalid longitude: {err}"))?;
        Self::new(lat, lon)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5},{:.5}", self.latitude, self.longitude)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Place {
    pub city: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub display_name: Option<String>,
}

impl Place {
    fn from_response(body: &Value) -> Self {
        let address = body.get("address");
        let text = |key: &str| {
            address
                .and_then(|address| address.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Self {
            city: ["city", "town", "village", "county"]
                .iter()
                .find_map(|key| text(key)),
            state: text("state"),
            postcode: text("postcode"),
            display_name: body
                .get("display_name")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Geocoder {
    api: ApiClient,
}

impl Geocoder {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Resolves coordinates to a place.
    ///
    /// # Errors
    /// Returns `ApiError` on transport failure or a provider error response.
    #[instrument(skip(self))]
    pub async fn reverse(&self, coordinates: Coordinates) -> Result<Place, ApiError> {
        let query = [
            ("format", "json".to_string()),
            ("lat", coordinates.latitude.to_string()),
            ("lon", coordinates.longitude.to_string()),
        ];
        let envelope = self
            .api
            .get("/reverse", &query, RequestOptions::default())
            .await?;

        if let Some(message) = envelope.raw().get("error").and_then(Value::as_str) {
            return Err(ApiError::Rejected(Some(message.to_string())));
        }

        Ok(Place::from_response(envelope.raw()))
    }
}
