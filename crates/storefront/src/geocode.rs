//! Address geocoding against a Nominatim-compatible service.
//!
//! Forward lookups validate a typed shipping address and attach coordinates
//! to it. Reverse lookups turn a device location into a prefilled form.

use hoe_core::{Address, AddressInput, Coordinates};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::StorefrontConfig;

/// Errors from the geocoding service.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoder request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("geocoder returned status {0}")]
    Status(u16),

    /// The service found no match.
    #[error("address not found: {0}")]
    NotFound(String),

    /// A match came back with unusable coordinates.
    #[error("geocoder returned invalid coordinates: {0}")]
    InvalidCoordinates(String),
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReverseResponse {
    Error { error: String },
    Found(ReversePayload),
}

#[derive(Debug, Deserialize)]
struct ReversePayload {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: ReverseParts,
}

#[derive(Debug, Default, Deserialize)]
struct ReverseParts {
    house_number: Option<String>,
    road: Option<String>,
    suburb: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
}

/// Result of a reverse lookup, in the shape of the address form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseAddress {
    pub display_name: Option<String>,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl ReverseAddress {
    /// Prefill an address form, keeping the name and phone the user typed.
    #[must_use]
    pub fn fill(&self, mut form: AddressInput) -> AddressInput {
        form.address_line1.clone_from(&self.address_line1);
        form.address_line2.clone_from(&self.address_line2);
        form.city.clone_from(&self.city);
        form.state.clone_from(&self.state);
        form.postal_code.clone_from(&self.postal_code);
        form.country.clone_from(&self.country);
        form
    }
}

impl From<ReversePayload> for ReverseAddress {
    fn from(payload: ReversePayload) -> Self {
        let parts = payload.address;
        let address_line1 = match (parts.house_number, parts.road) {
            (Some(number), Some(road)) => format!("{number} {road}"),
            (None, Some(road)) => road,
            (Some(number), None) => number,
            (None, None) => String::new(),
        };
        Self {
            display_name: payload.display_name,
            address_line1,
            address_line2: parts.suburb,
            city: parts
                .city
                .or(parts.town)
                .or(parts.village)
                .unwrap_or_default(),
            state: parts.state.unwrap_or_default(),
            postal_code: parts.postcode.unwrap_or_default(),
            country: parts.country.unwrap_or_default(),
        }
    }
}

/// Client for the geocoding service.
#[derive(Clone)]
pub struct Geocoder {
    http: reqwest::Client,
    base_url: String,
}

impl Geocoder {
    /// Create a geocoder using the configured service and user agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig) -> Result<Self, GeocodeError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.geocoder.user_agent.as_str())
            .build()?;
        Ok(Self {
            http,
            base_url: config.geocoder.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Coordinates for an address.
    ///
    /// # Errors
    ///
    /// Returns `GeocodeError::NotFound` if the service has no match.
    #[instrument(skip(self, address), fields(city = %address.city))]
    pub async fn lookup(&self, address: &Address) -> Result<Coordinates, GeocodeError> {
        let query = address.one_line();
        let response = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query.as_str()), ("format", "jsonv2"), ("limit", "1")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        let hits: Vec<SearchHit> = response.json().await?;
        let hit = hits
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NotFound(query.clone()))?;
        let coordinates = parse_coordinates(&hit.lat, &hit.lon)?;
        debug!(
            lat = coordinates.lat,
            lng = coordinates.lng,
            matched = hit.display_name.as_deref().unwrap_or_default(),
            "address geocoded"
        );
        Ok(coordinates)
    }

    /// Address parts for a location.
    ///
    /// # Errors
    ///
    /// Returns `GeocodeError::NotFound` if the service cannot place the
    /// coordinates.
    #[instrument(skip(self))]
    pub async fn reverse(&self, coordinates: Coordinates) -> Result<ReverseAddress, GeocodeError> {
        let lat = coordinates.lat.to_string();
        let lon = coordinates.lng.to_string();
        let response = self
            .http
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("format", "jsonv2"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        match response.json::<ReverseResponse>().await? {
            ReverseResponse::Error { error } => Err(GeocodeError::NotFound(error)),
            ReverseResponse::Found(payload) => Ok(payload.into()),
        }
    }
}

/// Parse a latitude/longitude pair, rejecting out-of-range values.
///
/// # Errors
///
/// Returns `GeocodeError::InvalidCoordinates` for non-numeric or
/// out-of-range input.
pub fn parse_coordinates(lat: &str, lon: &str) -> Result<Coordinates, GeocodeError> {
    let invalid = || GeocodeError::InvalidCoordinates(format!("{lat},{lon}"));
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lng: f64 = lon.trim().parse().map_err(|_| invalid())?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(invalid());
    }
    Ok(Coordinates { lat, lng })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_coordinates() {
        let c = parse_coordinates("12.9716", " 77.5946").unwrap();
        assert!((c.lat - 12.9716).abs() < f64::EPSILON);
        assert!(parse_coordinates("north", "77").is_err());
        assert!(parse_coordinates("95.0", "77").is_err());
    }

    #[test]
    fn test_reverse_payload_picks_town_when_no_city() {
        let response: ReverseResponse = serde_json::from_value(json!({
            "display_name": "4, Temple Street, Udupi",
            "address": {
                "house_number": "4",
                "road": "Temple Street",
                "town": "Udupi",
                "state": "Karnataka",
                "postcode": "576101",
                "country": "India"
            }
        }))
        .unwrap();
        let ReverseResponse::Found(payload) = response else {
            panic!("expected a match");
        };
        let address = ReverseAddress::from(payload);
        assert_eq!(address.address_line1, "4 Temple Street");
        assert_eq!(address.city, "Udupi");
        assert_eq!(address.postal_code, "576101");
    }

    #[test]
    fn test_reverse_error_body() {
        let response: ReverseResponse =
            serde_json::from_value(json!({"error": "Unable to geocode"})).unwrap();
        assert!(matches!(response, ReverseResponse::Error { .. }));
    }

    #[test]
    fn test_fill_keeps_contact_fields() {
        let form = AddressInput {
            full_name: "Asha".to_string(),
            phone: "9876543210".to_string(),
            ..AddressInput::default()
        };
        let reverse = ReverseAddress {
            address_line1: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            ..ReverseAddress::default()
        };
        let filled = reverse.fill(form);
        assert_eq!(filled.full_name, "Asha");
        assert_eq!(filled.city, "Bengaluru");
    }
}
