//! Event records placed on the globe.

use serde::{Deserialize, Serialize};

use crate::error::InvalidRecord;

/// Priority used when a record does not carry one.
pub const DEFAULT_PRIORITY: i32 = 5;

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

/// A geolocated event supplied by the owning UI.
///
/// Deserializes from the backend's JSON shape: `_id` is accepted for `id`,
/// `lat`/`lng` for the coordinates, and `null` coordinates become `None`.
/// Display fields are opaque to the globe.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lng")]
    pub longitude: Option<f64>,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub published_at: Option<String>,
}

impl EventRecord {
    /// Record with the fields the globe reads; display fields are left empty.
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64, priority: i32) -> Self {
        Self {
            id: id.into(),
            latitude: Some(latitude),
            longitude: Some(longitude),
            priority,
            ..Default::default()
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Latitude and longitude in degrees, if both are present and finite.
    ///
    /// Values outside the nominal ranges are accepted; they still map onto
    /// the sphere deterministically.
    pub fn coordinates(&self) -> Result<(f64, f64), InvalidRecord> {
        let latitude = require("latitude", self.latitude)?;
        let longitude = require("longitude", self.longitude)?;
        Ok((latitude, longitude))
    }
}

fn require(field: &'static str, value: Option<f64>) -> Result<f64, InvalidRecord> {
    match value {
        None => Err(InvalidRecord::MissingCoordinate(field)),
        Some(v) if !v.is_finite() => Err(InvalidRecord::NonFiniteCoordinate(field)),
        Some(v) => Ok(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_shape() {
        let record: EventRecord = serde_json::from_str(
            r#"{
                "_id": "65f1",
                "title": "Flooding in the delta",
                "lat": 23.7,
                "lng": 90.4,
                "priority": 8,
                "publishedAt": "2024-04-02T10:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(record.id, "65f1");
        assert_eq!(record.coordinates(), Ok((23.7, 90.4)));
        assert_eq!(record.priority, 8);
        assert_eq!(record.published_at.as_deref(), Some("2024-04-02T10:00:00Z"));
    }

    #[test]
    fn test_full_field_names() {
        let record: EventRecord = serde_json::from_str(
            r#"{"id": "x", "latitude": -33.9, "longitude": 151.2, "country": "Australia"}"#,
        )
        .unwrap();
        assert_eq!(record.coordinates(), Ok((-33.9, 151.2)));
        assert_eq!(record.priority, DEFAULT_PRIORITY);
        assert_eq!(record.country.as_deref(), Some("Australia"));
    }

    #[test]
    fn test_null_latitude_is_missing() {
        let record: EventRecord =
            serde_json::from_str(r#"{"id": "b", "lat": null, "lng": 10, "priority": 3}"#).unwrap();
        assert_eq!(
            record.coordinates(),
            Err(InvalidRecord::MissingCoordinate("latitude"))
        );
    }

    #[test]
    fn test_absent_longitude_is_missing() {
        let record: EventRecord = serde_json::from_str(r#"{"id": "c", "lat": 1.0}"#).unwrap();
        assert_eq!(
            record.coordinates(),
            Err(InvalidRecord::MissingCoordinate("longitude"))
        );
    }

    #[test]
    fn test_non_finite_rejected() {
        let record = EventRecord::new("nan", 10.0, f64::NAN, 5);
        assert_eq!(
            record.coordinates(),
            Err(InvalidRecord::NonFiniteCoordinate("longitude"))
        );
        let record = EventRecord::new("inf", f64::INFINITY, 0.0, 5);
        assert_eq!(
            record.coordinates(),
            Err(InvalidRecord::NonFiniteCoordinate("latitude"))
        );
    }

    #[test]
    fn test_out_of_range_accepted() {
        let record = EventRecord::new("wrap", 95.0, 200.0, 5);
        assert_eq!(record.coordinates(), Ok((95.0, 200.0)));
    }
}
