//! Data models.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::SatTrackerError;
use serde_helpers::*;

/// Maximum length of a two-line element set line
pub const TLE_LINE_MAX_LEN: usize = 70;

/// Category assigned to records created without one
pub const DEFAULT_CATEGORY: &str = "Other";

/// NORAD catalog number
///
/// The unique integer identifier assigned to a tracked space object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct NoradId(i64);

impl TryFrom<i64> for NoradId {
    type Error = SatTrackerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if !(1..=999_999_999).contains(&value) {
            return Err(SatTrackerError::InvalidNoradId(value.to_string()));
        }
        Ok(Self(value))
    }
}

impl TryFrom<&str> for NoradId {
    type Error = SatTrackerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let parsed = value
            .trim()
            .parse::<i64>()
            .map_err(|_| SatTrackerError::InvalidNoradId(value.to_string()))?;
        Self::try_from(parsed)
    }
}

impl From<NoradId> for i64 {
    fn from(id: NoradId) -> Self {
        id.0
    }
}

impl NoradId {
    /// Get the raw catalog number
    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Stored satellite with its two-line element set
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SatelliteRecord {
    /// Surrogate identifier assigned by the store
    pub id: i64,
    pub name: String,
    pub norad_id: i64,
    pub line1: String,
    pub line2: String,
    pub category: String,
    /// Inactive records are hidden from list and search
    pub is_active: bool,
    #[serde(serialize_with = "serialize_iso8601")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Satellite to be inserted into the store
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewSatellite {
    pub name: String,
    pub norad_id: NoradId,
    pub line1: String,
    pub line2: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl NewSatellite {
    pub fn new(name: &str, norad_id: NoradId, line1: &str, line2: &str) -> Self {
        Self {
            name: name.to_string(),
            norad_id,
            line1: line1.to_string(),
            line2: line2.to_string(),
            category: None,
        }
    }

    /// Category to store, falling back to [`DEFAULT_CATEGORY`]
    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }

    /// Check required fields.
    ///
    /// Element lines are opaque; only presence and length are checked.
    pub fn validate(&self) -> Result<(), SatTrackerError> {
        if self.name.trim().is_empty() {
            return Err(SatTrackerError::InvalidRecord(
                "name cannot be empty".to_string(),
            ));
        }
        for (field, line) in [("line1", &self.line1), ("line2", &self.line2)] {
            if line.is_empty() {
                return Err(SatTrackerError::InvalidRecord(format!(
                    "{} cannot be empty",
                    field
                )));
            }
            if line.chars().count() > TLE_LINE_MAX_LEN {
                return Err(SatTrackerError::InvalidRecord(format!(
                    "{} exceeds {} characters",
                    field, TLE_LINE_MAX_LEN
                )));
            }
        }
        Ok(())
    }
}

/// Identity of the live-tracked satellite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedSatellite {
    pub name: String,
    pub norad_id: NoradId,
}

/// Current position as reported to clients
///
/// Observer-relative fields are not supplied by the upstream service and
/// are always serialized as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SatellitePosition {
    pub latitude: f64,
    pub longitude: f64,
    pub azimuth: Option<f64>,
    pub elevation: Option<f64>,
    pub range_km: Option<f64>,
    pub visible: Option<bool>,
    /// ISO-8601 UTC time of the fix
    pub timestamp: String,
}

/// Response body of the upstream position service
///
/// See: http://open-notify.org/Open-Notify-API/ISS-Location-Now/
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpstreamPosition {
    pub message: String,
    pub iss_position: UpstreamCoordinates,
    /// Seconds from Unix epoch
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpstreamCoordinates {
    /// Decimal degrees, sent as a string
    #[serde(deserialize_with = "deserialize_coordinate")]
    pub latitude: f64,
    #[serde(deserialize_with = "deserialize_coordinate")]
    pub longitude: f64,
}

impl UpstreamPosition {
    /// Convert to client position, rounding coordinates to two decimals
    pub fn into_position(self) -> Result<SatellitePosition, SatTrackerError> {
        if self.message != "success" {
            return Err(SatTrackerError::UpstreamApi(format!(
                "unexpected message: {}",
                self.message
            )));
        }
        let time = DateTime::from_timestamp(self.timestamp, 0).ok_or_else(|| {
            SatTrackerError::UpstreamApi(format!("invalid timestamp: {}", self.timestamp))
        })?;

        Ok(SatellitePosition {
            latitude: round2(self.iss_position.latitude),
            longitude: round2(self.iss_position.longitude),
            azimuth: None,
            elevation: None,
            range_km: None,
            visible: None,
            timestamp: time.to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }
}

/// Round to two decimals from the exact value of `value`
fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// Custom (de)serializers
mod serde_helpers {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize_iso8601<S>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Micros, true)),
            None => serializer.serialize_none(),
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Coordinate {
        Text(String),
        Number(f64),
    }

    pub fn deserialize_coordinate<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Coordinate::deserialize(deserializer)? {
            Coordinate::Number(value) => Ok(value),
            Coordinate::Text(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
        }
    }
}
