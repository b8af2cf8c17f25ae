use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;

/// A validated WGS84 position in decimal degrees.
///
/// Latitude must lie in `[-90, 90]` and longitude in `[-180, 180]`; both must be finite.
/// Deserialization runs the same validation, so a `Coordinate` read from a config file or
/// an order payload is always usable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("Coordinate out of range: lat={lat}, lng={lng}")]
pub struct CoordinateError {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        if valid {
            Ok(Self { lat, lng })
        } else {
            Err(CoordinateError { lat, lng })
        }
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

#[derive(Deserialize)]
struct RawCoordinate {
    lat: f64,
    #[serde(alias = "lon")]
    lng: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoordinateError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.lat, raw.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_out_of_range_and_non_finite() {
        assert!(Coordinate::new(-31.38, -57.96).is_ok());
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(90.5, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.01).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Coordinate = serde_json::from_str(r#"{"lat": -31.38, "lon": -57.96}"#).unwrap();
        assert_eq!(ok.lng, -57.96);

        let bad = serde_json::from_str::<Coordinate>(r#"{"lat": 120.0, "lng": 0.0}"#);
        assert!(bad.is_err());
    }
}
