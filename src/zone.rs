//! Quadrant labelling of delivery points relative to the store.
//!
//! A point is north of the store iff its latitude is strictly greater, and east iff its
//! longitude is strictly greater. Points exactly on either line therefore fall to the
//! south / west side. No hemisphere is assumed: the comparison is against the configured
//! store coordinate only.

use crate::model::Coordinate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ZoneLabel {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl ZoneLabel {
    pub const ALL: [ZoneLabel; 4] = [
        ZoneLabel::NorthWest,
        ZoneLabel::NorthEast,
        ZoneLabel::SouthWest,
        ZoneLabel::SouthEast,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ZoneLabel::NorthWest => "NW",
            ZoneLabel::NorthEast => "NE",
            ZoneLabel::SouthWest => "SW",
            ZoneLabel::SouthEast => "SE",
        }
    }
}

impl Display for ZoneLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("Unknown zone code: {0:?} (expected NW, NE, SW or SE)")]
pub struct ZoneParseError(pub String);

impl FromStr for ZoneLabel {
    type Err = ZoneParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NW" => Ok(ZoneLabel::NorthWest),
            "NE" => Ok(ZoneLabel::NorthEast),
            "SW" => Ok(ZoneLabel::SouthWest),
            "SE" => Ok(ZoneLabel::SouthEast),
            _ => Err(ZoneParseError(s.to_string())),
        }
    }
}

impl TryFrom<String> for ZoneLabel {
    type Error = ZoneParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ZoneLabel> for String {
    fn from(label: ZoneLabel) -> Self {
        label.code().to_string()
    }
}

/// Classifies delivery points against a fixed store coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneClassifier {
    store: Coordinate,
}

impl ZoneClassifier {
    pub fn new(store: Coordinate) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Coordinate {
        self.store
    }

    pub fn classify(&self, point: Coordinate) -> ZoneLabel {
        let north = point.lat > self.store.lat;
        let east = point.lng > self.store.lng;
        match (north, east) {
            (true, false) => ZoneLabel::NorthWest,
            (true, true) => ZoneLabel::NorthEast,
            (false, false) => ZoneLabel::SouthWest,
            (false, true) => ZoneLabel::SouthEast,
        }
    }
}
