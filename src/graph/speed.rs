//! Speed-limit parsing for OSM-style `maxspeed` tags.
//!
//! A tag may be missing, a number, a string whose leading token is a number (`"50"`,
//! `"30 mph"`), or a list of such candidates. Lists resolve to the lowest candidate.
//! Anything unusable falls back to the configured default, so the resulting speed is
//! always positive.

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Speed used when a tag is missing or unusable.
pub const DEFAULT_SPEED_KMH: f64 = 40.0;

/// One candidate value of a `maxspeed` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpeedValue {
    Number(f64),
    Text(String),
}

/// Raw `maxspeed` tag as found in the graph document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaxSpeed {
    One(SpeedValue),
    Many(Vec<SpeedValue>),
}

impl SpeedValue {
    fn kmh(&self) -> Option<f64> {
        match self {
            SpeedValue::Number(n) => Some(*n),
            SpeedValue::Text(text) => leading_number(text),
        }
    }
}

/// Parses the number at the start of `text`, ignoring any unit after it.
fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let end = text
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map_or(text.len(), |(i, _)| i);
    text[..end].parse().ok()
}

/// Resolves a `maxspeed` tag to a positive speed in km/h.
pub fn parse_maxspeed(raw: Option<&MaxSpeed>, default_kmh: f64) -> f64 {
    let parsed = match raw {
        None => None,
        Some(MaxSpeed::One(value)) => value.kmh(),
        // Every candidate must parse, otherwise the whole tag is unusable.
        Some(MaxSpeed::Many(values)) => values
            .iter()
            .map(SpeedValue::kmh)
            .collect::<Option<Vec<f64>>>()
            .and_then(|speeds| speeds.into_iter().min_by(f64::total_cmp)),
    };

    match parsed {
        Some(speed) if speed.is_finite() && speed > 0.0 => speed,
        _ => {
            trace!(?raw, default_kmh, "Unusable maxspeed, using default");
            default_kmh
        }
    }
}
