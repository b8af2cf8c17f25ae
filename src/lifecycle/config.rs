//! Startup configuration, read from a TOML file.
//!
//! ```toml
//! couriers = [
//!     { id = "ana", name = "Ana", contact = "+598 91 000 001" },
//!     { id = "bruno", name = "Bruno", contact = "+598 91 000 002" },
//! ]
//!
//! [store]
//! lat = -31.3833
//! lng = -57.9667
//!
//! [graph]
//! path = "salto.json"          # relative to the config file
//! default_speed_kmh = 40.0
//!
//! [routing]
//! strategy = "a_star"          # or "dijkstra"
//! speed_averaging = "arithmetic" # or "length_weighted"
//! timeout_ms = 500
//!
//! [assignment]
//! capacity = 7
//! policy = "zone_pinned"       # or "load_balance"
//! default_zone = "SE"
//! zones = { NW = "ana", NE = "ana", SW = "bruno", SE = "bruno" }
//! ```
//!
//! The file path comes from the command line or the `DISPATCH_CONFIG` environment
//! variable.

use crate::assignment::{CourierPicker, LoadBalance, ZonePinned};
use crate::graph::{GraphLoadOptions, DEFAULT_SPEED_KMH};
use crate::model::{Coordinate, CourierId, DEFAULT_CAPACITY};
use crate::routing::{RoutingOptions, SearchStrategy, SpeedAveraging};
use crate::zone::ZoneLabel;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "DISPATCH_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No configuration file given (pass a path or set {CONFIG_ENV})")]
    MissingPath,

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    pub store: Coordinate,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub assignment: AssignmentConfig,
    pub couriers: Vec<CourierConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_graph_path")]
    pub path: PathBuf,
    #[serde(default = "default_speed")]
    pub default_speed_kmh: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            path: default_graph_path(),
            default_speed_kmh: default_speed(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    #[serde(default)]
    pub strategy: SearchStrategy,
    #[serde(default)]
    pub speed_averaging: SpeedAveraging,
    /// Upper bound for one route search.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            strategy: SearchStrategy::default(),
            speed_averaging: SpeedAveraging::default(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    LoadBalance,
    ZonePinned,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default)]
    pub policy: PolicyKind,
    #[serde(default)]
    pub zones: HashMap<ZoneLabel, CourierId>,
    #[serde(default)]
    pub default_zone: Option<ZoneLabel>,
    /// Panic on invariant violations. Defaults to on in debug builds.
    #[serde(default = "default_strict")]
    pub strict_invariants: bool,
    /// Mailbox size of each courier actor.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer: usize,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            policy: PolicyKind::default(),
            zones: HashMap::new(),
            default_zone: None,
            strict_invariants: default_strict(),
            channel_buffer: default_channel_buffer(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CourierConfig {
    pub id: CourierId,
    pub name: String,
    pub contact: String,
}

fn default_graph_path() -> PathBuf {
    PathBuf::from("graph.json")
}

fn default_speed() -> f64 {
    DEFAULT_SPEED_KMH
}

fn default_timeout_ms() -> u64 {
    500
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_strict() -> bool {
    cfg!(debug_assertions)
}

fn default_channel_buffer() -> usize {
    32
}

impl DispatchConfig {
    /// Picks the config path: the explicit argument first, then `DISPATCH_CONFIG`.
    pub fn resolve_path(arg: Option<String>) -> Result<PathBuf, ConfigError> {
        arg.or_else(|| std::env::var(CONFIG_ENV).ok())
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .ok_or(ConfigError::MissingPath)
    }

    /// Reads, parses and validates the file. A relative graph path is taken relative to
    /// the config file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&raw)?;
        if config.graph.path.is_relative() {
            if let Some(dir) = path.parent() {
                config.graph.path = dir.join(&config.graph.path);
            }
        }
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.couriers.is_empty() {
            return invalid("at least one courier is required".into());
        }
        let mut seen = HashSet::new();
        for courier in &self.couriers {
            if !seen.insert(&courier.id) {
                return invalid(format!("duplicate courier id {}", courier.id));
            }
        }
        if self.assignment.capacity == 0 {
            return invalid("assignment.capacity must be at least 1".into());
        }
        if self.assignment.channel_buffer == 0 {
            return invalid("assignment.channel_buffer must be at least 1".into());
        }
        let speed = self.graph.default_speed_kmh;
        if !speed.is_finite() || speed <= 0.0 {
            return invalid(format!("graph.default_speed_kmh must be positive, got {speed}"));
        }

        if self.assignment.policy == PolicyKind::ZonePinned {
            let Some(default_zone) = self.assignment.default_zone else {
                return invalid("zone_pinned policy needs assignment.default_zone".into());
            };
            if !self.assignment.zones.contains_key(&default_zone) {
                return invalid(format!("default zone {default_zone} has no courier"));
            }
            for (zone, courier) in &self.assignment.zones {
                if !seen.contains(courier) {
                    return invalid(format!("zone {zone} is mapped to unknown courier {courier}"));
                }
            }
        }
        Ok(())
    }

    pub fn graph_options(&self) -> GraphLoadOptions {
        GraphLoadOptions {
            default_speed_kmh: self.graph.default_speed_kmh,
        }
    }

    pub fn routing_options(&self) -> RoutingOptions {
        RoutingOptions {
            strategy: self.routing.strategy,
            speed_averaging: self.routing.speed_averaging,
        }
    }

    pub fn route_timeout(&self) -> Duration {
        Duration::from_millis(self.routing.timeout_ms)
    }

    /// The courier selection strategy named by `assignment.policy`.
    pub fn picker(&self) -> Box<dyn CourierPicker> {
        match self.assignment.policy {
            PolicyKind::LoadBalance => Box::new(LoadBalance),
            PolicyKind::ZonePinned => Box::new(ZonePinned::new(
                self.assignment.zones.clone(),
                // Validation guarantees a default zone for this policy.
                self.assignment.default_zone.unwrap_or(ZoneLabel::SouthEast),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        couriers = [{ id = "ana", name = "Ana", contact = "+598 1" }]

        [store]
        lat = -31.3833
        lng = -57.9667
    "#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = DispatchConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.assignment.capacity, 7);
        assert_eq!(config.assignment.policy, PolicyKind::LoadBalance);
        assert_eq!(config.graph.default_speed_kmh, 40.0);
        assert_eq!(config.routing.strategy, SearchStrategy::AStar);
        assert_eq!(config.routing.speed_averaging, SpeedAveraging::Arithmetic);
        assert_eq!(config.route_timeout(), Duration::from_millis(500));
        assert_eq!(config.assignment.strict_invariants, cfg!(debug_assertions));
        assert_eq!(config.picker().name(), "load_balance");
    }

    #[test]
    fn test_zone_pinned_config() {
        let raw = r#"
            couriers = [
                { id = "ana", name = "Ana", contact = "1" },
                { id = "bruno", name = "Bruno", contact = "2" },
            ]

            [store]
            lat = -31.38
            lng = -57.96

            [routing]
            strategy = "dijkstra"
            speed_averaging = "length_weighted"

            [assignment]
            capacity = 2
            policy = "zone_pinned"
            default_zone = "se"
            zones = { NW = "ana", SE = "bruno" }
        "#;
        let config = DispatchConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.assignment.default_zone, Some(ZoneLabel::SouthEast));
        assert_eq!(config.assignment.zones[&ZoneLabel::NorthWest], CourierId::from("ana"));
        assert_eq!(config.routing_options().strategy, SearchStrategy::Dijkstra);
        assert_eq!(config.picker().name(), "zone_pinned");
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let cases = [
            // No couriers.
            "couriers = []\n[store]\nlat = 0.0\nlng = 0.0",
            // Duplicate id.
            "couriers = [{ id = \"a\", name = \"A\", contact = \"1\" }, { id = \"a\", name = \"B\", contact = \"2\" }]\n[store]\nlat = 0.0\nlng = 0.0",
            // Zero capacity.
            "couriers = [{ id = \"a\", name = \"A\", contact = \"1\" }]\n[store]\nlat = 0.0\nlng = 0.0\n[assignment]\ncapacity = 0",
            // Zone policy without default zone.
            "couriers = [{ id = \"a\", name = \"A\", contact = \"1\" }]\n[store]\nlat = 0.0\nlng = 0.0\n[assignment]\npolicy = \"zone_pinned\"\nzones = { NW = \"a\" }",
            // Zone mapped to a stranger.
            "couriers = [{ id = \"a\", name = \"A\", contact = \"1\" }]\n[store]\nlat = 0.0\nlng = 0.0\n[assignment]\npolicy = \"zone_pinned\"\ndefault_zone = \"NW\"\nzones = { NW = \"a\", SE = \"z\" }",
        ];
        for raw in cases {
            assert!(
                matches!(DispatchConfig::from_toml_str(raw), Err(ConfigError::Invalid(_))),
                "accepted: {raw}"
            );
        }

        let off_planet = "couriers = []\n[store]\nlat = 100.0\nlng = 0.0";
        assert!(matches!(DispatchConfig::from_toml_str(off_planet), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_resolve_path_prefers_argument() {
        let path = DispatchConfig::resolve_path(Some("dispatch.toml".into())).unwrap();
        assert_eq!(path, PathBuf::from("dispatch.toml"));
    }

    #[test]
    fn test_load_resolves_graph_path_next_to_config() {
        let dir = std::env::temp_dir().join(format!("dispatch-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("dispatch.toml");
        std::fs::write(&file, format!("{MINIMAL}\n[graph]\npath = \"salto.json\"\n")).unwrap();

        let config = DispatchConfig::load(&file).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();
        assert_eq!(config.graph.path, dir.join("salto.json"));
    }
}
