use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::bearing::DEFAULT_TAPS;
use crate::radio::DEFAULT_SETTLE;
use crate::tracker::{Location, DEFAULT_NUDGE_STEP_HZ};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_name")]
    pub name: String,
    /// Catalog numbers to offer for tracking, first one selected at startup.
    #[serde(default = "default_satellites")]
    pub satellites: Vec<u32>,
    #[serde(default = "default_locations")]
    pub locations: Vec<Location>,
    /// Name of the active location, defaults to the first.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub bearing: BearingConfig,
    #[serde(default)]
    pub radio: RadioConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub tle_folder: PathBuf,
    pub transponder_folder: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            tle_folder: PathBuf::from("sats"),
            transponder_folder: PathBuf::from("trsp"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    #[serde(deserialize_with = "deserialize_duration")]
    pub tick: Duration,
    pub nudge_step_hz: u64,
    /// Scale applied to the propagator's radial velocity.
    pub velocity_correction: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(250),
            nudge_step_hz: DEFAULT_NUDGE_STEP_HZ,
            velocity_correction: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BearingConfig {
    pub taps: Vec<f64>,
    /// File the compass driver writes `azimuth elevation` lines to.
    pub source: Option<PathBuf>,
}

impl Default for BearingConfig {
    fn default() -> Self {
        Self {
            taps: DEFAULT_TAPS.to_vec(),
            source: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    pub device: PathBuf,
    pub daemon: String,
    pub port: u16,
    #[serde(deserialize_with = "deserialize_duration")]
    pub sync_interval: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub settle: Duration,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from("/dev/ttyUSB0"),
            daemon: "rigctld -m120 -r/dev/ttyUSB0 -s38400".to_string(),
            port: 4532,
            sync_interval: Duration::from_millis(1000),
            settle: DEFAULT_SETTLE,
        }
    }
}

fn default_name() -> String {
    "default".to_string()
}

fn default_satellites() -> Vec<u32> {
    vec![24278, 7530, 25544, 39444, 27607, 36122]
}

fn default_locations() -> Vec<Location> {
    vec![Location::new("JN68WN", 13.902486, 48.542816, 550.0)]
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.locations.is_empty() {
            return Err(ConfigError::Invalid("no locations configured".into()));
        }
        self.active_location()?;

        let taps = &self.bearing.taps;
        if taps.is_empty() {
            return Err(ConfigError::Invalid("bearing filter needs taps".into()));
        }
        let sum: f64 = taps.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::Invalid(format!(
                "bearing taps must sum to 1, got {}",
                sum
            )));
        }

        if self.tracking.tick.is_zero() || self.radio.sync_interval.is_zero() {
            return Err(ConfigError::Invalid("intervals must be non-zero".into()));
        }
        Ok(())
    }

    pub fn active_location(&self) -> Result<&Location, ConfigError> {
        match &self.location {
            Some(name) => self.find_location(name).ok_or_else(|| {
                ConfigError::Invalid(format!("unknown location: {}", name))
            }),
            None => self
                .locations
                .first()
                .ok_or_else(|| ConfigError::Invalid("no locations configured".into())),
        }
    }

    pub fn find_location(&self, name: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.name == name)
    }
}
