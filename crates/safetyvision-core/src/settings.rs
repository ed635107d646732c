//! Engine configuration: sensor thresholds, fallback cadence and defaults.
//!
//! The canonical threshold table is the dashboard one (radiation, temperature,
//! humidity, pressure). Bad threshold ordering is rejected when the
//! configuration is built, never at runtime.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classifier::Thresholds;
use crate::risk::RiskLevel;

/// Upper bound for `fallback_interval_ms` (one day).
pub const MAX_FALLBACK_INTERVAL_MS: u64 = 86_400_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("sensor {sensor:?}: thresholds must satisfy safe <= warning <= danger, got {thresholds:?}")]
    ThresholdOrder { sensor: String, thresholds: Thresholds },
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    #[serde(default)]
    pub unit: String,
    /// Last-known-safe value used when a payload omits this sensor.
    /// Falls back to the safe bound.
    #[serde(default)]
    pub reference: Option<f64>,
    /// Other payload keys carrying this sensor, e.g. `radiation_level`.
    #[serde(default)]
    pub aliases: Vec<String>,
    pub thresholds: Thresholds,
}

impl SensorConfig {
    pub fn new(unit: &str, reference: f64, thresholds: Thresholds) -> Self {
        Self { unit: unit.to_string(), reference: Some(reference), aliases: Vec::new(), thresholds }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn reference_value(&self) -> f64 {
        self.reference.unwrap_or(self.thresholds.safe)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Period of the synthetic generator while disconnected.
    pub fallback_interval_ms: u64,
    pub trend_capacity: usize,
    /// Confidence used when a payload omits it.
    pub default_confidence: f64,
    /// When set, an applied update at or above this level raises an alert if none is active.
    pub auto_trigger_risk: Option<RiskLevel>,
    pub sensors: BTreeMap<String, SensorConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut sensors = BTreeMap::new();
        sensors.insert(
            "radiation".to_string(),
            SensorConfig::new("mSv/h", 0.1, Thresholds::new(0.1, 0.5, 1.0)).with_alias("radiation_level"),
        );
        sensors.insert(
            "temperature".to_string(),
            SensorConfig::new("°C", 25.0, Thresholds::new(30.0, 50.0, 70.0)),
        );
        sensors.insert(
            "humidity".to_string(),
            SensorConfig::new("%", 60.0, Thresholds::new(70.0, 85.0, 95.0)),
        );
        sensors.insert(
            "pressure".to_string(),
            SensorConfig::new("hPa", 1013.0, Thresholds::new(1020.0, 1050.0, 1080.0)),
        );
        Self {
            fallback_interval_ms: 2_000, // dashboard refresh interval
            trend_capacity: crate::trend::TREND_CAPACITY,
            default_confidence: 0.85,
            auto_trigger_risk: None,
            sensors,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: EngineConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a TOML file over the defaults, then apply `SAFETYVISION_*` environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings = ::config::Config::builder()
            .add_source(
                ::config::File::from(path.as_ref())
                    .format(::config::FileFormat::Toml)
                    .required(true),
            )
            .add_source(::config::Environment::with_prefix("SAFETYVISION"))
            .build()?;
        let cfg: EngineConfig = settings.try_deserialize()?;
        cfg.validate()?;
        log::info!(
            "loaded engine config from {} ({} sensors)",
            path.as_ref().display(),
            cfg.sensors.len()
        );
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fallback_interval_ms == 0 || self.fallback_interval_ms > MAX_FALLBACK_INTERVAL_MS {
            return Err(ConfigError::Invalid(format!(
                "fallback_interval_ms must be in 1..={MAX_FALLBACK_INTERVAL_MS}, got {}",
                self.fallback_interval_ms
            )));
        }
        if self.trend_capacity == 0 {
            return Err(ConfigError::Invalid("trend_capacity must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.default_confidence) {
            return Err(ConfigError::Invalid(format!(
                "default_confidence {} outside [0, 1]",
                self.default_confidence
            )));
        }
        for (name, sensor) in &self.sensors {
            if !sensor.thresholds.is_ordered() {
                return Err(ConfigError::ThresholdOrder {
                    sensor: name.clone(),
                    thresholds: sensor.thresholds,
                });
            }
        }
        Ok(())
    }

    pub fn sensor(&self, name: &str) -> Option<&SensorConfig> {
        self.sensors.get(name)
    }
}
