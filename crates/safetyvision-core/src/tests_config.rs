use std::io::Write;

use crate::{ConfigError, EngineConfig, RiskLevel, Thresholds};

#[test]
fn defaults_are_the_dashboard_table() {
    let cfg = EngineConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.fallback_interval_ms, 2_000);
    assert_eq!(cfg.trend_capacity, 20);
    assert_eq!(cfg.sensor("radiation").unwrap().thresholds, Thresholds::new(0.1, 0.5, 1.0));
    assert_eq!(cfg.sensor("pressure").unwrap().reference_value(), 1013.0);
    assert_eq!(cfg.sensors.len(), 4);
    assert_eq!(cfg.sensor("radiation").unwrap().aliases, vec!["radiation_level".to_string()]);
}

#[test]
fn aliases_from_toml() {
    let cfg = EngineConfig::from_toml_str(
        r#"
        [sensors.temperature]
        aliases = ["temp_c", "temperature_c"]
        thresholds = { safe = 30.0, warning = 50.0, danger = 70.0 }
        "#,
    )
    .unwrap();
    assert_eq!(cfg.sensor("temperature").unwrap().aliases.len(), 2);
}

#[test]
fn toml_overrides_and_keeps_defaults() {
    let cfg = EngineConfig::from_toml_str(
        r#"
        fallback_interval_ms = 500
        auto_trigger_risk = "HIGH"

        [sensors.radiation]
        unit = "mSv/h"
        thresholds = { safe = 0.2, warning = 0.6, danger = 1.5 }
        "#,
    )
    .unwrap();
    assert_eq!(cfg.fallback_interval_ms, 500);
    assert_eq!(cfg.trend_capacity, 20);
    assert_eq!(cfg.auto_trigger_risk, Some(RiskLevel::High));
    let radiation = cfg.sensor("radiation").unwrap();
    assert_eq!(radiation.reference_value(), 0.2);
    assert_eq!(cfg.sensors.len(), 1);
}

#[test]
fn misordered_thresholds_are_rejected() {
    let err = EngineConfig::from_toml_str(
        r#"
        [sensors.temperature]
        thresholds = { safe = 80.0, warning = 50.0, danger = 70.0 }
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::ThresholdOrder { ref sensor, .. } if sensor == "temperature"));
}

#[test]
fn scalar_limits_are_checked() {
    let cfg = EngineConfig { fallback_interval_ms: 0, ..EngineConfig::default() };
    assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    let cfg = EngineConfig { default_confidence: 1.5, ..EngineConfig::default() };
    assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn load_from_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
trend_capacity = 10
default_confidence = 0.5

[sensors.humidity]
unit = "%"
reference = 55.0
thresholds = {{ safe = 70.0, warning = 85.0, danger = 95.0 }}
"#
    )
    .unwrap();
    let cfg = EngineConfig::load(file.path()).unwrap();
    assert_eq!(cfg.trend_capacity, 10);
    assert_eq!(cfg.default_confidence, 0.5);
    assert_eq!(cfg.sensor("humidity").unwrap().reference_value(), 55.0);
}

#[test]
fn missing_file_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = EngineConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
}
