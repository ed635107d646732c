//! Read-only projections of an engine snapshot for dashboard panels.
//!
//! Nothing here mutates engine state; a panel is rebuilt from each snapshot.

use serde::Serialize;

use safetyvision_core::{
    classify, DashboardSnapshot, EmergencyAlert, EngineConfig, RiskLevel, Status, TrendPoint,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorGauge {
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub status: Status,
    /// Gauge fill in [0, 100].
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskBanner {
    pub level: RiskLevel,
    pub score: u32,
    pub tier: Status,
    pub confidence_pct: f64,
    pub status: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertBanner {
    pub id: String,
    pub headline: String,
    pub description: String,
    pub recommendations: Vec<String>,
    pub acknowledged: bool,
}

impl AlertBanner {
    fn from_alert(alert: &EmergencyAlert) -> Self {
        let headline = if alert.auto_triggered {
            format!("EMERGENCY PROTOCOLS ACTIVE ({})", alert.risk_level)
        } else {
            "EMERGENCY STOP ENGAGED".to_string()
        };
        Self {
            id: alert.id.clone(),
            headline,
            description: alert.description.clone(),
            recommendations: alert.recommendations.clone(),
            acknowledged: alert.acknowledged,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardPanel {
    pub connected: bool,
    /// "LIVE" or "SIMULATED".
    pub feed: &'static str,
    pub risk: RiskBanner,
    pub gauges: Vec<SensorGauge>,
    pub sensor_alerts: Vec<String>,
    pub alert: Option<AlertBanner>,
    pub trend: Vec<TrendPoint>,
}

/// Build the panel for `snapshot`, classifying each configured sensor.
///
/// Sensors present in the update but absent from the configuration have no
/// thresholds and are left off the gauges.
pub fn project(snapshot: &DashboardSnapshot, cfg: &EngineConfig) -> DashboardPanel {
    let latest = snapshot.latest.as_ref();

    let gauges: Vec<SensorGauge> = cfg
        .sensors
        .iter()
        .map(|(name, sensor)| {
            let value = latest
                .and_then(|u| u.sensor_data.get(name).copied())
                .unwrap_or_else(|| sensor.reference_value());
            let (status, percentage) = classify(value, &sensor.thresholds);
            SensorGauge { name: name.clone(), value, unit: sensor.unit.clone(), status, percentage }
        })
        .collect();

    let sensor_alerts = gauges.iter().filter_map(sensor_alert).collect();

    let risk = RiskBanner {
        level: snapshot.risk_level,
        score: snapshot.risk_score,
        tier: snapshot.tier,
        confidence_pct: latest.map_or(0.0, |u| u.confidence * 100.0),
        status: latest.map(|u| u.status.clone()).unwrap_or_else(|| "Awaiting data".to_string()),
        recommendations: latest.map(|u| u.recommendations.clone()).unwrap_or_default(),
    };

    DashboardPanel {
        connected: snapshot.is_connected(),
        feed: if snapshot.in_fallback() { "SIMULATED" } else { "LIVE" },
        risk,
        gauges,
        sensor_alerts,
        alert: snapshot.alert().map(AlertBanner::from_alert),
        trend: snapshot.trend.clone(),
    }
}

/// Alert line for a gauge outside its safe band, e.g. `WARNING: Elevated radiation level 0.3 mSv/h`.
pub fn sensor_alert(gauge: &SensorGauge) -> Option<String> {
    let (prefix, adjective) = match gauge.status {
        Status::Safe => return None,
        Status::Warning => ("WARNING", "Elevated"),
        Status::Danger => ("DANGER", "High"),
    };
    let line = format!("{prefix}: {adjective} {} level {} {}", gauge.name, gauge.value, gauge.unit);
    Some(line.trim_end().to_string())
}
