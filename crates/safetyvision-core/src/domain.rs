use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::risk::{RiskLevel, Status};

/// Where an applied update came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateSource {
    Live,
    Synthetic,
}

/// A fully-populated safety assessment. Missing fields are defaulted at the protocol boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyUpdate {
    pub timestamp: DateTime<Utc>,
    pub risk_level: RiskLevel,
    /// Certainty of the assessment, in [0, 1].
    pub confidence: f64,
    pub sensor_data: BTreeMap<String, f64>,
    pub status: String,
    pub recommendations: Vec<String>,
    pub source: UpdateSource,
}

impl SafetyUpdate {
    pub fn risk_score(&self) -> u32 {
        self.risk_level.score()
    }

    pub fn tier(&self) -> Status {
        self.risk_level.tier()
    }
}

/// Default status line for a risk level when the producer did not supply one.
pub fn default_status(level: RiskLevel) -> &'static str {
    match level.tier() {
        Status::Safe => "All systems nominal",
        Status::Warning => "Elevated readings detected",
        Status::Danger => "Hazardous conditions detected",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyAlert {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub risk_level: RiskLevel,
    pub description: String,
    pub recommendations: Vec<String>,
    pub auto_triggered: bool,
    pub acknowledged: bool,
}

impl EmergencyAlert {
    /// The alert raised locally when an operator presses emergency stop.
    pub fn manual_stop(now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: now,
            risk_level: RiskLevel::Critical,
            description: "Manual emergency stop activated".into(),
            recommendations: vec![
                "Halt all robot operations".into(),
                "Evacuate non-essential personnel".into(),
                "Await clearance from the safety officer".into(),
            ],
            auto_triggered: false,
            acknowledged: false,
        }
    }

    /// Alert raised by the engine itself when an applied update crosses the configured level.
    pub fn from_update(update: &SafetyUpdate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: update.timestamp,
            risk_level: update.risk_level,
            description: format!("{} risk detected: {}", update.risk_level, update.status),
            recommendations: update.recommendations.clone(),
            auto_triggered: true,
            acknowledged: false,
        }
    }
}

/// One chart sample derived from an applied update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Wall-clock marker, `HH:MM:SS`.
    pub label: String,
    pub confidence_pct: f64,
    pub risk_score: u32,
}

impl TrendPoint {
    pub fn from_update(update: &SafetyUpdate) -> Self {
        Self {
            label: update.timestamp.format("%H:%M:%S").to_string(),
            confidence_pct: (update.confidence * 100.0).clamp(0.0, 100.0),
            risk_score: update.risk_score(),
        }
    }
}
