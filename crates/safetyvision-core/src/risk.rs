//! Risk aggregation: qualitative risk labels to gauge scores and severity tiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Severity tier shared by the threshold classifier and the risk aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Safe,
    Warning,
    Danger,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Safe => "SAFE",
            Status::Warning => "WARNING",
            Status::Danger => "DANGER",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall hazard label, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    #[default]
    Minimal,
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::Minimal,
        RiskLevel::Low,
        RiskLevel::Moderate,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Case-insensitive label lookup; `None` for anything unrecognised.
    pub fn parse(label: &str) -> Option<RiskLevel> {
        match label.trim().to_ascii_lowercase().as_str() {
            "minimal" => Some(RiskLevel::Minimal),
            "low" => Some(RiskLevel::Low),
            "moderate" => Some(RiskLevel::Moderate),
            "high" => Some(RiskLevel::High),
            "critical" => Some(RiskLevel::Critical),
            _ => None,
        }
    }

    /// Gauge score in [0, 100].
    pub fn score(&self) -> u32 {
        match self {
            RiskLevel::Minimal => 10,
            RiskLevel::Low => 25,
            RiskLevel::Moderate => 50,
            RiskLevel::High => 75,
            RiskLevel::Critical => 95,
        }
    }

    pub fn tier(&self) -> Status {
        match self {
            RiskLevel::Minimal | RiskLevel::Low => Status::Safe,
            RiskLevel::Moderate => Status::Warning,
            RiskLevel::High | RiskLevel::Critical => Status::Danger,
        }
    }

    /// Levels at which the facility monitor raises an emergency (HIGH and above).
    pub fn emergency_required(&self) -> bool {
        *self >= RiskLevel::High
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Minimal => "MINIMAL",
            RiskLevel::Low => "LOW",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown risk level: {0:?}")]
pub struct UnknownRiskLevel(pub String);

impl FromStr for RiskLevel {
    type Err = UnknownRiskLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RiskLevel::parse(s).ok_or_else(|| UnknownRiskLevel(s.to_string()))
    }
}

/// Score for a raw label. Unrecognised labels score as MINIMAL (10).
pub fn score(risk_level: &str) -> u32 {
    RiskLevel::parse(risk_level).unwrap_or_default().score()
}

/// Presentation tier for a raw label. Unrecognised labels are SAFE.
pub fn tier(risk_level: &str) -> Status {
    RiskLevel::parse(risk_level).unwrap_or_default().tier()
}
