use serde::Serialize;

use crate::alert::AlertState;
use crate::domain::{EmergencyAlert, SafetyUpdate, TrendPoint};
use crate::risk::{RiskLevel, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Connection {
    #[default]
    Disconnected,
    Connected,
}

/// Realtime channel posture: connectivity plus the active alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelState {
    pub connection: Connection,
    pub alert: AlertState,
}

/// Counters kept by the controller since start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EngineStats {
    pub live_updates: u64,
    pub synthetic_updates: u64,
    /// Synthetic outputs that arrived after the channel reconnected.
    pub stale_discarded: u64,
    pub malformed_frames: u64,
    pub send_failures: u64,
    /// Inbound, manual and auto-triggered alerts.
    pub alerts_raised: u64,
    pub alerts_acknowledged: u64,
}

/// Immutable read of the engine, handed to presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub channel: ChannelState,
    pub latest: Option<SafetyUpdate>,
    pub risk_level: RiskLevel,
    pub risk_score: u32,
    pub tier: Status,
    pub trend: Vec<TrendPoint>,
    pub stats: EngineStats,
}

impl DashboardSnapshot {
    pub fn is_connected(&self) -> bool {
        self.channel.connection == Connection::Connected
    }

    /// True while synthetic data stands in for the live feed.
    pub fn in_fallback(&self) -> bool {
        !self.is_connected()
    }

    pub fn alert(&self) -> Option<&EmergencyAlert> {
        match &self.channel.alert {
            AlertState::Active(alert) => Some(alert),
            AlertState::Clear => None,
        }
    }

    /// blake3 over the JSON encoding; equal snapshots hash equal.
    pub fn digest(&self) -> Result<[u8; 32], serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        Ok(*blake3::hash(&bytes).as_bytes())
    }
}
