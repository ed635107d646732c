//! Wire frames exchanged with the realtime service.
//!
//! Inbound frames look like `{"type": "safety_update", "data": {...}}`. Payloads
//! are read into all-optional raw structs and defaulted here, so nothing past
//! this module sees a missing field.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

use crate::domain::{default_status, EmergencyAlert, SafetyUpdate, UpdateSource};
use crate::risk::RiskLevel;
use crate::settings::EngineConfig;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown event type {0:?}")]
    UnknownEvent(String),
}

/// Inbound events after parsing. Payloads are still raw; see [`RawSafetyUpdate::normalize`].
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Connect,
    Disconnect,
    SafetyUpdate(RawSafetyUpdate),
    EmergencyAlert(RawEmergencyAlert),
    EmergencyCleared,
}

#[derive(Deserialize)]
struct Frame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

impl InboundEvent {
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        let frame: Frame = serde_json::from_str(text)?;
        Ok(match frame.kind.as_str() {
            "connect" => InboundEvent::Connect,
            "disconnect" => InboundEvent::Disconnect,
            "safety_update" => InboundEvent::SafetyUpdate(payload(frame.data)),
            "emergency_alert" => InboundEvent::EmergencyAlert(match frame.data {
                // a bare string is the alert text
                Value::String(description) => RawEmergencyAlert {
                    description: Some(description),
                    ..RawEmergencyAlert::default()
                },
                data => payload(data),
            }),
            "emergency_cleared" => InboundEvent::EmergencyCleared,
            _ => return Err(ProtocolError::UnknownEvent(frame.kind)),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::Connect => "connect",
            InboundEvent::Disconnect => "disconnect",
            InboundEvent::SafetyUpdate(_) => "safety_update",
            InboundEvent::EmergencyAlert(_) => "emergency_alert",
            InboundEvent::EmergencyCleared => "emergency_cleared",
        }
    }
}

/// A payload that is not an object degrades to an all-defaults payload.
fn payload<T: DeserializeOwned + Default>(data: Value) -> T {
    if data.is_null() {
        return T::default();
    }
    serde_json::from_value(data).unwrap_or_else(|err| {
        log::debug!("unusable payload, using defaults: {err}");
        T::default()
    })
}

/// Keeps a field that fails to deserialize as `None` instead of rejecting the frame.
fn lenient<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = Value::deserialize(d)?;
    Ok(serde_json::from_value(v).ok())
}

/// RFC 3339, or an offset-less ISO 8601 timestamp read as UTC.
fn lenient_timestamp<'de, D>(d: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    Ok(v.as_str().and_then(parse_timestamp))
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    s.parse::<NaiveDateTime>().ok().map(|naive| Utc.from_utc_datetime(&naive))
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawSafetyUpdate {
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient")]
    pub risk_level: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub sensor_data: Option<BTreeMap<String, Value>>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub recommendations: Option<Vec<Value>>,
}

impl RawSafetyUpdate {
    /// Fill every missing or unusable field.
    ///
    /// Readings sent under a configured alias move to the sensor's name.
    /// Configured sensors still absent take their reference value; extra
    /// numeric sensors are kept as delivered.
    pub fn normalize(self, cfg: &EngineConfig, now: DateTime<Utc>) -> SafetyUpdate {
        let risk_level = self
            .risk_level
            .as_deref()
            .and_then(RiskLevel::parse)
            .unwrap_or(RiskLevel::Minimal);

        let confidence = self
            .confidence
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0))
            .unwrap_or(cfg.default_confidence);

        let mut sensor_data: BTreeMap<String, f64> = self
            .sensor_data
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(k, v)| v.as_f64().filter(|x| x.is_finite()).map(|x| (k, x)))
            .collect();
        for (name, sensor) in &cfg.sensors {
            let aliased: Vec<f64> = sensor
                .aliases
                .iter()
                .filter_map(|alias| sensor_data.remove(alias))
                .collect();
            let value = sensor_data
                .get(name)
                .copied()
                .or_else(|| aliased.first().copied())
                .unwrap_or_else(|| sensor.reference_value());
            sensor_data.insert(name.clone(), value);
        }

        let status = self
            .status
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| default_status(risk_level).to_string());

        SafetyUpdate {
            timestamp: self.timestamp.unwrap_or(now),
            risk_level,
            confidence,
            sensor_data,
            status,
            recommendations: strings(self.recommendations),
            source: UpdateSource::Live,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawEmergencyAlert {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient")]
    pub risk_level: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub recommendations: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient")]
    pub auto_triggered: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub acknowledged: Option<bool>,
}

impl RawEmergencyAlert {
    /// An alert without a usable risk level is treated as CRITICAL.
    pub fn normalize(self, now: DateTime<Utc>) -> EmergencyAlert {
        EmergencyAlert {
            id: self
                .id
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            timestamp: self.timestamp.unwrap_or(now),
            risk_level: self
                .risk_level
                .as_deref()
                .and_then(RiskLevel::parse)
                .unwrap_or(RiskLevel::Critical),
            description: self
                .description
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "Emergency alert".to_string()),
            recommendations: strings(self.recommendations),
            auto_triggered: self.auto_triggered.unwrap_or(true),
            acknowledged: self.acknowledged.unwrap_or(false),
        }
    }
}

fn strings(values: Option<Vec<Value>>) -> Vec<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect()
}

/// Commands sent back to the realtime service.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    Message(Value),
    EmergencyStop,
}

impl OutboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::Message(_) => "message",
            OutboundEvent::EmergencyStop => "emergency_stop",
        }
    }

    pub fn to_json(&self) -> String {
        let frame = match self {
            OutboundEvent::Message(data) => json!({ "type": "message", "data": data }),
            OutboundEvent::EmergencyStop => json!({ "type": "emergency_stop" }),
        };
        frame.to_string()
    }
}
