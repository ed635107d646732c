use serde::Serialize;

use crate::domain::EmergencyAlert;

/// At most one alert is active; a newer one replaces it.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", content = "alert", rename_all = "snake_case")]
pub enum AlertState {
    #[default]
    Clear,
    Active(EmergencyAlert),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlertEvent {
    /// Inbound `emergency_alert`.
    Raised(EmergencyAlert),
    /// Inbound `emergency_cleared`.
    Cleared,
    /// Operator pressed emergency stop; carries the locally built alert.
    ManualStop(EmergencyAlert),
    Acknowledged { id: String },
}

fn transition(state: AlertState, event: AlertEvent) -> AlertState {
    match (state, event) {
        (_, AlertEvent::Raised(alert)) | (_, AlertEvent::ManualStop(alert)) => AlertState::Active(alert),
        (_, AlertEvent::Cleared) => AlertState::Clear,
        (AlertState::Active(mut alert), AlertEvent::Acknowledged { id }) => {
            if alert.id == id {
                alert.acknowledged = true;
            }
            AlertState::Active(alert)
        }
        (AlertState::Clear, AlertEvent::Acknowledged { .. }) => AlertState::Clear,
    }
}

/// Emergency alert state machine. Alerts never expire; only a clear event removes one.
#[derive(Debug, Clone, Default)]
pub struct AlertLifecycle {
    state: AlertState,
}

impl AlertLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AlertState {
        &self.state
    }

    pub fn active(&self) -> Option<&EmergencyAlert> {
        match &self.state {
            AlertState::Active(alert) => Some(alert),
            AlertState::Clear => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active().is_some()
    }

    pub fn apply(&mut self, event: AlertEvent) {
        let prev = std::mem::take(&mut self.state);
        let was_active = matches!(prev, AlertState::Active(_));
        self.state = transition(prev, event);
        match (&self.state, was_active) {
            (AlertState::Active(alert), _) => {
                log::debug!("alert {} active: {}", alert.id, alert.description)
            }
            (AlertState::Clear, true) => log::info!("emergency alert cleared"),
            (AlertState::Clear, false) => {}
        }
    }

    pub fn raise(&mut self, alert: EmergencyAlert) {
        log::warn!("emergency alert {} ({}): {}", alert.id, alert.risk_level, alert.description);
        self.apply(AlertEvent::Raised(alert));
    }

    pub fn manual_stop(&mut self, alert: EmergencyAlert) {
        log::warn!("manual emergency stop {}", alert.id);
        self.apply(AlertEvent::ManualStop(alert));
    }

    pub fn clear(&mut self) {
        self.apply(AlertEvent::Cleared);
    }

    /// Marks the active alert acknowledged if its id matches. Acknowledging does not clear it.
    pub fn acknowledge(&mut self, id: &str) -> bool {
        let matches = self.active().map_or(false, |a| a.id == id);
        if matches {
            self.apply(AlertEvent::Acknowledged { id: id.to_string() });
        }
        matches
    }
}
