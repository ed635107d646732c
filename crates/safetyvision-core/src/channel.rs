//! Realtime update channel controller.
//!
//! Owns connectivity, the latest update, the trend buffer and the alert
//! lifecycle. Every mutation goes through [`ChannelController::handle`] or one
//! of the operator commands; readers only ever get a [`DashboardSnapshot`].

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::Rng;
use serde_json::Value;

use crate::alert::AlertLifecycle;
use crate::clock::Clock;
use crate::domain::{EmergencyAlert, SafetyUpdate, TrendPoint, UpdateSource};
use crate::fallback::{FallbackGenerator, FallbackTimer};
use crate::protocol::{InboundEvent, OutboundEvent};
use crate::risk::RiskLevel;
use crate::settings::{ConfigError, EngineConfig};
use crate::snapshot::{ChannelState, Connection, DashboardSnapshot, EngineStats};
use crate::trend::TrendBuffer;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("channel closed")]
    Closed,
    #[error("send failed: {0}")]
    Send(String),
}

/// Outbound half of the realtime channel.
pub trait Transport {
    fn send(&mut self, event: &OutboundEvent) -> Result<(), TransportError>;
}

/// In-memory transport that records what was sent. Can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    pub sent: Vec<OutboundEvent>,
    pub fail_with: Option<TransportError>,
}

impl Transport for RecordingTransport {
    fn send(&mut self, event: &OutboundEvent) -> Result<(), TransportError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.sent.push(event.clone());
        Ok(())
    }
}

pub struct ChannelController<T, C, R = StdRng> {
    cfg: EngineConfig,
    transport: T,
    clock: C,
    generator: FallbackGenerator<R>,
    timer: FallbackTimer,
    connection: Connection,
    alerts: AlertLifecycle,
    latest: Option<SafetyUpdate>,
    trend: TrendBuffer,
    stats: EngineStats,
}

impl<T: Transport, C: Clock> ChannelController<T, C, StdRng> {
    /// Controller with a generator seeded from `seed`.
    pub fn seeded(cfg: EngineConfig, transport: T, clock: C, seed: u64) -> Result<Self, ConfigError> {
        let generator = FallbackGenerator::seeded(seed, cfg.sensors.clone());
        Self::new(cfg, transport, clock, generator)
    }
}

impl<T: Transport, C: Clock, R: Rng> ChannelController<T, C, R> {
    /// Starts disconnected with the fallback timer armed.
    pub fn new(
        cfg: EngineConfig,
        transport: T,
        clock: C,
        generator: FallbackGenerator<R>,
    ) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let mut timer = FallbackTimer::new(cfg.fallback_interval_ms);
        timer.arm(clock.now());
        Ok(Self {
            trend: TrendBuffer::with_capacity(cfg.trend_capacity),
            cfg,
            transport,
            clock,
            generator,
            timer,
            connection: Connection::Disconnected,
            alerts: AlertLifecycle::new(),
            latest: None,
            stats: EngineStats::default(),
        })
    }

    pub fn handle(&mut self, event: InboundEvent) {
        let now = self.clock.now();
        match event {
            InboundEvent::Connect => self.set_connected(now),
            InboundEvent::Disconnect => self.set_disconnected(now, "server disconnect"),
            InboundEvent::SafetyUpdate(raw) => {
                let update = raw.normalize(&self.cfg, now);
                self.apply(update);
            }
            InboundEvent::EmergencyAlert(raw) => {
                self.stats.alerts_raised += 1;
                self.alerts.raise(raw.normalize(now));
            }
            InboundEvent::EmergencyCleared => self.alerts.clear(),
        }
    }

    /// Parse and handle one inbound text frame. Malformed frames are logged and dropped.
    pub fn handle_message(&mut self, text: &str) {
        match InboundEvent::from_json(text) {
            Ok(event) => self.handle(event),
            Err(err) => {
                self.stats.malformed_frames += 1;
                log::warn!("dropping inbound frame: {err}");
            }
        }
    }

    /// Transport-level failure (open failed, socket error). Never fatal.
    pub fn channel_error(&mut self, reason: &str) {
        let now = self.clock.now();
        self.set_disconnected(now, reason);
    }

    /// Drive the fallback timer. Call from the host's event loop.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        if self.timer.poll(now) {
            let update = self.generator.generate(now);
            self.deliver_synthetic(update);
        }
    }

    /// Apply generator output, unless the channel came back in the meantime.
    pub fn deliver_synthetic(&mut self, update: SafetyUpdate) {
        if self.connection == Connection::Connected {
            self.stats.stale_discarded += 1;
            log::debug!("discarding stale synthetic update from {}", update.timestamp);
            return;
        }
        self.apply(update);
    }

    /// Send an arbitrary payload. No-op while disconnected.
    pub fn emit(&mut self, message: Value) {
        self.send(OutboundEvent::Message(message));
    }

    /// Ask the service to stop and raise a local manual-stop alert, connected or not.
    pub fn emergency_stop(&mut self) {
        self.send(OutboundEvent::EmergencyStop);
        let now = self.clock.now();
        self.stats.alerts_raised += 1;
        self.alerts.manual_stop(EmergencyAlert::manual_stop(now));
    }

    /// Returns false when no active alert has this id.
    pub fn acknowledge_alert(&mut self, id: &str) -> bool {
        let acknowledged = self.alerts.acknowledge(id);
        if acknowledged {
            self.stats.alerts_acknowledged += 1;
        }
        acknowledged
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let risk_level = self.latest.as_ref().map_or(RiskLevel::Minimal, |u| u.risk_level);
        DashboardSnapshot {
            channel: self.channel_state(),
            latest: self.latest.clone(),
            risk_level,
            risk_score: risk_level.score(),
            tier: risk_level.tier(),
            trend: self.trend.snapshot(),
            stats: self.stats,
        }
    }

    pub fn channel_state(&self) -> ChannelState {
        ChannelState { connection: self.connection, alert: self.alerts.state().clone() }
    }

    pub fn connection(&self) -> Connection {
        self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection == Connection::Connected
    }

    pub fn latest(&self) -> Option<&SafetyUpdate> {
        self.latest.as_ref()
    }

    pub fn active_alert(&self) -> Option<&EmergencyAlert> {
        self.alerts.active()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn set_connected(&mut self, now: DateTime<Utc>) {
        if self.connection != Connection::Connected {
            log::info!("realtime channel connected at {now}");
        }
        self.connection = Connection::Connected;
        self.timer.disarm();
    }

    fn set_disconnected(&mut self, now: DateTime<Utc>, reason: &str) {
        if self.connection != Connection::Disconnected {
            log::info!("realtime channel disconnected ({reason}), switching to fallback data");
        } else {
            log::debug!("channel still disconnected: {reason}");
        }
        self.connection = Connection::Disconnected;
        self.timer.arm(now);
    }

    fn send(&mut self, event: OutboundEvent) {
        if self.connection != Connection::Connected {
            log::debug!("not connected, suppressing outbound {}", event.name());
            return;
        }
        if let Err(err) = self.transport.send(&event) {
            self.stats.send_failures += 1;
            log::warn!("outbound {} failed: {err}", event.name());
            let now = self.clock.now();
            self.set_disconnected(now, "send failure");
        }
    }

    // Last delivered wins: no sequence numbers, no reordering defence.
    fn apply(&mut self, update: SafetyUpdate) {
        match update.source {
            UpdateSource::Live => self.stats.live_updates += 1,
            UpdateSource::Synthetic => self.stats.synthetic_updates += 1,
        }
        self.trend.append(TrendPoint::from_update(&update));

        if let Some(level) = self.cfg.auto_trigger_risk {
            if update.risk_level >= level && !self.alerts.is_active() {
                self.stats.alerts_raised += 1;
                self.alerts.raise(EmergencyAlert::from_update(&update));
            }
        }
        self.latest = Some(update);
    }
}
