use chrono::{TimeZone, Utc};
use serde_json::json;

use crate::{
    ChannelController, Connection, EngineConfig, InboundEvent, ManualClock, OutboundEvent,
    RecordingTransport, RiskLevel, UpdateSource,
};

type Controller = ChannelController<RecordingTransport, ManualClock>;

fn setup(seed: u64) -> (Controller, ManualClock) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap());
    let c = ChannelController::seeded(EngineConfig::default(), RecordingTransport::default(), clock.clone(), seed)
        .unwrap();
    (c, clock)
}

#[test]
fn fallback_fills_in_within_one_interval() {
    let (mut c, clock) = setup(11);
    c.tick();
    assert!(c.latest().is_none());
    clock.advance_ms(2_000);
    c.tick();
    let latest = c.latest().expect("synthetic update applied");
    assert_eq!(latest.source, UpdateSource::Synthetic);
    assert_eq!(c.snapshot().trend.len(), 1);
}

#[test]
fn real_update_after_reconnect_is_not_overwritten() {
    let (mut c, clock) = setup(5);
    clock.advance_ms(2_000);
    c.tick();
    assert_eq!(c.latest().unwrap().source, UpdateSource::Synthetic);

    // generator output produced just before the reconnect lands afterwards
    let stale = c.latest().cloned().unwrap();
    c.handle(InboundEvent::Connect);
    c.handle_message(r#"{"type":"safety_update","data":{"risk_level":"HIGH","confidence":0.93}}"#);
    c.deliver_synthetic(stale);
    clock.advance_ms(10_000);
    c.tick();

    let snap = c.snapshot();
    let latest = snap.latest.as_ref().unwrap();
    assert_eq!(latest.source, UpdateSource::Live);
    assert_eq!(latest.risk_level, RiskLevel::High);
    assert_eq!(snap.risk_score, 75);
    assert_eq!(snap.stats.stale_discarded, 1);
    assert_eq!(snap.trend.len(), 2);
}

#[test]
fn fallback_resumes_after_disconnect() {
    let (mut c, clock) = setup(8);
    c.handle(InboundEvent::Connect);
    clock.advance_ms(6_000);
    c.tick();
    assert!(c.latest().is_none());

    c.handle(InboundEvent::Disconnect);
    clock.advance_ms(2_000);
    c.tick();
    assert_eq!(c.latest().unwrap().source, UpdateSource::Synthetic);
    assert!(c.snapshot().in_fallback());
}

#[test]
fn alert_persists_until_cleared() {
    let (mut c, clock) = setup(1);
    c.handle(InboundEvent::Connect);
    c.handle_message(r#"{"type":"emergency_alert","data":{"id":"A1","description":"Radiation spike"}}"#);
    assert_eq!(c.active_alert().unwrap().id, "A1");

    for _ in 0..100 {
        clock.advance_ms(60_000);
        c.tick();
    }
    assert_eq!(c.active_alert().unwrap().description, "Radiation spike");

    c.handle_message(r#"{"type":"emergency_cleared"}"#);
    assert!(c.active_alert().is_none());
}

#[test]
fn backend_frames_drive_gauges_and_alerts() {
    let (mut c, _) = setup(6);
    c.handle(InboundEvent::Connect);
    c.handle_message(
        r#"{"type":"safety_update","data":{"timestamp":"2024-03-01T07:59:58.250000","risk_level":"HIGH","sensor_data":{"radiation_level":0.9,"temperature":45.0}}}"#,
    );
    let latest = c.latest().unwrap();
    assert_eq!(latest.sensor_data["radiation"], 0.9);
    assert_eq!(c.snapshot().trend.last().unwrap().label, "07:59:58");

    c.handle_message(r#"{"type":"emergency_alert","data":"Radiation spike"}"#);
    assert_eq!(c.active_alert().unwrap().description, "Radiation spike");
    assert_eq!(c.snapshot().stats.malformed_frames, 0);
}

#[test]
fn emergency_stop_while_disconnected_is_local_only() {
    let (mut c, _) = setup(2);
    c.emergency_stop();
    assert_eq!(c.connection(), Connection::Disconnected);
    assert!(c.transport().sent.is_empty());
    let alert = c.active_alert().unwrap();
    assert!(!alert.auto_triggered);
    assert_eq!(alert.risk_level, RiskLevel::Critical);
}

#[test]
fn emergency_stop_while_connected_emits() {
    let (mut c, _) = setup(2);
    c.handle(InboundEvent::Connect);
    c.emergency_stop();
    assert_eq!(c.transport().sent, vec![OutboundEvent::EmergencyStop]);
    let id = c.active_alert().unwrap().id.clone();
    assert!(c.acknowledge_alert(&id));
    assert!(c.active_alert().unwrap().acknowledged);
}

#[test]
fn last_delivered_update_wins() {
    let (mut c, _) = setup(3);
    c.handle(InboundEvent::Connect);
    c.handle_message(
        r#"{"type":"safety_update","data":{"risk_level":"critical","timestamp":"2024-03-01T08:00:05Z"}}"#,
    );
    c.handle_message(
        r#"{"type":"safety_update","data":{"risk_level":"low","timestamp":"2024-03-01T08:00:01Z"}}"#,
    );
    assert_eq!(c.snapshot().risk_level, RiskLevel::Low);
}

#[test]
fn trend_is_bounded_through_the_controller() {
    let (mut c, _) = setup(4);
    c.handle(InboundEvent::Connect);
    for i in 0..25 {
        let level = if i % 2 == 0 { "moderate" } else { "minimal" };
        c.handle_message(&json!({"type": "safety_update", "data": {"risk_level": level}}).to_string());
    }
    let snap = c.snapshot();
    assert_eq!(snap.trend.len(), 20);
    assert_eq!(snap.stats.live_updates, 25);
    assert_eq!(snap.trend.last().unwrap().risk_score, 50);
}

#[test]
fn deterministic_replay_digest() {
    let frames = [
        r#"{"type":"safety_update","data":{"risk_level":"low","confidence":0.9}}"#,
        r#"{"type":"emergency_alert","data":{"id":"A7","timestamp":"2024-03-01T08:00:00Z"}}"#,
        r#"{"type":"disconnect"}"#,
    ];
    let run = || {
        let (mut c, clock) = setup(77);
        c.handle(InboundEvent::Connect);
        for f in frames.iter() {
            c.handle_message(f);
            clock.advance_ms(1_000);
        }
        for _ in 0..6 {
            clock.advance_ms(2_000);
            c.tick();
        }
        c.snapshot()
    };
    let (a, b) = (run(), run());
    assert_eq!(a, b);
    assert_eq!(a.digest().unwrap(), b.digest().unwrap());
    assert_eq!(a.stats.synthetic_updates, 6);
}
