//! Synthetic readings used while the realtime channel is down.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::classifier::classify;
use crate::domain::{default_status, SafetyUpdate, UpdateSource};
use crate::risk::{RiskLevel, Status};
use crate::settings::{SensorConfig, MAX_FALLBACK_INTERVAL_MS};

/// Produces plausible `SafetyUpdate`s around each sensor's reference value.
///
/// The risk level follows the worst classified sensor, so a synthetic spike
/// shows up consistently on the gauges and the risk banner.
#[derive(Debug, Clone)]
pub struct FallbackGenerator<R = StdRng> {
    rng: R,
    sensors: BTreeMap<String, SensorConfig>,
}

impl FallbackGenerator<StdRng> {
    pub fn seeded(seed: u64, sensors: BTreeMap<String, SensorConfig>) -> Self {
        Self::new(StdRng::seed_from_u64(seed), sensors)
    }

    pub fn from_entropy(sensors: BTreeMap<String, SensorConfig>) -> Self {
        Self::new(StdRng::from_entropy(), sensors)
    }
}

impl<R: Rng> FallbackGenerator<R> {
    pub fn new(rng: R, sensors: BTreeMap<String, SensorConfig>) -> Self {
        Self { rng, sensors }
    }

    pub fn generate(&mut self, now: DateTime<Utc>) -> SafetyUpdate {
        let mut sensor_data = BTreeMap::new();
        let mut worst = Status::Safe;
        for (name, sensor) in &self.sensors {
            let value = sample(&mut self.rng, sensor);
            let (status, _) = classify(value, &sensor.thresholds);
            worst = worst.max(status);
            sensor_data.insert(name.clone(), value);
        }

        let risk_level = match worst {
            Status::Danger => RiskLevel::High,
            Status::Warning => RiskLevel::Moderate,
            Status::Safe => {
                if self.rng.gen_bool(0.7) {
                    RiskLevel::Minimal
                } else {
                    RiskLevel::Low
                }
            }
        };

        SafetyUpdate {
            timestamp: now,
            risk_level,
            confidence: self.rng.gen_range(0.75..0.98),
            sensor_data,
            status: default_status(risk_level).to_string(),
            recommendations: recommendations(risk_level.tier()),
            source: UpdateSource::Synthetic,
        }
    }
}

fn sample<R: Rng>(rng: &mut R, sensor: &SensorConfig) -> f64 {
    let reference = sensor.reference_value();
    let t = &sensor.thresholds;
    let spread = (t.warning - t.safe).abs().max(reference.abs() * 0.05);
    if spread == 0.0 {
        return reference;
    }
    (reference + rng.gen_range(-0.5..1.0) * spread).max(0.0)
}

fn recommendations(tier: Status) -> Vec<String> {
    let items: &[&str] = match tier {
        Status::Safe => &["Continue routine monitoring"],
        Status::Warning => &[
            "Increase monitoring frequency",
            "Verify sensor calibration in affected zone",
        ],
        Status::Danger => &[
            "Restrict access to affected zone",
            "Prepare for emergency shutdown",
            "Notify the safety officer",
        ],
    };
    items.iter().map(|s| s.to_string()).collect()
}

/// Periodic trigger for the generator. Armed while disconnected.
#[derive(Debug, Clone)]
pub struct FallbackTimer {
    interval: Duration,
    next_due: Option<DateTime<Utc>>,
}

impl FallbackTimer {
    pub fn new(interval_ms: u64) -> Self {
        let ms = interval_ms.min(MAX_FALLBACK_INTERVAL_MS) as i64;
        Self { interval: Duration::milliseconds(ms), next_due: None }
    }

    /// Arms the timer; the first fire is one interval from `now`. Re-arming an armed timer is a no-op.
    pub fn arm(&mut self, now: DateTime<Utc>) {
        if self.next_due.is_none() {
            self.next_due = Some(now + self.interval);
        }
    }

    pub fn disarm(&mut self) {
        self.next_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Returns true at most once per call when the deadline has passed. Missed periods are not replayed.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::EngineConfig;

    fn generator(seed: u64) -> FallbackGenerator {
        FallbackGenerator::seeded(seed, EngineConfig::default().sensors)
    }

    #[test]
    fn seeded_output_is_reproducible() {
        let now = Utc::now();
        let a: Vec<_> = {
            let mut g = generator(7);
            (0..5).map(|_| g.generate(now)).collect()
        };
        let b: Vec<_> = {
            let mut g = generator(7);
            (0..5).map(|_| g.generate(now)).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn populates_every_field() {
        let cfg = EngineConfig::default();
        let mut g = generator(1);
        for _ in 0..50 {
            let u = g.generate(Utc::now());
            assert_eq!(u.source, UpdateSource::Synthetic);
            assert!((0.0..=1.0).contains(&u.confidence));
            assert!(!u.status.is_empty());
            assert!(!u.recommendations.is_empty());
            for name in cfg.sensors.keys() {
                let v = u.sensor_data[name];
                assert!(v.is_finite() && v >= 0.0);
            }
        }
    }

    #[test]
    fn risk_tracks_worst_sensor() {
        let cfg = EngineConfig::default();
        let mut g = generator(99);
        for _ in 0..100 {
            let u = g.generate(Utc::now());
            let worst = u
                .sensor_data
                .iter()
                .map(|(k, v)| classify(*v, &cfg.sensors[k].thresholds).0)
                .max()
                .unwrap();
            assert_eq!(u.tier(), worst);
        }
    }

    #[test]
    fn timer_fires_once_per_interval() {
        let t0 = Utc::now();
        let mut timer = FallbackTimer::new(2_000);
        assert!(!timer.poll(t0));
        timer.arm(t0);
        assert!(!timer.poll(t0 + Duration::milliseconds(1_999)));
        assert!(timer.poll(t0 + Duration::milliseconds(2_000)));
        assert!(!timer.poll(t0 + Duration::milliseconds(2_001)));
        // a long stall yields one fire, not a burst
        assert!(timer.poll(t0 + Duration::milliseconds(20_000)));
        assert!(!timer.poll(t0 + Duration::milliseconds(20_001)));
        timer.disarm();
        assert!(!timer.poll(t0 + Duration::milliseconds(60_000)));
    }
}
