//! Threshold classification of a single sensor reading into a status and gauge fill.

use serde::{Deserialize, Serialize};

use crate::risk::Status;

/// Per-sensor `(safe, warning, danger)` boundaries. Expected non-decreasing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub safe: f64,
    pub warning: f64,
    pub danger: f64,
}

impl Thresholds {
    pub const fn new(safe: f64, warning: f64, danger: f64) -> Self {
        Self { safe, warning, danger }
    }

    /// True when all bounds are finite and `safe <= warning <= danger`.
    pub fn is_ordered(&self) -> bool {
        [self.safe, self.warning, self.danger].iter().all(|v| v.is_finite())
            && self.safe <= self.warning
            && self.warning <= self.danger
    }
}

/// Classify `value` against `t`, returning the status and a gauge percentage in [0, 100].
///
/// SAFE fills 0..30, WARNING 30..70 and DANGER 70..100. A non-finite reading is
/// reported as DANGER at full scale.
pub fn classify(value: f64, t: &Thresholds) -> (Status, f64) {
    if !value.is_finite() {
        return (Status::Danger, 100.0);
    }

    let (status, pct) = if value <= t.safe {
        let ratio = if t.safe == 0.0 { 1.0 } else { value / t.safe };
        (Status::Safe, (ratio * 30.0).clamp(0.0, 30.0))
    } else if value <= t.warning {
        // value > safe here, so warning > safe
        (Status::Warning, 30.0 + (value - t.safe) / (t.warning - t.safe) * 40.0)
    } else {
        let span = t.danger - t.warning;
        let over = if span > 0.0 { (value - t.warning) / span * 30.0 } else { 30.0 };
        (Status::Danger, 70.0 + over.min(30.0))
    };

    (status, pct.clamp(0.0, 100.0))
}
