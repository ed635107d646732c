//! SafetyVision core: safety state and alert engine behind the facility dashboard.

pub mod risk;
pub mod classifier;
pub mod domain;
pub mod clock;
pub mod trend;
pub mod settings;
pub mod fallback;
pub mod alert;
pub mod protocol;
pub mod snapshot;
pub mod channel;

pub use risk::*;
pub use classifier::*;
pub use domain::*;
pub use clock::*;
pub use trend::*;
pub use settings::*;
pub use fallback::*;
pub use alert::*;
pub use protocol::*;
pub use snapshot::*;
pub use channel::*;

#[cfg(test)]
mod tests_controller;
#[cfg(test)]
mod tests_config;
