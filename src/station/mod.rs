//! The sampling-and-publishing core.
//!
//! A [`Station`] owns everything the daemon touches after startup: the two
//! sensor drivers, the publisher and the cycle configuration. It is built
//! once and handed to the [`Scheduler`] by mutable reference; nothing else
//! holds on to it, so no locking is involved.

pub mod cycle;
pub mod scheduler;

// Re-export commonly used items
pub use cycle::{CycleReport, SensorOutcome};
pub use scheduler::Scheduler;

use crate::config::CycleConfig;

/// Process-scoped context: sensor handles, publisher and configuration.
pub struct Station<C, P, S> {
    climate: C,
    particulate: P,
    publisher: S,
    config: CycleConfig,
}

impl<C, P, S> Station<C, P, S> {
    /// Assemble a station from already-configured parts.
    pub fn new(climate: C, particulate: P, publisher: S, config: CycleConfig) -> Self {
        Self {
            climate,
            particulate,
            publisher,
            config,
        }
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    pub fn climate(&self) -> &C {
        &self.climate
    }

    pub fn particulate(&self) -> &P {
        &self.particulate
    }

    pub fn publisher(&self) -> &S {
        &self.publisher
    }
}
