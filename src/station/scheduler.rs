//! Fixed-delay driver for the sample cycle.

use super::Station;
use crate::config::CycleConfig;
use crate::sensors::SensorDriver;
use crate::sink::Publisher;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::debug;

/// Runs one sample cycle, waits `interval`, and repeats.
///
/// The wait starts when a cycle finishes, so the period between two cycle
/// starts is the cycle's own duration plus `interval`: slow reads stretch
/// the cadence but never shorten it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduler {
    interval: Duration,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Create a scheduler using the configured inter-cycle delay.
    pub fn from_config(config: &CycleConfig) -> Self {
        Self::new(config.interval())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Tick forever. Only external termination stops the loop.
    pub async fn run<C, P, S>(&self, station: &mut Station<C, P, S>)
    where
        C: SensorDriver,
        P: SensorDriver,
        S: Publisher,
    {
        let mut cycle = 0u64;
        loop {
            self.tick(station, cycle).await;
            cycle = cycle.wrapping_add(1);
        }
    }

    /// Tick `cycles` times, including the delay after the last cycle.
    pub async fn run_cycles<C, P, S>(&self, station: &mut Station<C, P, S>, cycles: u64)
    where
        C: SensorDriver,
        P: SensorDriver,
        S: Publisher,
    {
        for cycle in 0..cycles {
            self.tick(station, cycle).await;
        }
    }

    async fn tick<C, P, S>(&self, station: &mut Station<C, P, S>, cycle: u64)
    where
        C: SensorDriver,
        P: SensorDriver,
        S: Publisher,
    {
        let started = Instant::now();
        let report = station.sample_cycle().await;
        debug!(
            cycle,
            elapsed_ms = started.elapsed().as_millis() as u64,
            climate = ?report.climate,
            particulate = ?report.particulate,
            "Cycle complete"
        );

        time::sleep(self.interval).await;
    }
}
