//! One poll-and-publish pass over both sensors.

use super::Station;
use crate::sensors::SensorDriver;
use crate::sink::Publisher;
use serde::Serialize;
use tracing::{error, info};

/// What happened to one sensor during a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SensorOutcome {
    /// Read succeeded and the measurement was accepted by the sink
    Published,
    /// The sensor had no new data; nothing was published
    NoData,
    /// The read failed; nothing was published
    ReadFailed,
    /// The read succeeded but the sink refused or could not be reached
    PublishFailed,
}

/// Per-sensor outcomes of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub climate: SensorOutcome,
    pub particulate: SensorOutcome,
}

impl CycleReport {
    /// Number of measurements the sink accepted this cycle.
    pub fn published(&self) -> usize {
        [self.climate, self.particulate]
            .iter()
            .filter(|o| **o == SensorOutcome::Published)
            .count()
    }
}

impl<C, P, S> Station<C, P, S>
where
    C: SensorDriver,
    P: SensorDriver,
    S: Publisher,
{
    /// Poll the climate sensor, then the particulate sensor, publishing each
    /// reading as it arrives.
    ///
    /// Every failure is logged and contained here; the method always returns
    /// normally, whatever combination of sensors and publishes failed.
    pub async fn sample_cycle(&mut self) -> CycleReport {
        let location = self.config.location.as_str();
        let climate = poll_and_publish(&mut self.climate, &mut self.publisher, location).await;
        let particulate =
            poll_and_publish(&mut self.particulate, &mut self.publisher, location).await;

        CycleReport {
            climate,
            particulate,
        }
    }
}

async fn poll_and_publish<D, S>(sensor: &mut D, publisher: &mut S, location: &str) -> SensorOutcome
where
    D: SensorDriver,
    S: Publisher,
{
    let reading = match sensor.read().await {
        Ok(Some(reading)) => reading,
        Ok(None) => {
            info!(sensor = sensor.name(), "No new data this cycle, skipping");
            return SensorOutcome::NoData;
        }
        Err(err) => {
            error!(sensor = sensor.name(), error = %err, "Failed to read sensor");
            return SensorOutcome::ReadFailed;
        }
    };

    info!(sensor = sensor.name(), "{} = {}", sensor.name(), reading);

    let measurement = reading.to_measurement(location);
    match publisher.publish(&measurement).await {
        Ok(()) => SensorOutcome::Published,
        Err(err) => {
            error!(
                sensor = sensor.name(),
                measurement = measurement.name(),
                error = %err,
                "Failed to publish measurement"
            );
            SensorOutcome::PublishFailed
        }
    }
}
