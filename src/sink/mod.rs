//! Delivery of measurements to the remote time-series sink.

pub mod influx;
pub mod measurement;

// Re-export commonly used items
pub use influx::InfluxPublisher;
pub use measurement::Measurement;

use crate::error::PublishError;
use std::future::Future;

/// Trait for writing measurements to a sink.
///
/// A call completes only once the sink has accepted or refused the
/// measurement. Implementations do not retry or buffer.
pub trait Publisher {
    /// Write one measurement.
    fn publish(
        &mut self,
        measurement: &Measurement,
    ) -> impl Future<Output = Result<(), PublishError>> + Send;
}
