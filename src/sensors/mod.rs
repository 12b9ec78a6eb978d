//! Sensor drivers and the values they produce.
//!
//! Each physical sensor is configured once at startup and then polled once
//! per cycle through [`SensorDriver::read`]. The drivers are generic over the
//! bus they talk to so the protocol logic can run against in-memory buses;
//! the Linux bus backends live behind the `hardware` feature.

pub mod bme680;
pub mod gpio;
pub mod pms5003;
pub mod reading;

// Re-export commonly used items
pub use bme680::{Bme680, ClimateSensorConfig};
pub use pms5003::{ParticulateSensorConfig, Pms5003};
pub use reading::{ClimateReading, ParticulateReading, Reading};

use crate::error::ReadError;
use std::future::Future;

/// Outcome of one poll: a reading, or `None` when the device had no new data.
pub type ReadResult = std::result::Result<Option<Reading>, ReadError>;

/// A sensor that can be polled for one reading at a time.
pub trait SensorDriver {
    /// Short human-readable name used in log lines.
    fn name(&self) -> &str;

    /// Take one reading.
    ///
    /// `Ok(None)` means the device reported no new data this time. That is an
    /// expected condition and may repeat any number of times.
    fn read(&mut self) -> impl Future<Output = ReadResult> + Send;
}
