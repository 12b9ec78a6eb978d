//! # Airstation - environmental sampling daemon
//!
//! Periodically samples a BME680 climate sensor and a PMS5003 particulate
//! sensor and writes each reading to InfluxDB as a tagged measurement.
//! Designed to run unattended on a Raspberry Pi.
//!
//! ## Features
//!
//! - **Fixed-delay sampling**: one cycle, then a fixed pause, forever
//! - **Fault isolation**: a failing sensor or sink write never affects the other sensor
//! - **Hardware backends**: I2C, UART and GPIO via rppal (feature `hardware`)
//! - **Library + Binary**: drive the loop with your own drivers or publishers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use airstation::{
//!     Bme680, ClimateSensorConfig, CycleConfig, InfluxPublisher, ParticulateSensorConfig,
//!     Pms5003, Scheduler, SinkConfig, Station,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cycle = CycleConfig::default();
//!     let climate = Bme680::open(&ClimateSensorConfig::default())?;
//!     let particulate = Pms5003::open(&ParticulateSensorConfig::default())?;
//!     let publisher = InfluxPublisher::new(&SinkConfig::default(), &cycle.bucket)?;
//!
//!     let scheduler = Scheduler::from_config(&cycle);
//!     let mut station = Station::new(climate, particulate, publisher, cycle);
//!     scheduler.run(&mut station).await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod sensors;
pub mod sink;
pub mod station;

// Re-export public API
pub use config::{CycleConfig, SinkConfig};
pub use error::{ConfigError, PublishError, ReadError, Result};
pub use sensors::{
    Bme680, ClimateReading, ClimateSensorConfig, ParticulateReading, ParticulateSensorConfig,
    Pms5003, Reading, SensorDriver,
};
pub use sink::{InfluxPublisher, Measurement, Publisher};
pub use station::{CycleReport, Scheduler, SensorOutcome, Station};

/// The default delay between cycles in seconds
pub const DEFAULT_DELAY_SECS: u64 = 15;

/// The default value of the `location` tag
pub const DEFAULT_LOCATION: &str = "Terasa";

/// The default destination bucket
pub const DEFAULT_BUCKET: &str = "nuculabs";

/// The default InfluxDB server
pub const DEFAULT_INFLUX_URL: &str = "http://nas.nuculabs.com:8086";

/// The default InfluxDB organization
pub const DEFAULT_INFLUX_ORG: &str = "NucuLabs";

/// The default upper bound for one write request in seconds
pub const DEFAULT_PUBLISH_TIMEOUT_SECS: u64 = 10;
