//! Bosch BME680 temperature/humidity/pressure/gas sensor over I2C.
//!
//! Register programming, calibration and compensation are handled by the
//! `bosch-bme680` driver. This module turns [`ClimateSensorConfig`] into the
//! driver's configuration and its measurements and errors into this crate's
//! types. A measurement that never completes yields `Ok(None)`.

use super::reading::{ClimateReading, Reading};
use super::{ReadResult, SensorDriver};
use crate::error::{ConfigError, ReadError, Result};
use bosch_bme680::{BmeError, Configuration, DeviceAddress, GasConfig, IIRFilter};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PRIMARY_ADDRESS: u16 = 0x76;
const SECONDARY_ADDRESS: u16 = 0x77;

/// Ambient temperature assumed when computing the heater set-point.
const AMBIENT_TEMPERATURE: i32 = 25;
const MAX_HEATER_TEMPERATURE: u16 = 400;
/// Longest heater on-time the gas_wait register can encode.
const MAX_HEATER_DURATION_MS: u16 = 4032;

/// Oversampling setting for one of the three environmental channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Oversampling {
    Skipped,
    X1,
    X2,
    X4,
    X8,
    X16,
}

impl Oversampling {
    fn to_driver(self) -> bosch_bme680::Oversampling {
        match self {
            Oversampling::Skipped => bosch_bme680::Oversampling::Skipped,
            Oversampling::X1 => bosch_bme680::Oversampling::By1,
            Oversampling::X2 => bosch_bme680::Oversampling::By2,
            Oversampling::X4 => bosch_bme680::Oversampling::By4,
            Oversampling::X8 => bosch_bme680::Oversampling::By8,
            Oversampling::X16 => bosch_bme680::Oversampling::By16,
        }
    }
}

/// IIR filter coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterSize {
    Off,
    Size1,
    Size3,
    Size7,
    Size15,
    Size31,
    Size63,
    Size127,
}

impl FilterSize {
    fn to_driver(self) -> IIRFilter {
        match self {
            FilterSize::Off => IIRFilter::Coeff0,
            FilterSize::Size1 => IIRFilter::Coeff1,
            FilterSize::Size3 => IIRFilter::Coeff3,
            FilterSize::Size7 => IIRFilter::Coeff7,
            FilterSize::Size15 => IIRFilter::Coeff15,
            FilterSize::Size31 => IIRFilter::Coeff31,
            FilterSize::Size63 => IIRFilter::Coeff63,
            FilterSize::Size127 => IIRFilter::Coeff127,
        }
    }
}

/// Static configuration of the climate sensor.
///
/// Gas measurement is always on: the published measurement carries a `gas`
/// field every time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClimateSensorConfig {
    /// I2C bus number (`/dev/i2c-N`)
    pub bus: u8,
    /// 0x76 (primary) or 0x77 (secondary)
    pub address: u16,
    pub humidity_oversampling: Oversampling,
    pub pressure_oversampling: Oversampling,
    pub temperature_oversampling: Oversampling,
    pub filter: FilterSize,
    /// Heater target in degrees Celsius, at most 400
    pub heater_temperature: u16,
    /// Heater on-time in milliseconds
    pub heater_duration_ms: u16,
}

impl Default for ClimateSensorConfig {
    fn default() -> Self {
        Self {
            bus: 1,
            address: PRIMARY_ADDRESS,
            humidity_oversampling: Oversampling::X2,
            pressure_oversampling: Oversampling::X4,
            temperature_oversampling: Oversampling::X8,
            filter: FilterSize::Size3,
            heater_temperature: 320,
            heater_duration_ms: 150,
        }
    }
}

impl ClimateSensorConfig {
    /// Set the I2C bus and device address.
    pub fn with_device(mut self, bus: u8, address: u16) -> Self {
        self.bus = bus;
        self.address = address;
        self
    }

    /// Set the gas heater profile.
    pub fn with_heater(mut self, temperature: u16, duration_ms: u16) -> Self {
        self.heater_temperature = temperature;
        self.heater_duration_ms = duration_ms;
        self
    }

    /// The driver's name for the configured address.
    pub fn device_address(&self) -> Result<DeviceAddress> {
        match self.address {
            PRIMARY_ADDRESS => Ok(DeviceAddress::Primary),
            SECONDARY_ADDRESS => Ok(DeviceAddress::Secondary),
            other => Err(ConfigError::invalid(format!(
                "BME680 address must be 0x76 or 0x77, got {:#04x}",
                other
            ))),
        }
    }

    /// Validate the heater profile and build the driver configuration.
    pub fn driver_configuration(&self) -> Result<Configuration> {
        if self.heater_temperature > MAX_HEATER_TEMPERATURE {
            return Err(ConfigError::invalid(format!(
                "heater temperature {} °C exceeds {} °C",
                self.heater_temperature, MAX_HEATER_TEMPERATURE
            )));
        }
        if self.heater_duration_ms == 0 || self.heater_duration_ms > MAX_HEATER_DURATION_MS {
            return Err(ConfigError::invalid(format!(
                "heater duration must be 1-{} ms, got {}",
                MAX_HEATER_DURATION_MS, self.heater_duration_ms
            )));
        }

        Ok(Configuration {
            temperature_oversampling: Some(self.temperature_oversampling.to_driver()),
            pressure_oversampling: Some(self.pressure_oversampling.to_driver()),
            humidity_oversampling: Some(self.humidity_oversampling.to_driver()),
            filter: Some(self.filter.to_driver()),
            gas_config: Some(GasConfig {
                heater_duration: Duration::from_millis(u64::from(self.heater_duration_ms)),
                heater_target_temperature: self.heater_temperature,
            }),
        })
    }
}

/// A configured BME680.
pub struct Bme680<I, D>
where
    I: I2c,
    D: DelayNs,
{
    driver: bosch_bme680::Bme680<I, D>,
}

impl<I, D> Bme680<I, D>
where
    I: I2c,
    D: DelayNs,
{
    /// Reset the chip, load its calibration and program the measurement
    /// profile.
    pub fn configure(bus: I, delay: D, config: &ClimateSensorConfig) -> Result<Self> {
        let address = config.device_address()?;
        let configuration = config.driver_configuration()?;

        let driver =
            bosch_bme680::Bme680::new(bus, address, delay, &configuration, AMBIENT_TEMPERATURE)
                .map_err(|e| {
                    ConfigError::device(format!("Failed to initialize BME680: {}", describe(&e)))
                })?;

        Ok(Self { driver })
    }
}

impl<I, D> SensorDriver for Bme680<I, D>
where
    I: I2c + Send,
    D: DelayNs + Send,
{
    fn name(&self) -> &str {
        "BME680"
    }

    async fn read(&mut self) -> ReadResult {
        let measured = self.driver.measure().map(|data| {
            climate_reading(
                data.temperature,
                data.humidity,
                data.pressure,
                data.gas_resistance,
            )
        });
        outcome(measured)
    }
}

/// Build a reading from the driver's values. Without a valid gas value there
/// is nothing to publish.
fn climate_reading(
    temperature: f32,
    humidity: f32,
    pressure: f32,
    gas_resistance: Option<f32>,
) -> Option<ClimateReading> {
    let Some(gas) = gas_resistance else {
        tracing::debug!("BME680 gas reading not valid this cycle");
        return None;
    };

    Some(ClimateReading {
        temperature: f64::from(temperature),
        humidity: f64::from(humidity),
        pressure: f64::from(pressure),
        gas_resistance: f64::from(gas),
    })
}

fn outcome<I: I2c>(
    measured: std::result::Result<Option<ClimateReading>, BmeError<I>>,
) -> ReadResult {
    match measured {
        Ok(reading) => Ok(reading.map(Reading::Climate)),
        Err(BmeError::MeasuringTimeOut) => Ok(None),
        Err(err) => Err(ReadError::bus(describe(&err))),
    }
}

fn describe<I: I2c>(err: &BmeError<I>) -> String {
    match err {
        BmeError::WriteError(e) => format!("I2C write failed: {}", e.kind()),
        BmeError::WriteReadError(e) => format!("I2C write-read failed: {}", e.kind()),
        BmeError::UnexpectedChipId(id) => format!("unexpected chip id {:#04x}", id),
        BmeError::MeasuringTimeOut => "measurement did not complete".to_string(),
        BmeError::Uninitialized => "sensor is not initialized".to_string(),
    }
}

/// The I2C backend used by [`Bme680::open`].
#[cfg(feature = "hardware")]
pub type I2cBus = rppal::i2c::I2c;

/// The delay provider used by [`Bme680::open`].
#[cfg(feature = "hardware")]
pub type BusDelay = rppal::hal::Delay;

/// The I2C backend used by [`Bme680::open`].
#[cfg(not(feature = "hardware"))]
pub type I2cBus = unsupported::NoBus;

/// The delay provider used by [`Bme680::open`].
#[cfg(not(feature = "hardware"))]
pub type BusDelay = unsupported::NoDelay;

impl Bme680<I2cBus, BusDelay> {
    /// Open the configured I2C bus and configure the sensor on it.
    #[cfg(feature = "hardware")]
    pub fn open(config: &ClimateSensorConfig) -> Result<Self> {
        let i2c = rppal::i2c::I2c::with_bus(config.bus).map_err(|e| {
            ConfigError::device(format!("Failed to open I2C bus {}: {}", config.bus, e))
        })?;
        Self::configure(i2c, rppal::hal::Delay::new(), config)
    }

    /// Open the configured I2C bus and configure the sensor on it.
    #[cfg(not(feature = "hardware"))]
    pub fn open(config: &ClimateSensorConfig) -> Result<Self> {
        Err(ConfigError::unsupported(format!(
            "BME680 on I2C bus {} needs the `hardware` feature",
            config.bus
        )))
    }
}

#[cfg(not(feature = "hardware"))]
mod unsupported {
    use embedded_hal::delay::DelayNs;
    use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};

    /// Bus placeholder for builds without I2C support.
    pub struct NoBus;

    impl ErrorType for NoBus {
        type Error = ErrorKind;
    }

    impl I2c for NoBus {
        fn transaction(
            &mut self,
            _address: u8,
            _operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            Err(ErrorKind::Other)
        }
    }

    /// Delay placeholder paired with [`NoBus`].
    pub struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }
}
