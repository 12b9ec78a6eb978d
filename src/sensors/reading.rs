//! Values produced by a single sensor poll.

use crate::sink::Measurement;
use serde::{Deserialize, Serialize};

/// Measurement name for climate readings.
pub const CLIMATE_MEASUREMENT: &str = "climate-measurement";
/// Measurement name for particulate readings.
pub const PARTICULATE_MEASUREMENT: &str = "particulate-measurement";
/// Tag key carried by every measurement.
pub const LOCATION_TAG: &str = "location";

/// Field keys of a climate measurement, in the order they are attached.
pub const CLIMATE_FIELDS: [&str; 4] = ["temperature", "humidity", "pressure", "gas"];
/// Field keys of a particulate measurement, in the order they are attached.
pub const PARTICULATE_FIELDS: [&str; 3] = ["ug-per-m3-1", "ug-per-m3-2-5", "ug-per-m3-10"];

/// Output of the temperature/humidity/pressure/gas sensor, in device-native units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateReading {
    /// Degrees Celsius
    pub temperature: f64,
    /// Percent relative humidity
    pub humidity: f64,
    /// Hectopascals
    pub pressure: f64,
    /// Ohms
    pub gas_resistance: f64,
}

/// Output of the particulate-matter sensor, in micrograms per cubic meter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticulateReading {
    pub pm1_0: f64,
    pub pm2_5: f64,
    pub pm10: f64,
}

/// One successful sensor poll.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Reading {
    Climate(ClimateReading),
    Particulate(ParticulateReading),
}

impl Reading {
    /// Name of the measurement this reading is published under.
    pub fn measurement_name(&self) -> &'static str {
        match self {
            Reading::Climate(_) => CLIMATE_MEASUREMENT,
            Reading::Particulate(_) => PARTICULATE_MEASUREMENT,
        }
    }

    /// Shape the reading into a tagged measurement.
    ///
    /// Field keys depend only on the variant, so every measurement with a
    /// given name carries the same field set.
    pub fn to_measurement(&self, location: &str) -> Measurement {
        let measurement = Measurement::new(self.measurement_name()).tag(LOCATION_TAG, location);

        match self {
            Reading::Climate(c) => {
                let values = [c.temperature, c.humidity, c.pressure, c.gas_resistance];
                CLIMATE_FIELDS
                    .iter()
                    .zip(values)
                    .fold(measurement, |m, (key, value)| m.field(*key, value))
            }
            Reading::Particulate(p) => {
                let values = [p.pm1_0, p.pm2_5, p.pm10];
                PARTICULATE_FIELDS
                    .iter()
                    .zip(values)
                    .fold(measurement, |m, (key, value)| m.field(*key, value))
            }
        }
    }
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reading::Climate(c) => write!(
                f,
                "T: {}; H: {}; P: {}; G: {}",
                c.temperature, c.humidity, c.pressure, c.gas_resistance
            ),
            Reading::Particulate(p) => write!(
                f,
                "PM1.0: {}; PM2.5: {}; PM10: {}",
                p.pm1_0, p.pm2_5, p.pm10
            ),
        }
    }
}

impl From<ClimateReading> for Reading {
    fn from(reading: ClimateReading) -> Self {
        Reading::Climate(reading)
    }
}

impl From<ParticulateReading> for Reading {
    fn from(reading: ParticulateReading) -> Self {
        Reading::Particulate(reading)
    }
}
