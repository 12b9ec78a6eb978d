//! GPIO control lines for the particulate sensor.
//!
//! The PMS5003 has an active-high enable (SET) line and an active-low reset
//! line. Both are driven from Raspberry Pi GPIO pins through rppal when the
//! `hardware` feature is on; without it the mock refuses to open.

use crate::error::{ConfigError, Result};
use std::time::Duration;

/// Highest BCM pin number exposed on the 40-pin header.
pub const MAX_PIN: u8 = 27;

/// Parse a pin identifier such as `GPIO22` or `22` into a BCM pin number.
pub fn parse_pin(id: &str) -> Result<u8> {
    let trimmed = id.trim();
    let digits = trimmed
        .strip_prefix("GPIO")
        .or_else(|| trimmed.strip_prefix("gpio"))
        .unwrap_or(trimmed);

    let pin = digits
        .parse::<u8>()
        .map_err(|_| ConfigError::invalid(format!("Invalid GPIO pin identifier: {:?}", id)))?;

    if pin > MAX_PIN {
        return Err(ConfigError::invalid(format!(
            "GPIO pin {} is not available (0-{})",
            pin, MAX_PIN
        )));
    }
    Ok(pin)
}

/// Trait for driving the sensor's control lines.
pub trait ControlPins {
    /// Drive the enable line high and hold the reset line inactive.
    fn enable(&mut self) -> Result<()>;

    /// Pull reset low for `hold`, then release it.
    fn pulse_reset(&mut self, hold: Duration) -> Result<()>;
}

#[cfg(feature = "hardware")]
mod raspberry_pi {
    use super::*;
    use rppal::gpio::{Gpio, OutputPin};

    /// Control lines on Raspberry Pi GPIO using rppal.
    pub struct RaspberryPiPins {
        enable: OutputPin,
        // None when reset shares the enable pin
        reset: Option<OutputPin>,
    }

    impl RaspberryPiPins {
        /// Claim the enable and reset pins as outputs.
        pub fn open(enable_pin: u8, reset_pin: u8) -> Result<Self> {
            let gpio = Gpio::new().map_err(|e| {
                ConfigError::device(format!("Failed to initialize GPIO: {}", e))
            })?;

            let claim = |pin: u8| -> Result<OutputPin> {
                gpio.get(pin).map(|p| p.into_output()).map_err(|e| {
                    ConfigError::device(format!("Failed to access pin {}: {}", pin, e))
                })
            };

            let enable = claim(enable_pin)?;
            let reset = if reset_pin == enable_pin {
                None
            } else {
                Some(claim(reset_pin)?)
            };

            Ok(Self { enable, reset })
        }

        fn reset_line(&mut self) -> &mut OutputPin {
            match self.reset {
                Some(ref mut pin) => pin,
                None => &mut self.enable,
            }
        }
    }

    impl ControlPins for RaspberryPiPins {
        fn enable(&mut self) -> Result<()> {
            self.enable.set_high();
            self.reset_line().set_high();
            Ok(())
        }

        fn pulse_reset(&mut self, hold: Duration) -> Result<()> {
            self.reset_line().set_low();
            std::thread::sleep(hold);
            self.reset_line().set_high();
            Ok(())
        }
    }
}

#[cfg(not(feature = "hardware"))]
mod mock {
    use super::*;

    /// Placeholder for systems without GPIO support.
    pub struct MockPins;

    impl MockPins {
        pub fn open(enable_pin: u8, reset_pin: u8) -> Result<Self> {
            Err(ConfigError::unsupported(format!(
                "GPIO not available on this build (enable pin {}, reset pin {})",
                enable_pin, reset_pin
            )))
        }
    }

    impl ControlPins for MockPins {
        fn enable(&mut self) -> Result<()> {
            Err(ConfigError::unsupported("GPIO not available on this build"))
        }

        fn pulse_reset(&mut self, _hold: Duration) -> Result<()> {
            Err(ConfigError::unsupported("GPIO not available on this build"))
        }
    }
}

// Re-export the appropriate control-pin backend
#[cfg(feature = "hardware")]
pub use raspberry_pi::RaspberryPiPins as DefaultControlPins;

#[cfg(not(feature = "hardware"))]
pub use mock::MockPins as DefaultControlPins;
