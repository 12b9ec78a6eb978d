//! Plantower PMS5003 particulate-matter sensor over UART.
//!
//! The sensor streams 32-byte frames at roughly one per second:
//!
//! ```text
//! 0x42 0x4D | length (u16 BE, always 28) | 13 data words (u16 BE) | checksum (u16 BE)
//! ```
//!
//! The checksum is the wrapping 16-bit sum of every byte before it, start
//! characters included.

use super::gpio::{self, ControlPins, DefaultControlPins};
use super::reading::{ParticulateReading, Reading};
use super::{ReadResult, SensorDriver};
use crate::error::{ConfigError, ReadError, Result};
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use std::time::{Duration, Instant};
use tracing::debug;

const START_1: u8 = 0x42;
const START_2: u8 = 0x4D;
const FRAME_BODY_LEN: usize = 28;
const DATA_WORDS: usize = 13;

/// How long reset is held low at startup.
const RESET_HOLD: Duration = Duration::from_millis(100);

/// Static configuration of the particulate sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticulateSensorConfig {
    /// Serial device path
    pub device: String,
    pub baud_rate: u32,
    /// Enable (SET) line, e.g. `GPIO22`
    pub pin_enable: String,
    /// Reset line, e.g. `GPIO27`; may equal `pin_enable`
    pub pin_reset: String,
    /// Upper bound for finding and reading one frame
    pub read_timeout_ms: u64,
}

impl Default for ParticulateSensorConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            pin_enable: "GPIO22".to_string(),
            pin_reset: "GPIO22".to_string(),
            read_timeout_ms: 5000,
        }
    }
}

impl ParticulateSensorConfig {
    /// Set the serial device and baud rate.
    pub fn with_device(mut self, device: impl Into<String>, baud_rate: u32) -> Self {
        self.device = device.into();
        self.baud_rate = baud_rate;
        self
    }

    /// Set the enable and reset pin identifiers.
    pub fn with_pins(mut self, enable: impl Into<String>, reset: impl Into<String>) -> Self {
        self.pin_enable = enable.into();
        self.pin_reset = reset.into();
        self
    }

    /// Validate the settings and resolve the pin identifiers.
    pub fn resolve_pins(&self) -> Result<(u8, u8)> {
        if self.baud_rate == 0 {
            return Err(ConfigError::invalid("PMS5003 baud rate must be positive"));
        }
        if self.device.is_empty() {
            return Err(ConfigError::invalid("PMS5003 device path must not be empty"));
        }
        Ok((gpio::parse_pin(&self.pin_enable)?, gpio::parse_pin(&self.pin_reset)?))
    }

    /// The frame deadline as a `Duration`.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// One decoded data frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    words: [u16; DATA_WORDS],
}

impl Frame {
    /// PM1.0 in µg/m³, standard particle (CF=1).
    pub fn pm1_0(&self) -> u16 {
        self.words[0]
    }

    /// PM2.5 in µg/m³, standard particle (CF=1).
    pub fn pm2_5(&self) -> u16 {
        self.words[1]
    }

    /// PM10 in µg/m³, standard particle (CF=1).
    pub fn pm10(&self) -> u16 {
        self.words[2]
    }

    /// PM1.0, PM2.5 and PM10 under atmospheric environment.
    pub fn atmospheric(&self) -> [u16; 3] {
        [self.words[3], self.words[4], self.words[5]]
    }

    /// Particles per 0.1 L of air above 0.3, 0.5, 1.0, 2.5, 5.0 and 10 µm.
    pub fn particle_counts(&self) -> [u16; 6] {
        let mut counts = [0u16; 6];
        counts.copy_from_slice(&self.words[6..12]);
        counts
    }

    /// The reading published for this frame.
    pub fn reading(&self) -> ParticulateReading {
        ParticulateReading {
            pm1_0: f64::from(self.pm1_0()),
            pm2_5: f64::from(self.pm2_5()),
            pm10: f64::from(self.pm10()),
        }
    }

    /// Decode a frame body (everything after the two length bytes).
    pub fn decode(
        length: [u8; 2],
        body: &[u8; FRAME_BODY_LEN],
    ) -> std::result::Result<Self, ReadError> {
        let frame_len = u16::from_be_bytes(length);
        if usize::from(frame_len) != FRAME_BODY_LEN {
            return Err(ReadError::frame(format!(
                "unexpected frame length {} (expected {})",
                frame_len, FRAME_BODY_LEN
            )));
        }

        let payload = &body[..FRAME_BODY_LEN - 2];
        let actual = [START_1, START_2, length[0], length[1]]
            .iter()
            .chain(payload)
            .fold(0u16, |sum, b| sum.wrapping_add(u16::from(*b)));
        let expected = u16::from_be_bytes([body[FRAME_BODY_LEN - 2], body[FRAME_BODY_LEN - 1]]);
        if actual != expected {
            return Err(ReadError::Checksum { expected, actual });
        }

        let mut words = [0u16; DATA_WORDS];
        for (word, chunk) in words.iter_mut().zip(payload.chunks_exact(2)) {
            *word = u16::from_be_bytes([chunk[0], chunk[1]]);
        }
        Ok(Self { words })
    }
}

/// Read bytes until a complete frame has been decoded or `timeout` elapses.
///
/// A read that returns no bytes is treated as a timeout.
pub fn read_frame<R: Read>(
    reader: &mut R,
    timeout: Duration,
) -> std::result::Result<Frame, ReadError> {
    let started = Instant::now();
    let mut byte = [0u8; 1];
    let mut previous = 0u8;

    loop {
        if started.elapsed() > timeout {
            return Err(ReadError::timeout(format!(
                "no start of frame within {:?}",
                timeout
            )));
        }
        reader.read_exact(&mut byte)?;
        if previous == START_1 && byte[0] == START_2 {
            break;
        }
        previous = byte[0];
    }

    let mut length = [0u8; 2];
    reader.read_exact(&mut length)?;
    let mut body = [0u8; FRAME_BODY_LEN];
    reader.read_exact(&mut body)?;

    Frame::decode(length, &body)
}

/// A serial byte stream whose already-buffered input can be thrown away.
///
/// The sensor streams continuously while the daemon reads far less often, so
/// stale frames pile up in the receive buffer between cycles.
pub trait SerialInput: Read {
    /// Drop every byte received so far.
    fn discard_input(&mut self) -> io::Result<()>;
}

impl<T: AsRef<[u8]>> SerialInput for io::Cursor<T> {
    fn discard_input(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SerialInput for io::Empty {
    fn discard_input(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A configured PMS5003.
pub struct Pms5003<S, P = DefaultControlPins> {
    serial: S,
    timeout: Duration,
    // held so the lines keep their state
    pins: Option<P>,
}

impl<S: SerialInput> Pms5003<S> {
    /// Wrap an already-open serial stream whose control lines are managed
    /// elsewhere.
    pub fn new(serial: S, timeout: Duration) -> Self {
        Self {
            serial,
            timeout,
            pins: None,
        }
    }
}

impl<S: SerialInput, P: ControlPins> Pms5003<S, P> {
    /// Power the sensor up through its control lines: enable high, then
    /// reset held low for 100 ms and released. Input received before the
    /// reset is discarded.
    pub fn with_pins(mut serial: S, mut pins: P, timeout: Duration) -> Result<Self> {
        pins.enable()?;
        pins.pulse_reset(RESET_HOLD)?;
        serial.discard_input().map_err(|e| {
            ConfigError::device(format!("Failed to clear PMS5003 input: {}", e))
        })?;

        Ok(Self {
            serial,
            timeout,
            pins: Some(pins),
        })
    }

    /// The control lines, when this driver owns them.
    pub fn control_pins(&self) -> Option<&P> {
        self.pins.as_ref()
    }
}

impl<S, P> SensorDriver for Pms5003<S, P>
where
    S: SerialInput + Send,
    P: Send,
{
    fn name(&self) -> &str {
        "PMS5003"
    }

    async fn read(&mut self) -> ReadResult {
        self.serial.discard_input()?;
        let frame = read_frame(&mut self.serial, self.timeout)?;
        debug!(
            atmospheric = ?frame.atmospheric(),
            particle_counts = ?frame.particle_counts(),
            "PMS5003 frame decoded"
        );
        Ok(Some(Reading::Particulate(frame.reading())))
    }
}

/// The serial backend used by [`Pms5003::open`].
#[cfg(feature = "hardware")]
pub type SerialPort = uart::UartPort;

/// The serial backend used by [`Pms5003::open`].
#[cfg(not(feature = "hardware"))]
pub type SerialPort = io::Empty;

impl Pms5003<SerialPort> {
    /// Power up the sensor through its control lines and open its UART.
    #[cfg(feature = "hardware")]
    pub fn open(config: &ParticulateSensorConfig) -> Result<Self> {
        let (enable_pin, reset_pin) = config.resolve_pins()?;
        let pins = DefaultControlPins::open(enable_pin, reset_pin)?;
        let serial = uart::UartPort::open(&config.device, config.baud_rate)?;
        Self::with_pins(serial, pins, config.read_timeout())
    }

    /// Power up the sensor through its control lines and open its UART.
    #[cfg(not(feature = "hardware"))]
    pub fn open(config: &ParticulateSensorConfig) -> Result<Self> {
        let (enable_pin, reset_pin) = config.resolve_pins()?;
        let pins = DefaultControlPins::open(enable_pin, reset_pin)?;
        Self::with_pins(io::empty(), pins, config.read_timeout())
    }
}

#[cfg(feature = "hardware")]
mod uart {
    use super::SerialInput;
    use crate::error::{ConfigError, Result};
    use rppal::uart::{Parity, Queue, Uart};
    use std::io;
    use std::time::Duration;

    /// Timeout for a single UART read; the frame deadline bounds the total.
    const READ_TIMEOUT: Duration = Duration::from_secs(1);

    fn to_io(err: rppal::uart::Error) -> io::Error {
        io::Error::new(io::ErrorKind::Other, err.to_string())
    }

    /// A UART exposed as `std::io::Read`.
    pub struct UartPort(Uart);

    impl UartPort {
        pub fn open(device: &str, baud_rate: u32) -> Result<Self> {
            let mut uart = Uart::with_path(device, baud_rate, Parity::None, 8, 1)
                .map_err(|e| ConfigError::device(format!("Failed to open {}: {}", device, e)))?;
            uart.set_read_mode(0, READ_TIMEOUT).map_err(|e| {
                ConfigError::device(format!("Failed to set read mode on {}: {}", device, e))
            })?;
            Ok(Self(uart))
        }
    }

    impl io::Read for UartPort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.0.read(buf).map_err(to_io)
        }
    }

    impl SerialInput for UartPort {
        fn discard_input(&mut self) -> io::Result<()> {
            self.0.flush(Queue::Input).map_err(to_io)
        }
    }
}
