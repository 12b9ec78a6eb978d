//! Error types for the air station daemon.
//!
//! Only [`ConfigError`] is ever fatal. [`ReadError`] and [`PublishError`] are
//! produced once per cycle and consumed by the sample cycle, which logs them
//! and moves on.

/// A specialized `Result` type for startup operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Startup failure: a sensor or the sink could not be configured.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value is out of range or malformed
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The sensor did not respond as expected while being configured
    #[error("Device error: {0}")]
    Device(String),

    /// The sink client could not be constructed
    #[error("Sink error: {0}")]
    Sink(String),

    /// The binary was built without the hardware backend
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl ConfigError {
    /// Create a new invalid-value error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    /// Create a new device error
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Create a new sink construction error
    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink(msg.into())
    }

    /// Create a new unsupported-platform error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}

/// A single sensor poll failed.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// Bus-level I/O failed (I2C transfer, UART read)
    #[error("Bus error: {0}")]
    Bus(String),

    /// The device did not produce a complete frame in time
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Frame checksum did not match its payload
    #[error("Checksum mismatch: expected {expected:#06x}, computed {actual:#06x}")]
    Checksum { expected: u16, actual: u16 },

    /// Frame structure was not what the device protocol describes
    #[error("Malformed frame: {0}")]
    Frame(String),
}

impl ReadError {
    /// Create a new bus error
    pub fn bus(msg: impl Into<String>) -> Self {
        Self::Bus(msg.into())
    }

    /// Create a new timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a new malformed-frame error
    pub fn frame(msg: impl Into<String>) -> Self {
        Self::Frame(msg.into())
    }
}

impl From<std::io::Error> for ReadError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::UnexpectedEof => {
                Self::Timeout(err.to_string())
            }
            _ => Self::Bus(err.to_string()),
        }
    }
}

/// Writing one measurement to the sink failed.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The sink could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// The sink refused the credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The sink answered with a non-success status
    #[error("Rejected by sink (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    /// The measurement could not be encoded
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl PublishError {
    /// Create a new connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a new authorization error
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a new encoding error
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }
}
