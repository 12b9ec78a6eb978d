//! Airstation - environmental sampling daemon binary
//!
//! Reads its configuration from the environment, configures both sensors and
//! the InfluxDB client, then samples forever until SIGINT or SIGTERM.

use airstation::{
    Bme680, ClimateSensorConfig, CycleConfig, InfluxPublisher, ParticulateSensorConfig, Pms5003,
    Scheduler, SinkConfig, Station, DEFAULT_BUCKET, DEFAULT_DELAY_SECS, DEFAULT_INFLUX_ORG,
    DEFAULT_INFLUX_URL, DEFAULT_LOCATION, DEFAULT_PUBLISH_TIMEOUT_SECS,
};
use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "airstation")]
#[command(about = "BME680 + PMS5003 sampling daemon that writes to InfluxDB")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Seconds to wait after each cycle
    #[arg(long, env = "DELAY", default_value_t = DEFAULT_DELAY_SECS,
          value_parser = clap::value_parser!(u64).range(1..))]
    delay: u64,

    /// Value of the `location` tag
    #[arg(long, env = "TAG_LOCATION", default_value = DEFAULT_LOCATION)]
    tag_location: String,

    /// Destination bucket
    #[arg(long, env = "BUCKET_NAME", default_value = DEFAULT_BUCKET)]
    bucket_name: String,

    /// InfluxDB server URL
    #[arg(long, env = "INFLUX_DB_URL", default_value = DEFAULT_INFLUX_URL)]
    influx_db_url: String,

    /// InfluxDB organization
    #[arg(long, env = "INFLUX_DB_ORGANIZATION", default_value = DEFAULT_INFLUX_ORG)]
    influx_db_organization: String,

    /// InfluxDB API token
    #[arg(long, env = "INFLUX_DB_TOKEN", hide_env_values = true)]
    influx_db_token: Option<String>,

    /// Upper bound for one write request, in seconds
    #[arg(long, env = "INFLUX_DB_TIMEOUT", default_value_t = DEFAULT_PUBLISH_TIMEOUT_SECS,
          value_parser = clap::value_parser!(u64).range(1..))]
    influx_db_timeout: u64,

    /// I2C bus the BME680 is attached to
    #[arg(long, env = "BME680_I2C_BUS", default_value_t = 1)]
    bme680_i2c_bus: u8,

    /// BME680 I2C address (0x76 or 0x77)
    #[arg(long, env = "BME680_I2C_ADDRESS", default_value = "0x76", value_parser = parse_address)]
    bme680_i2c_address: u16,

    /// Gas heater target temperature in degrees Celsius
    #[arg(long, env = "BME680_HEATER_TEMPERATURE", default_value_t = 320)]
    bme680_heater_temperature: u16,

    /// Gas heater on-time in milliseconds
    #[arg(long, env = "BME680_HEATER_DURATION", default_value_t = 150)]
    bme680_heater_duration: u16,

    /// PMS5003 serial device
    #[arg(long, env = "PMS5003_DEVICE", default_value = "/dev/ttyUSB0")]
    pms5003_device: String,

    /// PMS5003 baud rate
    #[arg(long, env = "PMS5003_BAUD_RATE", default_value_t = 9600)]
    pms5003_baud_rate: u32,

    /// PMS5003 enable pin
    #[arg(long, env = "PMS5003_PIN_ENABLE", default_value = "GPIO22")]
    pms5003_pin_enable: String,

    /// PMS5003 reset pin
    #[arg(long, env = "PMS5003_PIN_RESET", default_value = "GPIO22")]
    pms5003_pin_reset: String,
}

impl Cli {
    fn cycle_config(&self) -> airstation::Result<CycleConfig> {
        CycleConfig::new(self.delay, &self.tag_location, &self.bucket_name)
    }

    fn sink_config(&self) -> SinkConfig {
        SinkConfig::new(&self.influx_db_url, &self.influx_db_organization)
            .with_token(self.influx_db_token.clone())
            .with_timeout_secs(self.influx_db_timeout)
    }

    fn climate_config(&self) -> ClimateSensorConfig {
        ClimateSensorConfig::default()
            .with_device(self.bme680_i2c_bus, self.bme680_i2c_address)
            .with_heater(self.bme680_heater_temperature, self.bme680_heater_duration)
    }

    fn particulate_config(&self) -> ParticulateSensorConfig {
        ParticulateSensorConfig::default()
            .with_device(&self.pms5003_device, self.pms5003_baud_rate)
            .with_pins(&self.pms5003_pin_enable, &self.pms5003_pin_reset)
    }
}

fn parse_address(raw: &str) -> Result<u16, String> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => raw.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid I2C address {:?}: {}", raw, e))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging()?;

    if let Err(err) = run(cli).await {
        error!("Startup failed: {:#}", err);
        return Err(err);
    }

    Ok(())
}

fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    info!("Starting airstation v{}", env!("CARGO_PKG_VERSION"));

    let cycle = cli.cycle_config().context("Invalid cycle configuration")?;
    let sink = cli.sink_config();
    if sink.token.is_none() {
        warn!("INFLUX_DB_TOKEN is not set, writes will be sent unauthenticated");
    }

    let climate_config = cli.climate_config();
    let climate = Bme680::open(&climate_config).context("Failed to configure BME680")?;
    info!(
        "BME680 configured on I2C bus {} at {:#04x}",
        climate_config.bus, climate_config.address
    );

    let particulate_config = cli.particulate_config();
    let particulate =
        Pms5003::open(&particulate_config).context("Failed to configure PMS5003")?;
    info!(
        "PMS5003 configured on {} at {} baud",
        particulate_config.device, particulate_config.baud_rate
    );

    let publisher =
        InfluxPublisher::new(&sink, &cycle.bucket).context("Failed to create InfluxDB client")?;

    info!("Sampling configuration:");
    info!("  - Interval: {}s", cycle.interval_secs);
    info!("  - Location tag: {}", cycle.location);
    info!("  - Sink: {} (org {}, bucket {})", sink.url, sink.organization, cycle.bucket);

    let scheduler = Scheduler::from_config(&cycle);
    let mut station = Station::new(climate, particulate, publisher, cycle);

    tokio::select! {
        _ = scheduler.run(&mut station) => {}
        signal = shutdown_signal() => {
            signal?;
            info!("Termination signal received, stopping");
        }
    }

    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> anyhow::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.context("Failed to listen for SIGINT")?,
        _ = terminate.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> anyhow::Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")
}
