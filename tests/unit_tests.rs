use airstation::{
    error::{PublishError, ReadError},
    sensors::ReadResult,
    ClimateReading, CycleConfig, Measurement, ParticulateReading, Publisher, Reading, Scheduler,
    SensorDriver, SensorOutcome, Station,
};
use std::collections::VecDeque;
use std::time::Duration;

/// Sensor that replays a fixed script of outcomes, then keeps failing.
struct Scripted {
    name: &'static str,
    script: VecDeque<ReadResult>,
    reads: usize,
}

impl Scripted {
    fn new(name: &'static str, script: Vec<ReadResult>) -> Self {
        Self {
            name,
            script: script.into(),
            reads: 0,
        }
    }
}

impl SensorDriver for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    async fn read(&mut self) -> ReadResult {
        self.reads += 1;
        self.script
            .pop_front()
            .unwrap_or_else(|| Err(ReadError::bus("script exhausted")))
    }
}

/// Publisher that records every attempt and refuses the listed measurement names.
#[derive(Default)]
struct Recorder {
    attempts: Vec<Measurement>,
    accepted: Vec<Measurement>,
    refuse: Vec<&'static str>,
}

impl Publisher for Recorder {
    async fn publish(&mut self, measurement: &Measurement) -> Result<(), PublishError> {
        self.attempts.push(measurement.clone());
        if self.refuse.iter().any(|name| *name == measurement.name()) {
            return Err(PublishError::Rejected {
                status: 404,
                body: "bucket not found".to_string(),
            });
        }
        self.accepted.push(measurement.clone());
        Ok(())
    }
}

fn climate_ok() -> ReadResult {
    Ok(Some(Reading::Climate(ClimateReading {
        temperature: 21.5,
        humidity: 45.2,
        pressure: 1013.0,
        gas_resistance: 12000.0,
    })))
}

fn particulate_ok() -> ReadResult {
    Ok(Some(Reading::Particulate(ParticulateReading {
        pm1_0: 3.0,
        pm2_5: 5.0,
        pm10: 8.0,
    })))
}

fn station(
    climate: Vec<ReadResult>,
    particulate: Vec<ReadResult>,
    recorder: Recorder,
) -> Station<Scripted, Scripted, Recorder> {
    Station::new(
        Scripted::new("climate", climate),
        Scripted::new("particulate", particulate),
        recorder,
        CycleConfig::default(),
    )
}

/// A good climate reading becomes exactly one fully-shaped measurement
#[tokio::test]
async fn test_climate_measurement_contents() {
    let mut station = station(vec![climate_ok()], vec![Ok(None)], Recorder::default());
    station.sample_cycle().await;

    let accepted = &station.publisher().accepted;
    assert_eq!(accepted.len(), 1);

    let m = &accepted[0];
    assert_eq!(m.name(), "climate-measurement");
    assert_eq!(m.tags().len(), 1);
    assert_eq!(m.tags()["location"], "Terasa");
    assert_eq!(m.fields().len(), 4);
    assert_eq!(m.fields()["temperature"], 21.5);
    assert_eq!(m.fields()["humidity"], 45.2);
    assert_eq!(m.fields()["pressure"], 1013.0);
    assert_eq!(m.fields()["gas"], 12000.0);
}

/// A good particulate reading becomes exactly one fully-shaped measurement
#[tokio::test]
async fn test_particulate_measurement_contents() {
    let mut station = station(
        vec![Err(ReadError::bus("i2c nack"))],
        vec![particulate_ok()],
        Recorder::default(),
    );
    station.sample_cycle().await;

    let accepted = &station.publisher().accepted;
    assert_eq!(accepted.len(), 1);

    let m = &accepted[0];
    assert_eq!(m.name(), "particulate-measurement");
    assert_eq!(m.tags()["location"], "Terasa");
    assert_eq!(m.fields().len(), 3);
    assert_eq!(m.fields()["ug-per-m3-1"], 3.0);
    assert_eq!(m.fields()["ug-per-m3-2-5"], 5.0);
    assert_eq!(m.fields()["ug-per-m3-10"], 8.0);
}

/// Every failure combination still reads both sensors
#[tokio::test]
async fn test_read_failures_never_skip_the_other_sensor() {
    fn nack() -> ReadResult {
        Err(ReadError::bus("nack"))
    }
    fn empty() -> ReadResult {
        Ok(None)
    }
    fn no_frame() -> ReadResult {
        Err(ReadError::timeout("no frame"))
    }
    fn corrupt() -> ReadResult {
        Err(ReadError::Checksum {
            expected: 1,
            actual: 2,
        })
    }

    let combos: [(fn() -> ReadResult, fn() -> ReadResult); 4] = [
        (nack, particulate_ok),
        (empty, particulate_ok),
        (climate_ok, no_frame),
        (nack, corrupt),
    ];

    for (climate, particulate) in combos {
        let mut station = station(vec![climate()], vec![particulate()], Recorder::default());
        station.sample_cycle().await;

        assert_eq!(station.climate().reads, 1);
        assert_eq!(station.particulate().reads, 1);
    }
}

/// An empty climate read publishes nothing for that sensor and still reaches the other
#[tokio::test]
async fn test_empty_climate_read() {
    let mut station = station(vec![Ok(None)], vec![particulate_ok()], Recorder::default());
    let report = station.sample_cycle().await;

    assert_eq!(report.climate, SensorOutcome::NoData);
    assert_eq!(report.particulate, SensorOutcome::Published);
    assert!(station
        .publisher()
        .attempts
        .iter()
        .all(|m| m.name() != "climate-measurement"));
}

/// A refused publish does not stop the next measurement from being attempted
#[tokio::test]
async fn test_publish_failure_does_not_block_other_measurement() {
    let recorder = Recorder {
        refuse: vec!["climate-measurement"],
        ..Default::default()
    };
    let mut station = station(vec![climate_ok()], vec![particulate_ok()], recorder);
    let report = station.sample_cycle().await;

    assert_eq!(report.climate, SensorOutcome::PublishFailed);
    assert_eq!(report.particulate, SensorOutcome::Published);

    let attempts: Vec<_> = station.publisher().attempts.iter().map(|m| m.name()).collect();
    assert_eq!(attempts, ["climate-measurement", "particulate-measurement"]);
    assert_eq!(station.publisher().accepted.len(), 1);
}

/// The scheduler keeps ticking through cycles where everything fails
#[tokio::test(start_paused = true)]
async fn test_scheduler_survives_failing_cycles() {
    let recorder = Recorder {
        refuse: vec!["climate-measurement", "particulate-measurement"],
        ..Default::default()
    };
    let mut station = station(
        vec![Err(ReadError::bus("nack")), Ok(None), climate_ok(), climate_ok()],
        vec![
            Err(ReadError::timeout("no frame")),
            particulate_ok(),
            Err(ReadError::frame("bad length")),
            particulate_ok(),
        ],
        recorder,
    );
    let scheduler = Scheduler::new(Duration::from_secs(15));

    scheduler.run_cycles(&mut station, 6).await;

    assert_eq!(station.climate().reads, 6);
    assert_eq!(station.particulate().reads, 6);
    assert_eq!(station.publisher().attempts.len(), 4);
    assert!(station.publisher().accepted.is_empty());
}

/// Cycles are separated by at least the configured interval
#[tokio::test(start_paused = true)]
async fn test_cycles_are_spaced_by_interval() {
    let mut station = station(Vec::new(), Vec::new(), Recorder::default());
    let scheduler = Scheduler::from_config(station.config());

    let started = tokio::time::Instant::now();
    scheduler.run_cycles(&mut station, 3).await;

    assert!(started.elapsed() >= scheduler.interval() * 3);
    assert_eq!(station.climate().reads, 3);
}

/// Measurement encodes as InfluxDB line protocol
#[test]
fn test_line_protocol_encoding() {
    let m = match climate_ok() {
        Ok(Some(reading)) => reading.to_measurement("Terasa"),
        _ => unreachable!(),
    };
    let line = m.to_line_protocol().expect("Should encode");

    assert!(line.starts_with("climate-measurement,location=Terasa "));
    assert!(line.contains("gas=12000,humidity=45.2,pressure=1013,temperature=21.5 "));
}

/// Measurement serializes to JSON with its tags and fields
#[test]
fn test_measurement_json() {
    let m = Measurement::new("particulate-measurement")
        .tag("location", "Terasa")
        .field("ug-per-m3-1", 3.0);
    let json: serde_json::Value = serde_json::to_value(&m).expect("Should serialize");

    assert_eq!(json["name"], "particulate-measurement");
    assert_eq!(json["tags"]["location"], "Terasa");
    assert_eq!(json["fields"]["ug-per-m3-1"], 3.0);
    assert!(json.get("timestamp").is_some());
}
