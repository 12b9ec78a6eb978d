use airstation::{
    error::PublishError,
    sensors::{pms5003, ReadResult},
    ClimateReading, CycleConfig, Measurement, ParticulateReading, Publisher, Reading,
    SensorDriver, Station,
};
use criterion::{criterion_group, criterion_main, Criterion};
use std::io::Cursor;
use std::time::Duration;

/// A valid 32-byte PMS5003 frame preceded by some line noise
fn frame_bytes() -> Vec<u8> {
    let mut frame = vec![0x42, 0x4D, 0x00, 0x1C];
    for word in [3u16, 5, 8, 3, 5, 8, 600, 180, 30, 4, 1, 0, 0] {
        frame.extend_from_slice(&word.to_be_bytes());
    }
    let checksum = frame.iter().fold(0u16, |sum, b| sum.wrapping_add(u16::from(*b)));
    frame.extend_from_slice(&checksum.to_be_bytes());

    let mut stream = vec![0x00, 0xFF, 0x42, 0x13];
    stream.extend(frame);
    stream
}

/// Benchmark frame synchronisation and decoding
fn bench_frame_decoding(c: &mut Criterion) {
    let bytes = frame_bytes();

    c.bench_function("pms5003_read_frame", |b| {
        b.iter(|| {
            let mut cursor = Cursor::new(bytes.as_slice());
            pms5003::read_frame(&mut cursor, Duration::from_secs(1)).expect("Should decode frame")
        })
    });
}

/// Benchmark reading to line protocol conversion
fn bench_line_protocol(c: &mut Criterion) {
    let climate = Reading::Climate(ClimateReading {
        temperature: 21.5,
        humidity: 45.2,
        pressure: 1013.25,
        gas_resistance: 12000.0,
    });

    c.bench_function("climate_to_measurement", |b| {
        b.iter(|| climate.to_measurement("Terasa"))
    });

    let measurement = climate.to_measurement("Terasa");
    c.bench_function("line_protocol_encoding", |b| {
        b.iter(|| measurement.to_line_protocol().expect("Should encode"))
    });
}

struct Steady;

impl SensorDriver for Steady {
    fn name(&self) -> &str {
        "steady"
    }

    async fn read(&mut self) -> ReadResult {
        Ok(Some(Reading::Particulate(ParticulateReading {
            pm1_0: 3.0,
            pm2_5: 5.0,
            pm10: 8.0,
        })))
    }
}

struct Discard;

impl Publisher for Discard {
    async fn publish(&mut self, measurement: &Measurement) -> Result<(), PublishError> {
        measurement.to_line_protocol().map(|_| ()).ok_or_else(|| PublishError::encoding("empty"))
    }
}

/// Benchmark one full cycle against in-memory drivers
fn bench_sample_cycle(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Should create tokio runtime");

    c.bench_function("sample_cycle", |b| {
        b.to_async(&rt).iter(|| async {
            let mut station = Station::new(Steady, Steady, Discard, CycleConfig::default());
            station.sample_cycle().await
        })
    });
}

criterion_group!(
    benches,
    bench_frame_decoding,
    bench_line_protocol,
    bench_sample_cycle
);
criterion_main!(benches);
