//! The outbound unit written to the sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

/// A named, tagged, timestamped set of numeric fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    name: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, f64>,
    timestamp: DateTime<Utc>,
}

impl Measurement {
    /// Start a measurement stamped with the current time.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Attach a tag.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Attach a field.
    pub fn field(mut self, key: impl Into<String>, value: f64) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Override the timestamp.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn fields(&self) -> &BTreeMap<String, f64> {
        &self.fields
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Encode as one line of InfluxDB line protocol with a nanosecond timestamp.
    ///
    /// Returns `None` when there is nothing the sink would accept: no fields,
    /// a non-finite field value, or a timestamp outside the nanosecond range.
    pub fn to_line_protocol(&self) -> Option<String> {
        if self.fields.is_empty() || self.fields.values().any(|v| !v.is_finite()) {
            return None;
        }
        let nanos = self.timestamp.timestamp_nanos_opt()?;

        let mut line = String::with_capacity(64);
        escape_into(&mut line, &self.name, &[',', ' ']);
        for (key, value) in &self.tags {
            line.push(',');
            escape_into(&mut line, key, &[',', '=', ' ']);
            line.push('=');
            escape_into(&mut line, value, &[',', '=', ' ']);
        }

        let mut separator = ' ';
        for (key, value) in &self.fields {
            line.push(separator);
            escape_into(&mut line, key, &[',', '=', ' ']);
            // f64 Display never uses exponent notation, and a bare number is a float field
            let _ = write!(line, "={}", value);
            separator = ',';
        }

        let _ = write!(line, " {}", nanos);
        Some(line)
    }
}

fn escape_into(out: &mut String, raw: &str, special: &[char]) {
    for c in raw.chars() {
        if c == '\\' || special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 5).unwrap()
    }

    #[test]
    fn test_line_protocol() {
        let m = Measurement::new("climate-measurement")
            .tag("location", "Terasa")
            .field("temperature", 21.5)
            .field("gas", 12000.0)
            .at(fixed());

        assert_eq!(
            m.to_line_protocol().unwrap(),
            "climate-measurement,location=Terasa gas=12000,temperature=21.5 1700000000000000005"
        );
    }

    #[test]
    fn test_escaping() {
        let m = Measurement::new("my measurement,x")
            .tag("location", "Living Room=1")
            .field("a b", 1.0)
            .at(fixed());

        assert_eq!(
            m.to_line_protocol().unwrap(),
            r"my\ measurement\,x,location=Living\ Room\=1 a\ b=1 1700000000000000005"
        );
    }

    #[test]
    fn test_unencodable_measurements() {
        assert!(Measurement::new("empty").to_line_protocol().is_none());
        assert!(Measurement::new("nan")
            .field("value", f64::NAN)
            .to_line_protocol()
            .is_none());
    }

    #[test]
    fn test_timestamp_is_construction_time() {
        let before = Utc::now();
        let m = Measurement::new("t");
        let after = Utc::now();
        assert!(m.timestamp() >= before && m.timestamp() <= after);
    }
}
