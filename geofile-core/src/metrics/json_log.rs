//! JSON Lines metrics log
//!
//! Intermediate calls only fill in the in-flight record; `success` and
//! `failure` complete it and emit it as a single line. One line per
//! conversion, appended to a file or printed to stdout.

use super::{ConversionMetadata, MetricsCollector};
use serde_json::{Map, Value};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, warn};

/// Local timestamp layout used in every record
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct JsonLogCollector {
    output_file: Option<PathBuf>,
    current_record: Map<String, Value>,
}

impl JsonLogCollector {
    /// `None` prints records to stdout
    pub fn new(output_file: Option<PathBuf>) -> Self {
        Self {
            output_file,
            current_record: Map::new(),
        }
    }

    pub fn output_file(&self) -> Option<&Path> {
        self.output_file.as_deref()
    }

    /// Record being accumulated for the current conversion
    pub fn current_record(&self) -> &Map<String, Value> {
        &self.current_record
    }

    fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.current_record.insert(key.to_string(), value.into());
    }

    /// Emit the in-flight record and start over with an empty one
    fn flush_record(&mut self) {
        let mut record = std::mem::take(&mut self.current_record);
        record
            .entry("timestamp")
            .or_insert_with(|| Value::from(timestamp()));

        let line = match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to encode metrics record: {}", e);
                return;
            }
        };

        let result = match &self.output_file {
            Some(path) => append_line(path, &line),
            None => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                writeln!(handle, "{}", line)
            }
        };

        if let Err(e) = result {
            warn!("Failed to write metrics record: {}", e);
        }
    }
}

fn append_line(path: &Path, line: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)
}

fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Finite floats become JSON numbers, anything else null
fn float(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

impl MetricsCollector for JsonLogCollector {
    fn record_conversion_start(&mut self) {
        self.current_record = Map::new();
        self.set("timestamp", timestamp());
        self.set("event", "conversion_start");
    }

    fn record_conversion_success(&mut self, duration: Duration, metadata: &ConversionMetadata) {
        self.set("event", "conversion_success");
        self.set("duration_seconds", float(duration.as_secs_f64()));
        match serde_json::to_value(metadata) {
            Ok(Value::Object(fields)) => self.current_record.extend(fields),
            Ok(_) => {}
            Err(e) => warn!("Failed to encode conversion metadata: {}", e),
        }
        self.flush_record();
    }

    fn record_conversion_failure(&mut self, error: &str) {
        self.set("event", "conversion_failure");
        self.set("error", error);
        self.flush_record();
    }

    fn record_read_time(&mut self, duration: Duration) {
        self.set("read_duration_seconds", float(duration.as_secs_f64()));
    }

    fn record_write_time(&mut self, duration: Duration) {
        self.set("write_duration_seconds", float(duration.as_secs_f64()));
    }

    fn record_feature_count(&mut self, count: u64) {
        self.set("feature_count", count);
    }

    fn record_file_sizes(&mut self, input_mb: f64, output_mb: f64) {
        self.set("input_size_mb", float(input_mb));
        self.set("output_size_mb", float(output_mb));
    }
}
