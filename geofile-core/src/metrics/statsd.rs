//! StatsD push collector
//!
//! Every call is sent immediately as a UDP datagram. Send failures are
//! logged and dropped; StatsD is lossy by nature.

use super::{ConversionMetadata, MetricsCollector};
use crate::error::ConfigError;
use cadence::prelude::*;
use cadence::{MetricResult, StatsdClient, UdpMetricSink};
use std::net::UdpSocket;
use std::time::Duration;
use tracing::{info, warn};

/// Namespace prepended to every metric name
pub const STATSD_PREFIX: &str = "shapefile";

pub struct StatsdCollector {
    client: StatsdClient,
}

impl StatsdCollector {
    pub fn new(host: &str, port: u16) -> Result<Self, ConfigError> {
        Self::with_prefix(host, port, STATSD_PREFIX)
    }

    pub fn with_prefix(host: &str, port: u16, prefix: &str) -> Result<Self, ConfigError> {
        let target = format!("{}:{}", host, port);
        let socket_error = |source| ConfigError::StatsdSocket {
            target: target.clone(),
            source,
        };

        let socket = UdpSocket::bind("0.0.0.0:0").map_err(socket_error)?;
        socket.set_nonblocking(true).map_err(socket_error)?;

        let sink = UdpMetricSink::from((host, port), socket).map_err(|source| ConfigError::Statsd {
            target: target.clone(),
            source,
        })?;
        let client = StatsdClient::from_sink(prefix, sink);

        info!("StatsD metrics sending to {}", target);
        Ok(Self { client })
    }
}

fn report<T>(metric: &str, result: MetricResult<T>) {
    if let Err(e) = result {
        warn!("Failed to send StatsD metric {}: {}", metric, e);
    }
}

impl MetricsCollector for StatsdCollector {
    fn record_conversion_start(&mut self) {}

    fn record_conversion_success(&mut self, duration: Duration, _metadata: &ConversionMetadata) {
        report("conversion.success", self.client.incr("conversion.success"));
        report(
            "conversion.duration",
            self.client.time("conversion.duration", duration),
        );
    }

    fn record_conversion_failure(&mut self, _error: &str) {
        report("conversion.failure", self.client.incr("conversion.failure"));
    }

    fn record_read_time(&mut self, duration: Duration) {
        report("read.duration", self.client.time("read.duration", duration));
    }

    fn record_write_time(&mut self, duration: Duration) {
        report("write.duration", self.client.time("write.duration", duration));
    }

    fn record_feature_count(&mut self, count: u64) {
        report("feature.count", self.client.gauge("feature.count", count));
    }

    fn record_file_sizes(&mut self, input_mb: f64, output_mb: f64) {
        report("input.size_mb", self.client.gauge("input.size_mb", input_mb));
        report("output.size_mb", self.client.gauge("output.size_mb", output_mb));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daemon() -> (UdpSocket, u16) {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let port = socket.local_addr().unwrap().port();
        (socket, port)
    }

    fn receive(socket: &UdpSocket, count: usize) -> Vec<String> {
        let mut buf = [0u8; 512];
        (0..count)
            .map(|_| {
                let (len, _) = socket.recv_from(&mut buf).unwrap();
                String::from_utf8_lossy(&buf[..len]).into_owned()
            })
            .collect()
    }

    #[test]
    fn test_success_sends_counter_and_timer() {
        let (socket, port) = daemon();
        let mut collector = StatsdCollector::new("127.0.0.1", port).unwrap();

        collector.record_conversion_start();
        collector.record_conversion_success(
            Duration::from_millis(1500),
            &ConversionMetadata {
                input_file: "a.shp".to_string(),
                output_file: "a.geojson".to_string(),
                feature_count: 1,
                input_size_mb: 0.0,
                output_size_mb: 0.0,
                crs: "EPSG:4326".to_string(),
            },
        );

        let packets = receive(&socket, 2);
        assert_eq!(packets[0], "shapefile.conversion.success:1|c");
        assert_eq!(packets[1], "shapefile.conversion.duration:1500|ms");
    }

    #[test]
    fn test_failure_and_timings() {
        let (socket, port) = daemon();
        let mut collector = StatsdCollector::new("127.0.0.1", port).unwrap();

        collector.record_read_time(Duration::from_millis(40));
        collector.record_write_time(Duration::from_millis(60));
        collector.record_conversion_failure("boom");

        let packets = receive(&socket, 3);
        assert_eq!(packets[0], "shapefile.read.duration:40|ms");
        assert_eq!(packets[1], "shapefile.write.duration:60|ms");
        assert_eq!(packets[2], "shapefile.conversion.failure:1|c");
    }

    #[test]
    fn test_gauges() {
        let (socket, port) = daemon();
        let mut collector = StatsdCollector::with_prefix("127.0.0.1", port, "geo").unwrap();

        collector.record_feature_count(3);
        collector.record_file_sizes(0.5, 1.25);

        let packets = receive(&socket, 3);
        assert_eq!(packets[0], "geo.feature.count:3|g");
        assert_eq!(packets[1], "geo.input.size_mb:0.5|g");
        assert_eq!(packets[2], "geo.output.size_mb:1.25|g");
    }

    #[test]
    fn test_unresolvable_host_is_config_error() {
        let result = StatsdCollector::new("no-such-host.invalid", 8125);
        assert!(matches!(result, Err(ConfigError::Statsd { .. })));
    }
}
