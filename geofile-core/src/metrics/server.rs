//! HTTP server for Prometheus metrics export
//!
//! Exposes the collector's registry at `/metrics` (plus `/health` and a
//! small help page at `/`). The conversion pipeline is synchronous, so the
//! server runs on its own thread with a single-threaded tokio runtime.

use crate::error::ConfigError;
use anyhow::{Context, Result};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::{Encoder, Registry, TextEncoder};
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Configuration for metrics HTTP server
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Address to bind to (e.g., "0.0.0.0:8000")
    pub listen_addr: SocketAddr,
    /// Path to serve metrics (default: "/metrics")
    pub metrics_path: String,
}

impl MetricsServerConfig {
    /// All interfaces on `port`; port 0 picks a free port
    pub fn on_port(port: u16) -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            ..Self::default()
        }
    }
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            metrics_path: "/metrics".to_string(),
        }
    }
}

/// HTTP server for Prometheus metrics
pub struct MetricsServer {
    config: MetricsServerConfig,
    registry: Arc<Registry>,
}

/// Running server; dropping it leaves the server thread running until exit
#[derive(Debug)]
pub struct MetricsServerHandle {
    local_addr: SocketAddr,
    _thread: JoinHandle<()>,
}

impl MetricsServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl MetricsServer {
    /// Create a new metrics server
    pub fn new(config: MetricsServerConfig, registry: Arc<Registry>) -> Self {
        Self { config, registry }
    }

    /// Bind the listen address and serve from a background thread
    ///
    /// Binding happens on the calling thread so an unavailable port is
    /// reported here rather than from inside the server thread.
    pub fn spawn(self) -> Result<MetricsServerHandle, ConfigError> {
        let addr = self.config.listen_addr;
        let bind_error = |source| ConfigError::Bind { addr, source };

        let listener = StdTcpListener::bind(addr).map_err(bind_error)?;
        listener.set_nonblocking(true).map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ConfigError::Runtime)?;

        let thread = thread::Builder::new()
            .name("metrics-server".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    let listener = match TcpListener::from_std(listener) {
                        Ok(listener) => listener,
                        Err(e) => {
                            error!("Failed to register metrics listener: {}", e);
                            return;
                        }
                    };
                    self.serve(listener).await;
                });
            })
            .map_err(ConfigError::Runtime)?;

        Ok(MetricsServerHandle {
            local_addr,
            _thread: thread,
        })
    }

    /// Accept loop; runs until the process exits
    async fn serve(self, listener: TcpListener) {
        if let Ok(addr) = listener.local_addr() {
            info!(
                "Metrics server listening on http://{}{}",
                addr, self.config.metrics_path
            );
        }

        let registry = self.registry.clone();
        let metrics_path = self.config.metrics_path.clone();

        loop {
            let (stream, remote_addr) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            let registry = registry.clone();
            let metrics_path = metrics_path.clone();

            tokio::spawn(async move {
                let io = TokioIo::new(stream);

                let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                    let registry = registry.clone();
                    let metrics_path = metrics_path.clone();
                    async move { handle_request(req, registry, metrics_path).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Connection error from {}: {}", remote_addr, err);
                }
            });
        }
    }
}

fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
}

/// Handle HTTP request
async fn handle_request(
    req: Request<hyper::body::Incoming>,
    registry: Arc<Registry>,
    metrics_path: String,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let path = req.uri().path();

    debug!("Metrics request: {} {}", req.method(), path);

    if path == "/health" || path == "/healthz" {
        return Ok(text_response(StatusCode::OK, "OK"));
    }

    if path == metrics_path {
        return Ok(match encode_metrics(&registry) {
            Ok(metrics_text) => {
                let mut response = text_response(StatusCode::OK, metrics_text);
                response.headers_mut().insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("text/plain; version=0.0.4"),
                );
                response
            }
            Err(e) => {
                error!("Failed to encode metrics: {}", e);
                text_response(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e))
            }
        });
    }

    if path == "/" {
        let help_text = format!(
            "Geofile Conversion Metrics\n\nEndpoints:\n  {} - Prometheus metrics\n  /health - Health check\n",
            metrics_path
        );
        return Ok(text_response(StatusCode::OK, help_text));
    }

    warn!("Unknown metrics endpoint requested: {}", path);
    Ok(text_response(StatusCode::NOT_FOUND, "Not Found"))
}

/// Encode metrics to Prometheus text format
pub fn encode_metrics(registry: &Registry) -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();

    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .context("Failed to encode metrics")?;

    String::from_utf8(buffer).context("Invalid UTF-8 in metrics")
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::IntCounter;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::time::Duration;

    fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", addr.port())).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        write!(
            stream,
            "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
            path
        )
        .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    }

    #[test]
    fn test_metrics_server_config_default() {
        let config = MetricsServerConfig::default();
        assert_eq!(config.metrics_path, "/metrics");
        assert_eq!(config.listen_addr.port(), 8000);
        assert_eq!(MetricsServerConfig::on_port(9100).listen_addr.port(), 9100);
    }

    #[test]
    fn test_encode_metrics() {
        let registry = Registry::new();
        let counter = IntCounter::new("geofile_test_total", "Test counter").unwrap();
        registry.register(Box::new(counter.clone())).unwrap();
        counter.inc_by(3);

        let encoded = encode_metrics(&registry).unwrap();
        assert!(encoded.contains("geofile_test_total 3"));
        assert!(encoded.contains("TYPE"));
    }

    #[test]
    fn test_serves_metrics_health_and_404() {
        let registry = Arc::new(Registry::new());
        let counter = IntCounter::new("geofile_served_total", "Served counter").unwrap();
        registry.register(Box::new(counter.clone())).unwrap();
        counter.inc();

        let handle = MetricsServer::new(MetricsServerConfig::on_port(0), registry)
            .spawn()
            .unwrap();
        let addr = handle.local_addr();
        assert_ne!(addr.port(), 0);

        let metrics = get(addr, "/metrics");
        assert!(metrics.starts_with("HTTP/1.1 200"));
        assert!(metrics.contains("geofile_served_total 1"));

        let health = get(addr, "/health");
        assert!(health.starts_with("HTTP/1.1 200"));
        assert!(health.ends_with("OK"));

        let missing = get(addr, "/nope");
        assert!(missing.starts_with("HTTP/1.1 404"));
    }

    #[test]
    fn test_port_in_use_is_config_error() {
        let taken = StdTcpListener::bind("0.0.0.0:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let result = MetricsServer::new(MetricsServerConfig::on_port(port), Arc::new(Registry::new())).spawn();
        assert!(matches!(result, Err(ConfigError::Bind { .. })));
    }
}
