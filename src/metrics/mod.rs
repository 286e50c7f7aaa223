//! Prometheus metrics for the incident service.
//!
//! Covers HTTP request tracking, incident writes and server-side errors.
//! All metrics live in a single process-wide registry and are exposed in the
//! text exposition format by [`gather_metrics`].
//!
//! # Example
//! ```no_run
//! use incident_api::metrics::INCIDENTS_CREATED_TOTAL;
//!
//! INCIDENTS_CREATED_TOTAL.with_label_values(&["operator"]).inc();
//! ```

mod middleware;

pub use middleware::track_metrics;

use lazy_static::lazy_static;
use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry};

const NAMESPACE: &str = "incident_api";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    /// Total number of HTTP requests received
    ///
    /// Labels: method, path, status_code
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests")
            .namespace(NAMESPACE),
        &["method", "path", "status_code"]
    ).expect("Failed to create HTTP_REQUESTS_TOTAL metric");

    /// HTTP request duration in seconds
    ///
    /// Labels: method, path
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["method", "path"]
    ).expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric");

    /// Incidents created
    ///
    /// Labels: source
    pub static ref INCIDENTS_CREATED_TOTAL: CounterVec = CounterVec::new(
        Opts::new("incidents_created_total", "Total number of incidents created")
            .namespace(NAMESPACE),
        &["source"]
    ).expect("Failed to create INCIDENTS_CREATED_TOTAL metric");

    /// Status updates applied
    ///
    /// Labels: status (the new status)
    pub static ref INCIDENT_STATUS_CHANGES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            "incident_status_changes_total",
            "Total number of incident status updates"
        )
        .namespace(NAMESPACE),
        &["status"]
    ).expect("Failed to create INCIDENT_STATUS_CHANGES_TOTAL metric");

    /// Server-side errors
    ///
    /// Labels: kind (error code)
    pub static ref ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("errors_total", "Total number of server-side errors")
            .namespace(NAMESPACE),
        &["kind"]
    ).expect("Failed to create ERRORS_TOTAL metric");
}

/// Register all metrics with the global registry.
///
/// Fails with `AlreadyReg` if called more than once.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(INCIDENTS_CREATED_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(INCIDENT_STATUS_CHANGES_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(ERRORS_TOTAL.clone()))?;

    Ok(())
}

/// Render all registered metrics in Prometheus text format
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        // Global registry: a second registration in the same process is rejected
        let _ = init_metrics();
        assert!(init_metrics().is_err());

        INCIDENTS_CREATED_TOTAL.with_label_values(&["operator"]).inc();
        let output = gather_metrics();
        assert!(output.contains("incident_api_incidents_created_total"));
    }
}
