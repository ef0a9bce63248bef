//! Prometheus metrics collection for yapple-relay.
//!
//! Exposed on the `/metrics` HTTP endpoint when `server.metrics_port` is
//! non-zero. Every recording helper is a no-op until [`init`] has run, so
//! library code and tests can call them unconditionally.
//!
//! - `yapple_frames_total{type}` - Inbound frames decoded by type
//! - `yapple_frames_rejected_total{reason}` - Inbound frames that failed validation
//! - `yapple_message_fanout` - Live connections per delivery (histogram)
//! - `yapple_send_failures_total{error}` - Per-connection send failures

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Inbound frames decoded, by frame type.
pub static FRAMES_RECEIVED: OnceLock<IntCounterVec> = OnceLock::new();

/// Inbound frames rejected by the codec, by error code.
pub static FRAMES_REJECTED: OnceLock<IntCounterVec> = OnceLock::new();

/// Deliveries requested, by kind (message/text).
pub static DELIVERIES: OnceLock<IntCounterVec> = OnceLock::new();

/// Encoded frames queued to a live connection.
pub static FRAMES_DELIVERED: OnceLock<IntCounter> = OnceLock::new();

/// Per-connection send failures, by error code.
pub static SEND_FAILURES: OnceLock<IntCounterVec> = OnceLock::new();

/// Deliveries whose recipient had no live connection.
pub static RECIPIENT_OFFLINE: OnceLock<IntCounter> = OnceLock::new();

/// Persistence failures swallowed by the fanout path.
pub static STORAGE_ERRORS: OnceLock<IntCounter> = OnceLock::new();

// ========================================================================
// Gauges (can increase/decrease)
// ========================================================================

/// Open WebSocket connections.
pub static OPEN_CONNECTIONS: OnceLock<IntGauge> = OnceLock::new();

/// Users with at least one registered connection.
pub static REGISTERED_USERS: OnceLock<IntGauge> = OnceLock::new();

/// Distinct connections present in the registry.
pub static REGISTERED_CONNECTIONS: OnceLock<IntGauge> = OnceLock::new();

// ========================================================================
// Histograms
// ========================================================================

/// Live connections targeted per delivery.
pub static MESSAGE_FANOUT: OnceLock<Histogram> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at startup before any metrics are recorded.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(FRAMES_RECEIVED, IntCounterVec::new(Opts::new("yapple_frames_total", "Inbound frames by type"), &["type"]));
    register!(FRAMES_REJECTED, IntCounterVec::new(Opts::new("yapple_frames_rejected_total", "Inbound frames rejected by validation"), &["reason"]));
    register!(DELIVERIES, IntCounterVec::new(Opts::new("yapple_deliveries_total", "Deliveries requested by kind"), &["kind"]));
    register!(FRAMES_DELIVERED, IntCounter::new("yapple_frames_delivered_total", "Frames queued to live connections"));
    register!(SEND_FAILURES, IntCounterVec::new(Opts::new("yapple_send_failures_total", "Per-connection send failures"), &["error"]));
    register!(RECIPIENT_OFFLINE, IntCounter::new("yapple_recipient_offline_total", "Deliveries with no live recipient connection"));
    register!(STORAGE_ERRORS, IntCounter::new("yapple_storage_errors_total", "Message persistence failures"));
    register!(OPEN_CONNECTIONS, IntGauge::new("yapple_open_connections", "Open WebSocket connections"));
    register!(REGISTERED_USERS, IntGauge::new("yapple_registered_users", "Users with a registered connection"));
    register!(REGISTERED_CONNECTIONS, IntGauge::new("yapple_registered_connections", "Connections present in the registry"));
    register!(MESSAGE_FANOUT, Histogram::with_opts(
        HistogramOpts::new("yapple_message_fanout", "Live connections per delivery")
            .buckets(vec![0.0, 1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0])));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions for relay metric updates
// ============================================================================

fn inc_counter(metric: &OnceLock<IntCounter>) {
    if let Some(c) = metric.get() {
        c.inc();
    }
}

fn inc_counter_vec(metric: &OnceLock<IntCounterVec>, label: &str) {
    if let Some(c) = metric.get() {
        c.with_label_values(&[label]).inc();
    }
}

/// Record a decoded inbound frame.
#[inline]
pub fn record_frame(kind: &str) {
    inc_counter_vec(&FRAMES_RECEIVED, kind);
}

/// Record a frame that failed validation.
#[inline]
pub fn record_rejected_frame(reason: &str) {
    inc_counter_vec(&FRAMES_REJECTED, reason);
}

/// Record a delivery request and how many live connections it targeted.
#[inline]
pub fn record_delivery(kind: &str, fanout: usize) {
    inc_counter_vec(&DELIVERIES, kind);
    if let Some(h) = MESSAGE_FANOUT.get() {
        h.observe(fanout as f64);
    }
    if fanout == 0 {
        inc_counter(&RECIPIENT_OFFLINE);
    }
}

/// Record one frame queued to a connection.
#[inline]
pub fn record_delivered() {
    inc_counter(&FRAMES_DELIVERED);
}

/// Record one failed per-connection send.
#[inline]
pub fn record_send_failure(error: &str) {
    inc_counter_vec(&SEND_FAILURES, error);
}

/// Record a swallowed persistence failure.
#[inline]
pub fn record_storage_error() {
    inc_counter(&STORAGE_ERRORS);
}

/// Track an accepted (`+1`) or finished (`-1`) connection.
#[inline]
pub fn adjust_open_connections(delta: i64) {
    if let Some(g) = OPEN_CONNECTIONS.get() {
        g.add(delta);
    }
}

/// Publish the registry's current size.
#[inline]
pub fn set_registry_size(users: usize, connections: usize) {
    if let Some(g) = REGISTERED_USERS.get() {
        g.set(users as i64);
    }
    if let Some(g) = REGISTERED_CONNECTIONS.get() {
        g.set(connections as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        init();

        record_frame("text");
        record_delivery("message", 2);
        record_send_failure("queue_full");

        let output = gather_metrics();
        assert!(output.contains("yapple_frames_total"));
        assert!(output.contains("yapple_message_fanout"));
        assert!(output.contains("yapple_send_failures_total"));
    }
}
