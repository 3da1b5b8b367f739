//! Prometheus metrics infrastructure
//!
//! This module provides utilities for initializing Prometheus metrics
//! and recording settlement ledger activity.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Initialize the Prometheus metrics exporter
///
/// This starts an HTTP server on the specified port that exposes metrics
/// at the `/metrics` endpoint.
///
/// # Arguments
///
/// * `port` - Port to expose metrics on
///
/// # Example
///
/// ```ignore
/// observability::metrics::init_metrics(9090)?;
/// // Metrics available at http://localhost:9090/metrics
/// ```
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(%addr, "Metrics server listening");
    Ok(())
}

/// Settlement ledger metrics
///
/// Recording goes through the `metrics` facade, so it is a no-op until a
/// recorder such as the Prometheus exporter is installed.
///
/// # Metrics
///
/// * `settlement_operations_total{operation}` - Operations invoked
/// * `settlement_operation_errors_total{operation,kind}` - Operations that failed
/// * `settlement_operation_duration_seconds{operation}` - Operation latency
/// * `settlement_trades_created_total` - Sell offers recorded
/// * `settlement_trades_confirmed_total` - Trades settled
/// * `settlement_trades_cancelled_total{party}` - Offers cancelled, by buyer or seller
/// * `settlement_termsheet_rejections_total` - Trades rejected by the holder cap
#[derive(Debug, Clone, Default)]
pub struct LedgerMetrics;

impl LedgerMetrics {
    pub fn new() -> Self {
        Self
    }

    /// Record a completed operation
    ///
    /// # Arguments
    ///
    /// * `operation` - Operation name as it appears on the call surface
    /// * `duration` - How long the operation took
    /// * `error_kind` - Error category when the operation failed
    pub fn record_operation(
        &self,
        operation: &'static str,
        duration: Duration,
        error_kind: Option<&'static str>,
    ) {
        counter!("settlement_operations_total", "operation" => operation).increment(1);
        histogram!("settlement_operation_duration_seconds", "operation" => operation)
            .record(duration.as_secs_f64());
        if let Some(kind) = error_kind {
            counter!(
                "settlement_operation_errors_total",
                "operation" => operation,
                "kind" => kind
            )
            .increment(1);
        }
    }

    pub fn trade_created(&self) {
        counter!("settlement_trades_created_total").increment(1);
    }

    pub fn trade_confirmed(&self) {
        counter!("settlement_trades_confirmed_total").increment(1);
    }

    /// `party` is `buyer` or `seller`
    pub fn trade_cancelled(&self, party: &'static str) {
        counter!("settlement_trades_cancelled_total", "party" => party).increment(1);
    }

    pub fn termsheet_rejected(&self) {
        counter!("settlement_termsheet_rejections_total").increment(1);
    }
}

/// Operation metrics guard that automatically records duration on drop
///
/// # Example
///
/// ```ignore
/// let metrics = LedgerMetrics::new();
/// {
///     let mut guard = OperationMetricsGuard::new(&metrics, "sell");
///     if let Err(e) = do_sell() {
///         guard.set_error("validation");
///     }
/// } // Duration and outcome recorded when guard is dropped
/// ```
pub struct OperationMetricsGuard<'a> {
    metrics: &'a LedgerMetrics,
    operation: &'static str,
    start: Instant,
    error_kind: Option<&'static str>,
}

impl<'a> OperationMetricsGuard<'a> {
    pub fn new(metrics: &'a LedgerMetrics, operation: &'static str) -> Self {
        Self {
            metrics,
            operation,
            start: Instant::now(),
            error_kind: None,
        }
    }

    /// Mark the operation as failed (call before drop)
    pub fn set_error(&mut self, kind: &'static str) {
        self.error_kind = Some(kind);
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl Drop for OperationMetricsGuard<'_> {
    fn drop(&mut self) {
        self.metrics
            .record_operation(self.operation, self.start.elapsed(), self.error_kind);
    }
}
