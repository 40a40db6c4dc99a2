//! Metrics and Error Reporter
//!
//! Running totals for the session plus a forwarding sink toward the external
//! analytics collaborator. The collaborator may be absent; forwarding into a
//! no-op sink is not an error. Totals are never reset during a session.

use std::time::Duration;

use serde::Serialize;

use crate::resolve::ImageRole;

/// External analytics collaborator.
pub trait AnalyticsSink {
    fn track(&mut self, event: serde_json::Value);
}

/// Sink for pages without an analytics collaborator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl AnalyticsSink for NullSink {
    fn track(&mut self, _event: serde_json::Value) {}
}

/// Emitted when a slot reaches `Loaded`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLoadedEvent<'a> {
    pub event: &'static str,
    pub src: &'a str,
    pub load_time_ms: u64,
    pub role: &'static str,
    pub optimized_flag: bool,
}

/// Emitted when a load attempt fails or an internal step misbehaves.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizerErrorEvent<'a> {
    pub event: &'static str,
    pub method: &'a str,
    pub message: &'a str,
}

/// Session-lifetime running totals.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    /// Slots ever registered.
    pub total_discovered: u64,
    /// Slots that reached `Loaded`.
    pub loaded: u64,
    /// Slots that reached `Errored`.
    pub errored: u64,
    /// Loaded slots whose candidate differed from the original reference.
    pub optimized: u64,
    /// Incremental mean over successful loads.
    pub average_load_time_ms: f64,
}

impl Metrics {
    /// Share of discovered slots that have loaded, as a percentage.
    pub fn loading_progress(&self) -> f64 {
        if self.total_discovered == 0 {
            return 0.0;
        }
        self.loaded as f64 / self.total_discovered as f64 * 100.0
    }

    /// Share of loaded slots that took a negotiated encoding, as a
    /// percentage.
    pub fn optimization_rate(&self) -> f64 {
        if self.loaded == 0 {
            return 0.0;
        }
        self.optimized as f64 / self.loaded as f64 * 100.0
    }
}

/// Accumulates totals and forwards structured events to the sink.
pub struct Reporter {
    metrics: Metrics,
    sink: Box<dyn AnalyticsSink>,
}

impl Reporter {
    pub fn new(sink: Box<dyn AnalyticsSink>) -> Self {
        Self {
            metrics: Metrics::default(),
            sink,
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn record_discovered(&mut self) {
        self.metrics.total_discovered += 1;
    }

    /// Terminal success: update totals and forward the load event.
    pub fn record_loaded(&mut self, src: &str, elapsed: Duration, role: ImageRole, optimized: bool) {
        self.metrics.loaded += 1;
        if optimized {
            self.metrics.optimized += 1;
        }
        let elapsed_ms = elapsed.as_millis() as u64;
        let loaded = self.metrics.loaded as f64;
        self.metrics.average_load_time_ms =
            (self.metrics.average_load_time_ms * (loaded - 1.0) + elapsed_ms as f64) / loaded;

        self.forward(serde_json::to_value(ImageLoadedEvent {
            event: "image_loaded",
            src,
            load_time_ms: elapsed_ms,
            role: role.as_str(),
            optimized_flag: optimized,
        }));
    }

    /// Terminal failure: count it and forward the error event.
    pub fn record_error(&mut self, method: &str, message: &str) {
        self.metrics.errored += 1;
        self.report_internal(method, message);
    }

    /// Non-terminal internal error: forward without touching totals.
    pub fn report_internal(&mut self, method: &str, message: &str) {
        self.forward(serde_json::to_value(OptimizerErrorEvent {
            event: "image_optimizer_error",
            method,
            message,
        }));
    }

    fn forward(&mut self, event: Result<serde_json::Value, serde_json::Error>) {
        match event {
            Ok(value) => self.sink.track(value),
            Err(err) => tracing::warn!("failed to serialize telemetry event: {err}"),
        }
    }
}
