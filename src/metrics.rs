//! Request metrics
//!
//! Owns the Prometheus registry for the process. Every routed request is
//! counted, timed and tracked as in-flight through [`HttpMetrics::track`];
//! the metrics handler renders the registry in text exposition format.

use std::time::Instant;

use hyper::{Method, StatusCode};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};

pub struct HttpMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
    in_flight: IntGaugeVec,
}

impl HttpMetrics {
    /// Create a registry with the request metrics registered under `prefix`
    /// and, on Linux, the standard process collector.
    pub fn new(prefix: &str) -> prometheus::Result<Self> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests served").namespace(prefix),
            &["handler", "method", "status"],
        )?;
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request handling latency in seconds",
            )
            .namespace(prefix),
            &["handler", "method"],
        )?;
        let in_flight = IntGaugeVec::new(
            Opts::new("http_requests_in_flight", "HTTP requests currently being handled")
                .namespace(prefix),
            &["handler"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;
        registry.register(Box::new(in_flight.clone()))?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration,
            in_flight,
        })
    }

    /// Mark a request as started; the returned guard records it on
    /// [`RequestTimer::finish`]
    pub fn track(&self, handler: &str, method: &Method) -> RequestTimer<'_> {
        self.in_flight.with_label_values(&[handler]).inc();
        RequestTimer {
            metrics: self,
            handler: handler.to_string(),
            method: method.as_str().to_string(),
            start: Instant::now(),
            finished: false,
        }
    }

    /// Encode the current snapshot, returning `(body, content_type)`
    pub fn render(&self) -> prometheus::Result<(Vec<u8>, String)> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok((buffer, encoder.format_type().to_string()))
    }

    #[cfg(test)]
    pub fn request_count(&self, handler: &str, method: &str, status: &str) -> u64 {
        self.requests_total
            .with_label_values(&[handler, method, status])
            .get()
    }
}

/// In-flight request; the gauge is released even if `finish` is never called
pub struct RequestTimer<'a> {
    metrics: &'a HttpMetrics,
    handler: String,
    method: String,
    start: Instant,
    finished: bool,
}

impl RequestTimer<'_> {
    pub fn finish(mut self, status: StatusCode) {
        let labels = [self.handler.as_str(), self.method.as_str()];
        self.metrics
            .request_duration
            .with_label_values(&labels)
            .observe(self.start.elapsed().as_secs_f64());
        self.metrics
            .requests_total
            .with_label_values(&[self.handler.as_str(), self.method.as_str(), status.as_str()])
            .inc();
        self.release();
    }

    fn release(&mut self) {
        if !self.finished {
            self.finished = true;
            self.metrics
                .in_flight
                .with_label_values(&[self.handler.as_str()])
                .dec();
        }
    }
}

impl Drop for RequestTimer<'_> {
    fn drop(&mut self) {
        self.release();
    }
}
