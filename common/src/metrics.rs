//! Request tallies and response times for one process.
//!
//! Counters live in a registry owned by the [`Metrics`] value, so every
//! service collection (and every test) gets its own set.

use std::{collections::BTreeMap, time::Duration};

use prometheus::{core::Collector, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

pub struct Metrics {
    registry: Registry,
    requests: IntCounter,
    successes: IntCounter,
    failures: IntCounter,
    response_time: Histogram,
    errors: IntCounterVec,
    started: std::time::Instant,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsDto {
    pub total_requests: u64,
    pub successful_generations: u64,
    pub failed_generations: u64,
    pub success_rate: String,
    pub average_response_time: String,
    pub uptime_seconds: u64,
    pub uptime_formatted: String,
    pub errors: BTreeMap<String, u64>,
}

fn format_uptime(seconds: u64) -> String {
    format!("{}h {}m {}s", seconds / 3600, (seconds % 3600) / 60, seconds % 60)
}

impl Metrics {
    pub fn new() -> Result<Self, &'static str> {
        let registry = Registry::new();
        let requests = IntCounter::new("requests_total", "Requests received").map_err(|_| "invalid metric")?;
        let successes = IntCounter::new("generations_successful_total", "Requests that produced an artifact").map_err(|_| "invalid metric")?;
        let failures = IntCounter::new("generations_failed_total", "Requests that failed").map_err(|_| "invalid metric")?;
        let response_time = Histogram::with_opts(
            HistogramOpts::new("response_time_seconds", "Time to answer a request").buckets(vec![0.05, 0.25, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 180.0]),
        )
        .map_err(|_| "invalid metric")?;
        let errors = IntCounterVec::new(Opts::new("errors_total", "Errors by code"), &["code"]).map_err(|_| "invalid metric")?;

        registry.register(Box::new(requests.clone())).map_err(|_| "could not register metric")?;
        registry.register(Box::new(successes.clone())).map_err(|_| "could not register metric")?;
        registry.register(Box::new(failures.clone())).map_err(|_| "could not register metric")?;
        registry.register(Box::new(response_time.clone())).map_err(|_| "could not register metric")?;
        registry.register(Box::new(errors.clone())).map_err(|_| "could not register metric")?;

        Ok(Metrics {
            registry,
            requests,
            successes,
            failures,
            response_time,
            errors,
            started: std::time::Instant::now(),
        })
    }

    pub fn record_request(&self) {
        self.requests.inc();
    }

    pub fn record_response_time(&self, duration: Duration, success: bool) {
        self.response_time.observe(duration.as_secs_f64());
        if success {
            self.successes.inc();
        } else {
            self.failures.inc();
        }
    }

    pub fn record_error(&self, code: &str) {
        self.errors.with_label_values(&[code]).inc();
    }

    fn error_counts(&self) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for family in self.errors.collect() {
            for metric in family.get_metric() {
                if let Some(label) = metric.get_label().iter().find(|label| label.get_name() == "code") {
                    counts.insert(label.get_value().to_string(), metric.get_counter().get_value() as u64);
                }
            }
        }
        counts
    }

    pub fn snapshot(&self) -> MetricsDto {
        let successful = self.successes.get();
        let failed = self.failures.get();
        let samples = self.response_time.get_sample_count();
        let uptime = self.started.elapsed().as_secs();
        MetricsDto {
            total_requests: self.requests.get(),
            successful_generations: successful,
            failed_generations: failed,
            success_rate: match successful + failed {
                0 => "N/A".to_string(),
                total => format!("{:.1}%", successful as f64 / total as f64 * 100.0),
            },
            average_response_time: match samples {
                0 => "N/A".to_string(),
                samples => format!("{:.3}s", self.response_time.get_sample_sum() / samples as f64),
            },
            uptime_seconds: uptime,
            uptime_formatted: format_uptime(uptime),
            errors: self.error_counts(),
        }
    }

    /// Prometheus text exposition of every counter.
    pub fn encode(&self) -> Result<String, &'static str> {
        let mut buffer = vec![];
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer).map_err(|_| "could not encode metrics")?;
        String::from_utf8(buffer).map_err(|_| "metrics are not utf8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn empty_snapshot() {
        let snapshot = Metrics::new().unwrap().snapshot();
        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.success_rate, "N/A");
        assert_eq!(snapshot.average_response_time, "N/A");
        assert!(snapshot.errors.is_empty());
    }

    #[test]
    fn rates_and_averages() {
        let metrics = Metrics::new().unwrap();
        metrics.record_request();
        metrics.record_request();
        metrics.record_response_time(Duration::from_millis(1000), true);
        metrics.record_response_time(Duration::from_millis(3000), false);
        metrics.record_error("TIMED_OUT");
        metrics.record_error("TIMED_OUT");
        metrics.record_error("AUTH_FAILED");

        let snapshot = metrics.snapshot();

        assert_eq!(snapshot.total_requests, 2);
        assert_eq!(snapshot.success_rate, "50.0%");
        assert_eq!(snapshot.average_response_time, "2.000s");
        assert_eq!(snapshot.errors.get("TIMED_OUT"), Some(&2));
        assert_eq!(snapshot.errors.get("AUTH_FAILED"), Some(&1));
        assert!(metrics.encode().unwrap().contains("requests_total 2"));
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let metrics = metrics.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        metrics.record_request();
                        metrics.record_response_time(Duration::from_millis(1), true);
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, 8000);
        assert_eq!(snapshot.successful_generations, 8000);
    }

    #[test]
    fn uptime_format() {
        assert_eq!(format_uptime(3723), "1h 2m 3s");
        assert_eq!(format_uptime(59), "0h 0m 59s");
    }
}
