//! Metrics for backend queries
//!
//! - `ragchat_queries_total`: Counter of admitted queries
//! - `ragchat_queries_in_flight`: Gauge of queries awaiting a response
//! - `ragchat_query_duration_seconds`: Histogram of response times by outcome
//! - `ragchat_query_errors_total`: Counter of failed queries by error kind
//!
//! Nothing is exported unless the binary installs a recorder; without one
//! the macros are no-ops.

use crate::error::BackendError;
use metrics::{decrement_gauge, histogram, increment_counter, increment_gauge};
use std::time::{Duration, Instant};

/// Metrics tracker for one in-flight query
#[derive(Debug)]
pub struct QueryMetrics {
    start: Instant,
    recorded: bool,
}

impl QueryMetrics {
    /// Starts tracking a query and bumps the in-flight gauge
    ///
    /// # Examples
    ///
    /// ```
    /// use ragchat::conversation::metrics::QueryMetrics;
    /// use std::time::Duration;
    ///
    /// let metrics = QueryMetrics::start();
    /// metrics.record_success(Duration::from_millis(420));
    /// ```
    pub fn start() -> Self {
        increment_counter!("ragchat_queries_total");
        increment_gauge!("ragchat_queries_in_flight", 1.0);

        Self {
            start: Instant::now(),
            recorded: false,
        }
    }

    /// Records a completed query
    pub fn record_success(mut self, elapsed: Duration) {
        self.recorded = true;
        histogram!(
            "ragchat_query_duration_seconds",
            elapsed.as_secs_f64(),
            "outcome" => "success"
        );
        decrement_gauge!("ragchat_queries_in_flight", 1.0);
    }

    /// Records a failed query
    pub fn record_failure(mut self, error: &BackendError, elapsed: Duration) {
        self.recorded = true;
        histogram!(
            "ragchat_query_duration_seconds",
            elapsed.as_secs_f64(),
            "outcome" => "failure"
        );
        increment_counter!("ragchat_query_errors_total", "kind" => error.kind());
        decrement_gauge!("ragchat_queries_in_flight", 1.0);
    }

    /// Time since the query was admitted
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for QueryMetrics {
    // An abandoned query still leaves the in-flight gauge
    fn drop(&mut self) {
        if !self.recorded {
            decrement_gauge!("ragchat_queries_in_flight", 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_success_without_recorder() {
        let metrics = QueryMetrics::start();
        metrics.record_success(Duration::from_millis(10));
    }

    #[test]
    fn test_record_failure_without_recorder() {
        let metrics = QueryMetrics::start();
        metrics.record_failure(
            &BackendError::Status {
                status: 500,
                body: String::new(),
            },
            Duration::from_millis(10),
        );
    }

    #[test]
    fn test_drop_without_record() {
        let metrics = QueryMetrics::start();
        assert!(metrics.elapsed() < Duration::from_secs(60));
        drop(metrics);
    }
}
