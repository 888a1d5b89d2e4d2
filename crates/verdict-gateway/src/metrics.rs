//! In-process request metrics over a bounded window of recent requests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

const MAX_RECORDS: usize = 1000;

struct Record {
    endpoint: &'static str,
    duration_ms: u64,
    success: bool,
}

/// Rolling request metrics, bounded to the last 1000 records.
pub struct Metrics {
    records: Mutex<VecDeque<Record>>,
}

#[derive(Debug, Serialize)]
pub struct EndpointStats {
    pub requests: usize,
    pub errors: usize,
    pub avg_execution_time_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub total_errors: usize,
    pub avg_execution_time_ms: f64,
    pub endpoints: HashMap<String, EndpointStats>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(MAX_RECORDS)),
        }
    }

    pub fn record(&self, endpoint: &'static str, duration: Duration, success: bool) {
        let mut records = self.lock();
        if records.len() == MAX_RECORDS {
            records.pop_front();
        }
        records.push_back(Record {
            endpoint,
            duration_ms: duration.as_millis() as u64,
            success,
        });
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let records = self.lock();
        let total_requests = records.len();
        let total_errors = records.iter().filter(|r| !r.success).count();
        let avg_execution_time_ms = if total_requests == 0 {
            0.0
        } else {
            records.iter().map(|r| r.duration_ms as f64).sum::<f64>() / total_requests as f64
        };

        let mut endpoints: HashMap<String, EndpointStats> = HashMap::new();
        for record in records.iter() {
            let stats = endpoints
                .entry(record.endpoint.to_string())
                .or_insert(EndpointStats {
                    requests: 0,
                    errors: 0,
                    avg_execution_time_ms: 0.0,
                });
            // Accumulate the sum first; divide once per endpoint below.
            stats.requests += 1;
            if !record.success {
                stats.errors += 1;
            }
            stats.avg_execution_time_ms += record.duration_ms as f64;
        }
        for stats in endpoints.values_mut() {
            stats.avg_execution_time_ms /= stats.requests as f64;
        }

        MetricsSnapshot {
            total_requests,
            total_errors,
            avg_execution_time_ms,
            endpoints,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Record>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot() {
        let snapshot = Metrics::new().snapshot();
        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.total_errors, 0);
        assert_eq!(snapshot.avg_execution_time_ms, 0.0);
        assert!(snapshot.endpoints.is_empty());
    }

    #[test]
    fn test_per_endpoint_aggregation() {
        let metrics = Metrics::new();
        metrics.record("propose_action", Duration::from_millis(100), true);
        metrics.record("propose_action", Duration::from_millis(300), false);
        metrics.record("approve", Duration::from_millis(10), true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.total_errors, 1);

        let propose = &snapshot.endpoints["propose_action"];
        assert_eq!(propose.requests, 2);
        assert_eq!(propose.errors, 1);
        assert_eq!(propose.avg_execution_time_ms, 200.0);
        assert_eq!(snapshot.endpoints["approve"].requests, 1);
    }

    #[test]
    fn test_window_bounded() {
        let metrics = Metrics::new();
        for _ in 0..(MAX_RECORDS + 50) {
            metrics.record("propose_action", Duration::from_millis(1), true);
        }
        assert_eq!(metrics.snapshot().total_requests, MAX_RECORDS);
    }
}
