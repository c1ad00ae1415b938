use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RunId, TestRun};

/// Milliseconds assumed between two samples whose timestamps do not advance.
const FALLBACK_SAMPLE_GAP_MS: i64 = 1000;
const MS_PER_SEC: f64 = 1000.0;

/// Point-in-time view of a run's metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub total_requests: u64,
    pub success_count: u64,
    pub fail_count: u64,
    pub avg_latency_ms: f64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
    pub p50_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
    pub status_code_counts: BTreeMap<u16, u64>,
}

impl TestReport {
    /// Report for a run with no observations.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_requests == 0
    }

    /// Failed share of all requests, `0.0` without traffic.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "ratio of two counters is reported as a fraction"
    )]
    pub fn fail_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.fail_count as f64 / self.total_requests as f64
    }
}

/// One appended time-series point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSample {
    pub run_id: RunId,
    pub at: DateTime<Utc>,
    pub report: TestReport,
}

/// A run together with its live or final report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunView {
    pub run: TestRun,
    pub report: TestReport,
}

/// Graph-ready point derived from consecutive samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub at: DateTime<Utc>,
    pub total_requests: u64,
    pub success_count: u64,
    pub fail_count: u64,
    pub avg_latency_ms: f64,
    pub p50_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
    pub rps: f64,
    pub fail_rate: f64,
}

/// Turns raw samples into points with throughput and failure rate.
#[must_use]
pub fn time_series(samples: &[RunSample]) -> Vec<TimeSeriesPoint> {
    let mut points = Vec::with_capacity(samples.len());
    let mut prev: Option<&RunSample> = None;
    for sample in samples {
        let report = &sample.report;
        points.push(TimeSeriesPoint {
            at: sample.at,
            total_requests: report.total_requests,
            success_count: report.success_count,
            fail_count: report.fail_count,
            avg_latency_ms: report.avg_latency_ms,
            p50_ms: report.p50_ms,
            p95_ms: report.p95_ms,
            p99_ms: report.p99_ms,
            rps: prev.map_or(0.0, |prev| requests_per_sec(prev, sample)),
            fail_rate: report.fail_rate(),
        });
        prev = Some(sample);
    }
    points
}

#[expect(
    clippy::float_arithmetic,
    reason = "throughput is a rate over fractional seconds"
)]
fn requests_per_sec(prev: &RunSample, curr: &RunSample) -> f64 {
    let delta = curr
        .report
        .total_requests
        .saturating_sub(prev.report.total_requests);
    let mut gap_ms = curr.at.signed_duration_since(prev.at).num_milliseconds();
    if gap_ms <= 0 {
        gap_ms = FALLBACK_SAMPLE_GAP_MS;
    }
    delta as f64 / (gap_ms as f64 / MS_PER_SEC)
}
