use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::{RequestMetricEvent, TestReport};

use super::LatencyHistogram;

const P50: f64 = 0.50;
const P95: f64 = 0.95;
const P99: f64 = 0.99;

/// Running totals for one run, fed by every virtual-user worker.
///
/// Counters are independent atomics, so `snapshot` is not a transaction: a
/// report taken while workers are active can mix values from slightly
/// different instants. Once writers stop, the next snapshot is exact.
#[derive(Debug)]
pub struct MetricsAggregator {
    total: AtomicU64,
    success: AtomicU64,
    fail: AtomicU64,
    latency_sum_ms: AtomicU64,
    min_latency_ms: AtomicU64,
    max_latency_ms: AtomicU64,
    status_counts: RwLock<HashMap<u16, AtomicU64>>,
    histogram: LatencyHistogram,
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
            success: AtomicU64::new(0),
            fail: AtomicU64::new(0),
            latency_sum_ms: AtomicU64::new(0),
            min_latency_ms: AtomicU64::new(u64::MAX),
            max_latency_ms: AtomicU64::new(0),
            status_counts: RwLock::new(HashMap::new()),
            histogram: LatencyHistogram::new(),
        }
    }

    pub fn record(&self, event: RequestMetricEvent) {
        let latency = event.latency_ms;
        lower_to(&self.min_latency_ms, latency);
        raise_to(&self.max_latency_ms, latency);
        self.latency_sum_ms.fetch_add(latency, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);
        self.histogram.record_ms(latency);
        self.count_status(event.status_code);

        if event.error {
            self.fail.fetch_add(1, Ordering::Relaxed);
        } else {
            self.success.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    #[must_use]
    pub const fn histogram(&self) -> &LatencyHistogram {
        &self.histogram
    }

    #[must_use]
    pub fn snapshot(&self) -> TestReport {
        let total = self.total.load(Ordering::Relaxed);
        let success = self.success.load(Ordering::Relaxed);
        let fail = self.fail.load(Ordering::Relaxed);
        let sum = self.latency_sum_ms.load(Ordering::Relaxed);
        let (min, max) = if total == 0 {
            (0, 0)
        } else {
            // A writer may have bumped `total` before its min is visible.
            let min = self.min_latency_ms.load(Ordering::Relaxed);
            let max = self.max_latency_ms.load(Ordering::Relaxed);
            (if min == u64::MAX { 0 } else { min }, max)
        };
        let [p50, p95, p99] = self.histogram.percentiles([P50, P95, P99]);

        TestReport {
            total_requests: total,
            success_count: success,
            fail_count: fail,
            avg_latency_ms: average(sum, total),
            min_latency_ms: min,
            max_latency_ms: max,
            p50_ms: p50,
            p95_ms: p95,
            p99_ms: p99,
            status_code_counts: self.status_code_counts(),
        }
    }

    fn count_status(&self, status_code: u16) {
        if let Ok(counts) = self.status_counts.read()
            && let Some(counter) = counts.get(&status_code)
        {
            counter.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let mut counts = match self.status_counts.write() {
            Ok(counts) => counts,
            Err(poisoned) => poisoned.into_inner(),
        };
        counts
            .entry(status_code)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    fn status_code_counts(&self) -> BTreeMap<u16, u64> {
        let counts = match self.status_counts.read() {
            Ok(counts) => counts,
            Err(poisoned) => poisoned.into_inner(),
        };
        counts
            .iter()
            .map(|(code, counter)| (*code, counter.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Lowers `slot` to `value` if smaller. The plain load keeps the common
/// non-improving case free of read-modify-write traffic.
fn lower_to(slot: &AtomicU64, value: u64) {
    if value >= slot.load(Ordering::Relaxed) {
        return;
    }
    slot.fetch_min(value, Ordering::Relaxed);
}

fn raise_to(slot: &AtomicU64, value: u64) {
    if value <= slot.load(Ordering::Relaxed) {
        return;
    }
    slot.fetch_max(value, Ordering::Relaxed);
}

#[expect(
    clippy::float_arithmetic,
    reason = "average latency is reported with fractional milliseconds"
)]
fn average(sum: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    sum as f64 / total as f64
}
