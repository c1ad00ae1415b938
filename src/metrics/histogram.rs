use std::sync::atomic::{AtomicU64, Ordering};

/// Upper edge of the 10 ms tier.
const FINE_MAX_MS: u64 = 5_000;
/// Upper edge of the 100 ms tier.
const MEDIUM_MAX_MS: u64 = 30_000;
/// Upper edge of the 1 s tier; anything at or above lands in overflow.
const COARSE_MAX_MS: u64 = 120_000;

const FINE_STEP_MS: u64 = 10;
const MEDIUM_STEP_MS: u64 = 100;
const COARSE_STEP_MS: u64 = 1_000;

const FINE_BUCKETS: usize = (FINE_MAX_MS / FINE_STEP_MS) as usize;
const MEDIUM_BUCKETS: usize = ((MEDIUM_MAX_MS - FINE_MAX_MS) / MEDIUM_STEP_MS) as usize;
const COARSE_BUCKETS: usize = ((COARSE_MAX_MS - MEDIUM_MAX_MS) / COARSE_STEP_MS) as usize;

const MEDIUM_OFFSET: usize = FINE_BUCKETS;
const COARSE_OFFSET: usize = MEDIUM_OFFSET + MEDIUM_BUCKETS;
const OVERFLOW_INDEX: usize = COARSE_OFFSET + COARSE_BUCKETS;

/// Bucket count including the overflow bucket.
pub const HISTOGRAM_BUCKETS: usize = OVERFLOW_INDEX + 1;

const PPM_SCALE: u64 = 1_000_000;

/// Fixed-size latency histogram with three resolution tiers.
///
/// Recording is a single relaxed increment, so any number of workers can
/// share one instance through `&self`.
#[derive(Debug)]
pub struct LatencyHistogram {
    buckets: Box<[AtomicU64]>,
    total: AtomicU64,
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyHistogram {
    #[must_use]
    pub fn new() -> Self {
        let buckets = (0..HISTOGRAM_BUCKETS)
            .map(|_| AtomicU64::new(0))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            buckets,
            total: AtomicU64::new(0),
        }
    }

    /// Record a latency in milliseconds. Negative values count as zero.
    pub fn record(&self, latency_ms: i64) {
        let clamped = u64::try_from(latency_ms).unwrap_or(0);
        self.record_ms(clamped);
    }

    pub fn record_ms(&self, latency_ms: u64) {
        if let Some(bucket) = self.buckets.get(bucket_index(latency_ms)) {
            bucket.fetch_add(1, Ordering::Relaxed);
        }
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Lower bound (ms) of the bucket holding the `ceil(p * n)`-th smallest
    /// observation, or `0` when nothing was recorded.
    #[must_use]
    pub fn percentile(&self, quantile: f64) -> u64 {
        let counts = self.bucket_counts();
        percentile_of(&counts, quantile)
    }

    /// Several percentiles computed over one copy of the buckets.
    #[must_use]
    pub fn percentiles<const N: usize>(&self, quantiles: [f64; N]) -> [u64; N] {
        let counts = self.bucket_counts();
        quantiles.map(|quantile| percentile_of(&counts, quantile))
    }

    fn bucket_counts(&self) -> Vec<u64> {
        self.buckets
            .iter()
            .map(|bucket| bucket.load(Ordering::Relaxed))
            .collect()
    }
}

/// Bucket that a latency falls into.
#[must_use]
pub const fn bucket_index(latency_ms: u64) -> usize {
    if latency_ms < FINE_MAX_MS {
        return (latency_ms / FINE_STEP_MS) as usize;
    }
    if latency_ms < MEDIUM_MAX_MS {
        let step = (latency_ms.saturating_sub(FINE_MAX_MS) / MEDIUM_STEP_MS) as usize;
        return MEDIUM_OFFSET.saturating_add(step);
    }
    if latency_ms < COARSE_MAX_MS {
        let step = (latency_ms.saturating_sub(MEDIUM_MAX_MS) / COARSE_STEP_MS) as usize;
        return COARSE_OFFSET.saturating_add(step);
    }
    OVERFLOW_INDEX
}

/// Inclusive lower edge of a bucket in milliseconds.
#[must_use]
pub const fn bucket_lower_bound_ms(index: usize) -> u64 {
    if index < MEDIUM_OFFSET {
        return (index as u64).saturating_mul(FINE_STEP_MS);
    }
    if index < COARSE_OFFSET {
        let step = index.saturating_sub(MEDIUM_OFFSET) as u64;
        return FINE_MAX_MS.saturating_add(step.saturating_mul(MEDIUM_STEP_MS));
    }
    if index < OVERFLOW_INDEX {
        let step = index.saturating_sub(COARSE_OFFSET) as u64;
        return MEDIUM_MAX_MS.saturating_add(step.saturating_mul(COARSE_STEP_MS));
    }
    COARSE_MAX_MS
}

fn percentile_of(counts: &[u64], quantile: f64) -> u64 {
    let total = counts
        .iter()
        .fold(0u64, |acc, count| acc.saturating_add(*count));
    if total == 0 {
        return 0;
    }
    let rank = rank_for(quantile, total);
    let mut cumulative = 0u64;
    for (index, count) in counts.iter().enumerate() {
        cumulative = cumulative.saturating_add(*count);
        if cumulative >= rank {
            return bucket_lower_bound_ms(index);
        }
    }
    bucket_lower_bound_ms(OVERFLOW_INDEX)
}

/// `ceil(quantile * total)` in integer parts-per-million, clamped to `1..=total`.
fn rank_for(quantile: f64, total: u64) -> u64 {
    let ppm = quantile_to_ppm(quantile);
    let scaled = u128::from(ppm).saturating_mul(u128::from(total));
    let ppm_scale = u128::from(PPM_SCALE);
    let rank = scaled
        .checked_div(ppm_scale)
        .unwrap_or(0)
        .saturating_add(u128::from(scaled.checked_rem(ppm_scale).unwrap_or(0) != 0));
    u64::try_from(rank).unwrap_or(total).clamp(1, total)
}

#[expect(
    clippy::float_arithmetic,
    reason = "quantile is converted once into integer parts-per-million"
)]
fn quantile_to_ppm(quantile: f64) -> u64 {
    if !quantile.is_finite() || quantile <= 0.0 {
        return 0;
    }
    if quantile >= 1.0 {
        return PPM_SCALE;
    }
    (quantile * PPM_SCALE as f64).round() as u64
}
