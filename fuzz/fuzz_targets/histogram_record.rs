#![no_main]

use libfuzzer_sys::fuzz_target;
use loadrun::metrics::{HISTOGRAM_BUCKETS, LatencyHistogram, bucket_index, bucket_lower_bound_ms};

fuzz_target!(|data: &[u8]| {
    let histogram = LatencyHistogram::new();
    let mut recorded = 0u64;
    for chunk in data.chunks_exact(8).take(256) {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(chunk);
        let value = i64::from_le_bytes(bytes);
        histogram.record(value);
        recorded = recorded.saturating_add(1);

        let clamped = u64::try_from(value).unwrap_or(0);
        let index = bucket_index(clamped);
        debug_assert!(index < HISTOGRAM_BUCKETS);
        debug_assert!(bucket_lower_bound_ms(index) <= clamped);
    }
    debug_assert_eq!(histogram.total_count(), recorded);

    let [p50, p95, p99] = histogram.percentiles([0.5, 0.95, 0.99]);
    debug_assert!(p50 <= p95 && p95 <= p99);
});
