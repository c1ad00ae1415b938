use super::*;
use crate::domain::RequestMetricEvent;
use crate::error::{AppError, AppResult};

const WRITER_THREADS: u64 = 8;
const EVENTS_PER_WRITER: u64 = 5_000;

fn histogram_with(latencies: &[i64]) -> LatencyHistogram {
    let histogram = LatencyHistogram::new();
    for latency in latencies {
        histogram.record(*latency);
    }
    histogram
}

#[test]
fn bucket_edges_follow_tiers() -> AppResult<()> {
    let cases = [
        (0u64, 0u64),
        (5, 0),
        (9, 0),
        (10, 10),
        (4_999, 4_990),
        (5_000, 5_000),
        (5_099, 5_000),
        (5_100, 5_100),
        (29_999, 29_900),
        (30_000, 30_000),
        (119_999, 119_000),
        (120_000, 120_000),
        (u64::MAX, 120_000),
    ];
    for (latency, expected) in cases {
        let lower = bucket_lower_bound_ms(bucket_index(latency));
        if lower != expected {
            return Err(AppError::validation(format!(
                "latency {} landed at {} instead of {}",
                latency, lower, expected
            )));
        }
    }
    if bucket_index(u64::MAX) != HISTOGRAM_BUCKETS.saturating_sub(1) {
        return Err(AppError::validation("overflow must be the last bucket"));
    }
    Ok(())
}

#[test]
fn median_of_small_latencies_is_first_bucket() -> AppResult<()> {
    let histogram = histogram_with(&[5, 5, 15, 25]);
    let p50 = histogram.percentile(0.5);
    if p50 != 0 {
        return Err(AppError::validation(format!("Expected p50 0, got {}", p50)));
    }
    let p100 = histogram.percentile(1.0);
    if p100 != 20 {
        return Err(AppError::validation(format!(
            "Expected p100 20, got {}",
            p100
        )));
    }
    Ok(())
}

#[test]
fn empty_histogram_reports_zero() -> AppResult<()> {
    let histogram = LatencyHistogram::new();
    if histogram.percentile(0.99) != 0 || histogram.total_count() != 0 {
        return Err(AppError::validation("empty histogram must report zero"));
    }
    Ok(())
}

#[test]
fn negative_latency_counts_as_zero() -> AppResult<()> {
    let histogram = histogram_with(&[-40]);
    if histogram.total_count() != 1 || histogram.percentile(1.0) != 0 {
        return Err(AppError::validation("negative latency must clamp to zero"));
    }
    Ok(())
}

#[test]
fn slow_latencies_fall_into_overflow() -> AppResult<()> {
    let histogram = histogram_with(&[500_000, 125_000]);
    let p50 = histogram.percentile(0.5);
    if p50 != 120_000 {
        return Err(AppError::validation(format!(
            "Expected overflow lower bound, got {}",
            p50
        )));
    }
    Ok(())
}

#[test]
fn percentile_is_monotonic_in_quantile() -> AppResult<()> {
    let latencies: Vec<i64> = (0..2_000i64)
        .map(|i| i.saturating_mul(73).checked_rem(131_000).unwrap_or(0))
        .collect();
    let histogram = histogram_with(&latencies);
    let mut previous = 0u64;
    for step in 1..=100u32 {
        let quantile = f64::from(step) / 100.0;
        let value = histogram.percentile(quantile);
        if value < previous {
            return Err(AppError::validation(format!(
                "percentile decreased at {}: {} < {}",
                quantile, value, previous
            )));
        }
        previous = value;
    }
    Ok(())
}

#[test]
fn p95_rank_is_exact_for_twenty_values() -> AppResult<()> {
    let latencies: Vec<i64> = (0..20i64).map(|i| i.saturating_mul(10)).collect();
    let histogram = histogram_with(&latencies);
    let p95 = histogram.percentile(0.95);
    if p95 != 180 {
        return Err(AppError::validation(format!(
            "Expected 19th value bucket (180), got {}",
            p95
        )));
    }
    Ok(())
}

#[test]
fn snapshot_of_fresh_aggregator_is_empty() -> AppResult<()> {
    let aggregator = MetricsAggregator::new();
    let report = aggregator.snapshot();
    if !report.is_empty()
        || report.min_latency_ms != 0
        || report.max_latency_ms != 0
        || !report.status_code_counts.is_empty()
    {
        return Err(AppError::validation(format!(
            "Expected empty report, got {:?}",
            report
        )));
    }
    Ok(())
}

#[test]
fn snapshot_summarizes_recorded_events() -> AppResult<()> {
    let aggregator = MetricsAggregator::new();
    aggregator.record(RequestMetricEvent::new(20, 200));
    aggregator.record(RequestMetricEvent::new(40, 200));
    aggregator.record(RequestMetricEvent::new(90, 503));
    aggregator.record(RequestMetricEvent::transport_failure(10));

    let report = aggregator.snapshot();
    if report.total_requests != 4 || report.success_count != 2 || report.fail_count != 2 {
        return Err(AppError::validation(format!(
            "Unexpected counters: {:?}",
            report
        )));
    }
    if report.min_latency_ms != 10 || report.max_latency_ms != 90 {
        return Err(AppError::validation(format!(
            "Unexpected min/max: {}/{}",
            report.min_latency_ms, report.max_latency_ms
        )));
    }
    if (report.avg_latency_ms - 40.0).abs() > f64::EPSILON {
        return Err(AppError::validation(format!(
            "Unexpected average: {}",
            report.avg_latency_ms
        )));
    }
    let ok = report.status_code_counts.get(&200).copied();
    let unavailable = report.status_code_counts.get(&503).copied();
    let transport = report.status_code_counts.get(&0).copied();
    if ok != Some(2) || unavailable != Some(1) || transport != Some(1) {
        return Err(AppError::validation(format!(
            "Unexpected status counts: {:?}",
            report.status_code_counts
        )));
    }
    Ok(())
}

#[test]
fn concurrent_writers_converge_to_exact_totals() -> AppResult<()> {
    let aggregator = MetricsAggregator::new();
    std::thread::scope(|scope| {
        for writer in 0..WRITER_THREADS {
            let aggregator = &aggregator;
            scope.spawn(move || {
                for i in 0..EVENTS_PER_WRITER {
                    let status = if i.checked_rem(10) == Some(0) { 500 } else { 200 };
                    let latency = writer.saturating_mul(100).saturating_add(i.checked_rem(50).unwrap_or(0));
                    aggregator.record(RequestMetricEvent::new(latency, status));
                }
            });
        }
    });

    let expected = WRITER_THREADS.saturating_mul(EVENTS_PER_WRITER);
    let report = aggregator.snapshot();
    if aggregator.total_count() != expected
        || report.total_requests != expected
        || aggregator.histogram().total_count() != expected
        || report.success_count.saturating_add(report.fail_count) != expected
    {
        return Err(AppError::validation(format!(
            "Expected {} events, got {:?}",
            expected, report
        )));
    }
    let status_total: u64 = report.status_code_counts.values().sum();
    if status_total != expected {
        return Err(AppError::validation(format!(
            "Status counts sum to {} instead of {}",
            status_total, expected
        )));
    }
    if report.min_latency_ms != 0 || report.max_latency_ms != 749 {
        return Err(AppError::validation(format!(
            "Unexpected min/max {}/{}",
            report.min_latency_ms, report.max_latency_ms
        )));
    }
    Ok(())
}

#[test]
fn live_snapshots_never_expose_unset_minimum() -> AppResult<()> {
    let aggregator = MetricsAggregator::new();
    let mut worst = None;
    std::thread::scope(|scope| {
        let writer = &aggregator;
        scope.spawn(move || {
            for i in 0..EVENTS_PER_WRITER {
                writer.record(RequestMetricEvent::new(i.checked_rem(50).unwrap_or(0).saturating_add(1), 200));
            }
        });
        while aggregator.total_count() < EVENTS_PER_WRITER {
            let report = aggregator.snapshot();
            if report.min_latency_ms > 50 {
                worst = Some(report);
                break;
            }
        }
    });

    if let Some(report) = worst {
        return Err(AppError::validation(format!(
            "Live snapshot reported min {} with {} requests",
            report.min_latency_ms, report.total_requests
        )));
    }
    Ok(())
}
