//! Human-readable rendering of run progress, final reports, and target
//! decisions.

use crate::domain::{RunView, TestReport, TimeSeriesPoint};
use crate::target::ValidationResult;

/// Basis points per whole, for two-decimal percentages without floats.
const BASIS_POINTS: u64 = 10_000;
const PERCENT_DIVISOR: u64 = 100;

/// Failure share in hundredths of a percent.
#[must_use]
pub fn fail_rate_x100(report: &TestReport) -> u64 {
    if report.total_requests == 0 {
        return 0;
    }
    let scaled = u128::from(report.fail_count)
        .saturating_mul(u128::from(BASIS_POINTS))
        .checked_div(u128::from(report.total_requests))
        .unwrap_or(0);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

fn format_percent_x100(value: u64) -> String {
    format!(
        "{}.{:02}%",
        value / PERCENT_DIVISOR,
        value % PERCENT_DIVISOR
    )
}

/// One line per sample while a run is in progress.
#[must_use]
pub fn progress_line(point: &TimeSeriesPoint) -> String {
    format!(
        "[{}] total={} ok={} fail={} rps={:.1} p50={}ms p95={}ms p99={}ms",
        point.at.format("%H:%M:%S"),
        point.total_requests,
        point.success_count,
        point.fail_count,
        point.rps,
        point.p50_ms,
        point.p95_ms,
        point.p99_ms
    )
}

#[must_use]
pub fn summary_lines(view: &RunView) -> Vec<String> {
    let run = &view.run;
    let report = &view.report;
    let mut lines = vec![
        format!("Run: {}", run.run_id),
        format!("Status: {}", run.status()),
        format!("Started: {}", run.started_at.to_rfc3339()),
    ];
    if let Some(ended_at) = run.ended_at() {
        lines.push(format!("Ended: {}", ended_at.to_rfc3339()));
        let elapsed_ms = ended_at
            .signed_duration_since(run.started_at)
            .num_milliseconds()
            .max(0);
        lines.push(format!("Elapsed: {}ms", elapsed_ms));
    }
    lines.push(format!("Total Requests: {}", report.total_requests));
    lines.push(format!("Successful: {}", report.success_count));
    lines.push(format!(
        "Failed: {} ({})",
        report.fail_count,
        format_percent_x100(fail_rate_x100(report))
    ));
    lines.push(format!("Avg Latency: {:.2}ms", report.avg_latency_ms));
    lines.push(format!(
        "Min/Max Latency: {}ms / {}ms",
        report.min_latency_ms, report.max_latency_ms
    ));
    lines.push(format!(
        "P50/P95/P99 Latency: {}ms / {}ms / {}ms",
        report.p50_ms, report.p95_ms, report.p99_ms
    ));
    if !report.status_code_counts.is_empty() {
        let codes: Vec<String> = report
            .status_code_counts
            .iter()
            .map(|(code, count)| format!("{}={}", status_label(*code), count))
            .collect();
        lines.push(format!("Status Codes: {}", codes.join(", ")));
    }
    lines
}

fn status_label(code: u16) -> String {
    if code == 0 {
        "transport".to_owned()
    } else {
        code.to_string()
    }
}

#[must_use]
pub fn validation_line(url: &str, result: &ValidationResult) -> String {
    match result.reason {
        None => format!("ALLOWED {} ({})", url, result.detail),
        Some(reason) => format!("BLOCKED {} {} ({})", url, reason, result.detail),
    }
}
