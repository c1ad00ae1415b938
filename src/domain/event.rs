/// Outcome of one executed request.
///
/// Status code `0` marks a transport failure (connect error, timeout) and is
/// always counted as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestMetricEvent {
    pub latency_ms: u64,
    pub status_code: u16,
    pub error: bool,
}

impl RequestMetricEvent {
    /// First status code counted as a failure.
    pub const ERROR_STATUS_FLOOR: u16 = 400;
    pub const TRANSPORT_FAILURE: u16 = 0;

    #[must_use]
    pub const fn new(latency_ms: u64, status_code: u16) -> Self {
        Self {
            latency_ms,
            status_code,
            error: status_code >= Self::ERROR_STATUS_FLOOR
                || status_code == Self::TRANSPORT_FAILURE,
        }
    }

    #[must_use]
    pub const fn transport_failure(latency_ms: u64) -> Self {
        Self::new(latency_ms, Self::TRANSPORT_FAILURE)
    }
}
