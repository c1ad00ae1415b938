use std::time::Duration;

use super::types::{PositiveU32, PositiveU64};
use crate::error::{AppError, AppResult, ValidationError};

const SECS_PER_MIN: u64 = 60;
const SECS_PER_HOUR: u64 = 3_600;

pub(super) fn parse_positive_u64(s: &str) -> AppResult<PositiveU64> {
    s.parse::<PositiveU64>().map_err(AppError::from)
}

pub(super) fn parse_positive_u32(s: &str) -> AppResult<PositiveU32> {
    s.parse::<PositiveU32>().map_err(AppError::from)
}

pub(crate) fn parse_port(s: &str) -> AppResult<u16> {
    let port: u16 = s.trim().parse().map_err(|err| {
        AppError::validation(ValidationError::InvalidPort {
            value: s.to_owned(),
            source: err,
        })
    })?;
    if port == 0 {
        return Err(AppError::validation(ValidationError::ValueTooSmall { min: 1 }));
    }
    Ok(port)
}

/// Whole seconds from `30`, `30s`, `2m`, or `1h`; sub-second values are
/// refused because a run lasts at least one second.
pub(crate) fn parse_duration_secs(s: &str) -> AppResult<Duration> {
    let value = s.trim();
    if value.is_empty() {
        return Err(AppError::validation(ValidationError::DurationEmpty));
    }

    let digits_len = value.chars().take_while(char::is_ascii_digit).count();
    if digits_len == 0 {
        return Err(AppError::validation(
            ValidationError::InvalidDurationFormat {
                value: value.to_owned(),
            },
        ));
    }
    let (num_part, unit_part) = value.split_at(digits_len);
    let number: u64 = num_part.parse().map_err(|err| {
        AppError::validation(ValidationError::InvalidDurationNumber {
            value: value.to_owned(),
            source: err,
        })
    })?;

    let multiplier = match unit_part {
        "" | "s" => 1,
        "m" => SECS_PER_MIN,
        "h" => SECS_PER_HOUR,
        unit => {
            return Err(AppError::validation(ValidationError::InvalidDurationUnit {
                unit: unit.to_owned(),
            }));
        }
    };
    let secs = number
        .checked_mul(multiplier)
        .ok_or_else(|| AppError::validation(ValidationError::DurationOverflow))?;
    if secs == 0 {
        return Err(AppError::validation(ValidationError::DurationZero));
    }

    Ok(Duration::from_secs(secs))
}
