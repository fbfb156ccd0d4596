//! Schedule string parsing
//!
//! Accepts relative offsets understood by `humantime` ("30m", "2h 15m",
//! "in 3d") and absolute timestamps (RFC 3339 or `YYYY-MM-DD HH:MM` in UTC).

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::error::{Result, StudioError};

/// Posts cannot be scheduled further ahead than this
const MAX_SCHEDULE_AHEAD_DAYS: i64 = 365;

/// Parse a schedule string relative to `now`
///
/// # Errors
///
/// Returns `InvalidInput` if the string cannot be parsed, resolves to a time
/// that is not in the future, or lies more than a year ahead.
pub fn parse_schedule(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return Err(StudioError::InvalidInput(
            "Schedule string cannot be empty".to_string(),
        ));
    }

    let at = match parse_offset(input) {
        Some(offset) => now + offset?,
        None => parse_absolute(input)?,
    };

    if at <= now {
        return Err(StudioError::InvalidInput(format!(
            "Scheduled time {} is not in the future",
            at.to_rfc3339()
        )));
    }

    if at - now > Duration::days(MAX_SCHEDULE_AHEAD_DAYS) {
        return Err(StudioError::InvalidInput(format!(
            "Posts can be scheduled at most {} days ahead",
            MAX_SCHEDULE_AHEAD_DAYS
        )));
    }

    Ok(at)
}

/// `None` when the input is not a duration at all
fn parse_offset(input: &str) -> Option<Result<Duration>> {
    let stripped = input.strip_prefix("in ").unwrap_or(input).trim();
    let std_duration = humantime::parse_duration(stripped).ok()?;

    Some(
        Duration::from_std(std_duration)
            .map_err(|_| StudioError::InvalidInput("Duration out of range".to_string())),
    )
}

fn parse_absolute(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M") {
        return Ok(naive.and_utc());
    }

    Err(StudioError::InvalidInput(format!(
        "Could not parse schedule string: {}",
        input
    )))
}
