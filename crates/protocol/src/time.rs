use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Unix timestamp of the J2K epoch, 2000-01-01 12:00:00 UTC.
pub const J2K_UNIX_OFFSET: i64 = 946_728_000;

const TIME_STRING_FORMAT: &str = "%Y%m%d%H%M%S%3f";

/// Convert J2K seconds to a UTC date, rounded to the millisecond.
pub fn j2k_to_datetime(j2k: f64) -> Option<DateTime<Utc>> {
    if !j2k.is_finite() {
        return None;
    }
    let millis = (j2k * 1000.0).round();
    if millis.abs() > i64::MAX as f64 / 2.0 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64 + J2K_UNIX_OFFSET * 1000)
}

pub fn datetime_to_j2k(dt: &DateTime<Utc>) -> f64 {
    (dt.timestamp_millis() - J2K_UNIX_OFFSET * 1000) as f64 / 1000.0
}

/// Format J2K seconds as the `yyyyMMddHHmmssSSS` string plot requests expect.
pub fn format_time_string(j2k: f64) -> Result<String, ProtocolError> {
    let dt = j2k_to_datetime(j2k).ok_or(ProtocolError::TimeOutOfRange(j2k))?;
    Ok(dt.format(TIME_STRING_FORMAT).to_string())
}

/// Inverse of [`format_time_string`].
pub fn parse_time_string(s: &str) -> Result<f64, ProtocolError> {
    let naive = NaiveDateTime::parse_from_str(s, TIME_STRING_FORMAT)
        .map_err(|_| ProtocolError::MalformedTimeString(s.to_string()))?;
    Ok(datetime_to_j2k(&naive.and_utc()))
}

/// An absolute `[start, end]` range in J2K seconds. Always `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: f64,
    end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Result<Self, ProtocolError> {
        // Written as a negated `<=` so NaN bounds are rejected too.
        if !(start <= end) {
            return Err(ProtocolError::InvertedWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window of `duration_minutes` centered on `time`: half before, half after.
    /// A negative or NaN duration is an inverted window.
    pub fn centered(time: f64, duration_minutes: f64) -> Result<Self, ProtocolError> {
        let half = duration_minutes * 30.0;
        Self::new(time - half, time + half)
    }

    /// Window between two picked times, in whichever order they were picked.
    pub fn spanning(a: f64, b: f64) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }

    /// `(start, end)` as request time strings.
    pub fn to_time_strings(&self) -> Result<(String, String), ProtocolError> {
        Ok((format_time_string(self.start)?, format_time_string(self.end)?))
    }
}
