use crate::error::{RelayError, Result};
use chrono::{FixedOffset, NaiveDate, TimeZone};
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Seconds subtracted from the alarm time so errors logged just before the
/// alarm fired are still picked up.
pub const LOOKBACK_SECS: i64 = 120;

/// `YYYY-MM-DDTHH:MM:SS.ffffff` followed by `±HH:MM`, `±HHMM` or `Z`.
const TIMESTAMP_PATTERN: &str = r"^([0-9]{4})-([0-9]{2})-([0-9]{2})T([0-9]{2}):([0-9]{2}):([0-9]{2})\.([0-9]{6})(?:(Z)|([+-])([0-9]{2}):?([0-9]{2}))$";

fn timestamp_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TIMESTAMP_PATTERN).expect("timestamp pattern compiles"))
}

/// Lower bound of a log query. The window is open-ended: no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_millis: i64,
}

impl TimeWindow {
    pub fn for_alarm(time: &str) -> Result<Self> {
        Ok(Self {
            start_millis: window_start(time, LOOKBACK_SECS)?,
        })
    }
}

/// Parses a microsecond-precision, offset-aware ISO-8601 timestamp into
/// milliseconds since the Unix epoch.
pub fn epoch_millis(iso: &str) -> Result<i64> {
    let invalid = |reason: &str| RelayError::InvalidTimestamp {
        value: iso.to_string(),
        reason: reason.to_string(),
    };

    let caps = timestamp_regex()
        .captures(iso)
        .ok_or_else(|| invalid("expected YYYY-MM-DDTHH:MM:SS.ffffff+HH:MM"))?;

    let field = |caps: &Captures, i: usize| -> u32 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };

    let year = caps[1].parse::<i32>().map_err(|_| invalid("bad year"))?;
    let naive = NaiveDate::from_ymd_opt(year, field(&caps, 2), field(&caps, 3))
        .ok_or_else(|| invalid("date out of range"))?
        .and_hms_micro_opt(
            field(&caps, 4),
            field(&caps, 5),
            field(&caps, 6),
            field(&caps, 7),
        )
        .ok_or_else(|| invalid("time of day out of range"))?;

    let offset_secs = if caps.get(8).is_some() {
        0
    } else {
        let sign = if &caps[9] == "-" { -1 } else { 1 };
        let hours = field(&caps, 10) as i32;
        let minutes = field(&caps, 11) as i32;
        if minutes >= 60 {
            return Err(invalid("offset minutes out of range"));
        }
        sign * (hours * 3600 + minutes * 60)
    };

    let offset = FixedOffset::east_opt(offset_secs).ok_or_else(|| invalid("offset out of range"))?;
    let parsed = offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| invalid("ambiguous local time"))?;

    Ok(parsed.timestamp_millis())
}

/// Start of the query window: the alarm instant minus `buffer_secs`.
pub fn window_start(iso: &str, buffer_secs: i64) -> Result<i64> {
    match epoch_millis(iso) {
        Ok(millis) => Ok(millis - buffer_secs * 1000),
        Err(e) => {
            tracing::error!("Failed to parse timestamp '{}': {}", iso, e);
            Err(e)
        }
    }
}
