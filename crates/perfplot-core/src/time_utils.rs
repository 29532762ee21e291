use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{PerfPlotError, Result};

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Resolve a `--timezone` value: `"auto"` means the system timezone, and an
/// unrecognised name falls back to UTC with a warning.
pub fn resolve_timezone(tz_name: &str) -> Tz {
    let name = if tz_name.eq_ignore_ascii_case("auto") {
        get_system_timezone()
    } else {
        tz_name.to_string()
    };

    name.parse::<Tz>().unwrap_or_else(|_| {
        warn!(
            "TimestampConverter: unrecognised timezone \"{}\", falling back to UTC",
            name
        );
        Tz::UTC
    })
}

// ── TimestampConverter ────────────────────────────────────────────────────────

/// Date-time layouts written by the monitor script, most common first.
const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Date-only layouts; the time is taken as midnight.
const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

/// Turns a process time axis into elapsed minutes.
///
/// Timestamps without an offset are interpreted in the converter's timezone,
/// so that daylight-saving transitions inside a log are accounted for.
#[derive(Debug, Clone, Copy)]
pub struct TimestampConverter {
    tz: Tz,
}

impl Default for TimestampConverter {
    fn default() -> Self {
        Self { tz: Tz::UTC }
    }
}

impl TimestampConverter {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Parse one timestamp into an absolute instant.
    ///
    /// Accepts RFC 3339, US-style `M/D/YYYY` with 12- or 24-hour clocks, ISO
    /// date-times, and bare dates (midnight). Ambiguous local times resolve
    /// to the earlier instant.
    pub fn parse(&self, s: &str) -> Result<DateTime<Utc>> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PerfPlotError::TimestampParse(s.to_string()));
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt.with_timezone(&Utc));
        }

        let naive = DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
            .or_else(|| {
                DATE_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
            .ok_or_else(|| PerfPlotError::TimestampParse(s.to_string()))?;

        match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
            LocalResult::None => Err(PerfPlotError::TimestampParse(format!(
                "{} (does not exist in {})",
                s, self.tz
            ))),
        }
    }

    /// Minutes elapsed between each timestamp and the first one.
    ///
    /// The output has the same length as the input and starts with `0.0`.
    /// A single unparsable timestamp fails the whole conversion.
    pub fn to_elapsed_minutes<S: AsRef<str>>(&self, timestamps: &[S]) -> Result<Vec<f64>> {
        let Some(first) = timestamps.first() else {
            return Ok(Vec::new());
        };
        let start = self.parse(first.as_ref())?;

        timestamps
            .iter()
            .map(|ts| {
                let instant = self.parse(ts.as_ref())?;
                let millis = (instant - start).num_milliseconds() as f64;
                Ok(millis / 60_000.0)
            })
            .collect()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
