use chrono::{DateTime, Datelike, Duration, SecondsFormat, TimeZone, Utc};

use crate::config::RangeParams;
use crate::error::{AppError, Result};
use verdant_core::TimeRange;

pub const DEFAULT_RANGE: &str = "last30days";

pub fn resolve_range(params: &RangeParams) -> Result<TimeRange> {
    resolve_range_at(params, Utc::now())
}

/// Resolves presets against `now`. Windows are half-open and day presets use
/// UTC calendar days, matching the daily buckets.
pub fn resolve_range_at(params: &RangeParams, now: DateTime<Utc>) -> Result<TimeRange> {
    if let (Some(start), Some(end)) = (params.start.as_deref(), params.end.as_deref()) {
        let start = normalize_rfc3339_to_utc(start)?;
        let end = normalize_rfc3339_to_utc(end)?;
        if start > end {
            return Err(AppError::InvalidInput(format!(
                "range start {} is after end {}",
                start, end
            )));
        }
        return Ok(TimeRange { start, end });
    }
    if let Some(start) = params.start.as_deref() {
        let start = normalize_rfc3339_to_utc(start)?;
        return Ok(TimeRange {
            start,
            end: format_utc(now),
        });
    }
    let start = match params.range.as_deref().unwrap_or(DEFAULT_RANGE) {
        "today" => utc_midnight(now.year(), now.month(), now.day())?,
        "last7days" => now - Duration::days(7),
        "last30days" => now - Duration::days(30),
        "thismonth" => utc_midnight(now.year(), now.month(), 1)?,
        "alltime" => utc_midnight(1970, 1, 1)?,
        value => {
            return Err(AppError::InvalidInput(format!(
                "unsupported range {}",
                value
            )));
        }
    };
    Ok(TimeRange {
        start: format_utc(start),
        end: format_utc(now),
    })
}

pub fn normalize_rfc3339_to_utc(value: &str) -> Result<String> {
    let parsed = DateTime::parse_from_rfc3339(value)
        .map_err(|err| AppError::InvalidInput(format!("invalid datetime: {}", err)))?;
    Ok(format_utc(parsed.with_timezone(&Utc)))
}

fn format_utc(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn utc_midnight(year: i32, month: u32, day: u32) -> Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .ok_or_else(|| AppError::InvalidInput("invalid date".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 13, 45, 0).unwrap()
    }

    fn preset(range: &str) -> RangeParams {
        RangeParams {
            range: Some(range.to_string()),
            ..RangeParams::default()
        }
    }

    #[test]
    fn default_range_is_last_thirty_days() {
        let range = resolve_range_at(&RangeParams::default(), now()).expect("range");
        assert_eq!(range.start, "2025-02-13T13:45:00.000Z");
        assert_eq!(range.end, "2025-03-15T13:45:00.000Z");
    }

    #[test]
    fn calendar_presets_start_at_utc_midnight() {
        let today = resolve_range_at(&preset("today"), now()).expect("today");
        assert_eq!(today.start, "2025-03-15T00:00:00.000Z");
        let month = resolve_range_at(&preset("thismonth"), now()).expect("month");
        assert_eq!(month.start, "2025-03-01T00:00:00.000Z");
        let all = resolve_range_at(&preset("alltime"), now()).expect("all");
        assert_eq!(all.start, "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn explicit_bounds_are_normalized_to_utc() {
        let params = RangeParams {
            range: Some("today".to_string()),
            start: Some("2025-01-01T02:00:00+02:00".to_string()),
            end: Some("2025-01-02T00:00:00Z".to_string()),
        };
        let range = resolve_range_at(&params, now()).expect("range");
        assert_eq!(range.start, "2025-01-01T00:00:00.000Z");
        assert_eq!(range.end, "2025-01-02T00:00:00.000Z");
    }

    #[test]
    fn rejects_unknown_presets_and_inverted_bounds() {
        assert!(matches!(
            resolve_range_at(&preset("fortnight"), now()),
            Err(AppError::InvalidInput(_))
        ));
        let params = RangeParams {
            range: None,
            start: Some("2025-02-01T00:00:00Z".to_string()),
            end: Some("2025-01-01T00:00:00Z".to_string()),
        };
        assert!(resolve_range_at(&params, now()).is_err());
    }
}
