//! Report shape normalization.
//!
//! Backend report payloads arrive in several shapes: a keyed object
//! mapping date strings to records, an array of records with varying
//! field names, or only raw clock-in/clock-out pairs with no
//! pre-aggregation.  This module reduces all of them to a single
//! ordered sequence of loosely-typed records.  Candidate fields are
//! tried in a fixed priority order, each by a small extractor, so
//! new shapes can be added without deepening conditional branching.
//! Field access is defensive throughout: missing or malformed values
//! default to zero or are skipped, never raised as errors.

use crate::models::TimeEntry;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use serde_json::{json, Value};

/// Candidate fields that may hold the per-bucket series, in priority
/// order.  The first one holding a non-empty array or non-empty
/// keyed object wins; the rest are ignored.
const SERIES_FIELDS: [&str; 9] = [
    "bars", "days", "daily", "series", "data", "by_day", "by_date", "months", "by_month",
];

/// Aliases under which raw time entries may arrive when no
/// pre-aggregated series is present.
const ENTRY_FIELDS: [&str; 4] = ["entries", "time_entries", "raw_entries", "items"];

const ENTRY_START_FIELDS: [&str; 4] = ["clock_in", "start", "start_time", "in"];
const ENTRY_END_FIELDS: [&str; 4] = ["clock_out", "end", "end_time", "out"];

const RECORD_DATE_FIELDS: [&str; 4] = ["date", "day", "timestamp", "label"];
const RECORD_HOUR_FIELDS: [&str; 3] = ["hours", "total", "hours_total"];
const RECORD_PAY_FIELDS: [&str; 4] = ["pay_total", "total_pay", "pay", "earnings"];
const BREAKDOWN_FIELDS: [&str; 3] = ["diurnal", "nocturnal", "extra"];

/// Extracts the per-bucket series from an arbitrary report payload.
///
/// Keyed objects are converted to arrays by pairing each key, as the
/// record's date, with its value; a bare numeric value becomes a
/// `{date, hours}` record.  Returns an empty sequence when no
/// candidate yields data — callers fall back to raw time entries.
pub fn normalize_series(payload: &Value) -> Vec<Value> {
    for field in SERIES_FIELDS {
        match payload.get(field) {
            Some(Value::Array(items)) if !items.is_empty() => return items.clone(),
            Some(Value::Object(map)) if !map.is_empty() => {
                return map
                    .iter()
                    .map(|(key, value)| match value {
                        Value::Object(fields) => {
                            let mut fields = fields.clone();
                            fields.insert("date".to_string(), json!(key));
                            Value::Object(fields)
                        }
                        other => json!({ "date": key, "hours": other }),
                    })
                    .collect();
            }
            _ => {}
        }
    }
    Vec::new()
}

/// Extracts raw clock-in/clock-out pairs from a report payload,
/// converting every instant to the viewer's offset.  Entries with a
/// missing or unparsable endpoint, or with an end at or before the
/// start, are skipped.
pub fn extract_time_entries(payload: &Value, tz: FixedOffset) -> Vec<TimeEntry> {
    let Some(items) = ENTRY_FIELDS
        .iter()
        .find_map(|field| payload.get(field).and_then(Value::as_array))
    else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let start = first_string(item, &ENTRY_START_FIELDS)
                .and_then(|value| parse_instant(value, tz))?;
            let end =
                first_string(item, &ENTRY_END_FIELDS).and_then(|value| parse_instant(value, tz))?;
            (end > start).then_some(TimeEntry { start, end })
        })
        .collect()
}

/// Hours worked according to a single record.  Prefers an explicit
/// hours field; otherwise sums the diurnal/nocturnal/extra
/// breakdown.  Negative and missing values count as zero.
pub fn record_hours(record: &Value) -> f64 {
    for field in RECORD_HOUR_FIELDS {
        if let Some(hours) = record.get(field).and_then(value_as_f64) {
            return hours.max(0.0);
        }
    }
    BREAKDOWN_FIELDS
        .iter()
        .filter_map(|field| record.get(*field).and_then(value_as_f64))
        .map(|hours| hours.max(0.0))
        .sum()
}

/// Pay attributed by a single record, zero when absent or negative.
pub fn record_pay(record: &Value) -> f64 {
    RECORD_PAY_FIELDS
        .iter()
        .find_map(|field| record.get(*field).and_then(value_as_f64))
        .unwrap_or(0.0)
        .max(0.0)
}

/// Calendar date of a record, from the first date-like field that
/// parses.  `None` silently excludes the record from bucketing.
pub fn record_date(record: &Value) -> Option<NaiveDate> {
    RECORD_DATE_FIELDS
        .iter()
        .find_map(|field| record.get(*field).and_then(Value::as_str).and_then(parse_date))
}

/// Zero-based month index of a record for the yearly view.
///
/// Tried in order: an explicit `month` number, a date field holding a
/// bare month number (the shape keyed maps produce), then a full
/// date.  When the record names a year it must match `year`; a full
/// date must likewise fall in `year`.
pub fn record_month_index(record: &Value, year: i32) -> Option<usize> {
    if let Some(record_year) = record.get("year").and_then(value_as_f64) {
        if record_year as i32 != year {
            return None;
        }
    }
    if let Some(month) = record.get("month").and_then(value_as_f64) {
        return month_number_to_index(month);
    }
    let date_field = RECORD_DATE_FIELDS
        .iter()
        .find_map(|field| record.get(*field).and_then(Value::as_str))?;
    if let Ok(month) = date_field.trim().parse::<f64>() {
        return month_number_to_index(month);
    }
    let date = parse_date(date_field)?;
    use chrono::Datelike;
    if date.year() != year {
        return None;
    }
    Some(date.month0() as usize)
}

fn month_number_to_index(month: f64) -> Option<usize> {
    let month = month as i64;
    (1..=12).contains(&month).then(|| month as usize - 1)
}

/// Parses an instant, preferring RFC 3339 (keeping any embedded
/// offset, then converting to the viewer's).  Naive date-time
/// strings are assumed to already be in the viewer's offset.
pub fn parse_instant(value: &str, tz: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&tz));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return tz.from_local_datetime(&naive).single();
        }
    }
    None
}

/// Parses a calendar date from a date string or the date part of a
/// timestamp.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if value.len() > 10 && value.is_char_boundary(10) {
        if let Ok(date) = NaiveDate::parse_from_str(&value[..10], "%Y-%m-%d") {
            return Some(date);
        }
    }
    NaiveDate::parse_from_str(value, "%Y/%m/%d").ok()
}

fn first_string<'a>(record: &'a Value, fields: &[&str]) -> Option<&'a str> {
    fields
        .iter()
        .find_map(|field| record.get(*field).and_then(Value::as_str))
}

/// Numbers and numeric strings both count; anything else is absent.
fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_candidate_field_wins() {
        let payload = json!({
            "data": [{"date": "2025-03-10", "hours": 1.0}],
            "days": [{"date": "2025-03-11", "hours": 2.0}],
        });
        let series = normalize_series(&payload);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0]["date"], "2025-03-11");
    }

    #[test]
    fn test_empty_candidates_are_skipped() {
        let payload = json!({
            "days": [],
            "data": [{"date": "2025-03-10", "hours": 1.0}],
        });
        let series = normalize_series(&payload);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0]["date"], "2025-03-10");
    }

    #[test]
    fn test_keyed_object_becomes_dated_records() {
        let payload = json!({
            "by_day": {
                "2025-03-10": {"hours": 3.0},
                "2025-03-11": 4.5,
            }
        });
        let mut series = normalize_series(&payload);
        series.sort_by_key(|record| record["date"].as_str().map(str::to_string));
        assert_eq!(series.len(), 2);
        assert_eq!(series[0]["date"], "2025-03-10");
        assert_eq!(record_hours(&series[0]), 3.0);
        assert_eq!(series[1]["date"], "2025-03-11");
        assert_eq!(record_hours(&series[1]), 4.5);
    }

    #[test]
    fn test_no_usable_candidate_yields_empty_series() {
        assert!(normalize_series(&json!({"meta": {"note": "x"}})).is_empty());
        assert!(normalize_series(&json!(null)).is_empty());
    }

    #[test]
    fn test_record_hours_prefers_explicit_field() {
        let record = json!({"hours": 5.0, "diurnal": 1.0, "nocturnal": 1.0});
        assert_eq!(record_hours(&record), 5.0);
    }

    #[test]
    fn test_record_hours_sums_breakdown() {
        let record = json!({"diurnal": 3.0, "nocturnal": 2.0, "extra": 1.0});
        assert_eq!(record_hours(&record), 6.0);
    }

    #[test]
    fn test_record_hours_never_negative() {
        assert_eq!(record_hours(&json!({"hours": -4.0})), 0.0);
        assert_eq!(record_hours(&json!({})), 0.0);
    }

    #[test]
    fn test_record_hours_accepts_numeric_strings() {
        assert_eq!(record_hours(&json!({"total": "7.5"})), 7.5);
    }

    #[test]
    fn test_record_date_tries_aliases_and_timestamp_prefix() {
        assert_eq!(
            record_date(&json!({"day": "2025-03-10"})),
            NaiveDate::from_ymd_opt(2025, 3, 10)
        );
        assert_eq!(
            record_date(&json!({"timestamp": "2025-03-10T08:00:00-05:00"})),
            NaiveDate::from_ymd_opt(2025, 3, 10)
        );
        assert_eq!(record_date(&json!({"label": "garbage"})), None);
    }

    #[test]
    fn test_month_index_sources() {
        assert_eq!(record_month_index(&json!({"month": 3}), 2025), Some(2));
        assert_eq!(record_month_index(&json!({"date": "7"}), 2025), Some(6));
        assert_eq!(
            record_month_index(&json!({"date": "2025-11-02"}), 2025),
            Some(10)
        );
        assert_eq!(record_month_index(&json!({"month": 13}), 2025), None);
        assert_eq!(record_month_index(&json!({"label": "junk"}), 2025), None);
    }

    #[test]
    fn test_month_index_verifies_year_when_present() {
        assert_eq!(
            record_month_index(&json!({"month": 3, "year": 2024}), 2025),
            None
        );
        assert_eq!(
            record_month_index(&json!({"date": "2024-11-02"}), 2025),
            None
        );
    }

    #[test]
    fn test_extract_time_entries_skips_malformed_pairs() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let payload = json!({
            "entries": [
                {"clock_in": "2025-03-10T08:00:00-05:00", "clock_out": "2025-03-10T12:00:00-05:00"},
                {"start": "2025-03-10 13:00:00", "end": "2025-03-10 15:30:00"},
                {"clock_in": "garbage", "clock_out": "2025-03-10T12:00:00-05:00"},
                {"clock_in": "2025-03-10T12:00:00-05:00", "clock_out": "2025-03-10T12:00:00-05:00"},
                {"clock_in": "2025-03-10T08:00:00-05:00"},
            ]
        });
        let entries = extract_time_entries(&payload, tz);
        assert_eq!(entries.len(), 2);
        assert_eq!((entries[0].end - entries[0].start).num_hours(), 4);
        assert_eq!((entries[1].end - entries[1].start).num_minutes(), 150);
    }

    #[test]
    fn test_naive_instants_assume_viewer_offset() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let parsed = parse_instant("2025-03-10T08:00:00", tz).unwrap();
        assert_eq!(parsed.offset(), &tz);
        assert_eq!(parsed.naive_local().to_string(), "2025-03-10 08:00:00");
    }
}
