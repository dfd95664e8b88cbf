//! Fixed-slot time bucketing.
//!
//! The weekly view is always exactly seven buckets, Sunday through
//! Saturday, anchored to the Sunday on or before a reference date.
//! The yearly view is always exactly twelve, January through
//! December.  Buckets are zero-filled regardless of data sparsity,
//! and malformed records are silently excluded rather than failing
//! the whole computation.  All day arithmetic happens on the
//! viewer's local wall-clock calendar under a fixed offset.

use crate::models::{DayBucket, MonthBucket, TimeEntry};
use crate::normalize;
use chrono::{Datelike, Duration, FixedOffset, NaiveDate};
use serde_json::Value;

pub const DAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// The Sunday on or before the given date.
pub fn week_start(reference: NaiveDate) -> NaiveDate {
    reference - Duration::days(reference.weekday().num_days_from_sunday() as i64)
}

/// Rounding applied only at the output boundary, so additions never
/// compound rounding error.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Buckets a report payload into the week anchored at the Sunday on
/// or before `reference`.
///
/// Pre-aggregated records are attributed by whole-day offset from
/// the week start; records outside the window or without a parseable
/// date are ignored, not clamped.  When no record lands in the
/// window, raw time entries are bucketed instead, walking each
/// entry's duration in local-midnight-aligned segments so an
/// overnight entry contributes partial hours to both adjacent days.
pub fn bucket_week(payload: &Value, reference: NaiveDate, tz: FixedOffset) -> Vec<DayBucket> {
    let start = week_start(reference);
    let mut hours = [0.0_f64; 7];
    let mut pay = [0.0_f64; 7];

    let mut attributed = 0;
    for record in normalize::normalize_series(payload) {
        let Some(date) = normalize::record_date(&record) else {
            continue;
        };
        let offset = (date - start).num_days();
        if (0..7).contains(&offset) {
            hours[offset as usize] += normalize::record_hours(&record);
            pay[offset as usize] += normalize::record_pay(&record);
            attributed += 1;
        }
    }

    if attributed == 0 {
        for entry in normalize::extract_time_entries(payload, tz) {
            for (date, segment_hours) in split_by_local_day(&entry) {
                let offset = (date - start).num_days();
                if (0..7).contains(&offset) {
                    hours[offset as usize] += segment_hours;
                }
            }
        }
    }

    (0..7)
        .map(|i| DayBucket {
            label: DAY_LABELS[i].to_string(),
            date: start + Duration::days(i as i64),
            hours: round2(hours[i]),
            pay_total: round2(pay[i]),
        })
        .collect()
}

/// Buckets a report payload into the twelve months of `year`.
///
/// Records are assumed pre-aggregated at month grain; there is no
/// raw-entry fallback here.
pub fn bucket_year(payload: &Value, year: i32) -> Vec<MonthBucket> {
    let mut hours = [0.0_f64; 12];
    let mut pay = [0.0_f64; 12];

    for record in normalize::normalize_series(payload) {
        let Some(index) = normalize::record_month_index(&record, year) else {
            continue;
        };
        hours[index] += normalize::record_hours(&record);
        pay[index] += normalize::record_pay(&record);
    }

    (0..12)
        .map(|i| MonthBucket {
            label: MONTH_LABELS[i].to_string(),
            month: i as u32 + 1,
            hours: round2(hours[i]),
            pay_total: round2(pay[i]),
        })
        .collect()
}

/// Splits an entry's duration into per-calendar-day segments on the
/// viewer's local calendar.  The entry's instants already carry the
/// viewer offset, so the walk is plain naive date-time arithmetic.
fn split_by_local_day(entry: &TimeEntry) -> Vec<(NaiveDate, f64)> {
    let mut segments = Vec::new();
    let mut cursor = entry.start.naive_local();
    let end = entry.end.naive_local();
    while cursor < end {
        let day = cursor.date();
        let Some(next_midnight) = day.succ_opt().and_then(|next| next.and_hms_opt(0, 0, 0))
        else {
            break;
        };
        let segment_end = end.min(next_midnight);
        let segment_hours = (segment_end - cursor).num_seconds() as f64 / 3600.0;
        segments.push((day, segment_hours));
        cursor = segment_end;
    }
    segments
}
