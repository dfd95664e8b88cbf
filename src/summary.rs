//! Headline summary derivation.
//!
//! Reconciles the several places a total can come from.  Backend
//! declared totals are authoritative when present and positive, even
//! when they disagree with a locally recomputed sum (the backend may
//! legitimately exclude in-progress unclosed entries).  The
//! month-scoped donut view uses the month report's own totals, never
//! the week/year report's.

use crate::buckets::round2;
use crate::models::{HoursBreakdown, MonthSummary, Totals};
use serde_json::Value;

const TOTAL_HOURS_FIELDS: [&str; 2] = ["hours_total", "total_hours"];
const TOTAL_PAY_FIELDS: [&str; 2] = ["pay_total", "total_pay"];
const RATE_FIELDS: [&str; 3] = ["hourly_rate", "avg_rate", "rate"];

/// Totals for a week- or year-scoped view.  Each figure independently
/// prefers the payload's declared total when present and positive,
/// falling back to the corresponding bucket sum.
pub fn period_totals(payload: &Value, bucket_hours: f64, bucket_pay: f64) -> Totals {
    Totals {
        hours_total: round2(declared_total(payload, &TOTAL_HOURS_FIELDS).unwrap_or(bucket_hours)),
        pay_total: round2(declared_total(payload, &TOTAL_PAY_FIELDS).unwrap_or(bucket_pay)),
    }
}

/// Summary for a month-scoped report.
///
/// Hours come from the report's own totals field when present,
/// otherwise from the sum of its categorical breakdown; pay comes
/// from the totals field, defaulting to zero.
pub fn month_summary(payload: &Value) -> MonthSummary {
    let breakdown = extract_breakdown(payload);
    let hours = first_total_field(payload, &TOTAL_HOURS_FIELDS)
        .map(|hours| hours.max(0.0))
        .unwrap_or_else(|| breakdown.total());
    let pay = first_total_field(payload, &TOTAL_PAY_FIELDS)
        .unwrap_or(0.0)
        .max(0.0);
    MonthSummary {
        totals: Totals {
            hours_total: round2(hours),
            pay_total: round2(pay),
        },
        breakdown,
    }
}

/// The rate to display: the payload's rate when it carries a positive
/// one, otherwise the known profile rate.  Never a derived
/// pay-over-hours ratio, which is unstable when totals are
/// backend-approximated.
pub fn effective_rate(profile_rate: f64, payload: &Value) -> f64 {
    RATE_FIELDS
        .iter()
        .find_map(|&field| lookup_number(payload, field))
        .filter(|rate| *rate > 0.0)
        .unwrap_or(profile_rate)
}

/// A declared total only overrides recomputation when positive.
fn declared_total(payload: &Value, fields: &[&str]) -> Option<f64> {
    first_total_field(payload, fields).filter(|total| *total > 0.0)
}

fn first_total_field(payload: &Value, fields: &[&str]) -> Option<f64> {
    fields.iter().find_map(|&field| lookup_number(payload, field))
}

/// Looks a numeric field up at the top level and under a nested
/// `totals` object.
fn lookup_number(payload: &Value, field: &str) -> Option<f64> {
    payload
        .get(field)
        .or_else(|| payload.get("totals").and_then(|totals| totals.get(field)))
        .and_then(Value::as_f64)
}

fn extract_breakdown(payload: &Value) -> HoursBreakdown {
    HoursBreakdown {
        diurnal: breakdown_field(payload, "diurnal"),
        nocturnal: breakdown_field(payload, "nocturnal"),
        extra: breakdown_field(payload, "extra"),
    }
}

fn breakdown_field(payload: &Value, field: &str) -> f64 {
    payload
        .get(field)
        .or_else(|| {
            payload
                .get("breakdown")
                .and_then(|breakdown| breakdown.get(field))
        })
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_declared_totals_beat_recomputed_sums() {
        let payload = json!({"hours_total": 38.5, "pay_total": 1155.0});
        let totals = period_totals(&payload, 36.0, 1080.0);
        assert_eq!(totals.hours_total, 38.5);
        assert_eq!(totals.pay_total, 1155.0);
    }

    #[test]
    fn test_bucket_sums_used_when_totals_absent_or_non_positive() {
        let totals = period_totals(&json!({}), 36.0, 1080.0);
        assert_eq!(totals.hours_total, 36.0);
        assert_eq!(totals.pay_total, 1080.0);

        let totals = period_totals(&json!({"hours_total": 0.0}), 36.0, 1080.0);
        assert_eq!(totals.hours_total, 36.0);
    }

    #[test]
    fn test_nested_totals_object_is_consulted() {
        let payload = json!({"totals": {"total_hours": 40.0, "total_pay": 1200.0}});
        let totals = period_totals(&payload, 0.0, 0.0);
        assert_eq!(totals.hours_total, 40.0);
        assert_eq!(totals.pay_total, 1200.0);
    }

    #[test]
    fn test_month_summary_derives_hours_from_breakdown() {
        let payload = json!({"diurnal": 3.0, "nocturnal": 2.0, "extra": 1.0});
        let summary = month_summary(&payload);
        assert_eq!(summary.totals.hours_total, 6.0);
        assert_eq!(summary.totals.pay_total, 0.0);
        assert_eq!(summary.breakdown.diurnal, 3.0);
    }

    #[test]
    fn test_month_summary_prefers_own_totals() {
        let payload = json!({
            "hours_total": 7.25,
            "pay_total": 217.5,
            "diurnal": 3.0, "nocturnal": 2.0, "extra": 1.0,
        });
        let summary = month_summary(&payload);
        assert_eq!(summary.totals.hours_total, 7.25);
        assert_eq!(summary.totals.pay_total, 217.5);
    }

    #[test]
    fn test_effective_rate_refreshes_only_from_positive_values() {
        assert_eq!(effective_rate(30.0, &json!({"hourly_rate": 35.0})), 35.0);
        assert_eq!(effective_rate(30.0, &json!({"hourly_rate": 0.0})), 30.0);
        assert_eq!(effective_rate(30.0, &json!({})), 30.0);
        assert_eq!(
            effective_rate(30.0, &json!({"totals": {"rate": 32.0}})),
            32.0
        );
    }
}
