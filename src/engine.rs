//! Report view computation engine.
//!
//! The `engine` module turns raw backend report payloads into the
//! fixed-shape views the dashboards render: a seven-slot weekly
//! view, a twelve-slot yearly view, a month summary for the donut
//! chart, and an admin-side team report.  It uses the [`rayon`]
//! crate to parallelise the per-employee work of the team report
//! across multiple CPU cores.  Payload interpretation is delegated
//! to the normalizer and bucketers, so a malformed payload degrades
//! to zero-filled output instead of failing.

use crate::buckets::{bucket_week, bucket_year, round2};
use crate::models::{
    TeamMemberPayload, TeamMemberSummary, TeamReport, Totals, WeeklyReport, YearlyReport,
};
use crate::summary::{effective_rate, month_summary, period_totals};
use chrono::{FixedOffset, NaiveDate};
use rayon::prelude::*;
use serde_json::Value;

/// Builds the weekly view for one employee.  The week is anchored at
/// the Sunday on or before `reference`; instants are interpreted on
/// the viewer's wall-clock calendar under `tz`.
pub fn weekly_report(payload: &Value, reference: NaiveDate, tz: FixedOffset) -> WeeklyReport {
    let buckets = bucket_week(payload, reference, tz);
    let bucket_hours = buckets.iter().map(|b| b.hours).sum();
    let bucket_pay = buckets.iter().map(|b| b.pay_total).sum();
    WeeklyReport {
        week_start: crate::buckets::week_start(reference),
        totals: period_totals(payload, bucket_hours, bucket_pay),
        buckets,
    }
}

/// Builds the yearly view for one employee.
pub fn yearly_report(payload: &Value, year: i32) -> YearlyReport {
    let buckets = bucket_year(payload, year);
    let bucket_hours = buckets.iter().map(|b| b.hours).sum();
    let bucket_pay = buckets.iter().map(|b| b.pay_total).sum();
    YearlyReport {
        year,
        totals: period_totals(payload, bucket_hours, bucket_pay),
        buckets,
    }
}

/// Builds the team-wide view from one month-scoped payload per
/// employee, computing members in parallel.  Input order is
/// preserved in the output rows.
pub fn team_report(members: &[TeamMemberPayload]) -> TeamReport {
    let rows: Vec<TeamMemberSummary> = members
        .par_iter()
        .map(|member| {
            let summary = month_summary(&member.report);
            TeamMemberSummary {
                employee_id: member.employee_id.clone(),
                name: member.name.clone(),
                hours_total: summary.totals.hours_total,
                pay_total: summary.totals.pay_total,
                hourly_rate: effective_rate(member.hourly_rate, &member.report),
            }
        })
        .collect();

    let hours_total: f64 = rows.iter().map(|row| row.hours_total).sum();
    let pay_total: f64 = rows.iter().map(|row| row.pay_total).sum();
    let average_rate = if hours_total > 0.0 {
        round2(pay_total / hours_total)
    } else {
        0.0
    };
    TeamReport {
        members: rows,
        totals: Totals {
            hours_total: round2(hours_total),
            pay_total: round2(pay_total),
        },
        average_rate,
    }
}
