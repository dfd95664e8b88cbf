//! Data models for the Timesheet Engine.
//!
//! The `models` module defines a set of serialisable structs
//! representing clock state, time entries, report buckets and
//! summaries.  These data types derive `Serialize` and `Deserialize`
//! so that they can be easily persisted or transmitted over a
//! network.  They form the basis of the engine’s input and output
//! structures.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// Snapshot of whether a session believes an employee is clocked in.
///
/// The state is written on every successful clock-in and cleared on
/// clock-out, logout, employee mismatch or day rollover.  Validity is
/// never assessed at write time; readers must check it through
/// [`crate::store::ClockStateStore::is_valid_for_employee`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockState {
    /// Whether the session considers itself clocked in.
    pub is_clocked_in: bool,
    /// Instant of the last clock-in as an RFC 3339 string, if any.
    pub clock_in_time: Option<String>,
    /// Identifier of the employee the state belongs to.  A state is
    /// only ever valid for this exact employee.
    pub employee_id: Option<String>,
    /// IANA timezone name sent alongside the clock-in, e.g.
    /// `"America/Bogota"`.  Recorded verbatim; bucketing uses a fixed
    /// viewer offset instead.
    #[serde(default)]
    pub tz: Option<String>,
    /// Instant of the last write, stamped by the store.
    pub last_updated: String,
}

/// A single clock-in/clock-out pair, already converted to the
/// viewer's local offset.  An entry may span a local midnight, in
/// which case its duration is split across the calendar days it
/// touches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

/// One day slot of a weekly view.  Weekly views always contain
/// exactly seven of these, Sunday through Saturday, zero-filled where
/// no data arrived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBucket {
    /// Weekday abbreviation, `"Sun"` .. `"Sat"`.
    pub label: String,
    /// Absolute calendar date of this slot.
    pub date: NaiveDate,
    /// Hours worked, rounded to two decimals.
    pub hours: f64,
    /// Pay attributed to this day, rounded to two decimals.
    pub pay_total: f64,
}

/// One month slot of a yearly view.  Yearly views always contain
/// exactly twelve of these, January through December.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthBucket {
    /// Month abbreviation, `"Jan"` .. `"Dec"`.
    pub label: String,
    /// Calendar month number, 1 through 12.
    pub month: u32,
    pub hours: f64,
    pub pay_total: f64,
}

/// Headline totals for a period.  Backend-declared totals take
/// precedence over sums recomputed from buckets.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub hours_total: f64,
    pub pay_total: f64,
}

/// Categorical hour breakdown for the donut view of a single period.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HoursBreakdown {
    #[serde(default)]
    pub diurnal: f64,
    #[serde(default)]
    pub nocturnal: f64,
    #[serde(default)]
    pub extra: f64,
}

impl HoursBreakdown {
    /// Sum of the categories, treating negatives as zero.
    pub fn total(&self) -> f64 {
        self.diurnal.max(0.0) + self.nocturnal.max(0.0) + self.extra.max(0.0)
    }
}

/// Derived summary for a month-scoped report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthSummary {
    pub totals: Totals,
    pub breakdown: HoursBreakdown,
}

/// A fully bucketed weekly view for one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    /// The Sunday on or before the reference date.
    pub week_start: NaiveDate,
    /// Exactly seven buckets, Sunday through Saturday.
    pub buckets: Vec<DayBucket>,
    pub totals: Totals,
}

/// A fully bucketed yearly view for one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyReport {
    pub year: i32,
    /// Exactly twelve buckets, January through December.
    pub buckets: Vec<MonthBucket>,
    pub totals: Totals,
}

/// Input for the team-wide view: one employee plus the raw
/// month-scoped report payload the backend returned for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMemberPayload {
    pub employee_id: String,
    #[serde(default)]
    pub name: String,
    /// Rate from the employee's profile, used when the report payload
    /// does not carry one.
    #[serde(default)]
    pub hourly_rate: f64,
    /// Untyped report payload; the normalizer interprets it.
    pub report: serde_json::Value,
}

/// One row of the team-wide view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMemberSummary {
    pub employee_id: String,
    pub name: String,
    pub hours_total: f64,
    pub pay_total: f64,
    pub hourly_rate: f64,
}

/// The aggregate result of a team-wide report run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamReport {
    /// Individual summaries, in input order.
    pub members: Vec<TeamMemberSummary>,
    pub totals: Totals,
    /// Team-wide average rate, total pay over total hours.  Zero when
    /// no hours were worked.
    pub average_rate: f64,
}
