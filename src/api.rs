//! HTTP API for the Timesheet Engine.
//!
//! This module exposes a minimal REST API around the report engine
//! and the clock-state store using the
//! [`axum`](https://crates.io/crates/axum) framework.  Clients
//! submit raw backend report payloads and receive the fixed-shape
//! views in JSON; the clock endpoints wrap the shared state store.
//! Clock toggles are serialized by the store's lock, and a clock-in
//! while a still-valid clock-in exists is rejected as a conflict
//! rather than silently doubled.

use crate::engine::{team_report, weekly_report, yearly_report};
use crate::models::TeamMemberPayload;
use crate::store::{ClockStateStore, FileStorage, SystemClock};
use crate::summary::month_summary;
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{FixedOffset, NaiveDate};
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Application state shared across requests.  Only the clock-state
/// store needs sharing; the report endpoints are pure.
pub struct AppState {
    pub clock_state: RwLock<ClockStateStore<FileStorage, SystemClock>>,
}

#[derive(Debug, Deserialize)]
pub struct ClockInRequest {
    pub employee_id: String,
    /// IANA timezone name, recorded on the stored state.
    #[serde(default)]
    pub tz: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClockOutRequest {
    pub employee_id: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub employee_id: String,
}

#[derive(Debug, Deserialize)]
pub struct WeeklyRequest {
    /// Untyped backend report payload.
    pub report: Value,
    /// Reference date, `YYYY-MM-DD`; the week is the Sunday on or
    /// before it through the following Saturday.
    pub ref_date: String,
    /// Viewer's UTC offset in minutes, east positive.  Defaults to
    /// UTC.
    #[serde(default)]
    pub tz_offset_minutes: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct YearlyRequest {
    pub report: Value,
    pub year: i32,
}

#[derive(Debug, Deserialize)]
pub struct MonthlyRequest {
    pub report: Value,
}

#[derive(Debug, Deserialize)]
pub struct TeamRequest {
    pub members: Vec<TeamMemberPayload>,
}

/// Build the API router and initialise the clock-state store from
/// the given backing file.  Returns the router and a handle to the
/// state.
pub async fn build_router(state_path: PathBuf) -> Result<(Router, Arc<AppState>)> {
    let storage = FileStorage::open(&state_path)?;
    let state = Arc::new(AppState {
        clock_state: RwLock::new(ClockStateStore::new(storage, SystemClock)),
    });
    let router = Router::new()
        .route("/api/clock-in", post(clock_in_handler))
        .route("/api/clock-out", post(clock_out_handler))
        .route("/api/clock-status", get(clock_status_handler))
        .route("/api/reports/weekly", post(weekly_handler))
        .route("/api/reports/yearly", post(yearly_handler))
        .route("/api/reports/monthly", post(monthly_handler))
        .route("/api/reports/team", post(team_handler))
        .with_state(state.clone());
    Ok((router, state))
}

/// Handler for POST /api/clock-in
async fn clock_in_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<ClockInRequest>,
) -> Response {
    let mut store = app_state.clock_state.write().await;
    // A state left behind by another employee must never be visible
    // to this one.
    store.clear_if_not_current_employee(Some(&request.employee_id));
    if let Some(existing) = store.get_state() {
        if store.is_valid_for_employee(&existing, Some(&request.employee_id)) {
            return error_response(StatusCode::CONFLICT, "already clocked in today");
        }
    }
    let state = store.clock_in(&request.employee_id, request.tz);
    (StatusCode::OK, Json(state)).into_response()
}

/// Handler for POST /api/clock-out
async fn clock_out_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<ClockOutRequest>,
) -> Response {
    let mut store = app_state.clock_state.write().await;
    let valid = store
        .get_state()
        .map(|state| store.is_valid_for_employee(&state, Some(&request.employee_id)))
        .unwrap_or(false);
    if !valid {
        return error_response(StatusCode::CONFLICT, "not clocked in");
    }
    store.clear_state();
    (
        StatusCode::OK,
        Json(serde_json::json!({"clocked_in": false})),
    )
        .into_response()
}

/// Handler for GET /api/clock-status
async fn clock_status_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> Response {
    let mut store = app_state.clock_state.write().await;
    store.clear_if_not_current_employee(Some(&query.employee_id));
    let state = store.get_state();
    let clocked_in = state
        .as_ref()
        .map(|state| store.is_valid_for_employee(state, Some(&query.employee_id)))
        .unwrap_or(false);
    let clock_in_time = if clocked_in {
        state.and_then(|state| state.clock_in_time)
    } else {
        None
    };
    Json(serde_json::json!({
        "clocked_in": clocked_in,
        "clock_in_time": clock_in_time,
    }))
    .into_response()
}

/// Handler for POST /api/reports/weekly
async fn weekly_handler(Json(request): Json<WeeklyRequest>) -> Response {
    let Ok(reference) = NaiveDate::parse_from_str(&request.ref_date, "%Y-%m-%d") else {
        return error_response(StatusCode::BAD_REQUEST, "invalid ref_date, expected YYYY-MM-DD");
    };
    let Some(tz) = viewer_offset(request.tz_offset_minutes) else {
        return error_response(StatusCode::BAD_REQUEST, "invalid tz_offset_minutes");
    };
    (
        StatusCode::OK,
        Json(weekly_report(&request.report, reference, tz)),
    )
        .into_response()
}

/// Handler for POST /api/reports/yearly
async fn yearly_handler(Json(request): Json<YearlyRequest>) -> Response {
    (
        StatusCode::OK,
        Json(yearly_report(&request.report, request.year)),
    )
        .into_response()
}

/// Handler for POST /api/reports/monthly
async fn monthly_handler(Json(request): Json<MonthlyRequest>) -> Response {
    (StatusCode::OK, Json(month_summary(&request.report))).into_response()
}

/// Handler for POST /api/reports/team
async fn team_handler(Json(request): Json<TeamRequest>) -> Response {
    (StatusCode::OK, Json(team_report(&request.members))).into_response()
}

fn viewer_offset(minutes: Option<i32>) -> Option<FixedOffset> {
    minutes
        .unwrap_or(0)
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({"error": message}))).into_response()
}

/// Launch the API server.  This function builds the router over the
/// given state file and binds to the supplied address.  It blocks
/// until the server terminates (e.g. when interrupted).
pub async fn serve(addr: &str, state_path: PathBuf) -> Result<()> {
    let (router, _state) = build_router(state_path).await?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Server listening on {}", addr);
    axum::serve(listener, router).await.map_err(|e| e.into())
}
