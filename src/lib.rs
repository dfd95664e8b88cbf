//! Timesheet Engine library crate.
//!
//! This crate exposes the report-normalization core of a
//! time-tracking system and its API components as reusable modules.
//! External applications may depend on the `timesheet_engine` crate
//! and call into `engine::weekly_report` directly or embed the API
//! via `api::build_router`.

pub mod models;
pub mod store;
pub mod normalize;
pub mod buckets;
pub mod summary;
pub mod engine;
pub mod api;
