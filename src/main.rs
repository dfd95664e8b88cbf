//! Entry point for the Timesheet Engine binary.
//!
//! Running this binary will start an HTTP server that exposes a
//! minimal API for clock-state tracking and report bucketing.  The
//! file backing the clock-state store may be specified via the
//! `TIMESHEET_STATE_PATH` environment variable; if unset the server
//! uses a `clock_state.json` file relative to the current working
//! directory.

use std::path::PathBuf;

#[tokio::main]
async fn main() {
    // Determine where the clock state is persisted
    let state_path = std::env::var("TIMESHEET_STATE_PATH")
        .unwrap_or_else(|_| "clock_state.json".to_string());
    // Determine bind address
    let addr = std::env::var("TIMESHEET_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    if let Err(err) = timesheet_engine::api::serve(&addr, PathBuf::from(state_path)).await {
        eprintln!("Error running server: {}", err);
    }
}

// Public re-exports so the binary has access to library modules
pub use timesheet_engine::{api, buckets, engine, models, normalize, store, summary};
