//! Clock-state persistence.
//!
//! The `store` module defines abstractions for caching clock-in
//! status between page loads.  It provides the `KeyValueStorage` and
//! `Clock` traits so that tests can inject a deterministic clock and
//! an in-memory store, plus a JSON-file-backed storage used by the
//! server binary.  All read/write operations are best-effort and
//! never fail: corrupt or missing state degrades to "no state".

use crate::models::ClockState;
use crate::normalize::parse_instant;
use chrono::{DateTime, FixedOffset, Local};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fixed key the clock state is stored under.
pub const CLOCK_STATE_KEY: &str = "globalClockState";

/// Errors raised when opening a storage backend.  Only the initial
/// open can fail; once a store exists, every operation degrades
/// gracefully instead of erroring.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read state file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Source of "now".  Injected so tests can simulate yesterday's
/// stale state deterministically instead of depending on wall-clock
/// time.  The returned instant carries the viewer's local offset;
/// all same-day checks use that local calendar, not UTC.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// The real wall clock, in the system's local offset.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Minimal string key-value interface over the session's persistence
/// layer.  Implementations must not fail; a backend that cannot
/// write simply loses the value.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

/// Plain in-memory storage, used in tests and by embedders that keep
/// their own persistence.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Key-value storage persisted as a single JSON object on disk.
///
/// The whole map is loaded at open and rewritten on every mutation.
/// An unparsable file is treated as empty rather than as an error,
/// and failed writes are reported on stderr and otherwise ignored.
pub struct FileStorage {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileStorage {
    /// Opens the storage file, creating an empty store if the file
    /// does not exist yet.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let entries = match std::fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str::<HashMap<String, String>>(&data) {
                Ok(entries) => entries,
                Err(err) => {
                    eprintln!("Ignoring unparsable state file {:?}: {}", path, err);
                    HashMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                return Err(StorageError::Read {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    fn persist(&self) {
        match serde_json::to_string_pretty(&self.entries) {
            Ok(data) => {
                if let Err(err) = std::fs::write(&self.path, data) {
                    eprintln!("Failed to write state file {:?}: {}", self.path, err);
                }
            }
            Err(err) => eprintln!("Failed to serialise state map: {}", err),
        }
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
        self.persist();
    }

    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.persist();
        }
    }
}

/// Session-scoped cache of clock-in status.
///
/// Avoids an extra status round trip on every page load while never
/// presenting stale or cross-employee state: validation happens at
/// read time, and a state from another employee or another day is
/// simply invalid.
pub struct ClockStateStore<S, C> {
    storage: S,
    clock: C,
}

impl<S: KeyValueStorage, C: Clock> ClockStateStore<S, C> {
    pub fn new(storage: S, clock: C) -> Self {
        Self { storage, clock }
    }

    /// Stores the given state verbatim, stamping `last_updated` with
    /// the current instant.  No validation happens at write time.
    pub fn set_state(&mut self, mut state: ClockState) -> ClockState {
        state.last_updated = self.clock.now().to_rfc3339();
        if let Ok(json) = serde_json::to_string(&state) {
            self.storage.set(CLOCK_STATE_KEY, json);
        }
        state
    }

    /// Builds and stores a fresh clocked-in state for the employee,
    /// overwriting whatever was there.
    pub fn clock_in(&mut self, employee_id: &str, tz: Option<String>) -> ClockState {
        let state = ClockState {
            is_clocked_in: true,
            clock_in_time: Some(self.clock.now().to_rfc3339()),
            employee_id: Some(employee_id.to_string()),
            tz,
            last_updated: String::new(),
        };
        self.set_state(state)
    }

    /// Returns the last stored state, or `None` if absent or
    /// unparsable.  Corrupt storage is a cache miss, not an error.
    pub fn get_state(&self) -> Option<ClockState> {
        let stored = self.storage.get(CLOCK_STATE_KEY)?;
        serde_json::from_str(&stored).ok()
    }

    /// Removes any stored state.  Idempotent.
    pub fn clear_state(&mut self) {
        self.storage.remove(CLOCK_STATE_KEY);
    }

    /// A state is valid only when it belongs to exactly this employee,
    /// its clock-in instant parses and falls on the current local
    /// calendar day, and the clocked-in flag is set.  Any failure
    /// yields `false`.
    pub fn is_valid_for_employee(&self, state: &ClockState, employee_id: Option<&str>) -> bool {
        let (Some(clock_in_time), Some(owner), Some(current)) = (
            state.clock_in_time.as_deref(),
            state.employee_id.as_deref(),
            employee_id,
        ) else {
            return false;
        };
        if owner != current {
            return false;
        }
        let now = self.clock.now();
        let Some(clock_in) = parse_instant(clock_in_time, *now.offset()) else {
            return false;
        };
        let is_today = clock_in.with_timezone(now.offset()).date_naive() == now.date_naive();
        is_today && state.is_clocked_in
    }

    /// Clears the stored state when it belongs to a different
    /// employee.  This is what keeps one employee's clocked-in flag
    /// from leaking into another employee's session on a shared
    /// browser.
    pub fn clear_if_not_current_employee(&mut self, employee_id: Option<&str>) {
        if let Some(state) = self.get_state() {
            if state.employee_id.as_deref() != employee_id {
                self.clear_state();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct FixedClock(DateTime<FixedOffset>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<FixedOffset> {
            self.0
        }
    }

    fn bogota() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    fn noon_clock() -> FixedClock {
        FixedClock(bogota().with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap())
    }

    fn state(employee_id: &str, clock_in_time: &str) -> ClockState {
        ClockState {
            is_clocked_in: true,
            clock_in_time: Some(clock_in_time.to_string()),
            employee_id: Some(employee_id.to_string()),
            tz: None,
            last_updated: String::new(),
        }
    }

    #[test]
    fn test_valid_state_for_matching_employee_today() {
        let store = ClockStateStore::new(MemoryStorage::default(), noon_clock());
        let state = state("emp-1", "2025-03-10T08:30:00-05:00");
        assert!(store.is_valid_for_employee(&state, Some("emp-1")));
    }

    #[test]
    fn test_invalid_when_employee_differs() {
        let store = ClockStateStore::new(MemoryStorage::default(), noon_clock());
        let state = state("emp-1", "2025-03-10T08:30:00-05:00");
        assert!(!store.is_valid_for_employee(&state, Some("emp-2")));
    }

    #[test]
    fn test_invalid_when_clock_in_was_yesterday() {
        let store = ClockStateStore::new(MemoryStorage::default(), noon_clock());
        let state = state("emp-1", "2025-03-09T23:30:00-05:00");
        assert!(!store.is_valid_for_employee(&state, Some("emp-1")));
    }

    #[test]
    fn test_invalid_when_not_clocked_in() {
        let store = ClockStateStore::new(MemoryStorage::default(), noon_clock());
        let mut state = state("emp-1", "2025-03-10T08:30:00-05:00");
        state.is_clocked_in = false;
        assert!(!store.is_valid_for_employee(&state, Some("emp-1")));
    }

    #[test]
    fn test_invalid_when_current_employee_unknown() {
        let store = ClockStateStore::new(MemoryStorage::default(), noon_clock());
        let state = state("emp-1", "2025-03-10T08:30:00-05:00");
        assert!(!store.is_valid_for_employee(&state, None));
    }

    #[test]
    fn test_invalid_when_clock_in_time_unparsable() {
        let store = ClockStateStore::new(MemoryStorage::default(), noon_clock());
        let state = state("emp-1", "not a timestamp");
        assert!(!store.is_valid_for_employee(&state, Some("emp-1")));
    }

    #[test]
    fn test_same_day_check_uses_local_calendar() {
        // 02:00 UTC on March 11 is still 21:00 March 10 in Bogota.
        let store = ClockStateStore::new(
            MemoryStorage::default(),
            FixedClock(bogota().with_ymd_and_hms(2025, 3, 10, 22, 0, 0).unwrap()),
        );
        let state = state("emp-1", "2025-03-11T02:00:00+00:00");
        assert!(store.is_valid_for_employee(&state, Some("emp-1")));
    }

    #[test]
    fn test_set_state_stamps_last_updated() {
        let clock = noon_clock();
        let stamped = clock.now().to_rfc3339();
        let mut store = ClockStateStore::new(MemoryStorage::default(), clock);
        store.set_state(state("emp-1", "2025-03-10T08:30:00-05:00"));
        let stored = store.get_state().unwrap();
        assert_eq!(stored.last_updated, stamped);
        assert_eq!(stored.employee_id.as_deref(), Some("emp-1"));
    }

    #[test]
    fn test_corrupt_storage_reads_as_no_state() {
        let mut storage = MemoryStorage::default();
        storage.set(CLOCK_STATE_KEY, "{not json".to_string());
        let store = ClockStateStore::new(storage, noon_clock());
        assert!(store.get_state().is_none());
    }

    #[test]
    fn test_clear_state_is_idempotent() {
        let mut store = ClockStateStore::new(MemoryStorage::default(), noon_clock());
        store.set_state(state("emp-1", "2025-03-10T08:30:00-05:00"));
        store.clear_state();
        store.clear_state();
        assert!(store.get_state().is_none());
    }

    #[test]
    fn test_clear_if_not_current_employee() {
        let mut store = ClockStateStore::new(MemoryStorage::default(), noon_clock());
        store.set_state(state("emp-1", "2025-03-10T08:30:00-05:00"));

        // Same employee: untouched.
        store.clear_if_not_current_employee(Some("emp-1"));
        assert!(store.get_state().is_some());

        // Different employee: cleared.
        store.clear_if_not_current_employee(Some("emp-2"));
        assert!(store.get_state().is_none());
    }
}
