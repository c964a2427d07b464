//! Per-path gallery positions and the read-once focus index.

use std::collections::HashMap;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, warn};

use super::storage::{SessionStorage, StorageError};

/// Storage key holding every position record as one JSON object
pub const POSITIONS_KEY: &str = "gallery-positions";

/// Storage key holding the focused gallery item as a decimal integer
pub const FOCUS_KEY: &str = "gallery-focus-index";

/// Records older than this are dropped when a manager is opened.
/// A day covers any realistic back-navigation within one session.
const MAX_RECORD_AGE_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    /// Signed so that records written by other code with a bad index still parse
    pub index: i64,
    /// Milliseconds since the Unix epoch; only used for pruning
    pub timestamp: i64,
}

/// Quiet period before a debounced save is written
pub const SAVE_DEBOUNCE: StdDuration = StdDuration::from_millis(300);

type Positions = HashMap<String, PositionRecord>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingSave {
    path: String,
    index: usize,
    due: Instant,
}

/// Remembers where the user was in each gallery.
///
/// A manager without storage (no browser context) accepts every call and
/// does nothing. Storage failures are logged and otherwise ignored.
pub struct ScrollManager<S> {
    storage: Option<S>,
    restoring: bool,
    navigating: bool,
    pending: Option<PendingSave>,
}

impl<S: SessionStorage> ScrollManager<S> {
    /// Open a manager over `storage`, dropping day-old records
    pub fn new(storage: S) -> Self {
        let mut manager = Self {
            storage: Some(storage),
            restoring: false,
            navigating: false,
            pending: None,
        };
        manager.prune_older_than(Duration::hours(MAX_RECORD_AGE_HOURS));
        manager
    }

    /// A manager with no storage behind it
    pub fn detached() -> Self {
        Self {
            storage: None,
            restoring: false,
            navigating: false,
            pending: None,
        }
    }

    pub fn storage(&self) -> Option<&S> {
        self.storage.as_ref()
    }

    /// Record `index` as the position for `path`.
    ///
    /// Returns `true` only when storage was written. Skipped while a
    /// restoration or navigation is in progress, and when the stored index
    /// already equals `index`.
    pub fn save(&mut self, path: &str, index: usize) -> bool {
        if self.restoring || self.navigating {
            debug!(path, index, "Restoration or navigation in progress, skipping save");
            return false;
        }
        if self.storage.is_none() {
            return false;
        }

        let Ok(index) = i64::try_from(index) else {
            warn!(path, index, "Gallery index out of range, skipping save");
            return false;
        };
        let path = normalize_path(path);
        let mut positions = self.load_positions();
        if positions.get(&path).is_some_and(|record| record.index == index) {
            return false;
        }

        positions.insert(
            path.clone(),
            PositionRecord {
                index,
                timestamp: Utc::now().timestamp_millis(),
            },
        );

        match self.store_positions(&positions) {
            Ok(()) => {
                debug!(path = %path, index, "Saved gallery position");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to save gallery position");
                false
            }
        }
    }

    /// Queue a save of `index` for `path`, written once `SAVE_DEBOUNCE`
    /// passes without another call. A newer call replaces the queued one.
    pub fn save_debounced(&mut self, path: &str, index: usize) {
        if self.restoring || self.navigating {
            return;
        }
        self.pending = Some(PendingSave {
            path: normalize_path(path),
            index,
            due: Instant::now() + SAVE_DEBOUNCE,
        });
    }

    /// When the queued save becomes due, for callers driving their own timers
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.due)
    }

    /// Write the queued save if its quiet period has passed
    pub fn flush_due(&mut self) -> bool {
        let now = Instant::now();
        match self.pending.take() {
            Some(pending) if pending.due <= now => self.save(&pending.path, pending.index),
            not_due => {
                self.pending = not_due;
                false
            }
        }
    }

    /// Wait out the quiet period of the queued save, then write it
    pub async fn flush_pending(&mut self) -> bool {
        let Some(due) = self.pending_deadline() else {
            return false;
        };
        tokio::time::sleep_until(due).await;
        self.flush_due()
    }

    /// Stored index for `path`, if present and non-negative. Never mutates.
    pub fn saved_index(&self, path: &str) -> Option<usize> {
        let path = normalize_path(path);
        self.load_positions()
            .get(&path)
            .and_then(|record| usize::try_from(record.index).ok())
    }

    pub fn begin_restoration(&mut self) {
        self.restoring = true;
    }

    pub fn end_restoration(&mut self) {
        self.restoring = false;
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    /// Suppress saves while the page navigates away
    /// Any queued save is dropped.
    pub fn mark_navigation_start(&mut self) {
        self.navigating = true;
        self.pending = None;
    }

    pub fn mark_navigation_complete(&mut self) {
        self.navigating = false;
    }

    pub fn is_navigating(&self) -> bool {
        self.navigating
    }

    /// Remove the record for `path`, or every record when `path` is `None`
    pub fn clear(&mut self, path: Option<&str>) {
        let result = match path {
            Some(path) => {
                let mut positions = self.load_positions();
                if positions.remove(&normalize_path(path)).is_none() {
                    return;
                }
                self.store_positions(&positions)
            }
            None => match self.storage.as_mut() {
                Some(storage) => storage.remove_item(POSITIONS_KEY),
                None => Ok(()),
            },
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to clear gallery positions");
        }
    }

    /// Remember which item had focus, right before navigating to its detail page
    pub fn save_focus_index(&mut self, index: usize) {
        if let Some(storage) = self.storage.as_mut() {
            if let Err(e) = storage.set_item(FOCUS_KEY, &index.to_string()) {
                warn!(error = %e, "Failed to save focus index");
            }
        }
    }

    /// Read and clear the focus index in one step.
    /// A saved focus position is handed out at most once.
    pub fn take_focus_index(&mut self) -> Option<usize> {
        let storage = self.storage.as_mut()?;
        let value = match storage.get_item(FOCUS_KEY) {
            Ok(value) => value?,
            Err(e) => {
                warn!(error = %e, "Failed to read focus index");
                return None;
            }
        };
        if let Err(e) = storage.remove_item(FOCUS_KEY) {
            warn!(error = %e, "Failed to clear focus index");
        }
        value.trim().parse().ok()
    }

    /// Drop records older than `max_age`, returning how many were removed
    pub fn prune_older_than(&mut self, max_age: Duration) -> usize {
        let cutoff = (Utc::now() - max_age).timestamp_millis();
        let mut positions = self.load_positions();
        let before = positions.len();
        positions.retain(|_, record| record.timestamp >= cutoff);
        let removed = before - positions.len();

        if removed > 0 {
            match self.store_positions(&positions) {
                Ok(()) => debug!(removed, "Pruned old gallery positions"),
                Err(e) => warn!(error = %e, "Failed to prune gallery positions"),
            }
        }
        removed
    }

    fn load_positions(&self) -> Positions {
        let Some(storage) = self.storage.as_ref() else {
            return Positions::new();
        };
        match storage.get_item(POSITIONS_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!(error = %e, "Failed to parse saved gallery positions");
                Positions::new()
            }),
            Ok(None) => Positions::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read saved gallery positions");
                Positions::new()
            }
        }
    }

    fn store_positions(&mut self, positions: &Positions) -> Result<(), StorageError> {
        let Some(storage) = self.storage.as_mut() else {
            return Ok(());
        };
        let json = serde_json::to_string(positions)?;
        storage.set_item(POSITIONS_KEY, &json)
    }
}

/// `/work/` and `/work` are the same page; the empty path is the root
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
