//! Restoring a gallery's last position when it mounts.

use std::time::Duration;

use tracing::debug;

use super::scroll::ScrollManager;
use super::storage::SessionStorage;

#[derive(Debug, Clone, Copy)]
pub struct RestorePolicy {
    /// Total checks before falling back to the first item
    pub max_attempts: u32,
    /// Delay before check `n + 1` is `step * n`
    pub step: Duration,
}

impl Default for RestorePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            step: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreOutcome {
    /// Index the gallery should jump to, without animation
    pub index: usize,
    /// Whether `index` came from a saved record
    pub restored: bool,
    pub attempts: u32,
}

/// Holds the manager in restoring mode until dropped, so a cancelled
/// restoration never leaves saves suppressed.
struct RestorationGuard<'a, S: SessionStorage> {
    manager: &'a mut ScrollManager<S>,
}

impl<'a, S: SessionStorage> RestorationGuard<'a, S> {
    fn new(manager: &'a mut ScrollManager<S>) -> Self {
        manager.begin_restoration();
        Self { manager }
    }
}

impl<S: SessionStorage> Drop for RestorationGuard<'_, S> {
    fn drop(&mut self) {
        self.manager.end_restoration();
    }
}

/// Work out where the gallery at `path` should start.
///
/// `item_count` is re-read on every attempt because the list may still be
/// loading when the gallery mounts. A saved index inside `[0, item_count)`
/// wins and its record is cleared so it is replayed only once; otherwise
/// the check is retried with growing delays before settling on index 0.
/// Saves are suppressed while this runs, including if the future is dropped
/// part way through.
pub async fn restore_position<S, F>(
    manager: &mut ScrollManager<S>,
    path: &str,
    policy: RestorePolicy,
    mut item_count: F,
) -> RestoreOutcome
where
    S: SessionStorage,
    F: FnMut() -> usize,
{
    let mut guard = RestorationGuard::new(manager);

    let max_attempts = policy.max_attempts.max(1);
    let mut outcome = RestoreOutcome {
        index: 0,
        restored: false,
        attempts: max_attempts,
    };

    for attempt in 1..=max_attempts {
        let count = item_count();
        match guard.manager.saved_index(path) {
            Some(index) if index < count => {
                debug!(path, index, attempt, "Restoring gallery position");
                guard.manager.clear(Some(path));
                outcome = RestoreOutcome {
                    index,
                    restored: true,
                    attempts: attempt,
                };
                break;
            }
            saved => {
                debug!(path, ?saved, count, attempt, "No usable saved position yet");
                if attempt < max_attempts {
                    tokio::time::sleep(policy.step * attempt).await;
                }
            }
        }
    }

    if !outcome.restored {
        debug!(path, "Starting gallery from the beginning");
    }

    drop(guard);
    outcome
}
