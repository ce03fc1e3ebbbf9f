//! Per-turn timeout timers
//!
//! One tokio task per match. Every accepted action re-arms the timer with the
//! new `action_seq`; a timer that fires late finds a different sequence number
//! in the session and does nothing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::directory::SessionDirectory;

#[derive(Clone, Default)]
pub struct TurnTimers {
    armed: Arc<Mutex<HashMap<String, (u64, AbortHandle)>>>,
}

impl TurnTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the timer for `code`, tagged with the session's `seq`.
    ///
    /// A call older than the timer already armed is ignored. A zero timeout
    /// disables the timer. Must be called inside a tokio runtime.
    pub fn arm(&self, directory: Arc<SessionDirectory>, code: &str, seq: u64, timeout_ms: u64) {
        if timeout_ms == 0 {
            self.cancel(code);
            return;
        }

        // hold the table while spawning so a fast timer cannot race its own entry
        let mut armed = self.armed.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(&(current, _)) = armed.get(code) {
            if seq < current {
                debug!(code, seq, current, "out of date re-arm ignored");
                return;
            }
        }
        let timers = self.clone();
        let task_code = code.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(timeout_ms)).await;
            timers.forget(&task_code, seq);

            match directory.submit_timeout(&task_code, seq) {
                Ok(Some(outcome)) if outcome.accepted && !outcome.finished => {
                    if let Some(next_timeout) = outcome.timeout_ms {
                        timers.arm(directory.clone(), &task_code, outcome.action_seq, next_timeout);
                    }
                }
                Ok(_) => {}
                Err(e) => warn!(code = %task_code, error = %e, "turn timeout not applied"),
            }
        })
        .abort_handle();

        if let Some((_, old)) = armed.insert(code.to_string(), (seq, handle)) {
            old.abort();
        }
        drop(armed);
        debug!(code, seq, timeout_ms, "turn timer armed");
    }

    pub fn cancel(&self, code: &str) {
        let removed = self
            .armed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(code);
        if let Some((_, handle)) = removed {
            handle.abort();
            debug!(code, "turn timer cancelled");
        }
    }

    /// Sequence number the live timer for `code` was armed with
    pub fn armed_seq(&self, code: &str) -> Option<u64> {
        self.armed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(code)
            .map(|(seq, _)| *seq)
    }

    pub fn len(&self) -> usize {
        self.armed.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop the entry for a timer that has fired, unless it was re-armed meanwhile
    fn forget(&self, code: &str, seq: u64) {
        let mut armed = self.armed.lock().unwrap_or_else(PoisonError::into_inner);
        if armed.get(code).map_or(false, |(s, _)| *s == seq) {
            armed.remove(code);
        }
    }
}
