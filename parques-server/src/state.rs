//! Server state management
//!
//! Shared state for every HTTP handler: the session directory, the turn
//! timers, and the event channel observers publish on.

use std::sync::Arc;

use parques_core::{EndReason, MatchConfig, MatchSnapshot, PlayerId, RosterEntry, SubmitOutcome};
use serde_json::Value;
use tracing::info;

use crate::directory::{DirectoryError, SessionDirectory};
use crate::events::{BroadcastObserver, LogResultsSink};
use crate::timers::TurnTimers;

/// Default capacity of the event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Server-wide shared state
pub struct ServerState {
    pub directory: Arc<SessionDirectory>,
    pub timers: TurnTimers,
    pub events: Arc<BroadcastObserver>,
}

impl ServerState {
    pub fn new(match_config: MatchConfig, event_capacity: usize) -> Self {
        let events = Arc::new(BroadcastObserver::new(event_capacity));
        let directory = SessionDirectory::new(match_config, events.clone(), Arc::new(LogResultsSink));
        Self::with_directory(directory, events)
    }

    /// State around a directory built elsewhere, e.g. with scripted dice
    pub fn with_directory(directory: SessionDirectory, events: Arc<BroadcastObserver>) -> Self {
        Self {
            directory: Arc::new(directory),
            timers: TurnTimers::new(),
            events,
        }
    }

    /// Start a match and arm its first turn timer
    pub fn create_match(
        &self,
        roster: Vec<RosterEntry>,
        config: Option<MatchConfig>,
    ) -> Result<MatchSnapshot, DirectoryError> {
        let (session, snapshot) = self.directory.create(roster, config)?;
        self.timers.arm(
            self.directory.clone(),
            session.code(),
            session.action_seq(),
            session.config().turn_timeout_ms,
        );
        Ok(snapshot)
    }

    /// Submit without waiting on the match gate, then re-arm or stop the timer
    pub fn submit(
        &self,
        code: &str,
        player: &PlayerId,
        kind: &str,
        payload: &Value,
    ) -> Result<SubmitOutcome, DirectoryError> {
        let outcome = self.directory.try_submit(code, player, kind, payload)?;
        if outcome.accepted {
            match outcome.timeout_ms {
                Some(timeout_ms) if !outcome.finished => {
                    self.timers
                        .arm(self.directory.clone(), code, outcome.action_seq, timeout_ms)
                }
                _ => self.timers.cancel(code),
            }
        }
        Ok(outcome)
    }

    /// Cancel a match and drop it from the directory
    pub fn cancel_match(&self, code: &str) -> Result<Option<MatchSnapshot>, DirectoryError> {
        self.timers.cancel(code);
        self.directory.end(code, EndReason::Cancelled)?;
        let snapshot = self
            .directory
            .remove(code)
            .and_then(|session| session.current_state().ok().flatten());
        info!(code, "match cancelled");
        Ok(snapshot)
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new(MatchConfig::default(), DEFAULT_EVENT_CAPACITY)
    }
}
