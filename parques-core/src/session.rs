//! Match session: the per-match mutation gate
//!
//! Every action for one match passes through a single `Mutex`, so rolling,
//! move generation and move application form one transaction. Different
//! sessions share nothing and run fully in parallel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::action::Action;
use crate::config::MatchConfig;
use crate::dice::DiceRoller;
use crate::error::{ActionError, RejectReason, SessionError};
use crate::game::Match;
use crate::player::{PlayerId, RosterEntry};
use crate::snapshot::{EndReason, MatchEndNotice, MatchSnapshot, TurnStartNotice};

// ============================================================================
// COLLABORATOR BOUNDARIES
// ============================================================================

/// Receives outbound notices for one or more matches.
///
/// Called with the match gate held, so notices arrive in action order.
/// Implementations must not block or submit to the same match.
pub trait MatchObserver: Send + Sync {
    fn on_state(&self, _code: &str, _snapshot: &MatchSnapshot) {}
    fn on_turn_start(&self, _code: &str, _notice: &TurnStartNotice) {}
    fn on_match_end(&self, _code: &str, _notice: &MatchEndNotice) {}
    fn on_fault(&self, _code: &str, _message: &str) {}
}

/// Persists final results
pub trait ResultsSink: Send + Sync {
    fn record(&self, code: &str, notice: &MatchEndNotice);
}

/// Discards everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl MatchObserver for NullObserver {}

impl ResultsSink for NullObserver {
    fn record(&self, _code: &str, _notice: &MatchEndNotice) {}
}

// ============================================================================
// OUTCOME
// ============================================================================

/// Reply to a submitted action
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<MatchSnapshot>,
    /// Accepted-action counter after this submission
    pub action_seq: u64,
    pub finished: bool,
    /// Timeout for the acting player, when a turn is now running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl SubmitOutcome {
    fn rejected(reason: RejectReason, action_seq: u64) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
            state: None,
            action_seq,
            finished: false,
            timeout_ms: None,
        }
    }
}

// ============================================================================
// SESSION
// ============================================================================

struct Gate {
    game: Option<Match>,
    dice: Box<dyn DiceRoller>,
    unusable: Option<String>,
}

/// One match behind its mutation gate
pub struct MatchSession {
    id: String,
    code: String,
    config: MatchConfig,
    gate: Mutex<Gate>,
    /// Accepted actions so far; only written while the gate is held
    action_seq: AtomicU64,
    observer: Arc<dyn MatchObserver>,
    results: Arc<dyn ResultsSink>,
}

impl MatchSession {
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        config: MatchConfig,
        dice: Box<dyn DiceRoller>,
        observer: Arc<dyn MatchObserver>,
        results: Arc<dyn ResultsSink>,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            config,
            gate: Mutex::new(Gate {
                game: None,
                dice,
                unusable: None,
            }),
            action_seq: AtomicU64::new(0),
            observer,
            results,
        }
    }

    /// Session with no collaborators attached
    pub fn detached(code: impl Into<String>, config: MatchConfig, dice: Box<dyn DiceRoller>) -> Self {
        let code = code.into();
        let observer = Arc::new(NullObserver);
        Self::new(code.clone(), code, config, dice, observer.clone(), observer)
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    fn lock(&self) -> Result<MutexGuard<'_, Gate>, SessionError> {
        self.gate
            .lock()
            .map_err(|_| SessionError::Unusable("match gate poisoned".to_string()))
    }

    fn try_lock(&self) -> Result<MutexGuard<'_, Gate>, SessionError> {
        match self.gate.try_lock() {
            Ok(gate) => Ok(gate),
            Err(TryLockError::WouldBlock) => {
                warn!(code = %self.code, "action refused, match busy");
                Err(SessionError::Busy)
            }
            Err(TryLockError::Poisoned(_)) => {
                Err(SessionError::Unusable("match gate poisoned".to_string()))
            }
        }
    }

    /// Seat the roster and begin the first turn
    pub fn start(&self, roster: Vec<RosterEntry>) -> Result<MatchSnapshot, SessionError> {
        let mut gate = self.lock()?;
        if let Some(reason) = &gate.unusable {
            return Err(SessionError::Unusable(reason.clone()));
        }
        if gate.game.is_some() {
            return Err(SessionError::AlreadyStarted);
        }

        let mut game = Match::new(self.id.clone(), self.code.clone(), self.config.clone(), roster)?;
        game.start();
        let snapshot = game.snapshot();
        let notice = game.turn_start_notice();
        gate.game = Some(game);

        self.emit(&snapshot, notice.as_ref(), None);
        Ok(snapshot)
    }

    /// Apply an action, waiting for any action already in flight
    pub fn submit(&self, player: &PlayerId, action: &Action) -> Result<SubmitOutcome, SessionError> {
        let gate = self.lock()?;
        self.apply_locked(gate, player, action)
    }

    /// Apply an action, or fail with `Busy` if another is in flight
    pub fn try_submit(&self, player: &PlayerId, action: &Action) -> Result<SubmitOutcome, SessionError> {
        let gate = self.try_lock()?;
        self.apply_locked(gate, player, action)
    }

    /// Decode a transport `(kind, payload)` pair and submit it
    pub fn submit_request(
        &self,
        player: &PlayerId,
        kind: &str,
        payload: &Value,
    ) -> Result<SubmitOutcome, SessionError> {
        self.decode_then(player, kind, payload, Self::submit)
    }

    /// Like [`MatchSession::submit_request`], but never waits on the gate
    pub fn try_submit_request(
        &self,
        player: &PlayerId,
        kind: &str,
        payload: &Value,
    ) -> Result<SubmitOutcome, SessionError> {
        self.decode_then(player, kind, payload, Self::try_submit)
    }

    fn decode_then(
        &self,
        player: &PlayerId,
        kind: &str,
        payload: &Value,
        submit: fn(&Self, &PlayerId, &Action) -> Result<SubmitOutcome, SessionError>,
    ) -> Result<SubmitOutcome, SessionError> {
        match Action::from_request(kind, payload) {
            Ok(action) => submit(self, player, &action),
            Err(ActionError::Rejected(reason)) => Ok(SubmitOutcome::rejected(reason, self.action_seq())),
            Err(err) => Err(err.into()),
        }
    }

    /// Submit the acting player's timeout action, if nothing has been accepted
    /// since the timer was armed at `expected_seq`
    pub fn submit_timeout(&self, expected_seq: u64) -> Result<Option<SubmitOutcome>, SessionError> {
        let gate = self.lock()?;
        let seq = self.action_seq();
        if seq != expected_seq {
            debug!(code = %self.code, expected_seq, seq, "stale turn timer ignored");
            return Ok(None);
        }
        let (player, action) = match gate.game.as_ref() {
            Some(game) => match game.timeout_action() {
                Some(action) => (game.current_player().id.clone(), action),
                None => return Ok(None),
            },
            None => return Ok(None),
        };
        debug!(code = %self.code, player = %player, action = action.kind().as_str(), "turn timed out");
        self.apply_locked(gate, &player, &action).map(Some)
    }

    fn apply_locked(
        &self,
        mut gate: MutexGuard<'_, Gate>,
        player: &PlayerId,
        action: &Action,
    ) -> Result<SubmitOutcome, SessionError> {
        if let Some(reason) = &gate.unusable {
            return Err(SessionError::Unusable(reason.clone()));
        }

        let Gate { game, dice, unusable } = &mut *gate;
        let game = game.as_mut().ok_or(SessionError::NotStarted)?;

        let applied = match game.apply(player, action, dice.as_mut()) {
            Ok(applied) => applied,
            Err(ActionError::Rejected(reason)) => {
                debug!(code = %self.code, player = %player, reason = reason.code(), "action rejected");
                return Ok(SubmitOutcome::rejected(reason, self.action_seq()));
            }
            Err(ActionError::Invariant(message)) => {
                error!(code = %self.code, player = %player, %message, "invariant violated, match unusable");
                *unusable = Some(message.clone());
                self.observer.on_fault(&self.code, &message);
                return Err(SessionError::Unusable(message));
            }
            Err(err) => return Err(err.into()),
        };

        let action_seq = self.action_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = game.snapshot();
        let acting = game.turn_start_notice();
        let timeout_ms = acting.as_ref().map(|n| n.timeout_ms);
        // only a new acting player (or a bonus roll) is announced
        let turn_notice = acting.filter(|_| applied.turn_started && !applied.match_ended);
        let end_notice = if game.is_over() { game.end_notice() } else { None };
        let outcome = SubmitOutcome {
            accepted: true,
            reason: None,
            state: Some(snapshot.clone()),
            action_seq,
            finished: end_notice.is_some(),
            timeout_ms,
        };

        // published before the gate opens so subscribers see actions in order
        self.emit(&snapshot, turn_notice.as_ref(), end_notice.as_ref());
        drop(gate);
        Ok(outcome)
    }

    fn emit(
        &self,
        snapshot: &MatchSnapshot,
        turn_notice: Option<&TurnStartNotice>,
        end_notice: Option<&MatchEndNotice>,
    ) {
        self.observer.on_state(&self.code, snapshot);
        if let Some(notice) = turn_notice {
            self.observer.on_turn_start(&self.code, notice);
        }
        if let Some(notice) = end_notice {
            self.observer.on_match_end(&self.code, notice);
            self.results.record(&self.code, notice);
        }
    }

    /// Current snapshot, or `None` before `start`
    pub fn current_state(&self) -> Result<Option<MatchSnapshot>, SessionError> {
        let gate = self.lock()?;
        Ok(gate.game.as_ref().map(Match::snapshot))
    }

    pub fn action_seq(&self) -> u64 {
        self.action_seq.load(Ordering::SeqCst)
    }

    /// Whether the match is still accepting actions
    pub fn is_live(&self) -> bool {
        match self.gate.lock() {
            Ok(gate) => {
                gate.unusable.is_none() && gate.game.as_ref().map_or(true, |g| !g.is_over())
            }
            Err(_) => false,
        }
    }

    /// End the match early; `Ok(false)` if it was already over
    pub fn end(&self, reason: EndReason) -> Result<bool, SessionError> {
        let mut gate = self.lock()?;
        let game = gate.game.as_mut().ok_or(SessionError::NotStarted)?;
        if !game.end(reason) {
            return Ok(false);
        }
        self.action_seq.fetch_add(1, Ordering::SeqCst);
        let snapshot = game.snapshot();
        let notice = game.end_notice();

        self.emit(&snapshot, None, notice.as_ref());
        Ok(true)
    }
}
