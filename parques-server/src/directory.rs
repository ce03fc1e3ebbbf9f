//! Session directory: the explicit registry of live matches
//!
//! Lookups hold the directory lock only long enough to clone an `Arc`; the
//! per-match gate inside [`MatchSession`] does the serializing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use parques_core::{
    ChaChaDice, DiceRoller, EndReason, MatchConfig, MatchObserver, MatchSession, MatchSnapshot,
    PlayerId, ResultsSink, RosterEntry, SessionError, SubmitOutcome,
};
use rand::Rng;
use serde_json::Value;
use tracing::info;

/// Length of a match code
pub const CODE_LEN: usize = 6;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Builds the dice source for each new match
pub type DiceFactory = Box<dyn Fn() -> Box<dyn DiceRoller> + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("match {0} not found")]
    NotFound(String),

    #[error("player {0} is already seated in match {1}")]
    PlayerBusy(PlayerId, String),

    #[error("invalid match config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Random match code from `A-Z0-9`
pub fn generate_code(rng: &mut impl Rng) -> String {
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

pub struct SessionDirectory {
    sessions: RwLock<HashMap<String, Arc<MatchSession>>>,
    players: RwLock<HashMap<PlayerId, String>>,
    default_config: MatchConfig,
    observer: Arc<dyn MatchObserver>,
    results: Arc<dyn ResultsSink>,
    dice: DiceFactory,
    next_id: AtomicU64,
}

impl SessionDirectory {
    pub fn new(
        default_config: MatchConfig,
        observer: Arc<dyn MatchObserver>,
        results: Arc<dyn ResultsSink>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            players: RwLock::new(HashMap::new()),
            default_config,
            observer,
            results,
            dice: Box::new(|| Box::new(ChaChaDice::from_entropy())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Replace the dice source used for matches created from now on
    pub fn with_dice(mut self, dice: DiceFactory) -> Self {
        self.dice = dice;
        self
    }

    pub fn default_config(&self) -> &MatchConfig {
        &self.default_config
    }

    /// Start a match for `roster` under a fresh code
    pub fn create(
        &self,
        roster: Vec<RosterEntry>,
        config: Option<MatchConfig>,
    ) -> Result<(Arc<MatchSession>, MatchSnapshot), DirectoryError> {
        let config = config.unwrap_or_else(|| self.default_config.clone());
        config
            .validate()
            .map_err(|e| DirectoryError::InvalidConfig(e.to_string()))?;

        // both maps stay locked until the new match is registered, so two
        // creates cannot seat the same player twice
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let mut players = self.players.write().unwrap_or_else(PoisonError::into_inner);
        for entry in &roster {
            if let Some(code) = players.get(&entry.id) {
                if sessions.get(code).map_or(false, |s| s.is_live()) {
                    return Err(DirectoryError::PlayerBusy(entry.id.clone(), code.clone()));
                }
            }
        }

        let ids: Vec<PlayerId> = roster.iter().map(|e| e.id.clone()).collect();
        let id = format!("match-{}", self.next_id.fetch_add(1, Ordering::Relaxed));

        let mut rng = rand::thread_rng();
        let code = loop {
            let code = generate_code(&mut rng);
            if !sessions.contains_key(&code) {
                break code;
            }
        };

        let session = Arc::new(MatchSession::new(
            id,
            code.clone(),
            config,
            (self.dice)(),
            self.observer.clone(),
            self.results.clone(),
        ));
        let snapshot = session.start(roster)?;
        sessions.insert(code.clone(), session.clone());
        for player in ids {
            players.insert(player, code.clone());
        }
        let active = sessions.len();
        drop(players);
        drop(sessions);

        info!(code = %code, active, "match registered");
        Ok((session, snapshot))
    }

    pub fn get(&self, code: &str) -> Option<Arc<MatchSession>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(code)
            .cloned()
    }

    /// The match `player` was last seated in
    pub fn session_for_player(&self, player: &PlayerId) -> Option<Arc<MatchSession>> {
        let code = self
            .players
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(player)
            .cloned()?;
        self.get(&code)
    }

    pub fn remove(&self, code: &str) -> Option<Arc<MatchSession>> {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(code)?;
        self.players
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, c| c != code);
        info!(code, "match removed");
        Some(removed)
    }

    /// Registered codes, sorted
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        codes.sort();
        codes
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn require(&self, code: &str) -> Result<Arc<MatchSession>, DirectoryError> {
        self.get(code)
            .ok_or_else(|| DirectoryError::NotFound(code.to_string()))
    }

    /// Route a transport action to its match, waiting on the match gate
    pub fn submit(
        &self,
        code: &str,
        player: &PlayerId,
        kind: &str,
        payload: &Value,
    ) -> Result<SubmitOutcome, DirectoryError> {
        let outcome = self.require(code)?.submit_request(player, kind, payload)?;
        self.retire_if_finished(code, &outcome);
        Ok(outcome)
    }

    /// Route a transport action to its match, failing with `Busy` instead of waiting
    pub fn try_submit(
        &self,
        code: &str,
        player: &PlayerId,
        kind: &str,
        payload: &Value,
    ) -> Result<SubmitOutcome, DirectoryError> {
        let outcome = self.require(code)?.try_submit_request(player, kind, payload)?;
        self.retire_if_finished(code, &outcome);
        Ok(outcome)
    }

    pub fn submit_timeout(&self, code: &str, expected_seq: u64) -> Result<Option<SubmitOutcome>, DirectoryError> {
        let outcome = self.require(code)?.submit_timeout(expected_seq)?;
        if let Some(outcome) = &outcome {
            self.retire_if_finished(code, outcome);
        }
        Ok(outcome)
    }

    /// A won match has already published its results; drop it from the maps
    fn retire_if_finished(&self, code: &str, outcome: &SubmitOutcome) {
        if outcome.accepted && outcome.finished {
            self.remove(code);
        }
    }

    pub fn end(&self, code: &str, reason: EndReason) -> Result<bool, DirectoryError> {
        Ok(self.require(code)?.end(reason)?)
    }
}
