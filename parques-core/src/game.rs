//! Match state machine
//!
//! A [`Match`] owns every pawn and the turn record of one game. All mutation
//! goes through [`Match::apply`]: the phase/owner guard runs once, the handler
//! runs on a copy, the copy is validated, and only then is it committed. A
//! rejected action therefore never leaves a trace.

use std::cmp::Reverse;

use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::action::{Action, ActionKind};
use crate::board::{BoardGeometry, Cell};
use crate::config::{CapturePolicy, MatchConfig};
use crate::dice::{Dice, DiceRoller, DieSource, TurnPhase, TurnState, TRIPLE_DOUBLES};
use crate::error::{ActionError, RejectReason, SessionError};
use crate::moves::{legal_moves, LegalMove};
use crate::pawn::{Location, PawnArena, PawnId, Seat};
use crate::player::{Player, PlayerId, RosterEntry};
use crate::snapshot::{
    EndReason, MatchEndNotice, MatchSnapshot, MatchStatus, PlayerView, Ranking, TurnStartNotice,
};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Non-double rolls allowed per turn while every pawn is in prison
const MAX_PRISON_ATTEMPTS: u8 = 3;

/// Score per finished pawn
const POINTS_PER_FINISHED_PAWN: u32 = 100;

// ============================================================================
// CORE TYPES
// ============================================================================

/// What an accepted action did
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionOutcome {
    pub kind: ActionKind,
    pub roll: Option<Dice>,
    pub captured: Vec<(Seat, PawnId)>,
    pub released: usize,
    /// Pawn sent to the goal by the triple-doubles rule
    pub promoted: Option<PawnId>,
    /// Pawn sent to prison for skipping a capture
    pub penalized: Option<PawnId>,
    /// A player (possibly the same one, for a bonus roll) now has to roll
    pub turn_started: bool,
    pub match_ended: bool,
}

impl ActionOutcome {
    fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            roll: None,
            captured: Vec::new(),
            released: 0,
            promoted: None,
            penalized: None,
            turn_started: false,
            match_ended: false,
        }
    }
}

/// Authoritative state of one match (clone to mutate)
#[derive(Clone, Debug)]
pub struct Match {
    id: String,
    code: String,
    config: MatchConfig,
    geometry: &'static BoardGeometry,
    status: MatchStatus,
    players: Vec<Player>,
    seats: FxHashMap<PlayerId, Seat>,
    current_seat: Seat,
    turn_number: u32,
    turn: TurnState,
    pawns: PawnArena,
    legal_moves: Vec<LegalMove>,
    must_capture: bool,
    prison_attempts: Vec<u8>,
    winner: Option<Seat>,
    end_reason: Option<EndReason>,
}

impl Match {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Seat the roster in join order with every pawn in prison
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        config: MatchConfig,
        roster: Vec<RosterEntry>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let min = config.min_players;
        let max = config.max_players();
        if roster.len() < min || roster.len() > max {
            return Err(SessionError::PlayerCount {
                count: roster.len(),
                min,
                max,
            });
        }

        let mut seats = FxHashMap::default();
        let mut players = Vec::with_capacity(roster.len());
        for (seat, entry) in roster.into_iter().enumerate() {
            if seats.insert(entry.id.clone(), seat).is_some() {
                return Err(SessionError::DuplicatePlayer(entry.id));
            }
            players.push(Player::from_roster(entry, seat));
        }

        let seat_count = players.len();
        Ok(Self {
            id: id.into(),
            code: code.into(),
            geometry: config.variant.geometry(),
            pawns: PawnArena::new(seat_count, config.pawns_per_player),
            config,
            status: MatchStatus::Waiting,
            players,
            seats,
            current_seat: 0,
            turn_number: 1,
            turn: TurnState::new(),
            legal_moves: Vec::new(),
            must_capture: false,
            prison_attempts: vec![0; seat_count],
            winner: None,
            end_reason: None,
        })
    }

    /// Move from `Waiting` to `Playing`; false if already started or over
    pub fn start(&mut self) -> bool {
        if self.status != MatchStatus::Waiting {
            return false;
        }
        self.status = MatchStatus::Playing;
        info!(
            code = %self.code,
            players = self.players.len(),
            variant = ?self.config.variant,
            "match started"
        );
        true
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn geometry(&self) -> &'static BoardGeometry {
        self.geometry
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn seat_of(&self, player: &PlayerId) -> Option<Seat> {
        self.seats.get(player).copied()
    }

    pub fn current_seat(&self) -> Seat {
        self.current_seat
    }

    pub fn current_player(&self) -> &Player {
        &self.players[self.current_seat]
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    pub fn turn(&self) -> &TurnState {
        &self.turn
    }

    pub fn pawns(&self) -> &PawnArena {
        &self.pawns
    }

    pub fn legal_moves(&self) -> &[LegalMove] {
        &self.legal_moves
    }

    pub fn must_capture(&self) -> bool {
        self.must_capture
    }

    pub fn prison_attempts(&self, seat: Seat) -> u8 {
        self.prison_attempts[seat]
    }

    pub fn winner(&self) -> Option<&Player> {
        self.winner.map(|seat| &self.players[seat])
    }

    pub fn is_over(&self) -> bool {
        matches!(self.status, MatchStatus::Finished | MatchStatus::Cancelled)
    }

    /// Action kinds the acting player may submit right now
    pub fn legal_actions(&self) -> Vec<ActionKind> {
        if self.status != MatchStatus::Playing {
            return Vec::new();
        }
        match self.turn.phase {
            TurnPhase::AwaitingRoll => vec![ActionKind::RollDice],
            TurnPhase::AwaitingPrisonExit => {
                let mut actions = vec![ActionKind::ExitPrison];
                if self.turn.rolled {
                    actions.push(ActionKind::Pass);
                }
                actions
            }
            TurnPhase::AwaitingMove => {
                let mut actions = Vec::with_capacity(2);
                if !self.legal_moves.is_empty() {
                    actions.push(ActionKind::MovePawn);
                }
                if self.pass_allowed() {
                    actions.push(ActionKind::Pass);
                }
                actions
            }
        }
    }

    fn pass_allowed(&self) -> bool {
        !(self.must_capture && self.config.rules.capture_policy == CapturePolicy::Mandatory)
    }

    /// Action a turn timer submits on behalf of the acting player
    pub fn timeout_action(&self) -> Option<Action> {
        if self.status != MatchStatus::Playing {
            return None;
        }
        match self.turn.phase {
            TurnPhase::AwaitingRoll => Some(Action::RollDice),
            TurnPhase::AwaitingPrisonExit => Some(Action::ExitPrison),
            TurnPhase::AwaitingMove if self.pass_allowed() => Some(Action::Pass),
            TurnPhase::AwaitingMove => self
                .legal_moves
                .iter()
                .find(|m| m.can_capture)
                .map(|m| Action::MovePawn {
                    pawn_id: m.pawn_id,
                    target: m.target,
                    source: Some(m.source),
                }),
        }
    }

    // ========================================================================
    // APPLY ACTION
    // ========================================================================

    /// Validate and apply one action as a single transaction
    pub fn apply(
        &mut self,
        player: &PlayerId,
        action: &Action,
        dice: &mut dyn DiceRoller,
    ) -> Result<ActionOutcome, ActionError> {
        let seat = self
            .seat_of(player)
            .ok_or_else(|| ActionError::UnknownPlayer(player.clone()))?;
        self.guard(seat, action.kind())?;

        let mut next = self.clone();
        let outcome = next.dispatch(seat, action, dice)?;
        next.check_invariants()?;
        next.check_progress(self)?;
        *self = next;

        debug!(
            code = %self.code,
            player = %player,
            action = action.kind().as_str(),
            phase = ?self.turn.phase,
            "action applied"
        );
        Ok(outcome)
    }

    /// The single phase/owner check run before any handler
    fn guard(&self, seat: Seat, kind: ActionKind) -> Result<(), RejectReason> {
        if self.status != MatchStatus::Playing {
            return Err(RejectReason::MatchNotPlaying);
        }
        if seat != self.current_seat {
            return Err(RejectReason::NotYourTurn);
        }
        if self.legal_actions().contains(&kind) {
            return Ok(());
        }
        Err(match (kind, self.turn.phase) {
            (ActionKind::Pass, TurnPhase::AwaitingMove) => RejectReason::MustCapture,
            (ActionKind::MovePawn, TurnPhase::AwaitingMove) => RejectReason::NoMatchingMove,
            _ => RejectReason::WrongPhase,
        })
    }

    fn dispatch(
        &mut self,
        seat: Seat,
        action: &Action,
        dice: &mut dyn DiceRoller,
    ) -> Result<ActionOutcome, ActionError> {
        match *action {
            Action::RollDice => self.roll_dice(seat, dice),
            Action::MovePawn {
                pawn_id,
                target,
                source,
            } => self.move_pawn(seat, pawn_id, target, source),
            Action::ExitPrison => self.exit_prison(seat),
            Action::Pass => self.pass_turn(seat),
        }
    }

    // ========================================================================
    // HANDLERS
    // ========================================================================

    fn roll_dice(&mut self, seat: Seat, dice: &mut dyn DiceRoller) -> Result<ActionOutcome, ActionError> {
        let roll = dice.roll();
        if !roll.is_valid() {
            return Err(ActionError::Invariant(format!("dice source produced {:?}", roll)));
        }

        let streak = self.turn.record_roll(roll);
        if roll.is_double() {
            self.players[seat].stats.doubles_rolled += 1;
        }
        debug!(code = %self.code, seat, d1 = roll.d1, d2 = roll.d2, streak, "dice rolled");

        let mut outcome = ActionOutcome::new(ActionKind::RollDice);
        outcome.roll = Some(roll);

        if streak >= TRIPLE_DOUBLES {
            if self.config.rules.enable_triple_double_bonus {
                outcome.promoted = self.promote_most_advanced(seat);
                if self.pawns.all_finished(seat) {
                    self.turn.reset();
                    self.finish(seat);
                    outcome.match_ended = true;
                    return Ok(outcome);
                }
            }
            self.end_turn();
            outcome.turn_started = true;
            return Ok(outcome);
        }

        if self.pawns.count_in_play(seat) == 0 && self.pawns.count_in_prison(seat) > 0 {
            if roll.is_double() {
                self.turn.phase = TurnPhase::AwaitingPrisonExit;
            } else {
                self.prison_attempts[seat] += 1;
                if self.prison_attempts[seat] >= MAX_PRISON_ATTEMPTS {
                    debug!(code = %self.code, seat, "prison attempts exhausted");
                    self.end_turn();
                    outcome.turn_started = true;
                } else {
                    self.turn.reset_for_reroll();
                }
            }
            return Ok(outcome);
        }

        self.refresh_legal_moves(seat);
        self.turn.phase = TurnPhase::AwaitingMove;
        Ok(outcome)
    }

    fn move_pawn(
        &mut self,
        seat: Seat,
        pawn_id: PawnId,
        target: Location,
        source: Option<DieSource>,
    ) -> Result<ActionOutcome, ActionError> {
        let mv = self
            .legal_moves
            .iter()
            .find(|m| m.pawn_id == pawn_id && m.target == target && source.map_or(true, |s| s == m.source))
            .copied()
            .ok_or(RejectReason::NoMatchingMove)?;

        let mut outcome = ActionOutcome::new(ActionKind::MovePawn);
        if let Some(cell) = mv.target.track_cell() {
            if self.geometry.capture_allowed(seat, cell) {
                outcome.captured = self.capture_at(seat, cell);
            }
        }

        let pawn = self.pawns.get_mut(seat, mv.pawn_id).ok_or_else(|| {
            ActionError::Invariant(format!("legal move references missing pawn {}", mv.pawn_id))
        })?;
        pawn.location = mv.target;
        self.turn.consume(mv.source);
        self.players[seat].stats.total_moves += 1;
        debug!(
            code = %self.code,
            seat,
            pawn = mv.pawn_id,
            target = ?mv.target,
            source = ?mv.source,
            "pawn moved"
        );

        if self.pawns.all_finished(seat) {
            self.finish(seat);
            outcome.match_ended = true;
            return Ok(outcome);
        }

        if self.turn.all_owed_consumed() {
            self.bonus_roll_or_end_turn();
            outcome.turn_started = true;
        } else {
            self.refresh_legal_moves(seat);
            if self.legal_moves.is_empty() {
                self.bonus_roll_or_end_turn();
                outcome.turn_started = true;
            }
        }
        Ok(outcome)
    }

    fn exit_prison(&mut self, seat: Seat) -> Result<ActionOutcome, ActionError> {
        let roll = self.turn.dice;
        if !self.turn.rolled || !roll.is_double() {
            return Err(RejectReason::NotADouble.into());
        }
        let in_prison = self.pawns.count_in_prison(seat);
        if in_prison == 0 {
            return Err(RejectReason::NoPawnsInPrison.into());
        }

        // 1-1 and 6-6 empty the prison, other doubles free two
        let count = if roll.d1 == 1 || roll.d1 == 6 {
            in_prison
        } else {
            in_prison.min(2)
        };

        let entry = self.geometry.entry_cell_of(seat);
        let mut outcome = ActionOutcome::new(ActionKind::ExitPrison);
        outcome.captured = self.capture_at(seat, entry);
        outcome.released = self.pawns.release_from_prison(seat, count, entry);
        self.prison_attempts[seat] = 0;
        info!(code = %self.code, seat, released = outcome.released, "pawns left prison");

        self.bonus_roll();
        outcome.turn_started = true;
        Ok(outcome)
    }

    fn pass_turn(&mut self, seat: Seat) -> Result<ActionOutcome, ActionError> {
        let mut outcome = ActionOutcome::new(ActionKind::Pass);

        if self.turn.phase == TurnPhase::AwaitingMove
            && self.must_capture
            && self.config.rules.capture_policy == CapturePolicy::Blow
        {
            outcome.penalized = self.blow(seat);
        }

        if self.turn.dice.is_double()
            && self.turn.any_consumed()
            && self.turn.consecutive_doubles < TRIPLE_DOUBLES
        {
            self.bonus_roll();
        } else {
            self.end_turn();
        }
        outcome.turn_started = true;
        Ok(outcome)
    }

    // ========================================================================
    // TURN FLOW
    // ========================================================================

    fn refresh_legal_moves(&mut self, seat: Seat) {
        let set = legal_moves(self.geometry, &self.config.rules, &self.pawns, seat, &self.turn);
        debug!(
            code = %self.code,
            seat,
            moves = set.moves.len(),
            must_capture = set.must_capture,
            "legal moves computed"
        );
        self.legal_moves = set.moves;
        self.must_capture = set.must_capture;
    }

    fn bonus_roll_or_end_turn(&mut self) {
        if self.turn.dice.is_double() && self.turn.consecutive_doubles < TRIPLE_DOUBLES {
            self.bonus_roll();
        } else {
            self.end_turn();
        }
    }

    /// Same player rolls again
    fn bonus_roll(&mut self) {
        self.turn.reset_for_reroll();
        self.legal_moves.clear();
        self.must_capture = false;
    }

    fn end_turn(&mut self) {
        self.turn.reset();
        self.legal_moves.clear();
        self.must_capture = false;
        self.prison_attempts[self.current_seat] = 0;
        self.current_seat = (self.current_seat + 1) % self.players.len();
        self.turn_number += 1;
    }

    fn capture_at(&mut self, seat: Seat, cell: Cell) -> Vec<(Seat, PawnId)> {
        let captured = self.pawns.imprison_enemies_at(seat, cell);
        if !captured.is_empty() {
            self.players[seat].stats.captures += captured.len() as u32;
            for &(victim, _) in &captured {
                self.players[victim].stats.captured_by += 1;
            }
            info!(code = %self.code, seat, cell, count = captured.len(), "capture");
        }
        captured
    }

    /// Triple doubles: the most advanced pawn goes straight to the goal
    fn promote_most_advanced(&mut self, seat: Seat) -> Option<PawnId> {
        let pawn_id = self
            .pawns
            .of_seat(seat)
            .iter()
            .filter(|p| !p.location.is_finished())
            .max_by_key(|p| (advancement(p.location), Reverse(p.id)))
            .map(|p| p.id)?;

        if let Some(pawn) = self.pawns.get_mut(seat, pawn_id) {
            pawn.location = Location::Finished;
        }
        info!(code = %self.code, seat, pawn = pawn_id, "third double in a row, pawn promoted");
        Some(pawn_id)
    }

    /// Skipped capture under the blow rule: the pawn that could capture is sent home
    fn blow(&mut self, seat: Seat) -> Option<PawnId> {
        let pawn_id = self.legal_moves.iter().find(|m| m.can_capture)?.pawn_id;
        let pawn = self.pawns.get_mut(seat, pawn_id)?;
        pawn.location = Location::InPrison;
        warn!(code = %self.code, seat, pawn = pawn_id, "capture skipped, pawn blown back to prison");
        Some(pawn_id)
    }

    fn finish(&mut self, winner: Seat) {
        self.status = MatchStatus::Finished;
        self.winner = Some(winner);
        self.end_reason = Some(EndReason::Completed);
        self.legal_moves.clear();
        self.must_capture = false;
        self.update_scores();
        info!(code = %self.code, winner = %self.players[winner].id, turns = self.turn_number, "match finished");
    }

    /// End the match from outside the rules; false if it is already over.
    ///
    /// `Cancelled`, `Timeout` and `Forfeit` all abandon the match with no
    /// winner and leave it `Cancelled`. `Completed` is reserved for a win on
    /// the board and is refused here.
    pub fn end(&mut self, reason: EndReason) -> bool {
        if self.is_over() || reason == EndReason::Completed {
            return false;
        }
        self.status = MatchStatus::Cancelled;
        self.end_reason = Some(reason);
        self.legal_moves.clear();
        self.must_capture = false;
        self.update_scores();
        info!(code = %self.code, reason = ?reason, "match ended early");
        true
    }

    fn update_scores(&mut self) {
        for player in self.players.iter_mut() {
            let finished = self.pawns.count_finished(player.seat) as u32;
            player.stats.pawns_finished = finished;
            player.score = finished * POINTS_PER_FINISHED_PAWN;
        }
    }

    // ========================================================================
    // INVARIANTS
    // ========================================================================

    /// Structural checks run on every candidate state before it is committed
    pub fn check_invariants(&self) -> Result<(), ActionError> {
        let fail = |msg: String| Err(ActionError::Invariant(msg));

        if self.players.is_empty() || self.current_seat >= self.players.len() {
            return fail(format!("current seat {} out of range", self.current_seat));
        }
        if self.pawns.seats() != self.players.len() {
            return fail(format!(
                "pawn arena has {} seats for {} players",
                self.pawns.seats(),
                self.players.len()
            ));
        }

        for seat in 0..self.players.len() {
            let entry = self.geometry.entry_cell_of(seat);
            let mut cells: Vec<Cell> = Vec::new();
            for (index, pawn) in self.pawns.of_seat(seat).iter().enumerate() {
                if pawn.seat != seat || pawn.id as usize != index {
                    return fail(format!("pawn slot {}/{} holds {:?}", seat, index, pawn));
                }
                match pawn.location {
                    Location::OnTrack { cell } if cell >= self.geometry.total_cells => {
                        return fail(format!("pawn {}/{} off the track at {}", seat, index, cell));
                    }
                    Location::OnTrack { cell } => cells.push(cell),
                    Location::InHomeStretch { step } if step >= self.geometry.final_step() => {
                        return fail(format!("pawn {}/{} past the goal at step {}", seat, index, step));
                    }
                    _ => {}
                }
            }
            cells.sort_unstable();
            if cells.windows(2).any(|w| w[0] == w[1] && w[0] != entry) {
                return fail(format!("seat {} stacks pawns outside its entry", seat));
            }
        }

        if !self.turn.rolled && self.turn.any_consumed() {
            return fail("dice consumed before a roll".to_string());
        }
        if self.turn.consecutive_doubles >= TRIPLE_DOUBLES {
            return fail("doubles streak was not reset".to_string());
        }
        for mv in &self.legal_moves {
            let in_play = self
                .pawns
                .get(self.current_seat, mv.pawn_id)
                .map(|p| p.location.is_in_play())
                .unwrap_or(false);
            if !in_play {
                return fail(format!("legal move references pawn {} not in play", mv.pawn_id));
            }
        }
        if self.must_capture != self.legal_moves.iter().any(|m| m.can_capture) {
            return fail("must_capture disagrees with the legal moves".to_string());
        }
        if self.status == MatchStatus::Finished {
            match self.winner {
                Some(seat) if self.pawns.all_finished(seat) => {}
                _ => return fail("finished match without a complete winner".to_string()),
            }
        }
        Ok(())
    }

    /// Checks against the previous committed state
    fn check_progress(&self, before: &Match) -> Result<(), ActionError> {
        for (old, new) in before.pawns.iter().zip(self.pawns.iter()) {
            if old.location.is_finished() && !new.location.is_finished() {
                return Err(ActionError::Invariant(format!(
                    "finished pawn {}/{} left the goal",
                    old.seat, old.id
                )));
            }
        }
        if self.turn_number < before.turn_number {
            return Err(ActionError::Invariant("turn number went backwards".to_string()));
        }
        Ok(())
    }

    // ========================================================================
    // VIEWS
    // ========================================================================

    pub fn snapshot(&self) -> MatchSnapshot {
        let players = self
            .players
            .iter()
            .map(|p| PlayerView {
                id: p.id.clone(),
                handle: p.handle.clone(),
                color: p.color,
                seat: p.seat,
                score: p.score,
                pawns: self.pawns.of_seat(p.seat).to_vec(),
                pawns_in_prison: self.pawns.count_in_prison(p.seat),
                pawns_finished: self.pawns.count_finished(p.seat),
                prison_attempts: self.prison_attempts[p.seat],
            })
            .collect();

        MatchSnapshot {
            id: self.id.clone(),
            code: self.code.clone(),
            status: self.status,
            variant: self.config.variant,
            turn_number: self.turn_number,
            current_player_id: (!self.is_over()).then(|| self.current_player().id.clone()),
            players,
            phase: self.turn.phase,
            dice: self.turn.dice,
            rolled: self.turn.rolled,
            consumed_dice: self.turn.consumed(),
            remaining_dice: self.turn.remaining_values(),
            consecutive_doubles: self.turn.consecutive_doubles,
            legal_moves: self.legal_moves.clone(),
            must_capture: self.must_capture,
            legal_actions: self.legal_actions(),
            winner_id: self.winner().map(|p| p.id.clone()),
        }
    }

    pub fn turn_start_notice(&self) -> Option<TurnStartNotice> {
        if self.status != MatchStatus::Playing {
            return None;
        }
        Some(TurnStartNotice {
            player_id: self.current_player().id.clone(),
            timeout_ms: self.config.turn_timeout_ms,
            legal_actions: self.legal_actions(),
        })
    }

    pub fn end_notice(&self) -> Option<MatchEndNotice> {
        let reason = self.end_reason?;
        Some(MatchEndNotice {
            winner_id: self.winner().map(|p| p.id.clone()),
            reason,
            turns: self.turn_number,
            rankings: self.rankings(),
        })
    }

    /// Winner first, then by score, then seat order
    pub fn rankings(&self) -> Vec<Ranking> {
        let mut order: Vec<&Player> = self.players.iter().collect();
        order.sort_by_key(|p| (Reverse(Some(p.seat) == self.winner), Reverse(p.score), p.seat));
        order
            .into_iter()
            .enumerate()
            .map(|(i, p)| Ranking {
                player_id: p.id.clone(),
                rank: i + 1,
                score: p.score,
                stats: p.stats,
            })
            .collect()
    }
}

/// Ordering key for "most advanced": home stretch, then track, then prison
fn advancement(location: Location) -> (u8, u8) {
    match location {
        Location::Finished => (3, 0),
        Location::InHomeStretch { step } => (2, step),
        Location::OnTrack { cell } => (1, cell),
        Location::InPrison => (0, 0),
    }
}

// ============================================================================
// TESTS
// ============================================================================
