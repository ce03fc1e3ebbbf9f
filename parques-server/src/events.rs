//! Outbound event fan-out and results recording

use parques_core::{MatchEndNotice, MatchObserver, MatchSnapshot, ResultsSink, TurnStartNotice};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{error, info};

/// Everything a connected client may need to hear about
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MatchEvent {
    State {
        code: String,
        snapshot: Box<MatchSnapshot>,
    },
    TurnStart {
        code: String,
        notice: TurnStartNotice,
    },
    MatchEnd {
        code: String,
        notice: MatchEndNotice,
    },
    Fault {
        code: String,
        message: String,
    },
}

impl MatchEvent {
    pub fn code(&self) -> &str {
        match self {
            MatchEvent::State { code, .. }
            | MatchEvent::TurnStart { code, .. }
            | MatchEvent::MatchEnd { code, .. }
            | MatchEvent::Fault { code, .. } => code,
        }
    }
}

/// Publishes match events on a broadcast channel shared by every match
pub struct BroadcastObserver {
    tx: broadcast::Sender<MatchEvent>,
}

impl BroadcastObserver {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MatchEvent> {
        self.tx.subscribe()
    }

    fn publish(&self, event: MatchEvent) {
        // no subscribers is fine
        let _ = self.tx.send(event);
    }
}

impl MatchObserver for BroadcastObserver {
    fn on_state(&self, code: &str, snapshot: &MatchSnapshot) {
        self.publish(MatchEvent::State {
            code: code.to_string(),
            snapshot: Box::new(snapshot.clone()),
        });
    }

    fn on_turn_start(&self, code: &str, notice: &TurnStartNotice) {
        self.publish(MatchEvent::TurnStart {
            code: code.to_string(),
            notice: notice.clone(),
        });
    }

    fn on_match_end(&self, code: &str, notice: &MatchEndNotice) {
        self.publish(MatchEvent::MatchEnd {
            code: code.to_string(),
            notice: notice.clone(),
        });
    }

    fn on_fault(&self, code: &str, message: &str) {
        error!(code, message, "match fault");
        self.publish(MatchEvent::Fault {
            code: code.to_string(),
            message: message.to_string(),
        });
    }
}

/// Writes final results to the log
#[derive(Clone, Copy, Debug, Default)]
pub struct LogResultsSink;

impl ResultsSink for LogResultsSink {
    fn record(&self, code: &str, notice: &MatchEndNotice) {
        let winner = notice
            .winner_id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "none".to_string());
        let rankings = serde_json::to_string(&notice.rankings).unwrap_or_default();
        info!(code, %winner, reason = ?notice.reason, turns = notice.turns, %rankings, "match results");
    }
}
