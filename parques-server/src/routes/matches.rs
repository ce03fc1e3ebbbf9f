//! Match API endpoints
//!
//! Create matches from a roster, submit actions, read snapshots, cancel.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use parques_core::{MatchConfig, MatchSnapshot, PlayerId, RosterEntry, SubmitOutcome};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::error::ApiError;
use crate::directory::DirectoryError;
use crate::state::ServerState;

#[derive(Deserialize)]
pub struct CreateMatchRequest {
    pub players: Vec<RosterEntry>,
    #[serde(default)]
    pub config: Option<MatchConfig>,
}

#[derive(Serialize)]
pub struct CreateMatchResponse {
    pub code: String,
    pub state: MatchSnapshot,
}

#[derive(Serialize)]
pub struct MatchListResponse {
    pub matches: Vec<String>,
}

#[derive(Deserialize)]
pub struct ActionRequest {
    pub player_id: PlayerId,
    pub action: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<MatchSnapshot>,
}

/// Start a match for a finalized roster
pub async fn create_match(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<CreateMatchRequest>,
) -> Result<(StatusCode, Json<CreateMatchResponse>), ApiError> {
    let snapshot = state.create_match(req.players, req.config)?;
    Ok((
        StatusCode::CREATED,
        Json(CreateMatchResponse {
            code: snapshot.code.clone(),
            state: snapshot,
        }),
    ))
}

/// List active match codes
pub async fn list_matches(State(state): State<Arc<ServerState>>) -> Json<MatchListResponse> {
    Json(MatchListResponse {
        matches: state.directory.codes(),
    })
}

/// Current snapshot of one match
pub async fn get_match(
    State(state): State<Arc<ServerState>>,
    Path(code): Path<String>,
) -> Result<Json<MatchSnapshot>, ApiError> {
    let session = state
        .directory
        .get(&code)
        .ok_or_else(|| ApiError::not_found(format!("match {} not found", code)))?;
    let snapshot = session
        .current_state()
        .map_err(DirectoryError::from)?
        .ok_or_else(|| ApiError::not_found(format!("match {} has not started", code)))?;
    Ok(Json(snapshot))
}

/// Submit one action; rejections come back as `accepted: false`
pub async fn submit_action(
    State(state): State<Arc<ServerState>>,
    Path(code): Path<String>,
    Json(req): Json<ActionRequest>,
) -> Result<Json<SubmitOutcome>, ApiError> {
    if req.action.is_empty() {
        return Err(ApiError::bad_request("missing action"));
    }
    let outcome = state.submit(&code, &req.player_id, &req.action, &req.payload)?;
    Ok(Json(outcome))
}

/// Cancel a match and remove it
pub async fn cancel_match(
    State(state): State<Arc<ServerState>>,
    Path(code): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    let snapshot = state.cancel_match(&code)?;
    Ok(Json(CancelResponse {
        cancelled: true,
        state: snapshot,
    }))
}
