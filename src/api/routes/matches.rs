use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{MatchId, MatchPhase, MatchResult, MatchScore, MatchStatus};

#[derive(Debug, Deserialize)]
pub struct ListMatchesParams {
    pub matchday: Option<u32>,
    pub phase: Option<MatchPhase>,
    pub status: Option<MatchStatus>,
}

#[derive(Debug, Serialize)]
pub struct MatchListResponse {
    pub matches: Vec<MatchResult>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct RecoverRequest {
    /// Late result; omitted to restore the score held before the freeze
    #[serde(default)]
    pub score: Option<MatchScore>,
}

#[derive(Debug, Serialize)]
pub struct RecoverResponse {
    pub updated: Vec<MatchResult>,
    pub matchday_unfrozen: bool,
}

pub async fn list_matches(
    State(state): State<AppState>,
    Query(params): Query<ListMatchesParams>,
) -> Json<MatchListResponse> {
    let mut matches = state.tournament.matches().await;
    matches.retain(|m| {
        params.matchday.map_or(true, |d| m.matchday_number == d)
            && params.phase.map_or(true, |p| m.phase == p)
            && params.status.map_or(true, |s| m.status == s)
    });
    matches.sort_by(|a, b| {
        a.matchday_number
            .cmp(&b.matchday_number)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    Json(MatchListResponse {
        count: matches.len(),
        matches,
    })
}

pub async fn confirm_match(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MatchResult>, ApiError> {
    let updated = state.tournament.confirm_match(&MatchId::from(id)).await?;
    Ok(Json(updated))
}

pub async fn record_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(score): Json<MatchScore>,
) -> Result<Json<MatchResult>, ApiError> {
    let updated = state
        .tournament
        .record_result(&MatchId::from(id), score)
        .await?;
    Ok(Json(updated))
}

pub async fn recover_match(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RecoverRequest>,
) -> Result<Json<RecoverResponse>, ApiError> {
    let resolution = state
        .tournament
        .resolve_recovery_match(&MatchId::from(id), req.score)
        .await?;
    Ok(Json(RecoverResponse {
        updated: resolution.updated,
        matchday_unfrozen: resolution.matchday_unfrozen,
    }))
}
