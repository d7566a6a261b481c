use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{BracketMatch, BracketStatus, Team};

/// A bracket match with its derived status.
#[derive(Debug, Serialize)]
pub struct BracketMatchView {
    #[serde(flatten)]
    pub inner: BracketMatch,
    pub status: BracketStatus,
}

#[derive(Debug, Serialize)]
pub struct BracketResponse {
    pub phase: &'static str,
    pub matches: Vec<BracketMatchView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub champions: Option<Team>,
}

fn bracket_view(phase: &'static str, bracket: Vec<BracketMatch>) -> BracketResponse {
    let champions = bracket
        .iter()
        .find(|m| m.is_final())
        .and_then(|m| m.winner().cloned());
    let matches = bracket
        .into_iter()
        .map(|m| BracketMatchView {
            status: m.status(),
            inner: m,
        })
        .collect();
    BracketResponse {
        phase,
        matches,
        champions,
    }
}

pub async fn get_bracket(State(state): State<AppState>) -> Json<BracketResponse> {
    let phase = state.tournament.phase().await;
    let bracket = state.tournament.bracket().await;
    Json(bracket_view(phase.name(), bracket))
}

pub async fn seed_bracket(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<BracketResponse>), ApiError> {
    let bracket = state.tournament.close_round_robin_and_seed_bracket().await?;
    let phase = state.tournament.phase().await;
    Ok((StatusCode::CREATED, Json(bracket_view(phase.name(), bracket))))
}
