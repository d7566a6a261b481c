use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::guard::frozen_matchdays;
use crate::models::StandingRow;
use crate::phase::TournamentPhase;

#[derive(Debug, Serialize)]
pub struct StandingsResponse {
    pub standings: Vec<StandingRow>,
    /// Matchdays left out of the table until recovered
    pub frozen_matchdays: Vec<u32>,
}

pub async fn get_standings(State(state): State<AppState>) -> Json<StandingsResponse> {
    let standings = state.tournament.standings().await;
    let frozen = frozen_matchdays(&state.tournament.matches().await);
    Json(StandingsResponse {
        standings,
        frozen_matchdays: frozen.into_iter().collect(),
    })
}

pub async fn get_phase(State(state): State<AppState>) -> Json<TournamentPhase> {
    Json(state.tournament.phase().await)
}
