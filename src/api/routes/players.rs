use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::Player;

#[derive(Debug, Serialize)]
pub struct PlayerListResponse {
    pub players: Vec<Player>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct RegisterPlayerRequest {
    pub name: String,
}

pub async fn list_players(State(state): State<AppState>) -> Json<PlayerListResponse> {
    let mut players = state.tournament.players().await;
    players.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    Json(PlayerListResponse {
        count: players.len(),
        players,
    })
}

pub async fn register_player(
    State(state): State<AppState>,
    Json(req): Json<RegisterPlayerRequest>,
) -> Result<(StatusCode, Json<Player>), ApiError> {
    let player = state.tournament.register_player(&req.name).await?;
    Ok((StatusCode::CREATED, Json(player)))
}
