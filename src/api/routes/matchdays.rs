use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::guard::FreezeOutcome;
use crate::models::MatchResult;
use crate::schedule::{GenerationOutcome, GenerationRejection};

#[derive(Debug, Serialize)]
pub struct MatchdayResponse {
    pub matchday_number: u32,
    pub matches: Vec<MatchResult>,
}

#[derive(Debug, Serialize)]
pub struct FreezeResponse {
    pub matchday_number: u32,
    pub frozen: Vec<MatchResult>,
}

fn rejection_message(reason: GenerationRejection) -> &'static str {
    match reason {
        GenerationRejection::NotEnoughPlayers => "At least 4 players are needed for a matchday",
        GenerationRejection::IncompletePreviousRound => {
            "The previous matchday still has matches without a result"
        }
        GenerationRejection::RoundRobinComplete => "The round-robin is complete",
    }
}

pub async fn generate_matchday(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<MatchdayResponse>), ApiError> {
    match state.tournament.generate_next_matchday().await? {
        GenerationOutcome::Created {
            matchday_number,
            matches,
        } => Ok((
            StatusCode::CREATED,
            Json(MatchdayResponse {
                matchday_number,
                matches,
            }),
        )),
        GenerationOutcome::Rejected(reason) => Err(ApiError::conflict(
            reason.code(),
            rejection_message(reason),
        )),
    }
}

pub async fn freeze_matchday(
    State(state): State<AppState>,
    Path(number): Path<u32>,
) -> Result<Json<FreezeResponse>, ApiError> {
    match state.tournament.freeze_matchday(number).await? {
        FreezeOutcome::Frozen(frozen) => Ok(Json(FreezeResponse {
            matchday_number: number,
            frozen,
        })),
        FreezeOutcome::Rejected(reason) => Err(ApiError::conflict(
            reason.to_string(),
            format!("Matchday {} cannot be frozen: {}", number, reason),
        )),
    }
}
