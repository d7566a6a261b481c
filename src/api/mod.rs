//! REST API endpoints.
//!
//! Axum-based HTTP API over the tournament service: roster, matchdays,
//! results, recovery, standings and the knockout bracket.

pub mod routes;
pub mod state;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::guard::GuardError;
use crate::phase::PhaseError;
use crate::models::ResultError;
use crate::tournament::ServiceError;

pub use routes::build_router;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The request is valid but the tournament is not in a state that allows it.
    #[error("{message}")]
    Conflict { code: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Conflict {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND".to_string()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST".to_string()),
            ApiError::Conflict { code, .. } => (StatusCode::CONFLICT, code.clone()),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR".to_string(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code,
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::Storage(_) => {
                tracing::error!("Storage failure: {}", message);
                ApiError::Internal(message)
            }
            ServiceError::MatchNotFound(_) | ServiceError::Guard(GuardError::MatchNotFound(_)) => {
                ApiError::NotFound(message)
            }
            ServiceError::InvalidPlayerName
            | ServiceError::Guard(GuardError::InvalidScore(_))
            | ServiceError::Match(ResultError::InvalidScore(_))
            | ServiceError::Phase(PhaseError::InvalidScore(_)) => ApiError::BadRequest(message),
            ServiceError::Guard(GuardError::NotInRecovery(_)) => {
                ApiError::conflict("not_in_recovery", message)
            }
            ServiceError::Guard(GuardError::NoResultToRestore(_)) => {
                ApiError::conflict("no_result_to_restore", message)
            }
            ServiceError::Match(ResultError::InRecovery(_)) => {
                ApiError::conflict("match_in_recovery", message)
            }
            ServiceError::Match(ResultError::InvalidTransition { .. }) => {
                ApiError::conflict("invalid_transition", message)
            }
            ServiceError::WrongPhase { .. } => ApiError::conflict("wrong_phase", message),
            ServiceError::IncompleteRoundRobin => {
                ApiError::conflict("incomplete_previous_round", message)
            }
            ServiceError::Phase(PhaseError::NotEnoughPlayers { .. }) => {
                ApiError::conflict("not_enough_players", message)
            }
            ServiceError::Phase(_) => ApiError::conflict("invalid_bracket_state", message),
        }
    }
}
