pub mod bracket;
pub mod matchdays;
pub mod matches;
pub mod players;
pub mod standings;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            tracing::warn!("Invalid CORS origin {:?}, allowing any origin", origin);
            layer.allow_origin(Any)
        }
    }
}

/// All API routes under `/api`.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.cors_origin);

    let api = Router::new()
        .route("/health", get(health))
        .route(
            "/players",
            get(players::list_players).post(players::register_player),
        )
        .route("/matches", get(matches::list_matches))
        .route("/matches/:id/confirm", post(matches::confirm_match))
        .route("/matches/:id/result", post(matches::record_result))
        .route("/matches/:id/recover", post(matches::recover_match))
        .route("/matchdays", post(matchdays::generate_matchday))
        .route("/matchdays/:number/freeze", post(matchdays::freeze_matchday))
        .route("/standings", get(standings::get_standings))
        .route("/phase", get(standings::get_phase))
        .route(
            "/bracket",
            get(bracket::get_bracket).post(bracket::seed_bracket),
        );

    Router::new()
        .nest("/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::util::ServiceExt;

    use crate::api::state::AppState;
    use crate::config::{BracketConfig, SchedulerConfig};
    use crate::storage::MemoryStore;
    use crate::tournament::TournamentService;

    pub async fn test_state() -> AppState {
        let service = TournamentService::open(
            std::sync::Arc::new(MemoryStore::new()),
            SchedulerConfig::default(),
            BracketConfig::default(),
        )
        .await
        .unwrap();
        AppState::new(service, "*")
    }

    /// State with `n` registered players.
    pub async fn league_state(n: usize) -> AppState {
        let state = test_state().await;
        for i in 0..n {
            state
                .tournament
                .register_player(&format!("Player {:02}", i))
                .await
                .unwrap();
        }
        state
    }

    pub async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn post_json(app: axum::Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }
}
