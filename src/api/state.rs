use std::sync::Arc;

use crate::tournament::TournamentService;

#[derive(Clone)]
pub struct AppState {
    pub tournament: Arc<TournamentService>,
    /// Allowed CORS origin, `*` for any
    pub cors_origin: String,
}

impl AppState {
    pub fn new(tournament: TournamentService, cors_origin: impl Into<String>) -> Self {
        Self {
            tournament: Arc::new(tournament),
            cors_origin: cors_origin.into(),
        }
    }
}
