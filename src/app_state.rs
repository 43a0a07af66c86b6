use std::sync::Arc;

use crate::services::{engine::TranscriptionEngine, session::SessionStore};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: TranscriptionEngine,
    pub session: Arc<SessionStore>,
}

impl AppState {
    pub fn new(engine: TranscriptionEngine, session: SessionStore) -> Self {
        Self {
            engine,
            session: Arc::new(session),
        }
    }
}
