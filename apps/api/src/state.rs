use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::TextGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// `None` when DATABASE_URL is unset; submissions then skip persistence.
    pub db: Option<PgPool>,
    /// Hosted inference with optional local fallback.
    pub llm: Arc<dyn TextGenerator>,
    pub config: Config,
}
