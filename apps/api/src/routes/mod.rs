pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::chat::handlers::handle_chat;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Questionnaire + analysis
        .route("/api/v1/questions", get(handlers::handle_list_questions))
        .route(
            "/api/v1/questionnaires",
            get(handlers::handle_list_questionnaires).post(handlers::handle_submit),
        )
        .route(
            "/api/v1/questionnaires/:id",
            get(handlers::handle_get_questionnaire),
        )
        .route(
            "/api/v1/questionnaires/:id/analysis",
            post(handlers::handle_regenerate_analysis),
        )
        .route(
            "/api/v1/questionnaires/:id/report",
            get(handlers::handle_get_report),
        )
        .route(
            "/api/v1/analysis/sectionize",
            post(handlers::handle_sectionize),
        )
        // Follow-up chat
        .route("/api/v1/chat", post(handle_chat))
        .with_state(state)
}
