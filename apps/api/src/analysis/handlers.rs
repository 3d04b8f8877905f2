//! Axum route handlers for questionnaire submission and analysis retrieval.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::analysis::prompts::build_analysis_prompt;
use crate::analysis::report::render_report;
use crate::analysis::sections::{sectionize, SectionedAnalysis};
use crate::chat::transcript::ChatTranscript;
use crate::errors::AppError;
use crate::questionnaire::answers::AnswerSet;
use crate::questionnaire::questions::{Question, QUESTIONS};
use crate::questionnaire::store::{
    fetch_questionnaire, list_questionnaires, spawn_save, upsert_analysis, StoredQuestionnaire,
    Submission,
};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub email: Option<String>,
    pub answers: AnswerSet,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub questionnaire_id: Uuid,
    pub backend: String,
    pub analysis: SectionedAnalysis,
    /// Fresh conversation for the follow-up chat, seeded with a greeting.
    pub transcript: ChatTranscript,
}

#[derive(Debug, Deserialize)]
pub struct SectionizeRequest {
    pub raw_text: String,
}

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/questions
pub async fn handle_list_questions() -> Json<&'static [Question]> {
    Json(QUESTIONS)
}

/// POST /api/v1/questionnaires
///
/// Builds the analysis prompt, calls inference, and splits the result into sections.
/// Persistence (when configured) happens in the background and never fails the request.
pub async fn handle_submit(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    let questionnaire_id = Uuid::new_v4();
    let (analysis, backend) = analyze(&state, questionnaire_id, &request.answers).await?;

    if let Some(pool) = &state.db {
        spawn_save(
            pool.clone(),
            Submission {
                questionnaire_id,
                email: request.email.filter(|e| !e.trim().is_empty()),
                answers: request.answers,
                analysis: analysis.clone(),
                backend: backend.clone(),
            },
        );
    }

    Ok(Json(SubmitResponse {
        questionnaire_id,
        backend,
        analysis,
        transcript: ChatTranscript::seeded(),
    }))
}

/// GET /api/v1/questionnaires?limit=N
///
/// Stored questionnaires with their analyses, newest first.
pub async fn handle_list_questionnaires(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<StoredQuestionnaire>>, AppError> {
    let pool = state.db.as_ref().ok_or(AppError::PersistenceDisabled)?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    Ok(Json(list_questionnaires(pool, limit).await?))
}

/// POST /api/v1/questionnaires/:id/analysis
///
/// Re-runs the analysis for stored answers and replaces the stored analysis.
pub async fn handle_regenerate_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StoredQuestionnaire>, AppError> {
    let pool = state.db.as_ref().ok_or(AppError::PersistenceDisabled)?;
    let stored = load(&state, id).await?;
    let (analysis, backend) = analyze(&state, id, &stored.answers).await?;

    upsert_analysis(pool, id, &analysis, &backend).await?;

    Ok(Json(StoredQuestionnaire {
        analysis: Some(analysis),
        backend: Some(backend),
        analyzed_at: Some(Utc::now()),
        ..stored
    }))
}

/// POST /api/v1/analysis/sectionize
///
/// Splits arbitrary generated text into sections. Never fails.
pub async fn handle_sectionize(Json(request): Json<SectionizeRequest>) -> Json<SectionedAnalysis> {
    Json(sectionize(&request.raw_text))
}

/// GET /api/v1/questionnaires/:id
pub async fn handle_get_questionnaire(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StoredQuestionnaire>, AppError> {
    Ok(Json(load(&state, id).await?))
}

/// GET /api/v1/questionnaires/:id/report
///
/// Returns the analysis as a downloadable Markdown report.
pub async fn handle_get_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let stored = load(&state, id).await?;
    let analysis = stored
        .analysis
        .ok_or_else(|| AppError::NotFound(format!("No analysis for questionnaire {id}")))?;

    let report = render_report(&analysis, Utc::now().date_naive());
    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"career-analysis-report.md\"",
            ),
        ],
        report,
    ))
}

/// Prompt, inference and sectioning for one answer set. Returns the analysis and the
/// name of the backend that produced it.
async fn analyze(
    state: &AppState,
    questionnaire_id: Uuid,
    answers: &AnswerSet,
) -> Result<(SectionedAnalysis, String), AppError> {
    if !answers.has_content() {
        return Err(AppError::Validation(
            "answers must contain at least one non-empty answer".to_string(),
        ));
    }

    let prompt = build_analysis_prompt(answers);
    let generation = state
        .llm
        .generate(&prompt, &state.config.generation)
        .await
        .map_err(|e| AppError::Llm(format!("Analysis generation failed: {e}")))?;

    let analysis = sectionize(generation.continuation(&prompt));
    info!(
        "Analysis for questionnaire {} via {}: {} section(s){}",
        questionnaire_id,
        generation.backend,
        analysis.sections.len(),
        if analysis.is_unparsed() { " (unparsed)" } else { "" }
    );

    Ok((analysis, generation.backend))
}

async fn load(state: &AppState, id: Uuid) -> Result<StoredQuestionnaire, AppError> {
    let pool = state.db.as_ref().ok_or(AppError::PersistenceDisabled)?;
    fetch_questionnaire(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Questionnaire {id} not found")))
}
