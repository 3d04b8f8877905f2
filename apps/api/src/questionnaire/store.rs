//! Persistence of finalized submissions.
//!
//! Saving never blocks the user-facing flow: `spawn_save` runs the insert on its own
//! task and only logs a failure. Each questionnaire has at most one analysis;
//! regenerating replaces it.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::sections::SectionedAnalysis;
use crate::models::questionnaire::QuestionnaireRow;
use crate::questionnaire::answers::AnswerSet;

/// A submitted questionnaire together with the analysis generated for it.
#[derive(Debug, Clone)]
pub struct Submission {
    pub questionnaire_id: Uuid,
    pub email: Option<String>,
    pub answers: AnswerSet,
    pub analysis: SectionedAnalysis,
    pub backend: String,
}

/// A stored questionnaire as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct StoredQuestionnaire {
    pub id: Uuid,
    pub email: Option<String>,
    pub answers: AnswerSet,
    pub analysis: Option<SectionedAnalysis>,
    pub backend: Option<String>,
    pub created_at: DateTime<Utc>,
    pub analyzed_at: Option<DateTime<Utc>>,
}

const UPSERT_ANALYSIS: &str = r#"
    INSERT INTO analyses (id, questionnaire_id, raw_text, sections, backend)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT (questionnaire_id) DO UPDATE
    SET raw_text = EXCLUDED.raw_text,
        sections = EXCLUDED.sections,
        backend = EXCLUDED.backend,
        created_at = now()
"#;

const SELECT_WITH_ANALYSIS: &str = r#"
    SELECT q.id, q.email, q.answers, q.created_at,
           a.raw_text, a.sections, a.backend, a.created_at AS analyzed_at
    FROM questionnaires q
    LEFT JOIN analyses a ON a.questionnaire_id = q.id
"#;

/// Inserts the questionnaire and its analysis in one transaction.
pub async fn save_submission(pool: &PgPool, submission: &Submission) -> Result<()> {
    let answers = serde_json::to_value(&submission.answers).context("serialize answers")?;
    let sections =
        serde_json::to_value(&submission.analysis.sections).context("serialize sections")?;

    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO questionnaires (id, email, answers) VALUES ($1, $2, $3)")
        .bind(submission.questionnaire_id)
        .bind(&submission.email)
        .bind(&answers)
        .execute(&mut *tx)
        .await?;

    sqlx::query(UPSERT_ANALYSIS)
        .bind(Uuid::new_v4())
        .bind(submission.questionnaire_id)
        .bind(&submission.analysis.raw_text)
        .bind(&sections)
        .bind(&submission.backend)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Saves in the background. Failures are logged and dropped.
pub fn spawn_save(pool: PgPool, submission: Submission) {
    tokio::spawn(async move {
        match save_submission(&pool, &submission).await {
            Ok(()) => info!("Saved questionnaire {}", submission.questionnaire_id),
            Err(e) => warn!(
                "Failed to save questionnaire {}: {e:#}",
                submission.questionnaire_id
            ),
        }
    });
}

/// Stores a freshly generated analysis, replacing any earlier one.
pub async fn upsert_analysis(
    pool: &PgPool,
    questionnaire_id: Uuid,
    analysis: &SectionedAnalysis,
    backend: &str,
) -> Result<()> {
    let sections = serde_json::to_value(&analysis.sections).context("serialize sections")?;

    sqlx::query(UPSERT_ANALYSIS)
        .bind(Uuid::new_v4())
        .bind(questionnaire_id)
        .bind(&analysis.raw_text)
        .bind(&sections)
        .bind(backend)
        .execute(pool)
        .await
        .context("Failed to store analysis")?;

    Ok(())
}

/// Loads a questionnaire and its analysis, if any.
pub async fn fetch_questionnaire(pool: &PgPool, id: Uuid) -> Result<Option<StoredQuestionnaire>> {
    let query = format!("{SELECT_WITH_ANALYSIS} WHERE q.id = $1");
    sqlx::query_as::<_, QuestionnaireRow>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(into_stored)
        .transpose()
}

/// Most recent questionnaires first, at most `limit`.
pub async fn list_questionnaires(pool: &PgPool, limit: i64) -> Result<Vec<StoredQuestionnaire>> {
    let query = format!("{SELECT_WITH_ANALYSIS} ORDER BY q.created_at DESC LIMIT $1");
    sqlx::query_as::<_, QuestionnaireRow>(&query)
        .bind(limit)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(into_stored)
        .collect()
}

fn into_stored(row: QuestionnaireRow) -> Result<StoredQuestionnaire> {
    let answers: AnswerSet =
        serde_json::from_value(row.answers).context("stored answers are malformed")?;

    let analysis = match (row.raw_text, row.sections) {
        (Some(raw_text), Some(sections)) => Some(SectionedAnalysis {
            raw_text,
            sections: serde_json::from_value(sections)
                .context("stored sections are malformed")?,
        }),
        _ => None,
    };

    Ok(StoredQuestionnaire {
        id: row.id,
        email: row.email,
        answers,
        analysis,
        backend: row.backend,
        created_at: row.created_at,
        analyzed_at: row.analyzed_at,
    })
}
