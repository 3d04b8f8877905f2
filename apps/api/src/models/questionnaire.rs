use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A questionnaire joined with its analysis. Analysis columns are `NULL` when none
/// has been generated yet.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuestionnaireRow {
    pub id: Uuid,
    pub email: Option<String>,
    pub answers: Value,
    pub created_at: DateTime<Utc>,
    pub raw_text: Option<String>,
    pub sections: Option<Value>,
    pub backend: Option<String>,
    pub analyzed_at: Option<DateTime<Utc>>,
}
