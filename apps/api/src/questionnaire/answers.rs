//! Answer set — question id → free-text answer, collected step by step.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::questionnaire::questions::catalog_position;

/// The user's answers. Answers are trimmed on the way in and, once recorded,
/// never overwritten: the set only grows until it is submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>")]
pub struct AnswerSet(BTreeMap<String, String>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an answer. Returns `false` (and changes nothing) if the question
    /// was already answered.
    pub fn record(&mut self, question_id: impl Into<String>, answer: &str) -> bool {
        let question_id = question_id.into();
        if self.0.contains_key(&question_id) {
            return false;
        }
        self.0.insert(question_id, answer.trim().to_string());
        true
    }

    /// True when at least one answer has content.
    pub fn has_content(&self) -> bool {
        self.0.values().any(|a| !a.is_empty())
    }

    /// Non-empty answers in rendering order: catalog questions first, in catalog
    /// order, then any other ids alphabetically.
    pub fn ordered(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .0
            .iter()
            .filter(|(_, answer)| !answer.is_empty())
            .map(|(id, answer)| (id.as_str(), answer.as_str()))
            .collect();
        entries.sort_by_key(|(id, _)| (catalog_position(id).unwrap_or(usize::MAX), *id));
        entries
    }
}

impl From<BTreeMap<String, String>> for AnswerSet {
    fn from(raw: BTreeMap<String, String>) -> Self {
        let mut set = AnswerSet::new();
        for (id, answer) in raw {
            set.record(id, &answer);
        }
        set
    }
}

impl<const N: usize> From<[(&str, &str); N]> for AnswerSet {
    fn from(pairs: [(&str, &str); N]) -> Self {
        let mut set = AnswerSet::new();
        for (id, answer) in pairs {
            set.record(id, answer);
        }
        set
    }
}
