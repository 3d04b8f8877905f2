//! Axum route handler for the follow-up chat.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::analysis::prompts::{build_chat_prompt, render_profile, TurnMarkers};
use crate::analysis::reply::{cut_at_next_turn, extract_assistant_reply, format_reply, ReplyBlock};
use crate::chat::transcript::{ChatMessage, ChatTranscript};
use crate::errors::AppError;
use crate::llm_client::Generation;
use crate::questionnaire::answers::AnswerSet;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    #[serde(default)]
    pub answers: AnswerSet,
    /// Raw text of the analysis shown to the user, if any.
    #[serde(default)]
    pub analysis: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The full conversation: supplied history, the new user message, and the reply.
    pub transcript: ChatTranscript,
    /// The reply split into display blocks. Empty when the reply failed.
    pub blocks: Vec<ReplyBlock>,
}

/// POST /api/v1/chat
///
/// An inference failure is not an HTTP error: the reply is an assistant message
/// flagged `is_error`, so the conversation can continue.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("message cannot be empty".to_string()));
    }

    let markers = &state.config.turn_markers;
    let mut transcript = ChatTranscript::from_history(request.history);
    let prompt = build_chat_prompt(
        message,
        transcript.messages(),
        &render_profile(&request.answers),
        request.analysis.as_deref(),
        markers,
    );
    transcript.push(ChatMessage::user(message));

    let params = &state.config.generation;
    let reply = match state.llm.generate(&prompt, params).await {
        Ok(generation) => {
            Some(reply_text(&generation, &prompt, params.return_full_text, markers))
                .filter(|r| !r.is_empty())
        }
        Err(e) => {
            error!("Chat generation failed: {e}");
            None
        }
    };

    let blocks = match reply {
        Some(reply) => {
            let blocks = format_reply(&reply);
            transcript.push(ChatMessage::assistant(reply));
            blocks
        }
        None => {
            transcript.push(ChatMessage::assistant_error());
            Vec::new()
        }
    };

    Ok(Json(ChatResponse { transcript, blocks }))
}

/// Picks the assistant's turn out of a completion. A continuation (no echo, or an
/// echo that starts with the exact prompt) ends at the next turn the model invents.
/// An echo that does not match the prompt falls back to marker extraction.
fn reply_text(
    generation: &Generation,
    prompt: &str,
    echoed: bool,
    markers: &TurnMarkers,
) -> String {
    if !echoed || generation.text.starts_with(prompt) {
        cut_at_next_turn(generation.continuation(prompt), markers)
    } else {
        extract_assistant_reply(&generation.text, &markers.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generation(text: &str) -> Generation {
        Generation {
            text: text.to_string(),
            backend: "hf".to_string(),
        }
    }

    #[test]
    fn test_echoed_prompt_is_stripped_before_cutting() {
        let markers = TurnMarkers::private();
        let prompt = "persona\n<|user|> How do I switch teams?\n<|assistant|>";
        let completion = format!("{prompt} Talk to your manager.\n<|user|> ok");
        assert_eq!(
            reply_text(&generation(&completion), prompt, true, &markers),
            "Talk to your manager."
        );
    }

    #[test]
    fn test_unmatched_echo_uses_marker_extraction() {
        let markers = TurnMarkers::legacy();
        let completion = "reformatted prompt\nUser: Build a portfolio.";
        assert_eq!(
            reply_text(&generation(completion), "original prompt", true, &markers),
            "Build a portfolio."
        );
    }
}
