//! Post-processing for chat completions: pull the assistant's turn out of an echoed
//! completion, then split it into display blocks.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::prompts::TurnMarkers;

/// Returns the assistant's reply from a raw completion.
///
/// Without `marker` in the text the completion is returned as-is (trimmed). Otherwise
/// the reply is the text after the first marker, cut at the next line that starts
/// with the marker again.
pub fn extract_assistant_reply(raw_completion: &str, marker: &str) -> String {
    if marker.is_empty() {
        return raw_completion.trim().to_string();
    }
    let Some(start) = raw_completion.find(marker) else {
        return raw_completion.trim().to_string();
    };

    let after = &raw_completion[start + marker.len()..];
    let next_turn = format!("\n{marker}");
    let reply = match after.find(&next_turn) {
        Some(end) => &after[..end],
        None => after,
    };
    reply.trim().to_string()
}

/// Returns the assistant's reply from a continuation of a chat prompt (no echo).
///
/// The continuation already is the assistant's turn; it ends where the model starts
/// writing a further turn of its own. A leading assistant marker is dropped.
pub fn cut_at_next_turn(continuation: &str, markers: &TurnMarkers) -> String {
    let text = continuation.trim_start();
    let text = match markers.assistant.as_str() {
        "" => text,
        marker => text.strip_prefix(marker).unwrap_or(text).trim_start(),
    };

    let end = [markers.user.as_str(), markers.assistant.as_str()]
        .into_iter()
        .filter(|marker| !marker.is_empty())
        .filter_map(|marker| {
            if text.starts_with(marker) {
                Some(0)
            } else {
                text.find(&format!("\n{marker}"))
            }
        })
        .min()
        .unwrap_or(text.len());

    text[..end].trim().to_string()
}

/// A display block of a chat reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyBlock {
    pub heading: Option<String>,
    pub body: String,
}

fn heading_pattern() -> &'static Regex {
    static HEADING: OnceLock<Regex> = OnceLock::new();
    HEADING.get_or_init(|| {
        Regex::new(r"^#{1,6}\s+(?:\*\*)?(.+?)(?:\*\*)?\s*#*\s*$").expect("heading regex is valid")
    })
}

/// Splits a reply at markdown headings. Text before the first heading becomes a
/// block without a heading. Runs of blank lines collapse to one paragraph break.
pub fn format_reply(text: &str) -> Vec<ReplyBlock> {
    let mut blocks = Vec::new();
    let mut heading: Option<String> = None;
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines().map(str::trim_end) {
        if let Some(caps) = heading_pattern().captures(line.trim_start()) {
            close_paragraph(&mut paragraphs, &mut current);
            push_block(&mut blocks, heading.take(), &mut paragraphs);
            heading = Some(caps[1].trim().to_string());
        } else if line.trim().is_empty() {
            close_paragraph(&mut paragraphs, &mut current);
        } else {
            current.push(line);
        }
    }
    close_paragraph(&mut paragraphs, &mut current);
    push_block(&mut blocks, heading, &mut paragraphs);

    blocks
}

fn close_paragraph(paragraphs: &mut Vec<String>, current: &mut Vec<&str>) {
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
        current.clear();
    }
}

fn push_block(blocks: &mut Vec<ReplyBlock>, heading: Option<String>, paragraphs: &mut Vec<String>) {
    let body = std::mem::take(paragraphs).join("\n\n").trim().to_string();
    if heading.is_some() || !body.is_empty() {
        blocks.push(ReplyBlock { heading, body });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_without_marker_is_unchanged() {
        assert_eq!(extract_assistant_reply("Hello there", "User:"), "Hello there");
    }

    #[test]
    fn test_reply_between_markers() {
        let raw = "...\nUser: What skills?\nI recommend networking.\nUser: thanks";
        assert_eq!(
            extract_assistant_reply(raw, "User:"),
            "What skills?\nI recommend networking."
        );
    }

    #[test]
    fn test_reply_after_single_marker_runs_to_end() {
        let raw = "prompt text\n<|user|>  Tell me more about PMP.  \n";
        assert_eq!(
            extract_assistant_reply(raw, "<|user|>"),
            "Tell me more about PMP."
        );
    }

    #[test]
    fn test_inline_marker_does_not_terminate_reply() {
        // Only a marker at the start of a line ends the reply.
        let raw = "User: Start. Then User: inline.\nUser: next";
        assert_eq!(extract_assistant_reply(raw, "User:"), "Start. Then User: inline.");
    }

    #[test]
    fn test_empty_marker_returns_trimmed_input() {
        assert_eq!(extract_assistant_reply("  text \n", ""), "text");
    }

    #[test]
    fn test_continuation_is_cut_at_invented_user_turn() {
        let raw = "Focus on platform roles and get a CKA.\n<|user|> thanks!\n<|assistant|> You're welcome.";
        assert_eq!(
            cut_at_next_turn(raw, &TurnMarkers::private()),
            "Focus on platform roles and get a CKA."
        );
    }

    #[test]
    fn test_continuation_is_cut_at_whichever_marker_comes_first() {
        let raw = "Update your CV.\nCareer Coach: Also network.\nUser: ok";
        assert_eq!(cut_at_next_turn(raw, &TurnMarkers::legacy()), "Update your CV.");
    }

    #[test]
    fn test_continuation_drops_leading_assistant_marker() {
        let raw = " <|assistant|> Try mock interviews.";
        assert_eq!(
            cut_at_next_turn(raw, &TurnMarkers::private()),
            "Try mock interviews."
        );
    }

    #[test]
    fn test_continuation_opening_with_user_turn_is_empty() {
        let raw = "<|user|> what next?";
        assert_eq!(cut_at_next_turn(raw, &TurnMarkers::private()), "");
    }

    #[test]
    fn test_plain_continuation_is_trimmed() {
        assert_eq!(
            cut_at_next_turn("\n  Keep learning Rust.  \n", &TurnMarkers::private()),
            "Keep learning Rust."
        );
    }

    #[test]
    fn test_format_reply_splits_on_headings() {
        let reply = "Great question.\n\n### Networking\nGo to meetups.\n\n\nFollow up.\n## **Certifications**\nConsider AWS.";
        let blocks = format_reply(reply);
        assert_eq!(
            blocks,
            vec![
                ReplyBlock {
                    heading: None,
                    body: "Great question.".to_string()
                },
                ReplyBlock {
                    heading: Some("Networking".to_string()),
                    body: "Go to meetups.\n\nFollow up.".to_string()
                },
                ReplyBlock {
                    heading: Some("Certifications".to_string()),
                    body: "Consider AWS.".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_format_reply_plain_text_is_one_block() {
        let blocks = format_reply("Line one\nLine two");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].heading, None);
        assert_eq!(blocks[0].body, "Line one\nLine two");
    }

    #[test]
    fn test_format_reply_ignores_hash_without_space() {
        let blocks = format_reply("#hashtag is not a heading");
        assert_eq!(blocks[0].heading, None);
    }

    #[test]
    fn test_format_reply_empty_input() {
        assert!(format_reply("  \n\n").is_empty());
    }
}
