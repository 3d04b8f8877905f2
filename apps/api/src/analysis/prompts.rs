//! Prompt construction for the career analysis and the follow-up chat.
//!
//! Both builders are pure: the same inputs always render the same string, and
//! user-supplied text is embedded verbatim (no escaping).

use tracing::warn;

use crate::analysis::sections::SectionId;
use crate::chat::transcript::{ChatMessage, ChatRole};
use crate::llm_client::prompts::{CHAT_GUIDELINES, COACH_PERSONA};
use crate::questionnaire::answers::AnswerSet;

/// Analysis prompt template. Fill `{persona}` and `{topics}` first, `{profile}` last.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"{persona}
Please analyze the following information about this individual and provide detailed, actionable advice.

## User Profile Information:
{profile}

## Instructions:
Provide a comprehensive career analysis with the following sections. Start each section on its own line with its numbered heading exactly as written below, followed by the content of that section.

{topics}

Write in a clear, professional tone. Be specific and personalized to their situation rather than generic. Focus on actionable advice that they can implement immediately."#;

/// Role labels that delimit conversation turns in a chat prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnMarkers {
    pub user: String,
    pub assistant: String,
}

impl TurnMarkers {
    /// Control-token style markers that ordinary user text does not contain.
    pub fn private() -> Self {
        Self {
            user: "<|user|>".to_string(),
            assistant: "<|assistant|>".to_string(),
        }
    }

    /// Plain-text markers. Collide with any user text containing "User:".
    pub fn legacy() -> Self {
        Self {
            user: "User:".to_string(),
            assistant: "Career Coach:".to_string(),
        }
    }

    fn label(&self, role: ChatRole) -> &str {
        match role {
            ChatRole::User => &self.user,
            ChatRole::Assistant => &self.assistant,
        }
    }

    /// True if `text` contains either marker, which would confuse reply extraction.
    pub fn collides_with(&self, text: &str) -> bool {
        text.contains(&self.user) || text.contains(&self.assistant)
    }
}

impl Default for TurnMarkers {
    fn default() -> Self {
        Self::private()
    }
}

/// Turns a question id into a label: `current_role` → `Current Role`.
pub fn humanize_label(question_id: &str) -> String {
    question_id
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders the non-empty answers as `**Label**: answer` lines.
pub fn render_profile(answers: &AnswerSet) -> String {
    answers
        .ordered()
        .into_iter()
        .map(|(id, answer)| format!("**{}**: {}", humanize_label(id), answer))
        .collect::<Vec<_>>()
        .join("\n")
}

fn topic_instruction(id: SectionId) -> &'static str {
    match id {
        SectionId::ProfessionalProfile => {
            "A concise summary of their background, experience, and career goals."
        }
        SectionId::KeyStrengths => {
            "3-5 key strengths and unique selling points that make them stand out in their field."
        }
        SectionId::AreasForDevelopment => {
            "3-4 specific areas where they could develop further to enhance their career prospects."
        }
        SectionId::CvRecommendations => {
            "Actionable advice on improving their CV/resume to better showcase their skills and experience."
        }
        SectionId::JobSearchStrategy => {
            "Specific job titles to target and strategies for finding opportunities."
        }
        SectionId::AdditionalSkills => {
            "Additional skills, certifications, or further education that would strengthen their profile."
        }
        SectionId::General => "",
    }
}

/// Builds the prompt that requests the six-part career analysis.
pub fn build_analysis_prompt(answers: &AnswerSet) -> String {
    let topics = SectionId::TOPICS
        .iter()
        .enumerate()
        .map(|(i, id)| format!("{}. {}\n{}", i + 1, id.title(), topic_instruction(*id)))
        .collect::<Vec<_>>()
        .join("\n\n");

    // Profile goes in last so answer text is never scanned for placeholders.
    ANALYSIS_PROMPT_TEMPLATE
        .replace("{persona}", COACH_PERSONA)
        .replace("{topics}", &topics)
        .replace("{profile}", &render_profile(answers))
}

/// Builds the follow-up chat prompt: profile, optional prior analysis, prior turns,
/// then the new message under a final user marker and an assistant cue.
pub fn build_chat_prompt(
    message: &str,
    history: &[ChatMessage],
    profile_text: &str,
    prior_analysis: Option<&str>,
    markers: &TurnMarkers,
) -> String {
    let collisions = history
        .iter()
        .map(|m| m.content.as_str())
        .chain([message, profile_text])
        .filter(|text| markers.collides_with(text))
        .count();
    if collisions > 0 {
        warn!(
            "{} chat prompt block(s) contain the turn marker {:?}; reply extraction may mis-split",
            collisions, markers.user
        );
    }

    let mut prompt = format!(
        "{COACH_PERSONA}\nYou are having a conversation with a user about their career. \
         Be helpful, specific, and provide actionable advice.\n\n\
         ## User Profile Information:\n{profile_text}\n"
    );

    if let Some(analysis) = prior_analysis.map(str::trim).filter(|a| !a.is_empty()) {
        prompt.push_str(&format!("\n## Career Analysis Already Provided:\n{analysis}\n"));
    }

    prompt.push_str(&format!("\n## Instructions:\n{CHAT_GUIDELINES}\n"));

    if !history.is_empty() {
        prompt.push_str("\n## Previous Conversation:\n");
        for turn in history {
            prompt.push_str(&format!("{} {}\n", markers.label(turn.role), turn.content));
        }
    }

    prompt.push_str(&format!(
        "\n{} {}\n{}",
        markers.user,
        message.trim(),
        markers.assistant
    ));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_answers() -> AnswerSet {
        AnswerSet::from([
            ("current_role", "Backend developer at a logistics firm"),
            ("years_experience", "seven"),
            ("key_skills", "Go, Kafka, Terraform"),
            ("education", ""),
            ("career_goals", "Move into platform engineering"),
        ])
    }

    #[test]
    fn test_humanize_label() {
        assert_eq!(humanize_label("current_role"), "Current Role");
        assert_eq!(humanize_label("cv-challenges"), "Cv Challenges");
        assert_eq!(humanize_label("  soft  skills "), "Soft Skills");
        assert_eq!(humanize_label("gpa"), "Gpa");
    }

    #[test]
    fn test_render_profile_skips_empty_answers() {
        let profile = render_profile(&sample_answers());
        assert!(profile.starts_with("**Current Role**: Backend developer at a logistics firm\n"));
        assert!(profile.contains("**Years Experience**: seven"));
        assert!(!profile.contains("Education"));
        assert_eq!(profile.lines().count(), 4);
    }

    #[test]
    fn test_analysis_prompt_contains_each_answer_once() {
        let answers = sample_answers();
        let prompt = build_analysis_prompt(&answers);
        for (_, answer) in answers.ordered() {
            assert_eq!(prompt.matches(answer).count(), 1, "answer {answer:?}");
        }
    }

    #[test]
    fn test_analysis_prompt_lists_topics_in_order() {
        let prompt = build_analysis_prompt(&sample_answers());
        let positions: Vec<usize> = SectionId::TOPICS
            .iter()
            .enumerate()
            .map(|(i, id)| {
                prompt
                    .find(&format!("{}. {}", i + 1, id.title()))
                    .unwrap_or_else(|| panic!("missing topic {}", id.title()))
            })
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(!prompt.contains("{profile}"));
        assert!(!prompt.contains("{topics}"));
    }

    #[test]
    fn test_analysis_prompt_is_stable() {
        let answers = sample_answers();
        assert_eq!(build_analysis_prompt(&answers), build_analysis_prompt(&answers));
    }

    #[test]
    fn test_answer_with_placeholder_text_is_embedded_verbatim() {
        let answers = AnswerSet::from([("current_role", "Writer of {topics} templates")]);
        let prompt = build_analysis_prompt(&answers);
        assert!(prompt.contains("**Current Role**: Writer of {topics} templates"));
    }

    #[test]
    fn test_chat_prompt_orders_turns_and_ends_with_new_message() {
        let history = vec![
            ChatMessage::assistant("What would you like to know?"),
            ChatMessage::user("Should I learn Rust?"),
            ChatMessage::assistant("Yes, for systems roles."),
        ];
        let markers = TurnMarkers::legacy();
        let prompt = build_chat_prompt(
            "  And for data roles?  ",
            &history,
            "**Current Role**: Analyst",
            Some("1. Summary\nAnalyst with SQL depth."),
            &markers,
        );

        let first = prompt.find("Career Coach: What would you like to know?").unwrap();
        let second = prompt.find("User: Should I learn Rust?").unwrap();
        let third = prompt.find("Career Coach: Yes, for systems roles.").unwrap();
        assert!(first < second && second < third);
        assert!(prompt.contains("Analyst with SQL depth."));
        assert!(prompt.contains("**Current Role**: Analyst"));
        assert!(prompt.ends_with("User: And for data roles?\nCareer Coach:"));
    }

    #[test]
    fn test_chat_prompt_omits_blank_prior_analysis_and_empty_history() {
        let prompt = build_chat_prompt("Hi", &[], "profile", Some("   "), &TurnMarkers::private());
        assert!(!prompt.contains("Career Analysis Already Provided"));
        assert!(!prompt.contains("Previous Conversation"));
        assert!(prompt.ends_with("<|user|> Hi\n<|assistant|>"));
    }

    #[test]
    fn test_marker_collision_detection() {
        let legacy = TurnMarkers::legacy();
        assert!(legacy.collides_with("My manager said User: is the prefix"));
        assert!(!legacy.collides_with("I am a user of many tools"));
        assert!(!TurnMarkers::private().collides_with("User: hello"));
        assert_eq!(TurnMarkers::default(), TurnMarkers::private());
    }
}
