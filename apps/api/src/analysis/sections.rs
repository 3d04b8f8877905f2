//! Response sectionizer — splits free-text model output into the fixed analysis sections.
//!
//! Matching is data-driven: an ordered table of `(SectionId, phrases)` is compiled into
//! one numbered-form and one standalone-heading regex per section. Lines are tested
//! top-to-bottom against the table, so the first section in `SectionId` order wins
//! when phrases overlap.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Section buckets of a career analysis. Declaration order is rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    ProfessionalProfile,
    KeyStrengths,
    AreasForDevelopment,
    CvRecommendations,
    JobSearchStrategy,
    AdditionalSkills,
    /// Holds the whole response when nothing could be split out.
    General,
}

impl SectionId {
    /// The six requested topics, in prompt and display order. Excludes `General`.
    pub const TOPICS: [SectionId; 6] = [
        SectionId::ProfessionalProfile,
        SectionId::KeyStrengths,
        SectionId::AreasForDevelopment,
        SectionId::CvRecommendations,
        SectionId::JobSearchStrategy,
        SectionId::AdditionalSkills,
    ];

    /// Display title. Every topic title is also a recognized header phrase, numbered
    /// or standalone.
    pub fn title(&self) -> &'static str {
        match self {
            SectionId::ProfessionalProfile => "Professional Profile",
            SectionId::KeyStrengths => "Key Strengths",
            SectionId::AreasForDevelopment => "Areas for Development",
            SectionId::CvRecommendations => "CV Recommendations",
            SectionId::JobSearchStrategy => "Job Search Strategy",
            SectionId::AdditionalSkills => "Additional Skills",
            SectionId::General => "General Analysis",
        }
    }
}

/// One row of the phrase table.
#[derive(Debug, Clone, Copy)]
pub struct SectionPhrases {
    pub id: SectionId,
    pub phrases: &'static [&'static str],
}

/// Built-in phrase table. Phrases are matched case-insensitively.
pub const DEFAULT_PHRASES: &[SectionPhrases] = &[
    SectionPhrases {
        id: SectionId::ProfessionalProfile,
        phrases: &["professional profile", "summary", "profile summary"],
    },
    SectionPhrases {
        id: SectionId::KeyStrengths,
        phrases: &[
            "key strengths",
            "strengths",
            "unique selling points",
            "selling points",
        ],
    },
    SectionPhrases {
        id: SectionId::AreasForDevelopment,
        phrases: &[
            "areas for development",
            "areas for professional development",
            "areas for",
            "professional development",
            "improvement areas",
            "weaknesses",
        ],
    },
    SectionPhrases {
        id: SectionId::CvRecommendations,
        phrases: &[
            "cv recommendations",
            "resume recommendations",
            "improving their cv",
            "cv/resume",
        ],
    },
    SectionPhrases {
        id: SectionId::JobSearchStrategy,
        phrases: &[
            "job search strategy",
            "potential roles",
            "target roles",
            "job search",
        ],
    },
    SectionPhrases {
        id: SectionId::AdditionalSkills,
        phrases: &[
            "additional skills",
            "certifications",
            "enhance their profile",
            "further education",
        ],
    },
];

/// Raw model output plus the sections extracted from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionedAnalysis {
    pub raw_text: String,
    pub sections: BTreeMap<SectionId, String>,
}

impl SectionedAnalysis {
    pub fn get(&self, id: SectionId) -> Option<&str> {
        self.sections.get(&id).map(String::as_str)
    }

    /// True when the text could not be split and everything landed in `general`.
    /// This is "unparsed but present", not a failure.
    pub fn is_unparsed(&self) -> bool {
        self.sections.len() == 1 && self.sections.contains_key(&SectionId::General)
    }
}

struct CompiledSection {
    id: SectionId,
    numbered: Regex,
    heading: Regex,
}

/// Compiled phrase table.
pub struct SectionMatcher {
    sections: Vec<CompiledSection>,
}

impl SectionMatcher {
    pub fn new(table: &[SectionPhrases]) -> Result<Self, regex::Error> {
        let sections = table
            .iter()
            .map(|row| -> Result<CompiledSection, regex::Error> {
                let alternation = row
                    .phrases
                    .iter()
                    .map(|p| regex::escape(p))
                    .collect::<Vec<_>>()
                    .join("|");
                Ok(CompiledSection {
                    id: row.id,
                    numbered: Regex::new(&format!(r"(?i)^\d+\.\s*(?:{alternation})"))?,
                    heading: Regex::new(&format!(r"(?i)^(?:{alternation})\s*:?\s*$"))?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { sections })
    }

    /// Matcher over `DEFAULT_PHRASES`, compiled once per process.
    pub fn default_matcher() -> &'static SectionMatcher {
        static MATCHER: OnceLock<SectionMatcher> = OnceLock::new();
        MATCHER.get_or_init(|| {
            SectionMatcher::new(DEFAULT_PHRASES).expect("built-in section phrases are valid regex")
        })
    }

    /// Returns the section a (trimmed, non-blank) line opens, if it is a header.
    pub fn match_header(&self, line: &str) -> Option<SectionId> {
        let candidate = strip_heading_decoration(line);
        self.sections
            .iter()
            .find(|s| s.numbered.is_match(candidate) || s.heading.is_match(candidate))
            .map(|s| s.id)
    }

    pub fn sectionize(&self, raw_text: &str) -> SectionedAnalysis {
        let mut sections = BTreeMap::new();
        let mut open: Option<SectionId> = None;
        let mut buffer: Vec<&str> = Vec::new();

        for line in raw_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match self.match_header(line) {
                Some(id) => {
                    flush(&mut sections, open, &mut buffer);
                    open = Some(id);
                }
                None => buffer.push(line),
            }
        }
        flush(&mut sections, open, &mut buffer);

        if sections.is_empty() {
            let trimmed = raw_text.trim();
            if !trimmed.is_empty() {
                sections.insert(SectionId::General, trimmed.to_string());
            }
        }

        SectionedAnalysis {
            raw_text: raw_text.to_string(),
            sections,
        }
    }
}

/// Splits `raw_text` with the built-in phrase table.
pub fn sectionize(raw_text: &str) -> SectionedAnalysis {
    SectionMatcher::default_matcher().sectionize(raw_text)
}

/// Closes the open buffer. Lines gathered before any header are dropped.
fn flush(
    sections: &mut BTreeMap<SectionId, String>,
    open: Option<SectionId>,
    buffer: &mut Vec<&str>,
) {
    let lines = std::mem::take(buffer);
    let Some(id) = open else {
        return;
    };
    let content = lines.join("\n").trim().to_string();
    if !content.is_empty() {
        // Repeated headers: last non-empty occurrence wins.
        sections.insert(id, content);
    }
}

/// Strips markdown heading markers (`### `) and bold wrapping (`**...**`, with the
/// colon inside or outside the bold).
fn strip_heading_decoration(line: &str) -> &str {
    let line = line.trim_start_matches('#').trim_start();
    let unwrapped = line.strip_suffix(':').unwrap_or(line).trim_end();
    match unwrapped
        .strip_prefix("**")
        .and_then(|l| l.strip_suffix("**"))
    {
        Some(inner) => inner.trim(),
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_without_headers_lands_in_general() {
        let raw = "  You have a solid background.\nKeep going.  \n";
        let analysis = sectionize(raw);
        assert_eq!(analysis.sections.len(), 1);
        assert_eq!(
            analysis.get(SectionId::General),
            Some("You have a solid background.\nKeep going.")
        );
        assert!(analysis.is_unparsed());
        assert_eq!(analysis.raw_text, raw);
    }

    #[test]
    fn test_empty_input_has_no_sections() {
        let analysis = sectionize("   \n\n ");
        assert!(analysis.sections.is_empty());
    }

    #[test]
    fn test_single_heading_with_colon() {
        let raw = "Key Strengths:\nLeadership under pressure.\n\nClear communication.";
        let analysis = sectionize(raw);
        assert_eq!(analysis.sections.len(), 1);
        assert_eq!(
            analysis.get(SectionId::KeyStrengths),
            Some("Leadership under pressure.\nClear communication.")
        );
        assert!(analysis.get(SectionId::General).is_none());
        assert!(!analysis.is_unparsed());
    }

    #[test]
    fn test_numbered_headers_split_sections() {
        let raw = "1. Professional Profile\nExperienced engineer.\n2. Key Strengths\nLeadership.\nTeamwork.";
        let analysis = sectionize(raw);
        assert_eq!(
            analysis.get(SectionId::ProfessionalProfile),
            Some("Experienced engineer.")
        );
        assert_eq!(
            analysis.get(SectionId::KeyStrengths),
            Some("Leadership.\nTeamwork.")
        );
        assert_eq!(analysis.sections.len(), 2);
    }

    #[test]
    fn test_numbered_header_matches_prefix_only() {
        let matcher = SectionMatcher::default_matcher();
        assert_eq!(
            matcher.match_header("3. Areas for Professional Development"),
            Some(SectionId::AreasForDevelopment)
        );
        assert_eq!(
            matcher.match_header("5. Job search strategy and potential roles to target"),
            Some(SectionId::JobSearchStrategy)
        );
    }

    #[test]
    fn test_heading_form_requires_phrase_alone() {
        let matcher = SectionMatcher::default_matcher();
        assert_eq!(matcher.match_header("Strengths"), Some(SectionId::KeyStrengths));
        assert_eq!(matcher.match_header("WEAKNESSES :"), Some(SectionId::AreasForDevelopment));
        assert_eq!(matcher.match_header("Your strengths include grit."), None);
        assert_eq!(matcher.match_header("Strengths are many"), None);
    }

    #[test]
    fn test_markdown_decorated_headings_match() {
        let matcher = SectionMatcher::default_matcher();
        assert_eq!(
            matcher.match_header("### CV Recommendations"),
            Some(SectionId::CvRecommendations)
        );
        assert_eq!(
            matcher.match_header("**Certifications:**"),
            Some(SectionId::AdditionalSkills)
        );
        assert_eq!(
            matcher.match_header("## **4. Resume recommendations**"),
            Some(SectionId::CvRecommendations)
        );
    }

    #[test]
    fn test_overlapping_phrases_first_section_wins() {
        // "summary" belongs to professional_profile; the table is scanned in order.
        let table = &[
            SectionPhrases {
                id: SectionId::ProfessionalProfile,
                phrases: &["overview"],
            },
            SectionPhrases {
                id: SectionId::KeyStrengths,
                phrases: &["overview"],
            },
        ];
        let matcher = SectionMatcher::new(table).unwrap();
        assert_eq!(
            matcher.match_header("Overview:"),
            Some(SectionId::ProfessionalProfile)
        );
    }

    #[test]
    fn test_lines_before_first_header_are_dropped() {
        let raw = "Here is your analysis.\nThanks for sharing.\nStrengths:\nResilience.";
        let analysis = sectionize(raw);
        assert_eq!(analysis.sections.len(), 1);
        assert_eq!(analysis.get(SectionId::KeyStrengths), Some("Resilience."));
    }

    #[test]
    fn test_repeated_header_last_write_wins() {
        let raw = "Strengths:\nFirst take.\nJob Search:\nApply widely.\nStrengths:\nSecond take.";
        let analysis = sectionize(raw);
        assert_eq!(analysis.get(SectionId::KeyStrengths), Some("Second take."));
        assert_eq!(analysis.get(SectionId::JobSearchStrategy), Some("Apply widely."));
    }

    #[test]
    fn test_empty_repeat_does_not_erase_earlier_content() {
        let raw = "Strengths:\nFirst take.\nStrengths:\nCertifications:\nAWS.";
        let analysis = sectionize(raw);
        assert_eq!(analysis.get(SectionId::KeyStrengths), Some("First take."));
        assert_eq!(analysis.get(SectionId::AdditionalSkills), Some("AWS."));
    }

    #[test]
    fn test_headers_without_content_fall_back_to_general() {
        let raw = "Key Strengths:\n\nJob Search:";
        let analysis = sectionize(raw);
        assert_eq!(analysis.sections.len(), 1);
        assert_eq!(analysis.get(SectionId::General), Some("Key Strengths:\n\nJob Search:"));
    }

    #[test]
    fn test_sections_iterate_in_fixed_order() {
        let raw = "Certifications:\nAWS.\nJob Search:\nNetwork.\nSummary:\nEngineer.";
        let analysis = sectionize(raw);
        let order: Vec<SectionId> = analysis.sections.keys().copied().collect();
        assert_eq!(
            order,
            vec![
                SectionId::ProfessionalProfile,
                SectionId::JobSearchStrategy,
                SectionId::AdditionalSkills
            ]
        );
    }

    #[test]
    fn test_sectionize_is_deterministic() {
        let raw = "1. Summary\nA.\n2. Strengths\nB.\nrandom trailing prose";
        assert_eq!(sectionize(raw), sectionize(raw));
    }

    #[test]
    fn test_sections_serialize_with_snake_case_keys() {
        let analysis = sectionize("Key Strengths:\nGrit.");
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["sections"]["key_strengths"], "Grit.");
    }

    #[test]
    fn test_topic_titles_are_recognized_headers() {
        let matcher = SectionMatcher::default_matcher();
        for (i, id) in SectionId::TOPICS.iter().enumerate() {
            let title = id.title();
            let forms = [
                format!("{}. {}", i + 1, title),
                title.to_string(),
                format!("{title}:"),
                format!("### {title}"),
                format!("**{title}**"),
                format!("**{title}**:"),
                format!("**{title}:**"),
                format!("## **{}. {}**", i + 1, title),
            ];
            for line in forms {
                assert_eq!(matcher.match_header(&line), Some(*id), "header {line:?}");
            }
        }
    }

    #[test]
    fn test_bold_heading_with_trailing_colon() {
        let matcher = SectionMatcher::default_matcher();
        assert_eq!(matcher.match_header("**Key Strengths**:"), Some(SectionId::KeyStrengths));
        assert_eq!(matcher.match_header("**Key Strengths** and more"), None);
    }

    #[test]
    fn test_markdown_headings_split_adjacent_sections() {
        let analysis =
            sectionize("### Key Strengths
Grit.
### Areas for Development
Public speaking.");
        assert_eq!(analysis.get(SectionId::KeyStrengths), Some("Grit."));
        assert_eq!(
            analysis.get(SectionId::AreasForDevelopment),
            Some("Public speaking.")
        );
    }
}
