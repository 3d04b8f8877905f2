//! Markdown report for downloading a finished analysis.

use chrono::NaiveDate;

use crate::analysis::sections::{SectionId, SectionedAnalysis};

const NO_DATA: &str = "No data";

/// Renders every topic under its own heading. An unparsed analysis is shown under
/// the profile heading so the report still carries the full text.
pub fn render_report(analysis: &SectionedAnalysis, generated_on: NaiveDate) -> String {
    let mut report = String::from("# Career Analysis Report\n\n");

    for id in SectionId::TOPICS {
        let content = match id {
            SectionId::ProfessionalProfile => analysis
                .get(SectionId::ProfessionalProfile)
                .or_else(|| analysis.get(SectionId::General)),
            _ => analysis.get(id),
        };
        report.push_str(&format!(
            "## {}\n{}\n\n",
            id.title(),
            content.unwrap_or(NO_DATA)
        ));
    }

    report.push_str(&format!(
        "\nGenerated by Talent Agent on {}\n",
        generated_on.format("%Y-%m-%d")
    ));
    report
}
