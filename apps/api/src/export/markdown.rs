use crate::analysis::models::SingleReport;

pub const MARKDOWN_PREFIX: &str = "resume_analysis";

const NO_TEXT_LAYER: &str = "_The resume had no text layer and was analysed from the PDF itself._";

/// Renders a single analysis as a standalone Markdown document.
pub fn render_markdown(report: &SingleReport) -> String {
    let result = &report.result;

    let percentage = match result.match_percentage {
        Some(pct) => format!("{pct}%"),
        None => "_Not reported by the analysis._".to_string(),
    };
    let resume_text = match report.resume_text.trim() {
        "" => NO_TEXT_LAYER,
        text => text,
    };

    let mut out = format!(
        "# Resume Analysis Report\n\
         Generated on: {}\n\n\
         **Resume:** {}  \n\
         **Analysis:** {}\n\n\
         ## Match Percentage\n{percentage}\n\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.filename,
        report.mode,
    );
    out.push_str(&keyword_section("Matched Keywords", &result.matched_keywords));
    out.push_str(&keyword_section("Missing Keywords", &result.missing_keywords));
    out.push_str(&format!(
        "## Job Description\n{}\n\n\
         ## Resume Content\n{resume_text}\n\n\
         ## Analysis Results\n{}\n",
        report.job_description.trim(),
        result.raw_narrative.trim(),
    ));
    out
}

fn keyword_section(title: &str, keywords: &[String]) -> String {
    let body = if keywords.is_empty() {
        "_None identified._\n".to_string()
    } else {
        keywords.iter().map(|k| format!("- {k}\n")).collect()
    };
    format!("## {title}\n{body}\n")
}
