// Prompt templates for each analysis mode.
// Reuses the output-contract fragments from ai_client::prompts.

use crate::ai_client::prompts::{
    GROUNDING_INSTRUCTION, KEYWORD_SECTIONS_INSTRUCTION, PERCENTAGE_INSTRUCTION,
};
use crate::analysis::mode::{AnalysisDepth, AnalysisMode};

pub const COMPREHENSIVE_TEMPLATE: &str = "\
You are an experienced Technical Human Resource Manager. Review the resume against the \
job description and provide:
1. Overall match percentage
2. Key strengths
3. Areas for improvement
4. Specific recommendations
Format your response in clear sections with bullet points.";

pub const SKILL_GAP_TEMPLATE: &str = "\
You are a skilled ATS scanner. Analyze the resume against the job description and provide:
1. Missing technical skills
2. Required certifications
3. Experience gaps
4. Actionable improvement steps
Format your response in clear sections.";

pub const KEYWORDS_TEMPLATE: &str = "\
Identify and categorize the keywords of the job description that are missing from the \
resume:
1. Technical skills
2. Soft skills
3. Tools and technologies
4. Industry-specific terms
Format as a bulleted list.";

pub const MATCH_PERCENTAGE_TEMPLATE: &str = "\
You are an ATS scanner with a deep understanding of hiring for this role. Estimate how \
well the resume matches the job description and report only the match percentage, \
followed by at most two sentences justifying it.";

/// How the resume reaches the model.
#[derive(Debug, Clone, Copy)]
pub enum ResumeInput<'a> {
    Text(&'a str),
    /// The PDF itself is attached to the request.
    Attached,
}

pub fn template_for(mode: AnalysisMode) -> &'static str {
    match mode {
        AnalysisMode::Comprehensive => COMPREHENSIVE_TEMPLATE,
        AnalysisMode::SkillGap => SKILL_GAP_TEMPLATE,
        AnalysisMode::Keywords => KEYWORDS_TEMPLATE,
        AnalysisMode::MatchPercentage => MATCH_PERCENTAGE_TEMPLATE,
    }
}

/// Builds the full prompt. Pure: identical inputs give identical prompts.
pub fn build_prompt(
    job_description: &str,
    resume: ResumeInput<'_>,
    mode: AnalysisMode,
    depth: AnalysisDepth,
) -> String {
    let mut sections = vec![template_for(mode).to_string(), GROUNDING_INSTRUCTION.to_string()];
    if let Some(depth_instruction) = depth.instruction() {
        sections.push(depth_instruction.to_string());
    }

    let mut output_format = String::from("OUTPUT FORMAT:\n");
    output_format.push_str(PERCENTAGE_INSTRUCTION);
    if mode.requests_keyword_lists() {
        output_format.push('\n');
        output_format.push_str(KEYWORD_SECTIONS_INSTRUCTION);
    }
    sections.push(output_format);

    sections.push(format!(
        "JOB DESCRIPTION:\n<<<\n{}\n>>>",
        job_description.trim()
    ));
    sections.push(match resume {
        ResumeInput::Text(text) => format!("RESUME:\n<<<\n{}\n>>>", text.trim()),
        ResumeInput::Attached => {
            "RESUME:\nThe resume is attached to this message as a PDF document.".to_string()
        }
    });

    sections.join("\n\n")
}
