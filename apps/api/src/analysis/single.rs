//! Single-Analysis Flow: one resume against one job description.
//!
//! Stages: Idle → AwaitingInput → Extracting → Prompting → CallingAi →
//!         Parsing → Rendered, or ErrorDisplay on the first failure.

use chrono::Utc;
use tracing::info;

use crate::analysis::flow::{validate_job_description, FlowError, FlowStage, Pipeline, StageTracker};
use crate::analysis::mode::{AnalysisDepth, AnalysisMode};
use crate::analysis::models::SingleReport;
use crate::analysis::narrative::render_narrative_html;
use crate::document::ResumeDocument;

#[derive(Debug, Clone)]
pub struct SingleAnalysisInput {
    pub job_description: String,
    pub mode: AnalysisMode,
    pub depth: AnalysisDepth,
    pub resume: Option<ResumeDocument>,
}

pub async fn run_single_analysis(
    pipeline: &Pipeline,
    input: SingleAnalysisInput,
) -> Result<SingleReport, FlowError> {
    let label = input
        .resume
        .as_ref()
        .map(|r| r.filename.clone())
        .unwrap_or_else(|| "single analysis".to_string());
    let mut tracker = StageTracker::new(label);
    tracker.advance(FlowStage::AwaitingInput);

    let (job_description, resume) = match check_input(&input) {
        Ok(checked) => checked,
        Err(e) => {
            tracker.fail(&e);
            return Err(e);
        }
    };

    let (content, result) = pipeline
        .analyze_document(job_description, resume, input.mode, input.depth, &mut tracker)
        .await?;

    let report = SingleReport {
        filename: resume.filename.clone(),
        mode: input.mode,
        depth: input.depth,
        job_description: job_description.to_string(),
        resume_text: content.text().to_string(),
        structured: !result.is_degraded(),
        narrative_html: render_narrative_html(&result.raw_narrative),
        result,
        generated_at: Utc::now(),
    };
    tracker.advance(FlowStage::Rendered);

    info!(
        "Analysed '{}' ({}): match {:?}",
        report.filename, report.mode, report.result.match_percentage
    );
    Ok(report)
}

fn check_input(input: &SingleAnalysisInput) -> Result<(&str, &ResumeDocument), FlowError> {
    let job_description = validate_job_description(&input.job_description)?;
    let resume = input
        .resume
        .as_ref()
        .ok_or_else(|| FlowError::Validation("Upload a resume PDF to analyse".to_string()))?;
    Ok((job_description, resume))
}
