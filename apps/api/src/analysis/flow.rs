//! Analysis pipeline shared by the single and bulk flows:
//! extract → build prompt → call the AI service → parse.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ai_client::{AiError, GenerateRequest, GenerativeBackend};
use crate::analysis::mode::{AnalysisDepth, AnalysisMode};
use crate::analysis::models::AnalysisResult;
use crate::analysis::parser::parse_response;
use crate::analysis::prompts::{build_prompt, ResumeInput};
use crate::document::{DocumentContent, DocumentExtractor, ExtractionError, ResumeDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStage {
    Idle,
    AwaitingInput,
    Extracting,
    Prompting,
    CallingAi,
    Parsing,
    Rendered,
    ErrorDisplay,
}

impl fmt::Display for FlowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowStage::Idle => "idle",
            FlowStage::AwaitingInput => "awaiting_input",
            FlowStage::Extracting => "extracting",
            FlowStage::Prompting => "prompting",
            FlowStage::CallingAi => "calling_ai",
            FlowStage::Parsing => "parsing",
            FlowStage::Rendered => "rendered",
            FlowStage::ErrorDisplay => "error_display",
        };
        f.write_str(name)
    }
}

/// Recoverable failures of an analysis. Parsing never fails.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Ai(#[from] AiError),
}

impl FlowError {
    /// Stage the flow was in when it failed.
    pub fn stage(&self) -> FlowStage {
        match self {
            FlowError::Validation(_) => FlowStage::AwaitingInput,
            FlowError::Extraction(_) => FlowStage::Extracting,
            FlowError::Ai(_) => FlowStage::CallingAi,
        }
    }
}

/// Tracks one flow through its stages and logs each transition.
#[derive(Debug)]
pub struct StageTracker {
    label: String,
    stage: FlowStage,
}

impl StageTracker {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            stage: FlowStage::Idle,
        }
    }

    pub fn stage(&self) -> FlowStage {
        self.stage
    }

    pub fn advance(&mut self, next: FlowStage) {
        debug!("{}: {} -> {}", self.label, self.stage, next);
        self.stage = next;
    }

    /// Terminal transition; the error keeps the stage it failed in.
    pub fn fail(&mut self, error: &FlowError) {
        warn!("{}: failed while {}: {error}", self.label, error.stage());
        self.stage = FlowStage::ErrorDisplay;
    }
}

/// Rejects a blank job description.
pub fn validate_job_description(job_description: &str) -> Result<&str, FlowError> {
    let trimmed = job_description.trim();
    if trimmed.is_empty() {
        return Err(FlowError::Validation(
            "Job description cannot be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

/// The AI backend and document extractor every flow runs against.
#[derive(Clone)]
pub struct Pipeline {
    backend: Arc<dyn GenerativeBackend>,
    extractor: Arc<dyn DocumentExtractor>,
}

impl Pipeline {
    pub fn new(backend: Arc<dyn GenerativeBackend>, extractor: Arc<dyn DocumentExtractor>) -> Self {
        Self { backend, extractor }
    }

    pub fn model(&self) -> &str {
        self.backend.model()
    }

    /// Runs one document through extraction, prompting, the AI call and
    /// parsing. On failure the tracker ends in `ErrorDisplay`.
    pub async fn analyze_document(
        &self,
        job_description: &str,
        document: &ResumeDocument,
        mode: AnalysisMode,
        depth: AnalysisDepth,
        tracker: &mut StageTracker,
    ) -> Result<(DocumentContent, AnalysisResult), FlowError> {
        let outcome = self
            .run_stages(job_description, document, mode, depth, tracker)
            .await;
        if let Err(e) = &outcome {
            tracker.fail(e);
        }
        outcome
    }

    async fn run_stages(
        &self,
        job_description: &str,
        document: &ResumeDocument,
        mode: AnalysisMode,
        depth: AnalysisDepth,
        tracker: &mut StageTracker,
    ) -> Result<(DocumentContent, AnalysisResult), FlowError> {
        tracker.advance(FlowStage::Extracting);
        let content = self.extractor.extract(document).await?;

        tracker.advance(FlowStage::Prompting);
        let request = match &content {
            DocumentContent::Text(text) => GenerateRequest::text(build_prompt(
                job_description,
                ResumeInput::Text(text),
                mode,
                depth,
            )),
            DocumentContent::Inline(inline) => GenerateRequest {
                prompt: build_prompt(job_description, ResumeInput::Attached, mode, depth),
                document: Some(inline.clone()),
            },
        };

        tracker.advance(FlowStage::CallingAi);
        let raw = self.backend.generate(&request).await?;

        tracker.advance(FlowStage::Parsing);
        let result = parse_response(&raw);
        if result.is_degraded() {
            info!(
                "'{}': no structured fields in the response, showing narrative only",
                document.filename
            );
        }
        Ok((content, result))
    }
}
