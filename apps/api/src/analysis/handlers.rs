//! Axum route handlers for sessions, analyses and exports.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::bulk::{run_bulk_ranking, BulkRankingInput};
use crate::analysis::mode::{AnalysisDepth, AnalysisMode};
use crate::analysis::models::{RankingReport, SingleReport};
use crate::analysis::single::{run_single_analysis, SingleAnalysisInput};
use crate::document::ResumeDocument;
use crate::errors::AppError;
use crate::export::markdown::{render_markdown, MARKDOWN_PREFIX};
use crate::export::rankings::{render_csv, CSV_PREFIX};
use crate::export::export_file_name;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
}

/// Fields of an analyze or rank upload. Any part that carries a filename is
/// treated as a resume, whatever its field name.
#[derive(Debug, Default)]
struct AnalysisForm {
    job_description: String,
    mode: AnalysisMode,
    depth: AnalysisDepth,
    files: Vec<ResumeDocument>,
}

async fn read_form(mut multipart: Multipart) -> Result<AnalysisForm, AppError> {
    let mut form = AnalysisForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();

        if let Some(filename) = field.file_name().map(str::to_string) {
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await?;
            // Browsers send an empty part for an untouched file input.
            if filename.is_empty() && bytes.is_empty() {
                continue;
            }
            form.files.push(ResumeDocument {
                filename,
                content_type,
                bytes,
            });
            continue;
        }

        match name.as_str() {
            "job_description" => form.job_description = field.text().await?,
            "mode" => {
                let value = field.text().await?;
                form.mode = value
                    .parse()
                    .map_err(|e| AppError::Validation(format!("mode: {e}")))?;
            }
            "depth" => {
                let value = field.text().await?;
                form.depth = value
                    .parse()
                    .map_err(|e| AppError::Validation(format!("depth: {e}")))?;
            }
            other => {
                warn!("Ignoring unknown form field '{other}'");
                let _ = field.bytes().await?;
            }
        }
    }

    Ok(form)
}

fn attachment(
    content_type: &str,
    prefix: &str,
    extension: &str,
    at: DateTime<Utc>,
    body: String,
) -> impl IntoResponse {
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_file_name(prefix, extension, at)
    );
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// Starts a UI session. Idle sessions past the TTL are evicted first.
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    state.sessions.evict_idle(state.config.session_ttl).await;
    let session_id = state.sessions.create().await;
    (StatusCode::CREATED, Json(CreateSessionResponse { session_id }))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(session_id).await?;
    info!("Session {session_id} closed");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:id/analyze
///
/// Multipart: `job_description`, `mode`, `depth`, `resume`.
/// Replaces the session's previous results with this analysis.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<SingleReport>, AppError> {
    state.sessions.begin_analysis(session_id).await?;
    let form = read_form(multipart).await?;

    if form.files.len() > 1 {
        return Err(AppError::Validation(
            "Upload exactly one resume for a single analysis".to_string(),
        ));
    }

    let input = SingleAnalysisInput {
        job_description: form.job_description,
        mode: form.mode,
        depth: form.depth,
        resume: form.files.into_iter().next(),
    };
    let report = run_single_analysis(&state.pipeline, input).await?;

    state.sessions.store_single(session_id, report.clone()).await?;
    Ok(Json(report))
}

/// POST /api/v1/sessions/:id/rank
///
/// Multipart: `job_description`, `mode`, `depth`, and one `resumes` part per file.
pub async fn handle_rank(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<RankingReport>, AppError> {
    state.sessions.begin_analysis(session_id).await?;
    let form = read_form(multipart).await?;

    let limit = state.config.max_bulk_files;
    if form.files.len() > limit {
        return Err(AppError::Validation(format!(
            "At most {limit} resumes can be ranked at once ({} uploaded)",
            form.files.len()
        )));
    }

    let input = BulkRankingInput {
        job_description: form.job_description,
        mode: form.mode,
        depth: form.depth,
        resumes: form.files,
    };
    let report = run_bulk_ranking(&state.pipeline, input, state.config.bulk_concurrency).await?;

    state.sessions.store_ranking(session_id, report.clone()).await?;
    Ok(Json(report))
}

/// GET /api/v1/sessions/:id/report.md
pub async fn handle_export_markdown(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let report = state
        .sessions
        .single_report(session_id)
        .await?
        .ok_or_else(|| AppError::Conflict("Run an analysis before exporting a report".to_string()))?;

    Ok(attachment(
        "text/markdown; charset=utf-8",
        MARKDOWN_PREFIX,
        "md",
        report.generated_at,
        render_markdown(&report),
    ))
}

/// GET /api/v1/sessions/:id/rankings.csv
pub async fn handle_export_csv(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let report = state
        .sessions
        .ranking_report(session_id)
        .await?
        .ok_or_else(|| AppError::Conflict("Rank resumes before exporting rankings".to_string()))?;

    let csv = render_csv(&report)?;
    Ok(attachment(
        "text/csv; charset=utf-8",
        CSV_PREFIX,
        "csv",
        report.generated_at,
        csv,
    ))
}
