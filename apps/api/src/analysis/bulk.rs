//! Bulk-Ranking Flow: many resumes against one job description.
//!
//! Each file runs the full pipeline on its own; a failing file becomes a
//! `Failed` entry and never aborts the batch. Files are analysed with bounded
//! concurrency and collected in upload order before sorting.

use std::cmp::Ordering;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::info;

use crate::analysis::flow::{validate_job_description, FlowError, Pipeline, StageTracker};
use crate::analysis::mode::{AnalysisDepth, AnalysisMode};
use crate::analysis::models::{RankingEntry, RankingReport};
use crate::document::ResumeDocument;

#[derive(Debug, Clone)]
pub struct BulkRankingInput {
    pub job_description: String,
    pub mode: AnalysisMode,
    pub depth: AnalysisDepth,
    pub resumes: Vec<ResumeDocument>,
}

pub async fn run_bulk_ranking(
    pipeline: &Pipeline,
    input: BulkRankingInput,
    concurrency: usize,
) -> Result<RankingReport, FlowError> {
    let job_description = validate_job_description(&input.job_description)?;
    if input.resumes.is_empty() {
        return Err(FlowError::Validation(
            "Upload at least one resume PDF to rank".to_string(),
        ));
    }

    let total = input.resumes.len();
    let tasks: Vec<_> = input
        .resumes
        .iter()
        .enumerate()
        .map(|(index, resume)| {
            analyze_entry(pipeline, job_description, input.mode, input.depth, index, resume)
        })
        .collect();
    let entries: Vec<RankingEntry> = stream::iter(tasks)
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let report = RankingReport {
        job_description: job_description.to_string(),
        mode: input.mode,
        entries: rank_entries(entries),
        generated_at: Utc::now(),
    };
    info!("Ranked {total} resumes ({} failed)", report.failed_count());
    Ok(report)
}

async fn analyze_entry(
    pipeline: &Pipeline,
    job_description: &str,
    mode: AnalysisMode,
    depth: AnalysisDepth,
    index: usize,
    resume: &ResumeDocument,
) -> RankingEntry {
    let mut tracker = StageTracker::new(format!("bulk #{} '{}'", index + 1, resume.filename));
    match pipeline
        .analyze_document(job_description, resume, mode, depth, &mut tracker)
        .await
    {
        Ok((_, result)) => RankingEntry::analyzed(index, resume.filename.clone(), result),
        Err(e) => RankingEntry::failed(index, resume.filename.clone(), e.to_string()),
    }
}

/// Stable sort, highest percentage first, entries without one last; ties keep
/// upload order. Ranks 1..k go to the entries that reported a percentage.
pub fn rank_entries(mut entries: Vec<RankingEntry>) -> Vec<RankingEntry> {
    entries.sort_by(|a, b| compare_percentages(a.match_percentage(), b.match_percentage()));

    let mut next_rank = 1;
    for entry in &mut entries {
        entry.rank = match entry.match_percentage() {
            Some(_) => {
                let rank = next_rank;
                next_rank += 1;
                Some(rank)
            }
            None => None,
        };
    }
    entries
}

fn compare_percentages(a: Option<u8>, b: Option<u8>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::analysis::models::AnalysisResult;
    use crate::testing::{pdf, StubBackend, StubExtractor, StubReply};

    fn analyzed(index: usize, pct: Option<u8>) -> RankingEntry {
        RankingEntry::analyzed(
            index,
            format!("cv{index}.pdf"),
            AnalysisResult {
                match_percentage: pct,
                matched_keywords: vec![],
                missing_keywords: vec![],
                raw_narrative: String::new(),
            },
        )
    }

    fn input(resumes: Vec<ResumeDocument>) -> BulkRankingInput {
        BulkRankingInput {
            job_description: "Platform engineer: Rust, Kubernetes".to_string(),
            mode: AnalysisMode::Comprehensive,
            depth: AnalysisDepth::Standard,
            resumes,
        }
    }

    #[test]
    fn test_rank_entries_sorts_descending_with_absent_last() {
        let ranked = rank_entries(vec![
            analyzed(0, Some(40)),
            analyzed(1, None),
            RankingEntry::failed(2, "bad.pdf", "corrupt"),
            analyzed(3, Some(90)),
            analyzed(4, Some(40)),
        ]);

        let order: Vec<usize> = ranked.iter().map(|e| e.upload_index).collect();
        assert_eq!(order, vec![3, 0, 4, 1, 2]);

        let pcts: Vec<Option<u8>> = ranked.iter().map(|e| e.match_percentage()).collect();
        let scored: Vec<u8> = pcts.iter().flatten().copied().collect();
        assert!(scored.windows(2).all(|w| w[0] >= w[1]));
        let first_absent = pcts.iter().position(Option::is_none).unwrap();
        assert!(pcts[first_absent..].iter().all(Option::is_none));

        let ranks: Vec<Option<usize>> = ranked.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![Some(1), Some(2), Some(3), None, None]);
    }

    #[test]
    fn test_rank_entries_ties_keep_upload_order() {
        let ranked = rank_entries((0..6).map(|i| analyzed(i, Some(70))).collect());
        let order: Vec<usize> = ranked.iter().map(|e| e.upload_index).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_one_corrupt_file_out_of_three() {
        let backend = StubBackend::replying("No score given.")
            .with_reply("alice", StubReply::Text("Match Percentage: 64%".into()))
            .with_reply("bob", StubReply::Text("Match Percentage: 88%".into()));
        let pipeline = Pipeline::new(Arc::new(backend), Arc::new(StubExtractor));

        let report = run_bulk_ranking(
            &pipeline,
            input(vec![
                pdf("alice.pdf", "alice: Rust, Docker"),
                pdf("broken.pdf", "CORRUPT"),
                pdf("bob.pdf", "bob: Rust, Kubernetes"),
            ]),
            2,
        )
        .await
        .unwrap();

        assert_eq!(report.entries.len(), 3);
        assert_eq!(report.failed_count(), 1);

        let names: Vec<&str> = report.entries.iter().map(|e| e.filename.as_str()).collect();
        assert_eq!(names, vec!["bob.pdf", "alice.pdf", "broken.pdf"]);
        assert_eq!(report.entries[0].match_percentage(), Some(88));
        assert_eq!(report.entries[1].match_percentage(), Some(64));
        assert_eq!(report.entries[2].match_percentage(), None);
        assert!(report.entries[2].error().unwrap().contains("broken.pdf"));
    }

    #[tokio::test]
    async fn test_ai_failures_are_isolated_per_file() {
        let backend = StubBackend::replying("Match Percentage: 50%")
            .with_reply("flaky", StubReply::Service)
            .with_reply("denied", StubReply::Auth);
        let pipeline = Pipeline::new(Arc::new(backend), Arc::new(StubExtractor));

        let report = run_bulk_ranking(
            &pipeline,
            input(vec![
                pdf("a.pdf", "flaky candidate"),
                pdf("b.pdf", "steady candidate"),
                pdf("c.pdf", "denied candidate"),
                ResumeDocument {
                    filename: "notes.txt".to_string(),
                    content_type: Some("text/plain".to_string()),
                    bytes: bytes::Bytes::from_static(b"plain text"),
                },
            ]),
            3,
        )
        .await
        .unwrap();

        assert_eq!(report.entries.len(), 4);
        assert_eq!(report.entries[0].filename, "b.pdf");
        assert_eq!(report.entries[0].rank, Some(1));
        assert_eq!(report.failed_count(), 3);
        let failed: Vec<&str> = report.entries[1..]
            .iter()
            .map(|e| e.filename.as_str())
            .collect();
        assert_eq!(failed, vec!["a.pdf", "c.pdf", "notes.txt"]);
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected() {
        let pipeline = Pipeline::new(
            Arc::new(StubBackend::replying("unused")),
            Arc::new(StubExtractor),
        );
        let err = run_bulk_ranking(&pipeline, input(vec![]), 2).await.unwrap_err();
        assert!(matches!(err, FlowError::Validation(_)));
    }
}
