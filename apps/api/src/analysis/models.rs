use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::mode::{AnalysisDepth, AnalysisMode};

/// Structured view of one AI response. Built once by the parser, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// 0–100, or `None` when the response carried no percentage.
    pub match_percentage: Option<u8>,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub raw_narrative: String,
}

impl AnalysisResult {
    /// Nothing structured could be read; only the narrative is shown.
    pub fn is_degraded(&self) -> bool {
        self.match_percentage.is_none()
            && self.matched_keywords.is_empty()
            && self.missing_keywords.is_empty()
    }
}

/// Case-insensitive set that keeps first spelling and insertion order.
#[derive(Debug, Default)]
pub struct KeywordSet {
    items: Vec<String>,
}

impl KeywordSet {
    pub fn insert(&mut self, item: &str) -> bool {
        let item = item.trim();
        if item.is_empty() || self.contains(item) {
            return false;
        }
        self.items.push(item.to_string());
        true
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.iter().any(|i| i.eq_ignore_ascii_case(item.trim()))
    }

    pub fn into_vec(self) -> Vec<String> {
        self.items
    }
}

impl<S: AsRef<str>> FromIterator<S> for KeywordSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = KeywordSet::default();
        for item in iter {
            set.insert(item.as_ref());
        }
        set
    }
}

/// Result of the single-analysis flow, kept in the session for export.
#[derive(Debug, Clone, Serialize)]
pub struct SingleReport {
    pub filename: String,
    pub mode: AnalysisMode,
    pub depth: AnalysisDepth,
    pub job_description: String,
    /// Kept for the Markdown export only.
    #[serde(skip_serializing)]
    pub resume_text: String,
    pub result: AnalysisResult,
    pub structured: bool,
    pub narrative_html: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryOutcome {
    Analyzed { result: AnalysisResult },
    Failed { error: String },
}

/// One uploaded file in a bulk ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    pub upload_index: usize,
    pub filename: String,
    /// 1-based rank among entries that reported a percentage.
    pub rank: Option<usize>,
    #[serde(flatten)]
    pub outcome: EntryOutcome,
}

impl RankingEntry {
    pub fn analyzed(upload_index: usize, filename: impl Into<String>, result: AnalysisResult) -> Self {
        Self {
            upload_index,
            filename: filename.into(),
            rank: None,
            outcome: EntryOutcome::Analyzed { result },
        }
    }

    pub fn failed(upload_index: usize, filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            upload_index,
            filename: filename.into(),
            rank: None,
            outcome: EntryOutcome::Failed {
                error: error.into(),
            },
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.outcome {
            EntryOutcome::Analyzed { result } => Some(result),
            EntryOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            EntryOutcome::Analyzed { .. } => None,
            EntryOutcome::Failed { error } => Some(error),
        }
    }

    pub fn match_percentage(&self) -> Option<u8> {
        self.result().and_then(|r| r.match_percentage)
    }
}

/// Result of the bulk-ranking flow, in ranked order.
#[derive(Debug, Clone, Serialize)]
pub struct RankingReport {
    pub job_description: String,
    pub mode: AnalysisMode,
    pub entries: Vec<RankingEntry>,
    pub generated_at: DateTime<Utc>,
}

impl RankingReport {
    pub fn failed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.error().is_some()).count()
    }
}
