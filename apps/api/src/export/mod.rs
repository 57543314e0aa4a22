//! Downloadable exports of a session's latest results.

use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod markdown;
pub mod rankings;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// `resume_analysis_20261019_142500.md` style download names.
pub fn export_file_name(prefix: &str, extension: &str, at: DateTime<Utc>) -> String {
    format!("{prefix}_{}.{extension}", at.format("%Y%m%d_%H%M%S"))
}
