//! Document Text Extractor: turns an uploaded resume PDF into plain text.
//!
//! Text extraction is delegated to `pdf-extract`. A PDF that parses but has no
//! text layer (a scanned resume) is handed back as an inline document so the
//! AI service can read it directly.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

/// Extracted text beyond this is cut off before prompting.
pub const MAX_RESUME_CHARS: usize = 60_000;

const PDF_MAGIC: &[u8] = b"%PDF-";
pub const PDF_MIME: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("'{filename}' is empty")]
    Empty { filename: String },

    #[error("'{filename}' is not a PDF document")]
    NotPdf { filename: String },

    #[error("Could not read '{filename}': {reason}")]
    Corrupt { filename: String, reason: String },
}

/// A resume as uploaded by the browser. Lives for a single request.
#[derive(Debug, Clone)]
pub struct ResumeDocument {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Raw document forwarded to the AI service alongside the prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineDocument {
    pub mime_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentContent {
    Text(String),
    Inline(InlineDocument),
}

impl DocumentContent {
    /// Text used for display and export; empty for inline documents.
    pub fn text(&self) -> &str {
        match self {
            DocumentContent::Text(text) => text,
            DocumentContent::Inline(_) => "",
        }
    }
}

/// Turns an upload into something the AI service can read. Carried by the
/// analysis pipeline as `Arc<dyn DocumentExtractor>`.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, document: &ResumeDocument) -> Result<DocumentContent, ExtractionError>;
}

/// Default extractor backed by `pdf-extract`.
pub struct PdfExtractor;

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    async fn extract(&self, document: &ResumeDocument) -> Result<DocumentContent, ExtractionError> {
        extract_pdf(document).await
    }
}

/// Cheap format check run before any parsing.
pub fn is_pdf(head: &[u8]) -> bool {
    let start = head
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(head.len());
    head[start..].starts_with(PDF_MAGIC)
}

/// Validates and extracts a resume. Parsing runs on the blocking pool so a
/// large or hostile PDF never stalls the runtime, and a panic inside the PDF
/// library is reported as a corrupt file.
pub async fn extract_pdf(document: &ResumeDocument) -> Result<DocumentContent, ExtractionError> {
    let filename = document.filename.clone();

    if document.bytes.is_empty() {
        return Err(ExtractionError::Empty { filename });
    }
    if !is_pdf(&document.bytes) {
        debug!(
            "'{filename}' rejected, declared type {}",
            document.content_type.as_deref().unwrap_or("none")
        );
        return Err(ExtractionError::NotPdf { filename });
    }

    let bytes = document.bytes.clone();
    let extracted = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| ExtractionError::Corrupt {
            filename: filename.clone(),
            reason: format!("PDF parser aborted ({e})"),
        })?
        .map_err(|e| ExtractionError::Corrupt {
            filename: filename.clone(),
            reason: e.to_string(),
        })?;

    let text = normalize_text(&extracted);
    if text.is_empty() {
        warn!("'{filename}' has no text layer, forwarding the PDF inline");
        return Ok(DocumentContent::Inline(InlineDocument {
            mime_type: PDF_MIME.to_string(),
            bytes: document.bytes.clone(),
        }));
    }

    debug!("Extracted {} chars from '{filename}'", text.chars().count());
    Ok(DocumentContent::Text(text))
}

/// Joins pages with newlines, trims, and caps the length.
fn normalize_text(raw: &str) -> String {
    let joined = raw.replace('\x0C', "\n");
    let trimmed = joined.trim();
    match trimmed.char_indices().nth(MAX_RESUME_CHARS) {
        Some((cut, _)) => trimmed[..cut].to_string(),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, bytes: &'static [u8]) -> ResumeDocument {
        ResumeDocument {
            filename: name.to_string(),
            content_type: Some(PDF_MIME.to_string()),
            bytes: Bytes::from_static(bytes),
        }
    }

    #[test]
    fn test_is_pdf_checks_magic_bytes() {
        assert!(is_pdf(b"%PDF-1.7\n..."));
        assert!(is_pdf(b"\n %PDF-1.4"));
        assert!(!is_pdf(b"PK\x03\x04 docx"));
        assert!(!is_pdf(b""));
    }

    #[test]
    fn test_normalize_text_joins_pages_and_trims() {
        assert_eq!(normalize_text("  page one\x0Cpage two \n"), "page one\npage two");
    }

    #[test]
    fn test_normalize_text_caps_length_on_char_boundary() {
        let long = "é".repeat(MAX_RESUME_CHARS + 10);
        let text = normalize_text(&long);
        assert_eq!(text.chars().count(), MAX_RESUME_CHARS);
    }

    #[test]
    fn test_document_content_text_is_empty_for_inline() {
        let inline = DocumentContent::Inline(InlineDocument {
            mime_type: PDF_MIME.to_string(),
            bytes: Bytes::from_static(b"%PDF-"),
        });
        assert_eq!(inline.text(), "");
        assert_eq!(DocumentContent::Text("Go".into()).text(), "Go");
    }

    #[tokio::test]
    async fn test_extract_rejects_empty_upload() {
        let err = extract_pdf(&upload("empty.pdf", b"")).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Empty { .. }));
    }

    #[tokio::test]
    async fn test_extract_rejects_non_pdf() {
        let err = extract_pdf(&upload("resume.docx", b"PK\x03\x04 not a pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NotPdf { .. }));
        assert!(err.to_string().contains("resume.docx"));
    }

    #[tokio::test]
    async fn test_extract_reports_corrupt_pdf() {
        let err = PdfExtractor
            .extract(&upload("broken.pdf", b"%PDF-1.4\nthis is not a real pdf body"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Corrupt { .. }));
    }
}
