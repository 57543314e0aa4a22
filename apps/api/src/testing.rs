//! Test doubles for the AI backend and the document extractor.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use crate::ai_client::{AiError, GenerateRequest, GenerativeBackend};
use crate::document::{
    is_pdf, DocumentContent, DocumentExtractor, ExtractionError, InlineDocument, ResumeDocument,
    PDF_MIME,
};

#[derive(Debug, Clone)]
pub enum StubReply {
    Text(String),
    Auth,
    Service,
}

impl StubReply {
    fn to_result(&self) -> Result<String, AiError> {
        match self {
            StubReply::Text(text) => Ok(text.clone()),
            StubReply::Auth => Err(AiError::Auth("API key not valid".to_string())),
            StubReply::Service => Err(AiError::Service("status 503: overloaded".to_string())),
        }
    }
}

/// Answers with the first reply whose needle occurs in the prompt, else the
/// fallback. Records every prompt it sees.
pub struct StubBackend {
    replies: Vec<(String, StubReply)>,
    fallback: StubReply,
    prompts: Mutex<Vec<String>>,
    inline_documents: AtomicUsize,
}

impl StubBackend {
    pub fn new(fallback: StubReply) -> Self {
        Self {
            replies: Vec::new(),
            fallback,
            prompts: Mutex::new(Vec::new()),
            inline_documents: AtomicUsize::new(0),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(StubReply::Text(text.to_string()))
    }

    pub fn with_reply(mut self, needle: &str, reply: StubReply) -> Self {
        self.replies.push((needle.to_string(), reply));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn inline_documents(&self) -> usize {
        self.inline_documents.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeBackend for StubBackend {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, AiError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        if request.document.is_some() {
            self.inline_documents.fetch_add(1, Ordering::SeqCst);
        }
        self.replies
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply)
            .unwrap_or(&self.fallback)
            .to_result()
    }

    fn model(&self) -> &str {
        "stub-model"
    }
}

/// Treats everything after `%PDF-` as the document text. A body containing
/// `CORRUPT` fails to parse; an empty body behaves like a scanned PDF.
pub struct StubExtractor;

#[async_trait]
impl DocumentExtractor for StubExtractor {
    async fn extract(&self, document: &ResumeDocument) -> Result<DocumentContent, ExtractionError> {
        let filename = document.filename.clone();
        if document.bytes.is_empty() {
            return Err(ExtractionError::Empty { filename });
        }
        if !is_pdf(&document.bytes) {
            return Err(ExtractionError::NotPdf { filename });
        }

        let text = String::from_utf8_lossy(&document.bytes);
        let body = text.trim_start().trim_start_matches("%PDF-").trim();
        if body.contains("CORRUPT") {
            return Err(ExtractionError::Corrupt {
                filename,
                reason: "invalid xref table".to_string(),
            });
        }
        if body.is_empty() {
            return Ok(DocumentContent::Inline(InlineDocument {
                mime_type: PDF_MIME.to_string(),
                bytes: document.bytes.clone(),
            }));
        }
        Ok(DocumentContent::Text(body.to_string()))
    }
}

/// A fake PDF upload whose text is `text`.
pub fn pdf(filename: &str, text: &str) -> ResumeDocument {
    ResumeDocument {
        filename: filename.to_string(),
        content_type: Some(PDF_MIME.to_string()),
        bytes: Bytes::from(format!("%PDF-{text}")),
    }
}
