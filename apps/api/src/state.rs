use crate::analysis::flow::Pipeline;
use crate::config::Config;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// AI backend and document extractor. Default: Gemini + pdf-extract; tests swap in stubs.
    pub pipeline: Pipeline,
    pub sessions: SessionStore,
    pub config: Config,
}
