//! In-memory session store holding the latest results of each UI session.
//!
//! Every new analysis request clears the session's previous results, so an
//! export always reflects the most recent run.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::analysis::models::{RankingReport, SingleReport};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session {0} not found or expired")]
    NotFound(Uuid),
}

#[derive(Debug)]
struct Session {
    id: Uuid,
    last_active: Instant,
    single: Option<SingleReport>,
    ranking: Option<RankingReport>,
}

impl Session {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            last_active: Instant::now(),
            single: None,
            ranking: None,
        }
    }

    fn touch(&mut self) {
        self.last_active = Instant::now();
    }
}

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> Uuid {
        let session = Session::new();
        let id = session.id;
        self.inner.write().await.insert(id, session);
        info!("Session {id} created");
        id
    }

    /// Clears both previous results ahead of a new run.
    pub async fn begin_analysis(&self, id: Uuid) -> Result<(), SessionError> {
        self.with_session(id, |session| {
            session.single = None;
            session.ranking = None;
        })
        .await
    }

    pub async fn store_single(&self, id: Uuid, report: SingleReport) -> Result<(), SessionError> {
        self.with_session(id, |session| session.single = Some(report))
            .await
    }

    pub async fn store_ranking(&self, id: Uuid, report: RankingReport) -> Result<(), SessionError> {
        self.with_session(id, |session| session.ranking = Some(report))
            .await
    }

    /// Latest single analysis, `Ok(None)` when the session has none.
    pub async fn single_report(&self, id: Uuid) -> Result<Option<SingleReport>, SessionError> {
        self.with_session(id, |session| session.single.clone()).await
    }

    pub async fn ranking_report(&self, id: Uuid) -> Result<Option<RankingReport>, SessionError> {
        self.with_session(id, |session| session.ranking.clone()).await
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), SessionError> {
        self.inner
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(SessionError::NotFound(id))
    }

    /// Drops sessions idle for at least `ttl`. Returns how many were dropped.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.last_active.elapsed() < ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {evicted} idle sessions");
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    async fn with_session<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Session) -> T,
    ) -> Result<T, SessionError> {
        let mut sessions = self.inner.write().await;
        let session = sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        session.touch();
        Ok(f(session))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::analysis::mode::{AnalysisDepth, AnalysisMode};
    use crate::analysis::models::AnalysisResult;

    fn single() -> SingleReport {
        SingleReport {
            filename: "cv.pdf".to_string(),
            mode: AnalysisMode::Comprehensive,
            depth: AnalysisDepth::Standard,
            job_description: "Go developer".to_string(),
            resume_text: "Go".to_string(),
            structured: true,
            narrative_html: String::new(),
            result: AnalysisResult {
                match_percentage: Some(50),
                matched_keywords: vec!["Go".to_string()],
                missing_keywords: vec![],
                raw_narrative: "Match Percentage: 50%".to_string(),
            },
            generated_at: Utc::now(),
        }
    }

    fn ranking() -> RankingReport {
        RankingReport {
            job_description: "Go developer".to_string(),
            mode: AnalysisMode::Comprehensive,
            entries: vec![],
            generated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_store_and_read_back() {
        let store = SessionStore::new();
        let id = store.create().await;
        assert!(store.single_report(id).await.unwrap().is_none());

        store.store_single(id, single()).await.unwrap();
        let report = store.single_report(id).await.unwrap().unwrap();
        assert_eq!(report.result.match_percentage, Some(50));
    }

    #[tokio::test]
    async fn test_begin_analysis_clears_previous_results() {
        let store = SessionStore::new();
        let id = store.create().await;
        store.store_single(id, single()).await.unwrap();
        store.store_ranking(id, ranking()).await.unwrap();

        store.begin_analysis(id).await.unwrap();
        assert!(store.single_report(id).await.unwrap().is_none());
        assert!(store.ranking_report(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();
        assert_eq!(
            store.single_report(id).await.unwrap_err(),
            SessionError::NotFound(id)
        );
        assert_eq!(store.remove(id).await, Err(SessionError::NotFound(id)));
    }

    #[tokio::test]
    async fn test_remove_drops_session() {
        let store = SessionStore::new();
        let id = store.create().await;
        store.remove(id).await.unwrap();
        assert_eq!(store.len().await, 0);
        assert!(store.begin_analysis(id).await.is_err());
    }

    #[tokio::test]
    async fn test_evict_idle_respects_ttl() {
        let store = SessionStore::new();
        store.create().await;
        store.create().await;

        assert_eq!(store.evict_idle(Duration::from_secs(3600)).await, 0);
        assert_eq!(store.len().await, 2);

        assert_eq!(store.evict_idle(Duration::ZERO).await, 2);
        assert_eq!(store.len().await, 0);
    }
}
