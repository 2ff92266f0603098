use std::sync::Arc;

use crate::auth::SessionKeys;
use crate::config::Config;
use crate::resumes::extract::TextExtractor;
use crate::scoring::ResumeScorer;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Persistence. `PgStore` in production.
    pub store: Arc<dyn Store>,
    pub sessions: SessionKeys,
    /// Remote resume scorer. Default: HttpResumeScorer against SCORING_URL.
    pub scorer: Arc<dyn ResumeScorer>,
    pub extractor: Arc<dyn TextExtractor>,
    pub config: Config,
}
