//! Application state for shared services

use std::sync::Arc;

use crate::domain::content::ContentRepository;
use crate::domain::exposure::ExposureTracker;
use crate::infrastructure::exposure::StickyAssignmentCodec;
use crate::infrastructure::services::{ExperimentService, ExposureEvaluator};

/// Default name of the cookie carrying the assignment token
pub const DEFAULT_TOKEN_COOKIE: &str = "pmp_ct";

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub evaluator: Arc<ExposureEvaluator>,
    pub experiment_service: Arc<ExperimentService>,
    pub content: Arc<dyn ContentRepository>,
    pub tracker: Arc<dyn ExposureTracker>,
    pub codec: StickyAssignmentCodec,
    pub token_cookie: String,
}

impl AppState {
    pub fn new(
        evaluator: Arc<ExposureEvaluator>,
        experiment_service: Arc<ExperimentService>,
        content: Arc<dyn ContentRepository>,
        tracker: Arc<dyn ExposureTracker>,
    ) -> Self {
        Self {
            evaluator,
            experiment_service,
            content,
            tracker,
            codec: StickyAssignmentCodec::new(),
            token_cookie: DEFAULT_TOKEN_COOKIE.to_string(),
        }
    }

    pub fn with_token_cookie(mut self, name: impl Into<String>) -> Self {
        self.token_cookie = name.into();
        self
    }
}
