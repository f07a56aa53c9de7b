//! PMP Content Testing
//!
//! Decides per request whether a visitor sees a content experiment variant:
//! - Gated exposure evaluation with forced, sticky and fresh combinations
//! - Client-held assignment tokens
//! - Automatic suspension of experiments whose content broke
//! - Admin API for experiments, content items and the exposure log

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use api::state::AppState;
use domain::content::{ContentItem, ContentRepository};
use domain::experiment::ExperimentDefinition;
use domain::exposure::ExposureTracker;
use infrastructure::{
    content::InMemoryContentRepository,
    experiment::InMemoryExperimentRepository,
    exposure::{
        DatasourceIntegrity, HashTrafficAllocator, InMemoryExposureTracker, RandomVariantSelector,
    },
    services::{ExperimentService, ExposureDependencies, ExposureEvaluator, ExposureSettings},
};

/// Initial content of the in-memory stores
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub items: Vec<ContentItem>,
    #[serde(default)]
    pub experiments: Vec<ExperimentDefinition>,
}

impl SeedData {
    /// Read seed data from a JSON file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;

        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid seed file {}", path.display()))
    }
}

/// Create the application state with all services initialized
pub async fn create_app_state(config: &AppConfig, seed: SeedData) -> anyhow::Result<AppState> {
    let content = Arc::new(InMemoryContentRepository::new());
    let experiments = Arc::new(InMemoryExperimentRepository::new());
    let tracker = Arc::new(InMemoryExposureTracker::new());

    let experiment_service = Arc::new(ExperimentService::new(experiments.clone()));

    let item_count = seed.items.len();
    for item in seed.items {
        content.save_item(item).await?;
    }

    let experiment_count = seed.experiments.len();
    for experiment in seed.experiments {
        let id = experiment.id().clone();
        experiment_service
            .import(experiment)
            .await
            .with_context(|| format!("Failed to seed experiment '{}'", id))?;
    }

    if item_count + experiment_count > 0 {
        info!(items = item_count, experiments = experiment_count, "Stores seeded");
    }

    let settings = ExposureSettings {
        enabled: config.testing.enabled,
        shell_site: config.testing.shell_site.clone(),
    };

    let content_repository: Arc<dyn ContentRepository> = content;
    let exposure_tracker: Arc<dyn ExposureTracker> = tracker;

    let evaluator = Arc::new(ExposureEvaluator::new(
        settings,
        ExposureDependencies {
            content: content_repository.clone(),
            experiments,
            selector: Arc::new(RandomVariantSelector::new()),
            integrity: Arc::new(DatasourceIntegrity::new(content_repository.clone())),
            allocator: Arc::new(HashTrafficAllocator::new()),
            tracker: exposure_tracker.clone(),
        },
    ));

    Ok(AppState::new(
        evaluator,
        experiment_service,
        content_repository,
        exposure_tracker,
    )
    .with_token_cookie(&config.testing.token_cookie))
}
