//! Exposure service
//!
//! Decides, once per request, whether the client sees an experiment variant
//! and which one. Gates run in a fixed order and the first failing gate ends
//! the evaluation with the default content.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, warn};

use crate::domain::content::ContentRepository;
use crate::domain::experiment::{ExperimentDefinition, ExperimentRepository, TestSet};
use crate::domain::exposure::{
    ContentIntegrity, ExposureDecision, ExposureSource, ExposureTracker, RequestContext,
    Resolution, TokenJar, TrafficAllocator, VariantSelector,
};
use crate::domain::DomainError;
use crate::infrastructure::exposure::{AutoSuspender, CombinationResolver, CombinationValidator};
use crate::infrastructure::observability::{record_decision, record_evaluation_duration};

// ============================================================================
// Settings and dependencies
// ============================================================================

/// Runtime switches of the evaluator
#[derive(Debug, Clone)]
pub struct ExposureSettings {
    /// Global on/off switch for content testing
    pub enabled: bool,
    /// Site name of the authoring/administration surface
    pub shell_site: String,
}

impl Default for ExposureSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            shell_site: "shell".to_string(),
        }
    }
}

/// Collaborators the evaluator is assembled from
#[derive(Clone)]
pub struct ExposureDependencies {
    pub content: Arc<dyn ContentRepository>,
    pub experiments: Arc<dyn ExperimentRepository>,
    pub selector: Arc<dyn VariantSelector>,
    pub integrity: Arc<dyn ContentIntegrity>,
    pub allocator: Arc<dyn TrafficAllocator>,
    pub tracker: Arc<dyn ExposureTracker>,
}

// ============================================================================
// Exposure Evaluator
// ============================================================================

/// Per-request exposure decision pipeline
pub struct ExposureEvaluator {
    settings: ExposureSettings,
    content: Arc<dyn ContentRepository>,
    experiments: Arc<dyn ExperimentRepository>,
    tracker: Arc<dyn ExposureTracker>,
    resolver: CombinationResolver,
    validator: CombinationValidator,
    suspender: AutoSuspender,
}

impl ExposureEvaluator {
    pub fn new(settings: ExposureSettings, deps: ExposureDependencies) -> Self {
        Self {
            settings,
            resolver: CombinationResolver::new(deps.selector, deps.allocator),
            validator: CombinationValidator::new(deps.integrity),
            suspender: AutoSuspender::new(deps.experiments.clone()),
            content: deps.content,
            experiments: deps.experiments,
            tracker: deps.tracker,
        }
    }

    pub fn settings(&self) -> &ExposureSettings {
        &self.settings
    }

    /// Entry point for the host request pipeline.
    ///
    /// Never fails: on any error the request keeps the default content and
    /// the token is left untouched.
    pub async fn process(&self, context: &RequestContext, tokens: &mut TokenJar) {
        self.decide(context, tokens).await;
    }

    /// Like [`process`](Self::process) but hands back the decision
    pub async fn decide(
        &self,
        context: &RequestContext,
        tokens: &mut TokenJar,
    ) -> ExposureDecision {
        let started = Instant::now();

        let decision = match self.evaluate(context, tokens).await {
            Ok(decision) => decision,
            Err(e) => {
                error!(
                    client_id = %context.client_id,
                    item_id = ?context.item_id.as_ref().map(|i| i.as_str()),
                    error = %e,
                    "Exposure evaluation failed, serving default content"
                );
                tokens.reset_writes();
                ExposureDecision::NoExperiment
            }
        };

        record_decision(decision.outcome());
        record_evaluation_duration(decision.outcome(), started.elapsed());

        decision
    }

    /// Run the gates, resolve and validate a combination, and persist the
    /// outcome to the token jar.
    pub async fn evaluate(
        &self,
        context: &RequestContext,
        tokens: &mut TokenJar,
    ) -> Result<ExposureDecision, DomainError> {
        if !self.settings.enabled {
            debug!("Content testing disabled");
            return Ok(ExposureDecision::NoExperiment);
        }

        if context.site.eq_ignore_ascii_case(&self.settings.shell_site) {
            debug!(site = %context.site, "Request targets the authoring surface");
            return Ok(ExposureDecision::NoExperiment);
        }

        let Some(ref item_id) = context.item_id else {
            debug!("No content item on request");
            return Ok(ExposureDecision::NoExperiment);
        };

        if self.content.get_item(item_id).await?.is_none() {
            debug!(item_id = %item_id, "Content item not found");
            return Ok(ExposureDecision::NoExperiment);
        }

        let Some(experiment) = self.running_experiment(context).await? else {
            debug!(
                item_id = %item_id,
                device_id = %context.device_id,
                "No running experiment on item"
            );
            return Ok(ExposureDecision::NoExperiment);
        };

        let forced = context.forced_combination.is_some();

        if !forced && context.page_mode.is_editing() {
            debug!(page_mode = ?context.page_mode, "Edit rendering, not exposing");
            return Ok(ExposureDecision::NoExperiment);
        }

        if !forced && !context.session.is_trackable() {
            debug!(
                client_id = %context.client_id,
                active = context.session.active,
                bot = context.session.bot,
                "Session not tracked, not exposing"
            );
            return Ok(ExposureDecision::NoExperiment);
        }

        let test_set = TestSet::for_experiment(&experiment, item_id, &context.device_id);

        let resolution = self
            .resolver
            .resolve(context, &test_set, &experiment, tokens)
            .await?;

        match resolution {
            Resolution::None => Ok(ExposureDecision::NoExperiment),
            Resolution::Excluded => {
                tokens.write(test_set.id(), None);
                Ok(ExposureDecision::Excluded {
                    test_set_id: test_set.id().clone(),
                })
            }
            Resolution::Combination(combination, source) => {
                if let Some(broken) = self
                    .validator
                    .find_broken(&combination, &test_set, &experiment)
                    .await
                {
                    warn!(
                        experiment_id = %experiment.id(),
                        combination = %combination,
                        position = broken.position,
                        value_id = ?broken.value_id,
                        "Combination references broken content"
                    );

                    self.suspender.suspend(&experiment).await;

                    if let Err(e) = self.tracker.clear(context).await {
                        error!(client_id = %context.client_id, error = %e, "Failed to clear exposure");
                    }

                    tokens.write(test_set.id(), None);

                    return Ok(ExposureDecision::Suppressed {
                        experiment_id: experiment.id().clone(),
                    });
                }

                let first_exposure = source == ExposureSource::Fresh;

                if let Err(e) = self
                    .tracker
                    .set_combination(context, &combination, &experiment, first_exposure)
                    .await
                {
                    error!(client_id = %context.client_id, error = %e, "Failed to track exposure");
                }

                tokens.write(test_set.id(), Some(&combination));

                debug!(
                    experiment_id = %experiment.id(),
                    combination = %combination,
                    source = ?source,
                    "Client exposed"
                );

                Ok(ExposureDecision::Exposed {
                    experiment_id: experiment.id().clone(),
                    combination,
                    source,
                })
            }
        }
    }

    /// Oldest running experiment configured on the requested item and device
    async fn running_experiment(
        &self,
        context: &RequestContext,
    ) -> Result<Option<ExperimentDefinition>, DomainError> {
        let Some(ref item_id) = context.item_id else {
            return Ok(None);
        };

        let experiments = self
            .experiments
            .find_for_item(item_id, &context.device_id)
            .await?;

        Ok(experiments.into_iter().find(|e| e.is_running()))
    }
}
