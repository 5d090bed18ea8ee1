use crate::{
    flow::{
        definition::FlowDefinition,
        types::{FlowFuture, Resource},
    },
    ErrorKind, FlowError, Result,
};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, instrument, warn};

/// Whether a retrieval consults the cache before the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Serve a fresh cached value when there is one.
    #[default]
    PreferCache,
    /// Skip the load stage; still save the network result.
    NetworkOnly,
}

/// The three stages of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadFromCache,
    Network,
    SaveToCache,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Succeeded,
    /// The cache answered but the freshness check rejected the value.
    Stale,
    Failed(FlowError),
    Cancelled,
}

/// Sent on the feedback channel each time a stage finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub outcome: StageOutcome,
}

/// Where a retrieved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Network,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retrieval<T> {
    pub value: T,
    pub origin: Origin,
}

pub type Freshness<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Sequences the stages of a [`FlowDefinition`]: load, then maybe network, then save.
///
/// A load that fails with [`FlowError::PersistenceBailout`] or
/// [`FlowError::CacheMiss`], or that yields a value the freshness check
/// rejects, falls through to the network. Any other failure ends the
/// retrieval. A network result is always passed through the save stage.
///
/// Stages never overlap. A shutdown signal drops the active stage and no
/// later stage runs. There is no retry.
pub struct FlowRunner<T> {
    definition: FlowDefinition<T>,
    policy: CachePolicy,
    freshness: Option<Freshness<T>>,
    feedback: Option<flume::Sender<StageReport>>,
}

impl<T> FlowRunner<T>
where
    T: Send + 'static,
{
    #[must_use]
    pub const fn new(definition: FlowDefinition<T>) -> Self {
        Self {
            definition,
            policy: CachePolicy::PreferCache,
            freshness: None,
            feedback: None,
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Cached values for which `is_fresh` returns false are refetched.
    #[must_use]
    pub fn with_freshness<F>(mut self, is_fresh: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.freshness = Some(Arc::new(is_fresh));
        self
    }

    #[must_use]
    pub fn with_feedback(mut self, feedback: flume::Sender<StageReport>) -> Self {
        self.feedback = Some(feedback);
        self
    }

    #[must_use]
    pub const fn definition(&self) -> &FlowDefinition<T> {
        &self.definition
    }

    /// Runs one retrieval of `resource`.
    ///
    /// # Errors
    ///
    /// Returns the error of the first stage that fails (other than a
    /// fall-through cache load), or [`FlowError::Cancelled`] when `shutdown`
    /// fires first.
    #[instrument(skip(self, shutdown), fields(path = %resource.path))]
    pub async fn retrieve(
        &self,
        resource: Resource,
        shutdown: Option<broadcast::Receiver<()>>,
    ) -> Result<Retrieval<T>> {
        let mut shutdown = shutdown;

        if self.policy == CachePolicy::PreferCache {
            let loaded = run_stage(
                Stage::LoadFromCache,
                self.definition.load_from_cache(),
                &mut shutdown,
            )
            .await;

            match loaded {
                Ok(value) if self.is_fresh(&value) => {
                    self.report(Stage::LoadFromCache, StageOutcome::Succeeded);
                    info!("Served from cache");
                    return Ok(Retrieval {
                        value,
                        origin: Origin::Cache,
                    });
                }
                Ok(_) => {
                    self.report(Stage::LoadFromCache, StageOutcome::Stale);
                    debug!("Cached value is stale, falling through to network");
                }
                Err(e) if e.is_cache_fallthrough() => {
                    self.report(Stage::LoadFromCache, StageOutcome::Failed(e.clone()));
                    debug!(error = %e, "No cached value, falling through to network");
                }
                Err(e) => {
                    self.report_failure(Stage::LoadFromCache, &e);
                    return Err(e);
                }
            }
        }

        let fetched = run_stage(Stage::Network, self.definition.network(resource), &mut shutdown)
            .await
            .inspect_err(|e| self.report_failure(Stage::Network, e))?;
        self.report(Stage::Network, StageOutcome::Succeeded);

        let saved = run_stage(
            Stage::SaveToCache,
            self.definition.save_to_cache(fetched),
            &mut shutdown,
        )
        .await
        .inspect_err(|e| self.report_failure(Stage::SaveToCache, e))?;
        self.report(Stage::SaveToCache, StageOutcome::Succeeded);

        info!("Served from network");
        Ok(Retrieval {
            value: saved,
            origin: Origin::Network,
        })
    }

    fn is_fresh(&self, value: &T) -> bool {
        self.freshness.as_ref().map_or(true, |is_fresh| is_fresh(value))
    }

    fn report_failure(&self, stage: Stage, err: &FlowError) {
        if err.kind() == ErrorKind::Cancelled {
            debug!(?stage, error = %err, "Stage cancelled");
            self.report(stage, StageOutcome::Cancelled);
        } else {
            error!(?stage, error = %err, "Stage failed");
            self.report(stage, StageOutcome::Failed(err.clone()));
        }
    }

    fn report(&self, stage: Stage, outcome: StageOutcome) {
        if let Some(feedback) = &self.feedback {
            if let Err(e) = feedback.try_send(StageReport { stage, outcome }) {
                warn!("Failed to send stage feedback: {}", e);
            }
        }
    }
}

// Awaits one stage unless shutdown fires first. A closed shutdown channel
// means nobody can cancel any more, so the stage simply runs to completion.
async fn run_stage<T>(
    stage: Stage,
    mut operation: FlowFuture<'static, T>,
    shutdown: &mut Option<broadcast::Receiver<()>>,
) -> Result<T> {
    let Some(receiver) = shutdown.as_mut() else {
        return operation.await;
    };

    tokio::select! {
        biased;
        signal = receiver.recv() => match signal {
            Ok(()) | Err(RecvError::Lagged(_)) => {
                warn!(?stage, "Received shutdown signal");
                Err(FlowError::Cancelled)
            }
            Err(RecvError::Closed) => {
                *shutdown = None;
                operation.await
            }
        },
        result = &mut operation => result,
    }
}
