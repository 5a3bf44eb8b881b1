//! Batch orchestration: grouping, pacing and per-file fallback

use crate::bridge::{OracleClient, OracleProvider, OracleSettings};
use crate::budget::BudgetTracker;
use crate::cache::ResultCache;
use crate::providers::create_provider;
use futures_util::future::join_all;
use serde::Serialize;
use specsniff_core::{
    fingerprint, ClassificationRequest, ClassificationResult, ConfigError, DetectorConfig,
    OracleError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const BUDGET_EXHAUSTED_REASON: &str = "Daily oracle budget exhausted; classification skipped";
pub const CANCELLED_REASON: &str = "Classification cancelled before the oracle was consulted";

/// Grouping and pacing knobs
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Files per group; also the peak number of concurrent oracle calls
    pub group_size: usize,
    /// Pause between groups to stay under provider rate limits
    pub group_delay: Duration,
    /// Confidence at or above which a spec verdict counts in the summary
    pub spec_threshold: u8,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::from(&DetectorConfig::default())
    }
}

impl From<&DetectorConfig> for BatchOptions {
    fn from(config: &DetectorConfig) -> Self {
        Self {
            group_size: config.group_size,
            group_delay: config.group_delay,
            spec_threshold: config.spec_threshold,
        }
    }
}

/// Advisory counters for one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub cache_hits: usize,
    pub oracle_calls: usize,
    pub classified: usize,
    pub failures: usize,
    pub budget_skipped: usize,
    pub cancelled: usize,
    pub likely_specs: usize,
}

/// Results index-aligned with the input, plus the summary
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub results: Vec<ClassificationResult>,
    pub summary: BatchSummary,
}

/// What happened to one file
#[derive(Debug)]
enum ItemOutcome {
    CacheHit(ClassificationResult),
    Classified(ClassificationResult),
    Failed(OracleError),
    BudgetExhausted,
    Cancelled,
}

/// Cached, budget-gated spec classifier.
///
/// Owns the budget and cache for its lifetime; both are handed out as `Arc`s
/// so the embedder can reset the budget or sweep the cache.
pub struct SpecDetector {
    provider: Arc<dyn OracleProvider>,
    client: OracleClient,
    budget: Arc<BudgetTracker>,
    cache: Arc<ResultCache>,
    options: BatchOptions,
}

impl SpecDetector {
    pub fn new(
        provider: Arc<dyn OracleProvider>,
        budget: Arc<BudgetTracker>,
        cache: Arc<ResultCache>,
    ) -> Self {
        let client = OracleClient::new(
            Arc::clone(&provider),
            Arc::clone(&budget),
            OracleSettings::default(),
        );
        Self {
            provider,
            client,
            budget,
            cache,
            options: BatchOptions::default(),
        }
    }

    /// Build provider, budget and cache from configuration.
    ///
    /// Fails when the configured provider has no credential.
    pub fn from_config(config: &DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let provider = create_provider(config)?;
        info!("Using {} oracle provider", provider.name());

        Ok(Self::new(
            provider,
            Arc::new(BudgetTracker::new(config.daily_budget_usd)),
            Arc::new(ResultCache::new(config.cache_ttl)),
        )
        .with_settings(OracleSettings::from(config))
        .with_options(BatchOptions::from(config)))
    }

    pub fn with_settings(mut self, settings: OracleSettings) -> Self {
        self.client =
            OracleClient::new(Arc::clone(&self.provider), Arc::clone(&self.budget), settings);
        self
    }

    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn budget(&self) -> &Arc<BudgetTracker> {
        &self.budget
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    pub fn provider_name(&self) -> &str {
        self.client.provider_name()
    }

    /// Classify every request; one result per request, in input order.
    pub async fn classify_batch(
        &self,
        requests: &[ClassificationRequest],
    ) -> Vec<ClassificationResult> {
        self.run_batch(requests, &CancellationToken::new()).await.results
    }

    /// Classify with an external cancellation signal.
    ///
    /// Once `cancel` fires no new oracle calls are issued; cache hits are still
    /// served and remaining misses get a fallback.
    pub async fn run_batch(
        &self,
        requests: &[ClassificationRequest],
        cancel: &CancellationToken,
    ) -> BatchOutcome {
        let mut summary = BatchSummary {
            total: requests.len(),
            ..Default::default()
        };
        let mut results = Vec::with_capacity(requests.len());

        if requests.is_empty() {
            return BatchOutcome { results, summary };
        }

        let group_size = self.options.group_size.max(1);
        let group_count = requests.len().div_ceil(group_size);
        info!(
            "Classifying {} files in {} group(s) of up to {}",
            requests.len(),
            group_count,
            group_size
        );

        for (index, group) in requests.chunks(group_size).enumerate() {
            // join_all yields outputs in input order, so each result lands in its slot
            let outcomes =
                join_all(group.iter().map(|request| self.classify_one(request, cancel))).await;

            let mut group_oracle_calls = 0;
            for outcome in outcomes {
                let result = match outcome {
                    ItemOutcome::CacheHit(result) => {
                        summary.cache_hits += 1;
                        result
                    }
                    ItemOutcome::Classified(result) => {
                        group_oracle_calls += 1;
                        summary.classified += 1;
                        result
                    }
                    ItemOutcome::Failed(err) => {
                        group_oracle_calls += 1;
                        summary.failures += 1;
                        ClassificationResult::fallback(format!("Classification failed: {err}"))
                    }
                    ItemOutcome::BudgetExhausted => {
                        summary.budget_skipped += 1;
                        ClassificationResult::fallback(BUDGET_EXHAUSTED_REASON)
                    }
                    ItemOutcome::Cancelled => {
                        summary.cancelled += 1;
                        ClassificationResult::fallback(CANCELLED_REASON)
                    }
                };
                results.push(result);
            }
            summary.oracle_calls += group_oracle_calls;
            debug!(
                "Group {}/{} done ({} oracle calls)",
                index + 1,
                group_count,
                group_oracle_calls
            );

            let is_last = index + 1 == group_count;
            if !is_last && !self.options.group_delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.options.group_delay) => {}
                    _ = cancel.cancelled() => debug!("Group pacing interrupted by cancellation"),
                }
            }
        }

        if summary.budget_skipped > 0 {
            warn!(
                "Daily budget exhausted (${:.4} of ${:.2}); {} file(s) skipped with fallback results",
                self.budget.spent_today(),
                self.budget.daily_ceiling(),
                summary.budget_skipped
            );
        }
        if summary.cancelled > 0 {
            warn!("Batch cancelled; {} file(s) not classified", summary.cancelled);
        }

        summary.likely_specs = results
            .iter()
            .filter(|result| result.is_likely_spec(self.options.spec_threshold))
            .count();

        info!(
            "Batch complete: {} files, {} cache hits, {} oracle calls, {} failures, {} likely specs",
            summary.total,
            summary.cache_hits,
            summary.oracle_calls,
            summary.failures,
            summary.likely_specs
        );

        BatchOutcome { results, summary }
    }

    async fn classify_one(
        &self,
        request: &ClassificationRequest,
        cancel: &CancellationToken,
    ) -> ItemOutcome {
        let key = fingerprint(&request.path, &request.content);

        if let Some(cached) = self.cache.get(&key) {
            debug!("Cache hit for {} ({})", request.path, key.short());
            return ItemOutcome::CacheHit(cached);
        }

        if cancel.is_cancelled() {
            return ItemOutcome::Cancelled;
        }

        if !self.budget.has_budget() {
            return ItemOutcome::BudgetExhausted;
        }

        match self.client.classify(&request.path, &request.content).await {
            Ok(result) => {
                self.cache.put(key, result.clone());
                ItemOutcome::Classified(result)
            }
            Err(e) => {
                warn!("Classification failed for {}: {}", request.path, e);
                ItemOutcome::Failed(e)
            }
        }
    }
}
