//! External metric providers.
//!
//! A provider answers one question: "what is the current scalar value of
//! this query?" The registry routes each external check to the provider
//! its policy names and counts successes and failures per provider.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use gantry_policy::ExternalCheck;

use crate::error::{MetricsError, MetricsResult};

/// A pluggable external metric backend.
#[async_trait]
pub trait MetricProvider: Send + Sync {
    /// Run the query and reduce the response to a single scalar.
    async fn get_value(&self, query: &str) -> MetricsResult<f64>;
}

/// Success/error counts for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProviderStats {
    pub success: u64,
    pub error: u64,
}

#[derive(Default)]
struct ProviderCounters {
    success: AtomicU64,
    error: AtomicU64,
}

/// Routes external checks to their configured provider.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn MetricProvider>>,
    counters: RwLock<HashMap<String, Arc<ProviderCounters>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            counters: RwLock::new(HashMap::new()),
        }
    }

    /// Register a provider under its name. Registering again replaces
    /// the previous provider.
    pub fn register(&mut self, name: &str, provider: Arc<dyn MetricProvider>) {
        self.providers.insert(name.to_string(), provider);
    }

    /// Evaluate one external check for a job and return the scalar.
    ///
    /// Failures (unconfigured provider, query error, unparsable
    /// response) are errors the caller skips; they never fail the
    /// evaluation of the rest of the job.
    pub async fn evaluate(
        &self,
        job: &str,
        check_name: &str,
        check: &ExternalCheck,
    ) -> MetricsResult<f64> {
        let provider_name = check.provider.as_str();
        let counters = self.counters_for(provider_name).await;

        let Some(provider) = self.providers.get(provider_name) else {
            counters.error.fetch_add(1, Ordering::Relaxed);
            warn!(%job, check = %check_name, provider = %provider_name, "provider not configured");
            return Err(MetricsError::UnknownProvider(provider_name.to_string()));
        };

        match provider.get_value(&check.query).await {
            Ok(value) => {
                counters.success.fetch_add(1, Ordering::Relaxed);
                debug!(
                    %job,
                    check = %check_name,
                    provider = %provider_name,
                    value,
                    "external metric evaluated"
                );
                Ok(value)
            }
            Err(e) => {
                counters.error.fetch_add(1, Ordering::Relaxed);
                warn!(
                    %job,
                    check = %check_name,
                    provider = %provider_name,
                    error = %e,
                    "external metric evaluation failed"
                );
                Err(e)
            }
        }
    }

    /// Point-in-time counter snapshot per provider.
    pub async fn stats_snapshot(&self) -> HashMap<String, ProviderStats> {
        let counters = self.counters.read().await;
        counters
            .iter()
            .map(|(name, c)| {
                (
                    name.clone(),
                    ProviderStats {
                        success: c.success.load(Ordering::Relaxed),
                        error: c.error.load(Ordering::Relaxed),
                    },
                )
            })
            .collect()
    }

    async fn counters_for(&self, name: &str) -> Arc<ProviderCounters> {
        {
            let counters = self.counters.read().await;
            if let Some(c) = counters.get(name) {
                return c.clone();
            }
        }
        let mut counters = self.counters.write().await;
        counters
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(ProviderCounters::default()))
            .clone()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
