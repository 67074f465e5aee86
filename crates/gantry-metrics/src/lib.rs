//! gantry-metrics — per-group utilization and external metric values.
//!
//! Two collection paths feed the decision engine:
//!
//! - [`UsageCollector`] turns the orchestrator's allocation stats into
//!   per-group [`GroupResources`] (accumulated usage plus declared
//!   capacity). A gather either succeeds for the whole job or fails;
//!   partial results are discarded.
//! - [`ProviderRegistry`] dispatches external checks to pluggable
//!   [`MetricProvider`] backends (Prometheus, InfluxDB) and keeps
//!   per-provider success/error counters. Provider failures are
//!   per-check, never fatal.

pub mod collector;
pub mod error;
pub mod influxdb;
pub mod prometheus;
pub mod provider;

pub use collector::{GroupResources, ResourceUsage, UsageCollector};
pub use error::{MetricsError, MetricsResult};
pub use influxdb::InfluxDbProvider;
pub use prometheus::PrometheusProvider;
pub use provider::{MetricProvider, ProviderRegistry, ProviderStats};
