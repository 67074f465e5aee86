//! Prometheus metric provider.
//!
//! Runs an instant query against `/api/v1/query` and reduces the
//! response to the first sample's scalar value.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{MetricsError, MetricsResult};
use crate::provider::MetricProvider;

/// Provider backed by a Prometheus-compatible query API.
pub struct PrometheusProvider {
    client: reqwest::Client,
    address: String,
}

impl PrometheusProvider {
    /// Build a provider for the Prometheus server at `address`
    /// (e.g. `http://127.0.0.1:9090`).
    pub fn new(address: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            address: address.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MetricProvider for PrometheusProvider {
    async fn get_value(&self, query: &str) -> MetricsResult<f64> {
        let url = format!("{}/api/v1/query", self.address);
        let resp = self
            .client
            .get(&url)
            .query(&[("query", query)])
            .send()
            .await
            .map_err(|e| MetricsError::Query(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(MetricsError::Query(format!(
                "prometheus returned status {}",
                resp.status()
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| MetricsError::Query(e.to_string()))?;
        parse_query_response(&body)
    }
}

#[derive(Deserialize)]
struct QueryResponse {
    status: String,
    data: QueryData,
}

#[derive(Deserialize)]
struct QueryData {
    result: Vec<QuerySample>,
}

#[derive(Deserialize)]
struct QuerySample {
    /// `[timestamp, "value"]` pair; the value is a string.
    value: (f64, String),
}

/// Reduce an instant-query response body to a single scalar.
fn parse_query_response(body: &str) -> MetricsResult<f64> {
    let resp: QueryResponse =
        serde_json::from_str(body).map_err(|e| MetricsError::Parse(e.to_string()))?;

    if resp.status != "success" {
        return Err(MetricsError::Query(format!(
            "prometheus query status {}",
            resp.status
        )));
    }

    let sample = resp
        .data
        .result
        .first()
        .ok_or_else(|| MetricsError::Parse("query returned no samples".to_string()))?;

    sample
        .value
        .1
        .parse::<f64>()
        .map_err(|e| MetricsError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_instant_vector() {
        let body = r#"{
            "status": "success",
            "data": {
                "resultType": "vector",
                "result": [
                    {"metric": {"job": "web"}, "value": [1712000000.0, "87.5"]}
                ]
            }
        }"#;
        assert_eq!(parse_query_response(body).unwrap(), 87.5);
    }

    #[test]
    fn first_sample_wins() {
        let body = r#"{
            "status": "success",
            "data": {
                "resultType": "vector",
                "result": [
                    {"metric": {}, "value": [1712000000.0, "1"]},
                    {"metric": {}, "value": [1712000000.0, "2"]}
                ]
            }
        }"#;
        assert_eq!(parse_query_response(body).unwrap(), 1.0);
    }

    #[test]
    fn empty_result_is_parse_error() {
        let body = r#"{"status": "success", "data": {"resultType": "vector", "result": []}}"#;
        assert!(matches!(
            parse_query_response(body),
            Err(MetricsError::Parse(_))
        ));
    }

    #[test]
    fn error_status_is_query_error() {
        let body = r#"{"status": "error", "data": {"result": []}}"#;
        assert!(matches!(
            parse_query_response(body),
            Err(MetricsError::Query(_))
        ));
    }

    #[test]
    fn non_numeric_value_is_parse_error() {
        let body = r#"{
            "status": "success",
            "data": {"result": [{"value": [1712000000.0, "NaN-ish"]}]}
        }"#;
        assert!(matches!(
            parse_query_response(body),
            Err(MetricsError::Parse(_))
        ));
    }
}
