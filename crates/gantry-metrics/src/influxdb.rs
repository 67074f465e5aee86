//! InfluxDB metric provider.
//!
//! Runs an InfluxQL query against `/query` and reduces the response to
//! the first value of the first series.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{MetricsError, MetricsResult};
use crate::provider::MetricProvider;

/// Provider backed by an InfluxDB 1.x query API.
pub struct InfluxDbProvider {
    client: reqwest::Client,
    address: String,
    database: String,
}

impl InfluxDbProvider {
    /// Build a provider for the InfluxDB server at `address`, querying
    /// the named database.
    pub fn new(address: &str, database: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            address: address.trim_end_matches('/').to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl MetricProvider for InfluxDbProvider {
    async fn get_value(&self, query: &str) -> MetricsResult<f64> {
        let url = format!("{}/query", self.address);
        let resp = self
            .client
            .get(&url)
            .query(&[("db", self.database.as_str()), ("q", query)])
            .send()
            .await
            .map_err(|e| MetricsError::Query(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(MetricsError::Query(format!(
                "influxdb returned status {}",
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
    results: Vec<QueryResult>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct QueryResult {
    series: Vec<Series>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct Series {
    /// Rows of `[time, field...]` values.
    values: Vec<Vec<serde_json::Value>>,
}

/// Reduce a query response body to a single scalar: first series, first
/// row, first field after the timestamp.
fn parse_query_response(body: &str) -> MetricsResult<f64> {
    let resp: QueryResponse =
        serde_json::from_str(body).map_err(|e| MetricsError::Parse(e.to_string()))?;

    let result = resp
        .results
        .first()
        .ok_or_else(|| MetricsError::Parse("query returned no results".to_string()))?;

    if let Some(err) = &result.error {
        return Err(MetricsError::Query(err.clone()));
    }

    let value = result
        .series
        .first()
        .and_then(|s| s.values.first())
        .and_then(|row| row.get(1))
        .ok_or_else(|| MetricsError::Parse("query returned no values".to_string()))?;

    match value {
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| MetricsError::Parse("value is not representable as f64".to_string())),
        serde_json::Value::String(s) => s
            .parse::<f64>()
            .map_err(|e| MetricsError::Parse(e.to_string())),
        other => Err(MetricsError::Parse(format!(
            "value has unexpected type: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_series_value() {
        let body = r#"{
            "results": [
                {"series": [
                    {"name": "queue", "columns": ["time", "depth"],
                     "values": [["2024-04-01T00:00:00Z", 123.5], ["2024-04-01T00:01:00Z", 999.0]]}
                ]}
            ]
        }"#;
        assert_eq!(parse_query_response(body).unwrap(), 123.5);
    }

    #[test]
    fn string_values_parse() {
        let body = r#"{
            "results": [{"series": [{"values": [["t", "42"]]}]}]
        }"#;
        assert_eq!(parse_query_response(body).unwrap(), 42.0);
    }

    #[test]
    fn empty_series_is_parse_error() {
        let body = r#"{"results": [{"series": []}]}"#;
        assert!(matches!(
            parse_query_response(body),
            Err(MetricsError::Parse(_))
        ));
    }

    #[test]
    fn query_error_surfaces() {
        let body = r#"{"results": [{"error": "database not found"}]}"#;
        assert!(matches!(
            parse_query_response(body),
            Err(MetricsError::Query(_))
        ));
    }
}
