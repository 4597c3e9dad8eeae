//! External Optimizer Adapter: an optional HTTP client for a
//! more sophisticated optimizer. When unset, unreachable, or slow beyond
//! the configured timeout, the Plan Service transparently falls back to
//! the local rule-based `domain::optimizer` and records the fallback on
//! the returned plan's `aiModelInfo`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use domain::{AiModelInfo, OptimizationMetrics, OptimizationResult, RankedEntry, Train};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("no external optimizer configured")]
    NotConfigured,

    #[error("request to external optimizer timed out")]
    Timeout,

    #[error("external optimizer request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("external optimizer returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("external optimizer returned a malformed response: {0}")]
    MalformedResponse(String),
}

/// Configuration read from the environment at startup.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    pub base_url: Option<String>,
    pub timeout_ms: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("EXTERNAL_OPTIMIZER_URL").ok(),
            timeout_ms: std::env::var("OPTIMIZER_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct RemoteOptimizeRequest<'a> {
    trains: &'a [Train],
    constraints: &'a serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteOptimizeResponse {
    ranked_trains: Vec<RankedEntry>,
    metrics: OptimizationMetrics,
    model_info: AiModelInfo,
}

/// HTTP client for the external optimizer.
#[derive(Debug, Clone)]
pub struct OptimizerClient {
    http_client: Client,
    config: OptimizerConfig,
}

impl OptimizerClient {
    pub fn new() -> Self {
        Self::with_config(OptimizerConfig::default())
    }

    pub fn with_config(config: OptimizerConfig) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .expect("failed to build external optimizer HTTP client");
        Self { http_client, config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.base_url.is_some()
    }

    /// Call the configured external optimizer. Returns `NotConfigured`
    /// immediately (no request attempted) when no base URL is set.
    pub async fn optimize_remote(
        &self,
        trains: &[Train],
        constraints: &serde_json::Value,
    ) -> Result<OptimizationResult, OptimizerError> {
        let base_url = self.config.base_url.as_ref().ok_or(OptimizerError::NotConfigured)?;

        let response = self
            .http_client
            .post(format!("{base_url}/optimize"))
            .json(&RemoteOptimizeRequest { trains, constraints })
            .send()
            .await
            .map_err(|e| if e.is_timeout() { OptimizerError::Timeout } else { OptimizerError::Http(e) })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(OptimizerError::Api { status, message });
        }

        let body: RemoteOptimizeResponse = response
            .json()
            .await
            .map_err(|e| OptimizerError::MalformedResponse(e.to_string()))?;

        Ok(OptimizationResult {
            ranked_trains: body.ranked_trains,
            metrics: body.metrics,
            model_info: body.model_info,
        })
    }
}

impl Default for OptimizerClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the Optimizer via the external adapter, falling back to the local
/// rule-based implementation on any failure.
/// The caller learns whether the fallback path was taken so it can log
/// and increment the fallback metric at the call site.
pub async fn optimize_with_fallback(
    client: &OptimizerClient,
    trains: &[Train],
    constraints: &serde_json::Value,
    now: DateTime<Utc>,
) -> (OptimizationResult, bool) {
    if !client.is_configured() {
        return (domain::optimizer::optimize(trains, constraints, now), true);
    }

    match client.optimize_remote(trains, constraints).await {
        Ok(result) => (result, false),
        Err(err) => {
            tracing::warn!(error = %err, "external optimizer unavailable, falling back to local optimizer");
            (domain::optimizer::optimize(trains, constraints, now), true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(base_url: String) -> OptimizerConfig {
        OptimizerConfig {
            base_url: Some(base_url),
            timeout_ms: 2_000,
        }
    }

    #[tokio::test]
    async fn not_configured_yields_error_without_request() {
        let client = OptimizerClient::with_config(OptimizerConfig {
            base_url: None,
            timeout_ms: 1_000,
        });
        let err = client.optimize_remote(&[], &serde_json::Value::Null).await.unwrap_err();
        assert!(matches!(err, OptimizerError::NotConfigured));
    }

    #[tokio::test]
    async fn falls_back_when_remote_is_unreachable() {
        let client = OptimizerClient::with_config(config_for("http://127.0.0.1:1".to_string()));
        let (_, used_fallback) = optimize_with_fallback(&client, &[], &json!({}), Utc::now()).await;
        assert!(used_fallback);
    }

    #[tokio::test]
    async fn falls_back_on_5xx_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/optimize"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = OptimizerClient::with_config(config_for(server.uri()));
        let (_, used_fallback) = optimize_with_fallback(&client, &[], &json!({}), Utc::now()).await;
        assert!(used_fallback);
    }

    #[tokio::test]
    async fn uses_remote_result_when_reachable() {
        let server = MockServer::start().await;
        let body = json!({
            "rankedTrains": [],
            "metrics": {
                "totalTrainsEvaluated": 0,
                "constraintsSatisfied": 0,
                "averageConfidence": 0.0,
                "processingTimeMs": 5
            },
            "modelInfo": {
                "version": "remote-1.0",
                "algorithm": "Remote Gradient Optimizer",
                "parameters": {}
            }
        });
        Mock::given(method("POST"))
            .and(path("/optimize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = OptimizerClient::with_config(config_for(server.uri()));
        let (result, used_fallback) = optimize_with_fallback(&client, &[], &json!({}), Utc::now()).await;
        assert!(!used_fallback);
        assert_eq!(result.model_info.version, "remote-1.0");
    }
}
