//! Flag evaluation against the remote experimentation service.
//!
//! # Responsibilities
//! - Ask the decision service for a visitor's variation
//! - Forward conversion events for a visitor
//! - Bound every call and fall back to the default variation
//!
//! # Design Decisions
//! - The decision engine is remote and opaque; `DecisionProvider` is the seam
//! - Readiness (datafile available) and decision share one time budget
//! - Fallback is explicit: any error, timeout or missing variable yields the default

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::config::FlagConfig;
use crate::experiments::datafile::DatafileCache;
use crate::experiments::ExperimentError;
use crate::observability::metrics;

/// Request for a single flag decision.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRequest {
    pub user_id: String,
    pub flag_key: String,
    pub datafile_revision: Option<String>,
}

/// Decision returned by the service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Decision {
    pub flag_key: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub variation_key: Option<String>,
    #[serde(default)]
    pub variables: Map<String, Value>,
}

/// Conversion event for a visitor.
#[derive(Debug, Clone, Serialize)]
pub struct TrackRequest {
    pub user_id: String,
    pub event_key: String,
    pub tags: Value,
}

/// Remote experimentation collaborator.
pub trait DecisionProvider: Send + Sync {
    fn decide(&self, request: DecisionRequest) -> BoxFuture<'_, Result<Decision, ExperimentError>>;

    fn track(&self, request: TrackRequest) -> BoxFuture<'_, Result<(), ExperimentError>>;
}

/// JSON-over-HTTP decision service client.
pub struct HttpDecisionProvider {
    base_url: String,
    client: reqwest::Client,
}

impl HttpDecisionProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

impl DecisionProvider for HttpDecisionProvider {
    fn decide(&self, request: DecisionRequest) -> BoxFuture<'_, Result<Decision, ExperimentError>> {
        Box::pin(async move {
            let response = self
                .client
                .post(format!("{}/decide", self.base_url))
                .json(&request)
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ExperimentError::Status(status.as_u16()));
            }
            Ok(response.json::<Decision>().await?)
        })
    }

    fn track(&self, request: TrackRequest) -> BoxFuture<'_, Result<(), ExperimentError>> {
        Box::pin(async move {
            let response = self
                .client
                .post(format!("{}/track", self.base_url))
                .json(&request)
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ExperimentError::Status(status.as_u16()));
            }
            Ok(())
        })
    }
}

/// Evaluates the content-variation flag with a bounded wait.
pub struct FlagEvaluator {
    provider: Arc<dyn DecisionProvider>,
    datafile: Arc<DatafileCache>,
    flag_key: String,
    variable_key: String,
    default_variation: String,
    event_key: String,
    timeout: Duration,
}

impl FlagEvaluator {
    pub fn new(provider: Arc<dyn DecisionProvider>, datafile: Arc<DatafileCache>, config: &FlagConfig) -> Self {
        Self {
            provider,
            datafile,
            flag_key: config.flag_key.clone(),
            variable_key: config.variable_key.clone(),
            default_variation: config.default_variation.clone(),
            event_key: config.track_event_key.clone(),
            timeout: Duration::from_millis(config.decision_timeout_ms),
        }
    }

    pub fn default_variation(&self) -> &str {
        &self.default_variation
    }

    /// Variation for a visitor; the default when no decision arrives in time.
    pub async fn variation(&self, user_id: &str) -> String {
        let outcome = tokio::time::timeout(self.timeout, self.decide_variation(user_id)).await;

        let variation = match outcome {
            Ok(Ok(variation)) => {
                metrics::record_flag_decision("decided");
                variation
            }
            Ok(Err(e)) => {
                tracing::warn!(flag = %self.flag_key, error = %e, "Flag decision failed, using default");
                metrics::record_flag_decision("fallback");
                self.default_variation.clone()
            }
            Err(_) => {
                tracing::warn!(
                    flag = %self.flag_key,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Flag decision timed out, using default"
                );
                metrics::record_flag_decision("fallback");
                self.default_variation.clone()
            }
        };

        tracing::debug!(variable = %self.variable_key, value = %variation, "Flag value reported");
        variation
    }

    async fn decide_variation(&self, user_id: &str) -> Result<String, ExperimentError> {
        let datafile = self.datafile.get().await?;
        let decision = self
            .provider
            .decide(DecisionRequest {
                user_id: user_id.to_string(),
                flag_key: self.flag_key.clone(),
                datafile_revision: datafile.revision.clone(),
            })
            .await?;

        decision
            .variables
            .get(&self.variable_key)
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| ExperimentError::MissingVariable(self.variable_key.clone()))
    }

    /// Record a button click for a visitor.
    pub async fn track_click(&self, user_id: &str, button_text: Option<&str>) -> Result<(), ExperimentError> {
        let request = TrackRequest {
            user_id: user_id.to_string(),
            event_key: self.event_key.clone(),
            tags: json!({
                "$opt_event_properties": { "Text": button_text.unwrap_or_default() }
            }),
        };

        let send = async {
            self.datafile.get().await?;
            self.provider.track(request).await
        };

        tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| ExperimentError::Timeout(self.timeout.as_millis() as u64))?
    }
}
