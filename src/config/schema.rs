//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Origin that renders the localized site.
    pub origin: OriginConfig,

    /// Supported locales and the default.
    pub locales: LocaleConfig,

    /// Experiment-enabled paths and routing exclusions.
    pub experiments: ExperimentConfig,

    /// Cookie and header names used for locale and visitor identity.
    pub cookies: CookieConfig,

    /// Remote experimentation service settings.
    pub flags: FlagConfig,

    /// Datafile invalidation webhook.
    pub webhook: WebhookConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Origin server the edge forwards rewritten requests to.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Origin address (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Locale configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Supported locale codes, in preference order.
    pub supported: Vec<String>,

    /// Locale served on clean (unprefixed) URLs.
    pub default: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            supported: vec!["en".to_string()],
            default: "en".to_string(),
        }
    }
}

/// Experiment routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Experiment-enabled paths, literal or with `[param]` segments.
    pub pages: Vec<String>,

    /// Extra path prefixes that bypass routing entirely.
    pub excluded_prefixes: Vec<String>,
}

/// Cookie and header names.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Cookie holding the visitor's locale.
    pub locale_name: String,

    /// Cookie holding the anonymous user id used for bucketing.
    pub user_id_name: String,

    /// Response header carrying a changed locale.
    pub locale_header: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            locale_name: "__LOCALE_NAME".to_string(),
            user_id_name: "__USER_ID".to_string(),
            locale_header: "X-Locale".to_string(),
        }
    }
}

/// Remote experimentation service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FlagConfig {
    /// Enable flag evaluation and event tracking.
    pub enabled: bool,

    /// SDK key used to locate the experiment datafile.
    pub sdk_key: String,

    /// Base URL of the datafile CDN.
    pub datafile_base_url: String,

    /// Base URL of the decision service.
    pub decision_url: String,

    /// Upper bound on readiness plus decision, in milliseconds.
    pub decision_timeout_ms: u64,

    /// Experiment flag whose variable selects the content variation.
    pub flag_key: String,

    /// Variable on the flag that carries the variation key.
    pub variable_key: String,

    /// Variation served when no decision is available.
    pub default_variation: String,

    /// Variations advertised on the discovery endpoint.
    pub options: Vec<String>,

    /// Event key recorded by the tracking endpoint.
    pub track_event_key: String,

    /// Bearer secret for the discovery endpoint. Discovery is off when unset.
    pub discovery_secret: Option<String>,
}

impl Default for FlagConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sdk_key: String::new(),
            datafile_base_url: "https://cdn.optimizely.com".to_string(),
            decision_url: "http://127.0.0.1:8090".to_string(),
            decision_timeout_ms: 500,
            flag_key: "opticon-portfolio-demo".to_string(),
            variable_key: "cms-saas-content-variation".to_string(),
            default_variation: "original".to_string(),
            options: vec![
                "Original".to_string(),
                "Variation1".to_string(),
                "Variation2".to_string(),
            ],
            track_event_key: "cta-clicked".to_string(),
            discovery_secret: None,
        }
    }
}

/// Datafile revalidation webhook.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Enable the webhook endpoint.
    pub enabled: bool,

    /// Route the webhook is served on.
    pub path: String,

    /// Shared HMAC secret.
    pub secret: Option<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/api/revalidate/datafile".to_string(),
            secret: None,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Datafile fetch timeout in seconds.
    pub datafile_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            datafile_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
