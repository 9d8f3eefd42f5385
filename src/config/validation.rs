//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the locale set is usable (non-empty, default included)
//! - Check experiment patterns compile
//! - Validate addresses, URLs and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EdgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::EdgeConfig;
use crate::routing::matcher::PathPattern;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("locales.supported must not be empty")]
    EmptyLocaleSet,

    #[error("invalid locale code {0:?}")]
    InvalidLocaleCode(String),

    #[error("locale {0:?} is listed more than once")]
    DuplicateLocale(String),

    #[error("default locale {0:?} is not in locales.supported")]
    DefaultLocaleUnsupported(String),

    #[error("invalid experiment pattern {pattern:?}: {reason}")]
    InvalidExperimentPattern { pattern: String, reason: String },

    #[error("invalid {field} address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("invalid {field} URL {value:?}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("invalid cookies.locale_header {0:?}")]
    InvalidHeaderName(String),

    #[error("flags are enabled but flags.sdk_key is empty")]
    MissingSdkKey,

    #[error("webhook is enabled but no secret is configured")]
    MissingWebhookSecret,

    #[error("flags.decision_timeout_ms must be greater than zero")]
    ZeroDecisionTimeout,
}

/// Validate a deserialized configuration, collecting every error.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_locales(config, &mut errors);

    for pattern in &config.experiments.pages {
        if let Err(e) = PathPattern::compile(pattern) {
            errors.push(ValidationError::InvalidExperimentPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            });
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.origin.address.parse::<axum::http::uri::Authority>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "origin.address",
            value: config.origin.address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if axum::http::HeaderName::from_bytes(config.cookies.locale_header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeaderName(
            config.cookies.locale_header.clone(),
        ));
    }

    if config.flags.enabled {
        validate_flags(config, &mut errors);
    }

    if config.webhook.enabled
        && config.webhook.secret.as_deref().map_or(true, str::is_empty)
    {
        errors.push(ValidationError::MissingWebhookSecret);
    }

    if config.flags.decision_timeout_ms == 0 {
        errors.push(ValidationError::ZeroDecisionTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_locales(config: &EdgeConfig, errors: &mut Vec<ValidationError>) {
    let locales = &config.locales;
    if locales.supported.is_empty() {
        errors.push(ValidationError::EmptyLocaleSet);
        return;
    }

    let mut seen = HashSet::new();
    for code in &locales.supported {
        if !is_valid_locale_code(code) {
            errors.push(ValidationError::InvalidLocaleCode(code.clone()));
        } else if !seen.insert(code.to_ascii_lowercase()) {
            errors.push(ValidationError::DuplicateLocale(code.clone()));
        }
    }

    if !locales.supported.contains(&locales.default) {
        errors.push(ValidationError::DefaultLocaleUnsupported(locales.default.clone()));
    }
}

fn validate_flags(config: &EdgeConfig, errors: &mut Vec<ValidationError>) {
    let flags = &config.flags;
    if flags.sdk_key.is_empty() {
        errors.push(ValidationError::MissingSdkKey);
    }

    let urls = [
        ("flags.datafile_base_url", &flags.datafile_base_url),
        ("flags.decision_url", &flags.decision_url),
    ];
    for (field, value) in urls {
        let ok = Url::parse(value)
            .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
            .unwrap_or(false);
        if !ok {
            errors.push(ValidationError::InvalidUrl {
                field,
                value: value.clone(),
            });
        }
    }
}

/// Locale codes are path segments: letters, digits and `-` only.
pub(crate) fn is_valid_locale_code(code: &str) -> bool {
    !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> EdgeConfig {
        let mut config = EdgeConfig::default();
        config.webhook.secret = Some("shh".into());
        config
    }

    #[test]
    fn test_default_config_with_secret_is_valid() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_webhook_without_secret_is_rejected() {
        let config = EdgeConfig::default();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::MissingWebhookSecret]);
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = valid_config();
        config.locales.supported = vec!["en".into(), "en".into(), "f/r".into()];
        config.locales.default = "de".into();
        config.experiments.pages = vec!["/ok".into(), "/product/[slug".into()];
        config.listener.bind_address = "not an address".into();
        config.flags.decision_timeout_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateLocale("en".into())));
        assert!(errors.contains(&ValidationError::InvalidLocaleCode("f/r".into())));
        assert!(errors.contains(&ValidationError::DefaultLocaleUnsupported("de".into())));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::InvalidExperimentPattern { pattern, .. } if pattern == "/product/[slug"
        )));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::InvalidAddress { field: "listener.bind_address", .. }
        )));
        assert!(errors.contains(&ValidationError::ZeroDecisionTimeout));
    }

    #[test]
    fn test_empty_locale_set() {
        let mut config = valid_config();
        config.locales.supported.clear();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::EmptyLocaleSet]);
    }

    #[test]
    fn test_flags_checked_only_when_enabled() {
        let mut config = valid_config();
        config.flags.decision_url = "not a url".into();
        config.cookies.locale_header = "bad header".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::InvalidHeaderName("bad header".into())]);

        config.cookies.locale_header = "X-Locale".into();
        config.flags.enabled = true;
        config.flags.datafile_base_url = "ftp://cdn.example.com".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::MissingSdkKey));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::InvalidUrl { field: "flags.decision_url", .. }
        )));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::InvalidUrl { field: "flags.datafile_base_url", .. }
        )));
    }
}
