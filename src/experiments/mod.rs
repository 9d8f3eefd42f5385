//! Experimentation collaborator subsystem.
//!
//! # Data Flow
//! ```text
//! Experiment route (rewritten to /{locale}/exp/...)
//!     → decision.rs (FlagEvaluator: bounded wait, default fallback)
//!         → datafile.rs (cached datafile = readiness)
//!         → DecisionProvider (remote service, opaque)
//!     → variation forwarded to origin
//!
//! Datafile webhook:
//!     signature.rs (HMAC-SHA1, constant-time compare)
//!     → datafile.rs invalidate → next decision refetches
//! ```

pub mod datafile;
pub mod decision;
pub mod signature;

use serde::Serialize;
use thiserror::Error;

use crate::config::FlagConfig;

pub use datafile::{Datafile, DatafileCache};
pub use decision::{DecisionProvider, FlagEvaluator, HttpDecisionProvider};

/// Errors talking to the experimentation service.
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("timed out after {0} ms")]
    Timeout(u64),

    #[error("decision is missing variable {0:?}")]
    MissingVariable(String),
}

/// A selectable flag value advertised for discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagOption {
    pub value: String,
    pub label: String,
}

/// Flag metadata advertised on the discovery endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagDefinition {
    pub key: String,
    pub default_value: String,
    pub description: String,
    pub options: Vec<FlagOption>,
}

/// Flags this service evaluates.
pub fn flag_definitions(config: &FlagConfig) -> Vec<FlagDefinition> {
    vec![FlagDefinition {
        key: config.variable_key.clone(),
        default_value: config.default_variation.clone(),
        description: "Content variation key served on experiment routes".to_string(),
        options: config
            .options
            .iter()
            .map(|o| FlagOption {
                value: o.clone(),
                label: o.clone(),
            })
            .collect(),
    }]
}
