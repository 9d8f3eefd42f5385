//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides: EXPERIMENT_PAGES, ...)
//!     → validation.rs (semantic checks)
//!     → EdgeConfig (validated, immutable)
//!     → compiled into routing tables, shared via Arc
//! ```
//!
//! # Design Decisions
//! - Config is loaded once at startup and never mutated afterwards
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::EdgeConfig;
pub use schema::{
    CookieConfig, ExperimentConfig, FlagConfig, ListenerConfig, LocaleConfig,
    ObservabilityConfig, OriginConfig, TimeoutConfig, WebhookConfig,
};
