//! Locale & experiment routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query, cookies, Accept-Language)
//!     → router.rs (exclusion check, locale prefix detection)
//!     → locale.rs (cookie > Accept-Language > default)
//!     → matcher.rs (experiment path lookup)
//!     → Return: RoutingDecision (pass-through, rewrite or redirect)
//!     → visitor.rs (cookie/header plan for the response)
//!
//! Table Compilation (at startup):
//!     EdgeConfig.locales + EdgeConfig.experiments
//!     → LocaleSet (ordered codes + default)
//!     → ExperimentPaths (literal set + compiled patterns)
//!     → Freeze as immutable LocaleRouter
//! ```
//!
//! # Design Decisions
//! - Tables compiled at startup, immutable at runtime
//! - Pure functions of the request and the tables: no I/O, no locks
//! - Deterministic: same input always yields the same decision

pub mod locale;
pub mod matcher;
pub mod router;
pub mod visitor;

pub use locale::{LocaleSet, LocaleSource};
pub use matcher::ExperimentPaths;
pub use router::{LocaleRouter, Route, RouteKind, RouteRequest, RoutingDecision};
pub use visitor::{plan_cookie_sync, CookieSync};
