//! Locale & experiment routing edge service library.

pub mod config;
pub mod experiments;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::EdgeConfig;
pub use http::EdgeServer;
pub use lifecycle::Shutdown;
pub use routing::LocaleRouter;
