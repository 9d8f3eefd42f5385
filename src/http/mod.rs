//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → explicit route? → handlers.rs
//!     → fallback: middleware/locale_routing.rs (routing decision)
//!         → pass-through | rewrite | redirect (307)
//!     → server.rs proxy_handler (forward to origin with visitor headers)
//!     → cookies.rs (Set-Cookie, locale header)
//!     → Send to client
//!
//! /api/revalidate/datafile, /api/track, /.well-known/flags
//!     → handlers.rs (experimentation collaborator)
//! ```

pub mod cookies;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, EdgeServer, ServerError};
