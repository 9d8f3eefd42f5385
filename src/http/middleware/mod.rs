//! Request interceptors.

pub mod discovery_auth;
pub mod locale_routing;

pub use discovery_auth::discovery_auth_middleware;
pub use locale_routing::{locale_routing_middleware, Visitor};
