//! Middleware components for page request processing

pub mod guard;

pub use guard::{GuardState, route_guard_middleware, session_cookies};
