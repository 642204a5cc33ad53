//! Folio HTTP layer: the authenticated API client and the page route guard
//!
//! The client is the single gateway for backend calls. It attaches the
//! session's access credential, refreshes it once on a `401` and normalizes
//! failures into [`client::error::ClientError`]. The route guard decides, per
//! page request, whether to serve the page or redirect.

#[cfg(feature = "client")]
#[macro_use]
extern crate tracing;

pub mod config;
pub mod guard;

#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "server")]
pub mod middleware;
#[cfg(feature = "server")]
pub mod routes;

pub use config::{ClientConfig, GuardConfig};
pub use guard::{GuardDecision, PageKind, RouteGuard, SessionState};

#[cfg(feature = "client")]
pub use client::{FolioClient, FolioClientBuilder, error::ClientError};
