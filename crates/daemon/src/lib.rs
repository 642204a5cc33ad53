//! Folio dashboard server: static pages behind the session route guard

pub mod config;
pub mod server;

pub use config::{ServerConfig, Settings};
pub use server::{build_router, serve};

/// Result type for daemon operations
pub type Result<T> = std::result::Result<T, DaemonError>;

/// Daemon error types
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("API client error: {0}")]
    Client(#[from] folio_http::ClientError),
}
