//! Configuration management for the dashboard server

use crate::Result;
use ::config::{Config, Environment, File};
use folio_core::tracing::InstrumentationConfig;
use folio_http::{ClientConfig, GuardConfig};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Listener and static asset configuration
    pub server: ServerConfig,

    /// Backend API the dashboard talks to
    pub api: ClientConfig,

    /// Page access rules
    pub guard: GuardConfig,

    pub logging: InstrumentationConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind HTTP server
    pub bind_addr: SocketAddr,

    /// Directory holding the built dashboard
    pub static_dir: PathBuf,

    /// Page served for paths that match no file
    pub index_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            static_dir: PathBuf::from("dist"),
            index_file: "index.html".to_string(),
        }
    }
}

impl Settings {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// Environment variables use the `FOLIO_` prefix and `__` between
    /// sections, e.g. `FOLIO_API__BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("FOLIO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }
}
