//! Client and guard configuration

use serde::{Deserialize, Serialize};

/// Settings for [`crate::client::FolioClient`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend base URL, e.g. `https://api.example.com/api/v1`
    pub base_url: String,
    /// Path of the token refresh endpoint, relative to `base_url`
    pub refresh_path: String,
    /// Transport timeout in seconds; `None` keeps the transport default
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
    /// Mark credentials written by the dashboard as HTTPS-only
    pub secure_cookies: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api/v1".to_string(),
            refresh_path: "/auth/refresh-token".to_string(),
            timeout_secs: None,
            user_agent: concat!("folio-client/", env!("CARGO_PKG_VERSION")).to_string(),
            secure_cookies: false,
        }
    }
}

/// Settings for [`crate::guard::RouteGuard`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub login_path: String,
    pub home_path: String,
    /// Pages only anonymous visitors may open
    pub auth_pages: Vec<String>,
    /// Path prefixes served without any session check
    pub public_prefixes: Vec<String>,
    /// File extensions served without any session check
    pub public_extensions: Vec<String>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            home_path: "/".to_string(),
            auth_pages: vec!["/login".to_string(), "/signup".to_string()],
            public_prefixes: vec![
                "/health".to_string(),
                "/assets/".to_string(),
                "/_next/".to_string(),
            ],
            public_extensions: [
                "js", "css", "wasm", "map", "png", "jpg", "jpeg", "svg", "ico", "webp", "woff",
                "woff2",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_client_config_uses_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url": "https://api.example.com"}"#).unwrap();
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.refresh_path, "/auth/refresh-token");
        assert!(!config.secure_cookies);
    }

    #[test]
    fn test_default_auth_pages() {
        let config = GuardConfig::default();
        assert_eq!(config.auth_pages, vec!["/login", "/signup"]);
        assert_eq!(config.login_path, "/login");
    }
}
