//! Folio API client

pub mod auth;
pub mod content;
pub mod error;
pub mod request;
mod refresh;

use crate::config::ClientConfig;
use error::ClientError;
use folio_core::{ACCESS_TOKEN, CookieOptions, Envelope, SessionStore, Token};
use futures::FutureExt;
use refresh::{RefreshCall, RefreshGate};
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub use request::{ApiResponse, Attempt, PendingRequest};

/// Authenticated gateway for every backend call
///
/// Clones share the HTTP connection pool, the session and the in-flight
/// refresh. Use [`FolioClient::with_session`] to talk on behalf of another
/// session (e.g. the one carried by an incoming page request).
#[derive(Clone)]
pub struct FolioClient {
    http: Client,
    base_url: String,
    refresh_path: String,
    session: SessionStore,
    cookie_options: CookieOptions,
    refresh_gate: RefreshGate,
}

impl FolioClient {
    /// Create a new client with default configuration and an empty session
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> FolioClientBuilder {
        FolioClientBuilder::default()
    }

    /// Build a client from configuration
    pub fn from_config(config: &ClientConfig, session: SessionStore) -> Result<Self, ClientError> {
        let mut builder = Self::builder()
            .base_url(&config.base_url)
            .refresh_path(&config.refresh_path)
            .user_agent(&config.user_agent)
            .session(session)
            .cookie_options(CookieOptions::protected(config.secure_cookies));

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The session this client reads credentials from
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    pub const fn cookie_options(&self) -> CookieOptions {
        self.cookie_options
    }

    /// Same backend and connection pool, different session
    pub fn with_session(&self, session: SessionStore) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            refresh_path: self.refresh_path.clone(),
            session,
            cookie_options: self.cookie_options,
            refresh_gate: RefreshGate::default(),
        }
    }

    /// Send a request, refreshing the access credential once on `401`
    ///
    /// Non-2xx responses are returned as typed failures. A request that is
    /// rejected again after the refresh is not retried a second time.
    #[tracing::instrument(
        name = "client.send",
        skip_all,
        fields(method = %request.method(), path = %request.path())
    )]
    pub async fn send(&self, request: PendingRequest) -> Result<ApiResponse, ClientError> {
        let response = self.dispatch(&request).await?;

        if response.status() != StatusCode::UNAUTHORIZED
            || request.attempt() == Attempt::Retried
        {
            return response.into_result();
        }

        debug!("Access credential rejected, refreshing");
        self.refresh().await?;

        let retry = request.into_retry();
        self.dispatch(&retry).await?.into_result()
    }

    /// Send a request and decode the response envelope
    pub async fn call<T: DeserializeOwned>(
        &self,
        request: PendingRequest,
    ) -> Result<Envelope<T>, ClientError> {
        self.send(request).await?.envelope()
    }

    /// Obtain a new access credential using the stored refresh credential
    ///
    /// Concurrent callers share a single refresh call. On success the new
    /// credential is already stored in the session.
    pub async fn refresh(&self) -> Result<Token, ClientError> {
        let call = RefreshCall {
            http: self.http.clone(),
            url: format!("{}{}", self.base_url, self.refresh_path),
            session: self.session.clone(),
            cookie_options: self.cookie_options,
        };

        self.refresh_gate.run(move || call.execute().boxed()).await
    }

    /// One network round-trip with the current access credential attached
    #[tracing::instrument(
        name = "client.dispatch",
        skip_all,
        fields(attempt = ?request.attempt(), status = tracing::field::Empty)
    )]
    async fn dispatch(&self, request: &PendingRequest) -> Result<ApiResponse, ClientError> {
        let url = format!("{}{}", self.base_url, request.path());
        let mut builder = self
            .http
            .request(request.method().clone(), url)
            .headers(request.headers().clone());

        if let Some(token) = self.session.get(ACCESS_TOKEN) {
            builder = builder.bearer_auth(token.as_str());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|err| {
            warn!(error = %err, "Request did not reach the backend");
            ClientError::from(err)
        })?;

        let status = response.status();
        tracing::Span::current().record("status", status.as_u16());

        let body = response.bytes().await?;
        if !status.is_success() {
            debug!(status = status.as_u16(), "Backend returned an error status");
        }

        Ok(ApiResponse::new(status, body))
    }
}

/// Builder for FolioClient
#[derive(Default)]
pub struct FolioClientBuilder {
    base_url: Option<String>,
    refresh_path: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    session: Option<SessionStore>,
    cookie_options: Option<CookieOptions>,
}

impl FolioClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the refresh endpoint path
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = Some(path.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Use an existing session instead of an empty one
    pub fn session(mut self, session: SessionStore) -> Self {
        self.session = Some(session);
        self
    }

    /// Attributes applied to credentials the client stores
    pub fn cookie_options(mut self, options: CookieOptions) -> Self {
        self.cookie_options = Some(options);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<FolioClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let refresh_path = self
            .refresh_path
            .unwrap_or_else(|| ClientConfig::default().refresh_path);
        if !refresh_path.starts_with('/') {
            return Err(ClientError::Configuration(format!(
                "refresh_path must start with '/': {refresh_path}"
            )));
        }

        let mut client_builder = ClientBuilder::new();

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        client_builder = client_builder.user_agent(
            self.user_agent
                .unwrap_or_else(|| ClientConfig::default().user_agent),
        );

        let http = client_builder.build()?;

        Ok(FolioClient {
            http,
            base_url,
            refresh_path,
            session: self.session.unwrap_or_default(),
            cookie_options: self.cookie_options.unwrap_or_default(),
            refresh_gate: RefreshGate::default(),
        })
    }
}
