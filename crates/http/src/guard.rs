//! Page route guard
//!
//! Evaluated once per page request, before the page is served:
//!
//! | session         | auth page (`/login`, `/signup`) | any other page             |
//! |-----------------|---------------------------------|----------------------------|
//! | unauthenticated | `Allow`                         | `RedirectToLogin(path)`    |
//! | authenticated   | `RedirectToHome`                | `Allow`                    |
//!
//! Nothing is carried between requests except what lives in the session.

use crate::config::GuardConfig;
use folio_core::CurrentUser;

/// Whether a user could be resolved for the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
}

/// Kind of page being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Login and signup screens
    AuthPage,
    ProtectedPage,
}

/// Outcome of the guard for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Location of the login page, carrying the requested path
    RedirectToLogin(String),
    RedirectToHome,
}

/// Decides page access from the session state
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    config: GuardConfig,
}

impl RouteGuard {
    pub const fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn home_path(&self) -> &str {
        &self.config.home_path
    }

    pub fn page_kind(&self, path: &str) -> PageKind {
        if self.config.auth_pages.iter().any(|page| page == path) {
            PageKind::AuthPage
        } else {
            PageKind::ProtectedPage
        }
    }

    /// Static assets and health checks skip the guard entirely
    pub fn is_public(&self, path: &str) -> bool {
        if self
            .config
            .public_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            return true;
        }

        let file_name = path.rsplit('/').next().unwrap_or_default();
        file_name.rsplit_once('.').is_some_and(|(_, ext)| {
            self.config
                .public_extensions
                .iter()
                .any(|public| public.eq_ignore_ascii_case(ext))
        })
    }

    /// Login location that sends the user back to `path` afterwards
    pub fn login_location(&self, path: &str) -> String {
        format!("{}?redirect={path}", self.config.login_path)
    }

    /// Decide access for a request whose user has already been resolved
    pub fn decide(&self, path: &str, user: Option<&CurrentUser>) -> GuardDecision {
        let state = if user.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        };

        match (state, self.page_kind(path)) {
            (SessionState::Unauthenticated, PageKind::AuthPage)
            | (SessionState::Authenticated, PageKind::ProtectedPage) => GuardDecision::Allow,
            (SessionState::Unauthenticated, PageKind::ProtectedPage) => {
                GuardDecision::RedirectToLogin(self.login_location(path))
            }
            (SessionState::Authenticated, PageKind::AuthPage) => GuardDecision::RedirectToHome,
        }
    }

    /// Resolve the user through `client` and decide access
    ///
    /// Resolution may refresh the access credential once; the refreshed
    /// credential ends up in the client's session. A rejected refresh
    /// credential clears the session; transient failures leave it alone.
    #[cfg(feature = "client")]
    #[tracing::instrument(name = "guard.evaluate", skip(self, client))]
    pub async fn evaluate(&self, client: &crate::client::FolioClient, path: &str) -> GuardDecision {
        let user = match client.resolve_user().await {
            Ok(user) => user,
            Err(err) if err.is_auth_expired() => {
                let held = client.session().session();
                if !held.is_anonymous() || held.can_refresh() {
                    info!(error = %err, "Session expired, clearing credentials");
                    client.logout();
                }
                None
            }
            Err(err) => {
                warn!(error = %err, "Could not restore session, treating visitor as anonymous");
                None
            }
        };

        let decision = self.decide(path, user.as_ref());
        debug!(?decision, authenticated = user.is_some(), "Route guard decision");
        decision
    }
}
