//! Route guard as an axum middleware
//!
//! Each page request carries its own session in its cookies. The middleware
//! seeds a [`SessionStore`] from them, lets the guard resolve the user through
//! a request-scoped client and answers with the page or a redirect. Credentials
//! refreshed along the way are written back as `Set-Cookie` headers.

use crate::client::FolioClient;
use crate::guard::{GuardDecision, RouteGuard};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use folio_core::{ACCESS_TOKEN, REFRESH_TOKEN, SessionChange, SessionStore};
use std::sync::Arc;

/// Shared state of the guard middleware
#[derive(Clone)]
pub struct GuardState {
    pub guard: Arc<RouteGuard>,
    /// Template client; each request gets a copy bound to its own session
    pub client: FolioClient,
}

impl GuardState {
    pub fn new(guard: RouteGuard, client: FolioClient) -> Self {
        Self {
            guard: Arc::new(guard),
            client,
        }
    }
}

/// Middleware function for the page route guard
pub async fn route_guard_middleware(
    State(state): State<GuardState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();

    if state.guard.is_public(&path) {
        return next.run(req).await;
    }

    let session = SessionStore::from_cookies(
        [ACCESS_TOKEN, REFRESH_TOKEN]
            .into_iter()
            .filter_map(|name| jar.get(name).map(|cookie| (name, cookie.value().to_string()))),
    );
    let client = state.client.with_session(session.clone());

    let response = match state.guard.evaluate(&client, &path).await {
        GuardDecision::Allow => next.run(req).await,
        GuardDecision::RedirectToLogin(location) => {
            info!(%path, "Anonymous visitor sent to login");
            Redirect::temporary(&location).into_response()
        }
        GuardDecision::RedirectToHome => Redirect::temporary(state.guard.home_path()).into_response(),
    };

    (session_cookies(&session), response).into_response()
}

/// Turn the writes made to `session` into `Set-Cookie` headers
pub fn session_cookies(session: &SessionStore) -> CookieJar {
    session
        .changes()
        .into_iter()
        .fold(CookieJar::new(), |jar, (name, change)| match change {
            SessionChange::Set(credential) => {
                let mut cookie = Cookie::build((name, credential.token.into_inner()))
                    .path("/")
                    .same_site(SameSite::Lax)
                    .http_only(credential.options.http_only)
                    .secure(credential.options.secure);
                if let Some(secs) = credential.options.max_age_secs {
                    cookie = cookie.max_age(time::Duration::seconds(secs));
                }
                jar.add(cookie)
            }
            SessionChange::Removed => {
                let mut cookie = Cookie::build((name, "")).path("/").build();
                cookie.make_removal();
                jar.add(cookie)
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{CookieOptions, Token};

    #[test]
    fn test_session_cookies_reflect_changes() {
        let session = SessionStore::from_cookies([(ACCESS_TOKEN, "old"), (REFRESH_TOKEN, "r")]);
        session.set(
            ACCESS_TOKEN,
            Token::from("new"),
            CookieOptions::protected(true),
        );

        let jar = session_cookies(&session);
        let cookie = jar.get(ACCESS_TOKEN).unwrap();
        assert_eq!(cookie.value(), "new");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert!(jar.get(REFRESH_TOKEN).is_none());
    }

    #[test]
    fn test_cleared_credentials_are_expired() {
        let session = SessionStore::from_cookies([(ACCESS_TOKEN, "a"), (REFRESH_TOKEN, "r")]);
        session.clear_all();

        let jar = session_cookies(&session);
        for name in [ACCESS_TOKEN, REFRESH_TOKEN] {
            let cookie = jar.get(name).unwrap();
            assert_eq!(cookie.value(), "");
            assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        }
    }

    #[test]
    fn test_untouched_session_emits_nothing() {
        let session = SessionStore::from_cookies([(ACCESS_TOKEN, "a")]);
        assert_eq!(session_cookies(&session).iter().count(), 0);
    }
}
