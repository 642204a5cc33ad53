//! Access credential refresh with single-flight coalescing
//!
//! When several requests hit a `401` at the same time only the first one
//! starts a refresh call. The others await the same in-flight outcome, so the
//! backend sees one refresh and the session is written once.

use super::error::ClientError;
use super::request::ApiResponse;
use folio_core::{ACCESS_TOKEN, CookieOptions, REFRESH_TOKEN, SessionStore, Token};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};

const SESSION_EXPIRED: &str = "Session expired, please log in again";

type RefreshFuture = Shared<BoxFuture<'static, Result<Token, ClientError>>>;

/// Coalesces concurrent refreshes of one session
#[derive(Clone, Default)]
pub(crate) struct RefreshGate {
    in_flight: Arc<Mutex<Option<RefreshFuture>>>,
}

impl RefreshGate {
    /// Join the in-flight refresh, or start one with `start`
    pub(crate) async fn run<F>(&self, start: F) -> Result<Token, ClientError>
    where
        F: FnOnce() -> BoxFuture<'static, Result<Token, ClientError>>,
    {
        let future = {
            let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(future) = slot.as_ref() {
                debug!("Joining in-flight token refresh");
                future.clone()
            } else {
                let future = start().shared();
                *slot = Some(future.clone());
                future
            }
        };

        let outcome = future.clone().await;

        // The first waiter to finish resets the slot so the next expiry starts over
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&future)) {
            *slot = None;
        }

        outcome
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    refresh_token: String,
}

/// One refresh round-trip, detached from the client so it can outlive the caller
pub(crate) struct RefreshCall {
    pub(crate) http: Client,
    pub(crate) url: String,
    pub(crate) session: SessionStore,
    pub(crate) cookie_options: CookieOptions,
}

impl RefreshCall {
    /// Exchange the refresh credential for a new access credential
    ///
    /// A rejected refresh credential (4xx), a missing one and a response
    /// without an access token are [`ClientError::Auth`]: the session has to be
    /// considered expired. Transport failures and 5xx keep their own kind so a
    /// backend outage is not mistaken for a logout. Storage is left untouched
    /// on failure.
    #[tracing::instrument(name = "client.refresh", skip_all, fields(url = %self.url))]
    pub(crate) async fn execute(self) -> Result<Token, ClientError> {
        let Some(refresh_token) = self.session.get(REFRESH_TOKEN) else {
            debug!("No refresh credential stored, cannot refresh");
            return Err(ClientError::session_expired("No refresh credential available"));
        };

        let response = self
            .http
            .post(&self.url)
            .json(&RefreshRequest {
                refresh_token: refresh_token.into_inner(),
            })
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "Token refresh request failed");
                ClientError::from(err)
            })?;

        let status = response.status();
        let response = ApiResponse::new(status, response.bytes().await?);

        if status.is_client_error() {
            warn!(status = status.as_u16(), "Refresh credential rejected");
            return Err(ClientError::Auth {
                status: Some(status.as_u16()),
                message: response
                    .declared_message()
                    .unwrap_or_else(|| SESSION_EXPIRED.to_string()),
            });
        }
        if !status.is_success() {
            warn!(status = status.as_u16(), "Token refresh failed");
            return Err(ClientError::from_status(status, response.error_message()));
        }

        let body: Value = response.json().map_err(|err| {
            warn!(error = %err, "Unreadable refresh response");
            err
        })?;

        let access = token_field(&body, "accessToken").ok_or_else(|| {
            ClientError::session_expired("Refresh response carried no access token")
        })?;

        self.session
            .set(ACCESS_TOKEN, access.clone(), self.cookie_options);
        if let Some(rotated) = token_field(&body, "refreshToken") {
            self.session.set(REFRESH_TOKEN, rotated, self.cookie_options);
        }

        info!("Access credential refreshed");
        Ok(access)
    }
}

/// Read a token either at the top level or inside the `data` envelope
fn token_field(body: &Value, field: &str) -> Option<Token> {
    body.get(field)
        .or_else(|| body.get("data").and_then(|data| data.get(field)))
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(Token::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_token_field_shapes() {
        assert_eq!(
            token_field(&json!({"accessToken": "a"}), "accessToken"),
            Some(Token::from("a"))
        );
        assert_eq!(
            token_field(
                &json!({"success": true, "data": {"accessToken": "b"}}),
                "accessToken"
            ),
            Some(Token::from("b"))
        );
        assert_eq!(token_field(&json!({"accessToken": ""}), "accessToken"), None);
        assert_eq!(token_field(&json!({"success": false}), "accessToken"), None);
    }

    #[tokio::test]
    async fn test_gate_coalesces_concurrent_callers() {
        let gate = RefreshGate::default();
        let started = Arc::new(AtomicUsize::new(0));

        let callers = (0..5).map(|_| {
            let gate = gate.clone();
            let started = started.clone();
            async move {
                gate.run(move || {
                    started.fetch_add(1, Ordering::SeqCst);
                    async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(Token::from("fresh"))
                    }
                    .boxed()
                })
                .await
            }
        });

        let results = futures::future::join_all(callers).await;
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| r.as_ref().ok() == Some(&Token::from("fresh"))));
    }

    #[tokio::test]
    async fn test_gate_starts_again_after_completion() {
        let gate = RefreshGate::default();
        let started = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let started = started.clone();
            let result = gate
                .run(move || {
                    started.fetch_add(1, Ordering::SeqCst);
                    async { Err(ClientError::session_expired("nope")) }.boxed()
                })
                .await;
            assert!(matches!(result, Err(ClientError::Auth { .. })));
        }

        assert_eq!(started.load(Ordering::SeqCst), 2);
    }
}
