//! Authentication API client methods

use super::{FolioClient, PendingRequest, error::ClientError};
use folio_core::{ACCESS_TOKEN, CurrentUser, Envelope, REFRESH_TOKEN, Token, error::CoreError};
use serde::{Deserialize, Serialize};

/// Credentials returned by login, registration and verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: Token,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<Token>,
}

/// Email and password login payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Signup payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    email: &'a str,
    code: &'a str,
}

#[derive(Serialize)]
struct ForgotPasswordRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct ResetPasswordRequest<'a> {
    id: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest<'a> {
    old_password: &'a str,
    new_password: &'a str,
}

impl FolioClient {
    /// Create an account and open a session
    pub async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<Envelope<AuthTokens>, ClientError> {
        let envelope = self
            .call(PendingRequest::post("/auth/register").json(request)?)
            .await?;
        self.store_tokens(&envelope);
        Ok(envelope)
    }

    /// Log in with email and password
    #[tracing::instrument(name = "client.login", skip_all)]
    pub async fn login(&self, request: &LoginRequest) -> Result<Envelope<AuthTokens>, ClientError> {
        let envelope = self
            .call(PendingRequest::post("/auth/login").json(request)?)
            .await?;
        self.store_tokens(&envelope);
        Ok(envelope)
    }

    /// Confirm an email address with the code sent to it
    pub async fn verify(
        &self,
        email: &str,
        code: &str,
    ) -> Result<Envelope<AuthTokens>, ClientError> {
        let envelope = self
            .call(PendingRequest::post("/auth/verify").json(&VerifyRequest { email, code })?)
            .await?;
        self.store_tokens(&envelope);
        Ok(envelope)
    }

    /// Ask the backend to mail a password reset link
    pub async fn forgot_password(&self, email: &str) -> Result<Envelope, ClientError> {
        self.call(
            PendingRequest::post("/auth/forgot-password").json(&ForgotPasswordRequest { email })?,
        )
        .await
    }

    /// Set a new password using the token from the reset link
    pub async fn reset_password(
        &self,
        token: &str,
        id: &str,
        password: &str,
    ) -> Result<Envelope, ClientError> {
        self.call(
            PendingRequest::post(format!("/auth/reset-password/{token}"))
                .json(&ResetPasswordRequest { id, password })?,
        )
        .await
    }

    /// Change the password of the logged-in user
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<Envelope, ClientError> {
        self.call(
            PendingRequest::post("/auth/change-password").json(&ChangePasswordRequest {
                old_password,
                new_password,
            })?,
        )
        .await
    }

    /// Drop every credential held by the session
    pub fn logout(&self) {
        self.session().clear_all();
        info!("Session cleared");
    }

    /// Resolve the logged-in user from the session
    ///
    /// An absent or expired access credential triggers one refresh. Any
    /// failure resolves to `None`: the visitor is treated as anonymous.
    pub async fn current_user(&self) -> Option<CurrentUser> {
        self.resolve_user()
            .await
            .inspect_err(|err| debug!(error = %err, "No session could be restored"))
            .ok()
            .flatten()
    }

    /// Same as [`FolioClient::current_user`], keeping the refresh failure
    ///
    /// `Ok(None)` means the access credential is unreadable; a missing or
    /// rejected refresh credential is [`ClientError::Auth`].
    #[tracing::instrument(name = "client.current_user", skip_all)]
    pub async fn resolve_user(&self) -> Result<Option<CurrentUser>, ClientError> {
        if let Some(access) = self.session().get(ACCESS_TOKEN) {
            match access.current_user() {
                Ok(user) => return Ok(Some(user)),
                Err(CoreError::TokenExpired { expired_at }) => {
                    debug!(expired_at, "Access credential expired");
                }
                Err(err) => {
                    debug!(error = %err, "Unreadable access credential");
                    return Ok(None);
                }
            }
        }

        let access = self.refresh().await?;
        Ok(access
            .current_user()
            .inspect_err(|err| debug!(error = %err, "Refreshed credential unusable"))
            .ok())
    }

    fn store_tokens(&self, envelope: &Envelope<AuthTokens>) {
        let Some(tokens) = envelope.data.as_ref().filter(|_| envelope.success) else {
            return;
        };

        let options = self.cookie_options();
        self.session()
            .set(ACCESS_TOKEN, tokens.access_token.clone(), options);
        if let Some(refresh) = &tokens.refresh_token {
            self.session().set(REFRESH_TOKEN, refresh.clone(), options);
        }
        debug!(with_refresh = tokens.refresh_token.is_some(), "Session opened");
    }
}
