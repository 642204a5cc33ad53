//! Bearer tokens and the identity claims carried inside them
//!
//! Tokens are issued and signed by the backend. The dashboard never verifies
//! the signature; it only reads the claims to learn who is logged in and
//! whether the credential has already expired.

use crate::error::{CoreError, CoreResult};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque, time-bounded bearer credential
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw token string, as sent in the `Authorization` header
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Read the claims without checking the signature or the expiry
    pub fn claims(&self) -> CoreResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<Claims>(&self.0, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims)
            .map_err(CoreError::from)
    }

    /// Resolve the identity carried by this token, rejecting expired ones
    pub fn current_user(&self) -> CoreResult<CurrentUser> {
        self.current_user_at(Utc::now().timestamp())
    }

    /// Same as [`Token::current_user`] with an explicit clock
    pub fn current_user_at(&self, now: i64) -> CoreResult<CurrentUser> {
        let claims = self.claims()?;
        if let Some(expired_at) = claims.exp.filter(|&exp| exp <= now) {
            return Err(CoreError::TokenExpired { expired_at });
        }
        claims.into_user()
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// Credentials must never end up in logs.
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Claims the backend places in its access tokens
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User identifier
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Standard subject claim, used when `id` is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Issued at (UTC timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Expiration time (UTC timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Claims {
    fn into_user(self) -> CoreResult<CurrentUser> {
        let id = self
            .id
            .or(self.sub)
            .ok_or_else(|| CoreError::malformed_token("token carries no subject"))?;

        Ok(CurrentUser {
            id,
            email: self.email,
        })
    }
}

/// Identity shown in the dashboard for the logged-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn mint(claims: &Claims) -> Token {
        let token = encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(b"backend-secret"),
        )
        .unwrap();
        Token::new(token)
    }

    #[test]
    fn test_current_user_from_valid_token() {
        let now = Utc::now().timestamp();
        let token = mint(&Claims {
            id: Some("u-1".to_string()),
            email: Some("admin@example.com".to_string()),
            iat: Some(now),
            exp: Some(now + 3600),
            ..Claims::default()
        });

        let user = token.current_user().unwrap();
        assert_eq!(user.id, "u-1");
        assert_eq!(user.email.as_deref(), Some("admin@example.com"));
    }

    #[test]
    fn test_subject_used_when_id_missing() {
        let token = mint(&Claims {
            sub: Some("subject-7".to_string()),
            ..Claims::default()
        });

        assert_eq!(token.current_user().unwrap().id, "subject-7");
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = mint(&Claims {
            id: Some("u-1".to_string()),
            exp: Some(1_000),
            ..Claims::default()
        });

        let result = token.current_user_at(2_000);
        assert_eq!(result, Err(CoreError::TokenExpired { expired_at: 1_000 }));
        // Claims stay readable regardless of expiry
        assert_eq!(token.claims().unwrap().id.as_deref(), Some("u-1"));
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        let token = Token::from("not-a-jwt");
        assert!(matches!(
            token.current_user(),
            Err(CoreError::MalformedToken { .. })
        ));
    }

    #[test]
    fn test_debug_redacts_value() {
        let token = Token::from("secret-value");
        assert_eq!(format!("{token:?}"), "Token(***)");
    }
}
