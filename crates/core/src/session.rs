//! Session storage with cookie-jar semantics
//!
//! A [`SessionStore`] is the explicit session context shared by the API client
//! and the route guard. Clones share the same underlying jar, so a credential
//! written by one holder is visible to every later request made through
//! another. The store also remembers which entries were touched since it was
//! created, letting a server turn those writes back into `Set-Cookie` headers.

use crate::token::Token;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Cookie name of the short-lived access credential
pub const ACCESS_TOKEN: &str = "accessToken";
/// Cookie name of the longer-lived refresh credential
pub const REFRESH_TOKEN: &str = "refreshToken";

/// Attributes attached to a stored credential
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieOptions {
    /// Hide the value from page scripts
    #[serde(default)]
    pub http_only: bool,
    /// Only send over HTTPS
    #[serde(default)]
    pub secure: bool,
    /// Lifetime in seconds; `None` makes it a session cookie
    #[serde(default)]
    pub max_age_secs: Option<i64>,
}

impl CookieOptions {
    /// Options used for credentials minted by the dashboard server itself
    pub const fn protected(secure: bool) -> Self {
        Self {
            http_only: true,
            secure,
            max_age_secs: None,
        }
    }
}

/// A credential together with its cookie attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub token: Token,
    pub options: CookieOptions,
}

/// A write performed on the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    Set(StoredCredential),
    Removed,
}

/// Snapshot of the credentials currently held
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access: Option<Token>,
    pub refresh: Option<Token>,
}

impl Session {
    /// No access credential means nobody is logged in
    pub const fn is_anonymous(&self) -> bool {
        self.access.is_none()
    }

    pub const fn can_refresh(&self) -> bool {
        self.refresh.is_some()
    }
}

#[derive(Debug, Default)]
struct Jar {
    entries: BTreeMap<String, StoredCredential>,
    changes: BTreeMap<String, SessionChange>,
}

/// Shared, internally synchronized credential jar
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    jar: Arc<RwLock<Jar>>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from cookies received with a request
    ///
    /// Seeded values are not reported by [`SessionStore::changes`].
    pub fn from_cookies<I, K, V>(cookies: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries = cookies
            .into_iter()
            .map(|(name, value)| {
                (
                    name.into(),
                    StoredCredential {
                        token: Token::new(value),
                        options: CookieOptions::default(),
                    },
                )
            })
            .collect();

        Self {
            jar: Arc::new(RwLock::new(Jar {
                entries,
                changes: BTreeMap::new(),
            })),
        }
    }

    /// Current value of a credential
    pub fn get(&self, name: &str) -> Option<Token> {
        let jar = self.jar.read().unwrap_or_else(PoisonError::into_inner);
        jar.entries.get(name).map(|entry| entry.token.clone())
    }

    /// Store a credential, replacing any previous value
    pub fn set(&self, name: &str, token: Token, options: CookieOptions) {
        let mut jar = self.jar.write().unwrap_or_else(PoisonError::into_inner);
        let entry = StoredCredential { token, options };
        jar.changes
            .insert(name.to_string(), SessionChange::Set(entry.clone()));
        jar.entries.insert(name.to_string(), entry);
    }

    /// Remove one credential
    pub fn clear(&self, name: &str) {
        let mut jar = self.jar.write().unwrap_or_else(PoisonError::into_inner);
        if jar.entries.remove(name).is_some() {
            jar.changes.insert(name.to_string(), SessionChange::Removed);
        }
    }

    /// Remove every stored credential
    pub fn clear_all(&self) {
        let mut jar = self.jar.write().unwrap_or_else(PoisonError::into_inner);
        let names: Vec<String> = jar.entries.keys().cloned().collect();
        jar.entries.clear();
        for name in names {
            jar.changes.insert(name, SessionChange::Removed);
        }
    }

    /// Access and refresh credentials as one snapshot
    pub fn session(&self) -> Session {
        let jar = self.jar.read().unwrap_or_else(PoisonError::into_inner);
        Session {
            access: jar.entries.get(ACCESS_TOKEN).map(|e| e.token.clone()),
            refresh: jar.entries.get(REFRESH_TOKEN).map(|e| e.token.clone()),
        }
    }

    /// Writes performed since the store was created or seeded
    pub fn changes(&self) -> Vec<(String, SessionChange)> {
        let jar = self.jar.read().unwrap_or_else(PoisonError::into_inner);
        jar.changes
            .iter()
            .map(|(name, change)| (name.clone(), change.clone()))
            .collect()
    }
}
