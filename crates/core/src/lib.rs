//! Folio core types: session storage, bearer tokens and API payloads

pub mod error;
pub mod session;
pub mod token;
pub mod tracing;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use session::{
    ACCESS_TOKEN, CookieOptions, REFRESH_TOKEN, Session, SessionChange, SessionStore,
    StoredCredential,
};
pub use token::{Claims, CurrentUser, Token};
pub use types::{Blog, Envelope, Project, Skill, User};
