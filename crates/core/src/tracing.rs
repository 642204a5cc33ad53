//! Tracing setup shared by the Folio binaries

#[cfg(feature = "tracing")]
pub mod config;
#[cfg(feature = "tracing")]
pub mod init;

#[cfg(feature = "tracing")]
pub use config::InstrumentationConfig;
#[cfg(feature = "tracing")]
pub use init::init_tracing;
