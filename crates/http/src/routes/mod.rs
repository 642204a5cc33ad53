//! Route definitions served next to the dashboard pages

pub mod health;
