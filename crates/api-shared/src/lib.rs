//! # API Shared
//!
//! Shared utilities and definitions for the Telemed APIs.
//!
//! Contains:
//! - Wire types exchanged by the REST server and its clients (`dto` module)
//! - Shared services like `HealthService`
//! - Mock token issuing (`auth` module)
//!
//! Used by `api-rest` and `telemed-client` for common functionality.

pub mod auth;
pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
