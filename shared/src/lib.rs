//! Shared types for the foundation services
//!
//! Error codes and the HTTP error body, domain models for members, donations
//! and verification codes, and small time/id helpers.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
