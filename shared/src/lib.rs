//! Shared types for the shop backend
//!
//! Common types used across crates: unified error codes, API response
//! structures, domain models and utility helpers.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};
