//! # curio-core
//!
//! Core types, traits, and abstractions for the curio collection service.
//!
//! This crate provides the domain model (aggregates, memberships, activity),
//! the error taxonomy shared by every layer, payload validation, and the
//! static-text query guard.

pub mod defaults;
pub mod error;
pub mod guard;
pub mod models;
pub mod traits;
pub mod validation;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
