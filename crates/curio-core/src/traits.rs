//! Core traits for curio abstractions.
//!
//! These traits define the seams the write pipeline is assembled from, so
//! tests can substitute an implementation without touching the pipeline.

use async_trait::async_trait;
use sqlx::{Postgres, Transaction};

use crate::error::Result;
use crate::models::{Activity, NewActivity};

// =============================================================================
// AUDIT
// =============================================================================

/// Appends immutable activity records.
///
/// Implementations write on the caller's transaction so an activity row is
/// only ever visible when the mutation it describes commits.
#[async_trait]
pub trait AuditRecorder: Send + Sync {
    /// Record one activity on the given transaction.
    ///
    /// Fails with [`crate::Error::Validation`] when an id is missing.
    async fn record(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entry: NewActivity,
    ) -> Result<Activity>;

    /// Literal SQL text this recorder executes, for the query guard.
    fn statements(&self) -> Vec<&'static str> {
        Vec::new()
    }
}
