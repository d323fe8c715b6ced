//! Centralized default constants for curio.
//!
//! Limits and server defaults shared by the db and api crates live here so
//! that validation, pagination and configuration agree on one value.

// =============================================================================
// AGGREGATE LIMITS
// =============================================================================

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_LEN: usize = 5_000;

/// Maximum number of member items in one list.
pub const MAX_MEMBERS: usize = 500;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for list and activity reads.
pub const DEFAULT_PAGE_LIMIT: i64 = 50;

/// Upper bound applied to any requested page size.
pub const MAX_PAGE_LIMIT: i64 = 200;

/// Clamp a requested page size into `1..=MAX_PAGE_LIMIT`.
pub fn clamp_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT)
}

// =============================================================================
// SERVER
// =============================================================================

/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default request body limit (1 MiB; payloads are small JSON documents).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Default allowed CORS origin for the frontend dev server.
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173";
