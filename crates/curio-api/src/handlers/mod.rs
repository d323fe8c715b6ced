//! HTTP handler modules for curio-api.

pub mod activity;
pub mod lists;
