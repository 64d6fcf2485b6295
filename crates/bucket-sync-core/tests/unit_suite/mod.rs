//! Unit tests for bucket-sync-core.
//!
//! These tests drive the engines against the in-memory backend and local
//! temp directories. They don't require network access or credentials.

pub mod helpers;
pub mod mapping;
pub mod restore;
