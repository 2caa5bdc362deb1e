//! Action vocabulary: action types and their typed metadata payloads.

pub mod metadata;
pub mod types;
