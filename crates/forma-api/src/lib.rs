//! # forma-api
//!
//! HTTP surface: the action trigger endpoint, the workflow callback
//! ingestion endpoint, notification query/mutation endpoints, and the
//! per-session push connection.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
