//! # forma-core
//!
//! Core crate for Forma CRM. Contains configuration schemas, typed
//! identifiers, pagination types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Forma crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
