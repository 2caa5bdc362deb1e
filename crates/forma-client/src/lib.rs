//! # forma-client
//!
//! Client-side consumer of the Forma push connection:
//!
//! - [`stream`]: the long-lived event stream with drop detection and
//!   fixed-backoff reconnection
//! - [`listener`]: per-action correlation listeners with bounded wait
//! - [`cache`]: the ordered, deduplicated local notification view with
//!   optimistic read-state mutations
//! - [`api`]: the REST fallback used for initial load and refresh

pub mod api;
pub mod cache;
pub mod center;
pub mod config;
pub mod events;
pub mod listener;
pub mod stream;

pub use cache::NotificationCache;
pub use center::NotificationCenter;
pub use config::ClientConfig;
pub use events::ClientEvent;
pub use listener::{ActiveListeners, CompletionOutcome, CorrelationListener};
pub use stream::EventStream;
