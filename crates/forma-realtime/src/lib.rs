//! # forma-realtime
//!
//! Event stream broadcaster for Forma CRM. Maintains one long-lived,
//! server-to-client push connection per browser session and multiplexes
//! unread-count snapshots, new-notification events, and correlation
//! resolution events onto it, with periodic keep-alive frames.
//!
//! Delivery is at-most-once: if no connection is open for the target
//! identity the event is dropped, and a reconnecting client recovers
//! missed state through the pull path.

pub mod broadcaster;
pub mod connection;
pub mod engine;
pub mod event;

pub use broadcaster::Broadcaster;
pub use engine::RealtimeEngine;
pub use event::{PushEvent, ResolutionStatus};
