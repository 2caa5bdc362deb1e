//! # forma-entity
//!
//! Domain entities for Forma CRM: the persisted [`notification`] model with
//! its priority/audience/category enums, and the [`action`] vocabulary
//! (action types and their typed metadata payloads).

pub mod action;
pub mod notification;

pub use action::metadata::ActionMetadata;
pub use action::types::ActionType;
pub use notification::audience::Audience;
pub use notification::model::{Notification, NotificationCounts};
pub use notification::priority::NotificationPriority;
