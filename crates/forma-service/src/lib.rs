//! # forma-service
//!
//! Business services sitting between the HTTP surface and the repositories.

pub mod context;
pub mod notification;

pub use context::RequestContext;
pub use notification::service::NotificationService;
