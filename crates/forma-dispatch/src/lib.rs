//! # forma-dispatch
//!
//! The asynchronous action-correlation layer: a user-initiated action is
//! validated, guarded against duplicate submission, registered under a
//! client-generated correlation token, and forwarded fire-and-forget to
//! the external workflow engine. The engine's eventual callback resolves
//! the correlation, persists a notification, and pushes both to the
//! initiating session.

pub mod callback;
pub mod engine;
pub mod gateway;
pub mod registry;
pub mod types;

pub use callback::{CallbackDisposition, CallbackProcessor};
pub use engine::{HttpWorkflowEngine, WorkflowEngine};
pub use gateway::ActionDispatchGateway;
pub use registry::CorrelationRegistry;
pub use types::{ActionRequest, CallbackPayload, DispatchAck};
