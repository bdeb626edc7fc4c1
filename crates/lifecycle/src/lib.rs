//! Hiring lifecycle services.
//!
//! - [`LifecycleEngine`]: every job, application and offer transition, with
//!   the notifications each transition raises.
//! - [`ChatService`]: conversations and messages between a company and a
//!   subcontractor.
//! - [`JobScheduler`]: periodic sweep starting jobs whose start time has
//!   passed.

pub mod chat;
pub mod engine;
mod notices;
pub mod scheduler;

use siteworks_core::error::CoreError;
use siteworks_core::types::DbId;
use siteworks_db::store::StoreError;

pub use chat::ChatService;
pub use engine::LifecycleEngine;
pub use scheduler::JobScheduler;

/// Result type of every engine and chat operation.
pub type EngineResult<T> = Result<T, StoreError>;

pub(crate) fn not_found(entity: &'static str, id: DbId) -> StoreError {
    StoreError::Core(CoreError::NotFound { entity, id })
}

pub(crate) fn forbidden(message: impl Into<String>) -> StoreError {
    StoreError::Core(CoreError::Forbidden(message.into()))
}

pub(crate) fn conflict(message: impl Into<String>) -> StoreError {
    StoreError::Core(CoreError::Conflict(message.into()))
}
