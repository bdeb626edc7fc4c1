//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` create/update DTOs with their `validate` methods
//! - Result structs for multi-row transitions

pub mod application;
pub mod conversation;
pub mod job;
pub mod notification;
pub mod offer;
