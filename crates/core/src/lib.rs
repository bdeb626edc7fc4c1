//! Siteworks domain core.
//!
//! Zero internal dependencies: identifiers, the error taxonomy, the hiring
//! state machines and the validation and search rules shared by the storage,
//! lifecycle and API crates.

pub mod actors;
pub mod channels;
pub mod error;
pub mod hiring;
pub mod notifications;
pub mod search;
pub mod types;
pub mod validation;
