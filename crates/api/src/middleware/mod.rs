//! Authentication and authorization extractors.
//!
//! - [`auth::AuthActor`] -- the authenticated actor from a JWT Bearer token.
//! - [`roles::RequireCompany`] -- requires a company token.
//! - [`roles::RequireSubcontractor`] -- requires a subcontractor token.

pub mod auth;
pub mod roles;
