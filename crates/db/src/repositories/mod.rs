//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Multi-row transitions run inside
//! a single transaction and lock the job row first so concurrent
//! transitions on one job serialise.

pub mod application_repo;
pub mod conversation_repo;
pub mod job_repo;
pub mod notification_repo;
pub mod offer_repo;

pub use application_repo::ApplicationRepo;
pub use conversation_repo::ConversationRepo;
pub use job_repo::JobRepo;
pub use notification_repo::NotificationRepo;
pub use offer_repo::OfferRepo;

/// Escape `LIKE` wildcards so user input matches literally.
pub(crate) fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
