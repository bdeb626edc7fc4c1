//! Input validation rules for jobs, applications, offers and messages.
//!
//! Each rule is a plain function returning [`CoreError::Validation`]; DTOs
//! compose them in their own `validate` methods.

use crate::error::CoreError;
use crate::types::Timestamp;

/// Longest accepted job title.
pub const MAX_TITLE_LEN: usize = 200;

/// Longest accepted free-text body (description, application message).
pub const MAX_TEXT_LEN: usize = 5_000;

/// Upper bound on workers a single job may request.
pub const MAX_WORKERS_REQUIRED: i32 = 100;

/// Most document URLs attached to a job or application.
pub const MAX_DOCUMENTS: usize = 10;

/// Longest chat message body.
pub const MAX_MESSAGE_LEN: usize = 4_000;

// ---------------------------------------------------------------------------
// Validation functions
// ---------------------------------------------------------------------------

/// Reject empty or whitespace-only text, and text over `max_len` characters.
pub fn validate_text(field: &str, value: &str, max_len: usize) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    let len = value.chars().count();
    if len > max_len {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {max_len} characters, got {len}"
        )));
    }
    Ok(())
}

/// The timeline end must not precede its start.
pub fn validate_timeline(start: Timestamp, end: Timestamp) -> Result<(), CoreError> {
    if end < start {
        return Err(CoreError::Validation(
            "timeline_end_date must not be before timeline_start_date".to_string(),
        ));
    }
    Ok(())
}

/// Rates must be finite and strictly positive.
pub fn validate_rate(field: &str, rate: f64) -> Result<(), CoreError> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(CoreError::Validation(format!(
            "{field} must be a positive number, got {rate}"
        )));
    }
    Ok(())
}

pub fn validate_workers_required(workers: i32) -> Result<(), CoreError> {
    if !(1..=MAX_WORKERS_REQUIRED).contains(&workers) {
        return Err(CoreError::Validation(format!(
            "workers_required must be between 1 and {MAX_WORKERS_REQUIRED}, got {workers}"
        )));
    }
    Ok(())
}

/// Documents arrive as URLs returned by the upload service.
pub fn validate_document_urls(urls: &[String]) -> Result<(), CoreError> {
    if urls.len() > MAX_DOCUMENTS {
        return Err(CoreError::Validation(format!(
            "at most {MAX_DOCUMENTS} documents may be attached, got {}",
            urls.len()
        )));
    }
    for (i, url) in urls.iter().enumerate() {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(CoreError::Validation(format!(
                "documents[{i}] must be an http(s) URL"
            )));
        }
    }
    Ok(())
}

/// A message needs either content or at least one attachment.
pub fn validate_message(content: &str, attachments: &[String]) -> Result<(), CoreError> {
    if content.trim().is_empty() && attachments.is_empty() {
        return Err(CoreError::Validation(
            "message must have content or attachments".to_string(),
        ));
    }
    if content.chars().count() > MAX_MESSAGE_LEN {
        return Err(CoreError::Validation(format!(
            "message must be at most {MAX_MESSAGE_LEN} characters"
        )));
    }
    validate_document_urls(attachments)
}
