//! Shared fixtures for store integration tests.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use siteworks_core::hiring::Trade;
use siteworks_core::types::{DbId, Timestamp};
use siteworks_db::models::application::NewApplication;
use siteworks_db::models::job::CreateJob;
use siteworks_db::models::offer::NewOffer;

pub fn new_job(workers_required: i32) -> CreateJob {
    let start = Utc::now() + Duration::days(3);
    CreateJob {
        title: "Bathroom refit".to_string(),
        trade: Trade::Plumber,
        description: "Replace suite and pipework".to_string(),
        site_address: "4 Canal Street, Manchester".to_string(),
        timeline_start_date: start,
        timeline_end_date: start + Duration::days(5),
        hourly_rate: 32.0,
        workers_required,
        project_documents: vec![],
    }
}

pub fn new_application(job_id: DbId, subcontractor_id: DbId) -> NewApplication {
    NewApplication {
        job_id,
        subcontractor_id,
        company_id: 0,
        full_name: format!("Worker {subcontractor_id}"),
        proposed_rate: Some(30.0),
        message: None,
        documents: vec![],
        applied_at: Utc::now(),
    }
}

pub fn new_offer(
    company_id: DbId,
    subcontractor_id: DbId,
    expires_at: Option<Timestamp>,
) -> NewOffer {
    NewOffer {
        company_id,
        subcontractor_id,
        message: Some("Are you free next week?".to_string()),
        sent_at: Utc::now(),
        expires_at,
    }
}
