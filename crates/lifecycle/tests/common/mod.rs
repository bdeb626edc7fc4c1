//! Shared wiring and fixtures for lifecycle tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use siteworks_core::actors::{ActorRef, Party};
use siteworks_core::hiring::Trade;
use siteworks_core::notifications::NotificationKind;
use siteworks_core::search::Page;
use siteworks_core::types::DbId;
use siteworks_db::models::application::CreateApplication;
use siteworks_db::models::job::CreateJob;
use siteworks_db::models::notification::Notification;
use siteworks_db::models::offer::CreateOffer;
use siteworks_db::store::{MemoryStore, NotificationRepository};
use siteworks_events::{EventBus, NotificationDispatcher};
use siteworks_lifecycle::{ChatService, LifecycleEngine};

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub bus: Arc<EventBus>,
    pub engine: Arc<LifecycleEngine>,
    pub chat: ChatService,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(EventBus::default());
    let notifier = Arc::new(NotificationDispatcher::new(store.clone(), bus.clone()));
    let engine = Arc::new(LifecycleEngine::new(store.clone(), notifier.clone()));
    let chat = ChatService::new(store.clone(), notifier);
    Harness {
        store,
        bus,
        engine,
        chat,
    }
}

pub fn company(id: DbId) -> Party {
    Party::new(ActorRef::company(id), Some(format!("Company {id}")))
}

pub fn subcontractor(id: DbId) -> Party {
    Party::new(ActorRef::subcontractor(id), Some(format!("Worker {id}")))
}

pub fn job_input(workers_required: i32) -> CreateJob {
    let start = Utc::now() + Duration::days(2);
    CreateJob {
        title: "Rewire kitchen".to_string(),
        trade: Trade::Electrician,
        description: "Full rewire of a terraced house kitchen".to_string(),
        site_address: "12 Mill Lane, Leeds".to_string(),
        timeline_start_date: start,
        timeline_end_date: start + Duration::days(4),
        hourly_rate: 40.0,
        workers_required,
        project_documents: vec![],
    }
}

pub fn application_input(job_id: DbId) -> CreateApplication {
    CreateApplication {
        job_id,
        full_name: "Sam Turner".to_string(),
        proposed_rate: Some(38.0),
        message: Some("Available all week".to_string()),
        documents: vec![],
    }
}

pub fn offer_for(subcontractor_id: DbId, job_id: DbId) -> CreateOffer {
    CreateOffer {
        subcontractor_id,
        job_id: Some(job_id),
        job: None,
        message: None,
        expires_at: None,
    }
}

pub async fn notifications_for(store: &MemoryStore, actor: ActorRef) -> Vec<Notification> {
    let (rows, _) = store
        .list_notifications(actor, false, Page::new(Some(1), Some(100)))
        .await
        .unwrap();
    rows
}

pub async fn kinds_for(store: &MemoryStore, actor: ActorRef) -> Vec<NotificationKind> {
    let mut kinds: Vec<NotificationKind> = notifications_for(store, actor)
        .await
        .into_iter()
        .map(|n| n.notification_type)
        .collect();
    kinds.sort_by_key(|k| k.as_str());
    kinds
}
