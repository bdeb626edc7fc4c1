//! Notification payloads raised by lifecycle transitions.
//!
//! One builder per event kind. Each returns the record for a single
//! receiver; callers fan out when several receivers are involved.

use serde_json::json;
use siteworks_core::actors::{ActorRef, Party};
use siteworks_core::notifications::{NotificationKind, RelatedEntityType};
use siteworks_db::models::application::JobApplication;
use siteworks_db::models::conversation::Message;
use siteworks_db::models::job::Job;
use siteworks_db::models::notification::NewNotification;
use siteworks_db::models::offer::Offer;

pub(crate) fn new_application(
    job: &Job,
    application: &JobApplication,
    sender: &Party,
) -> NewNotification {
    NewNotification {
        kind: NotificationKind::NewApplication,
        title: "New application".to_string(),
        message: format!("{} applied to \"{}\"", application.full_name, job.title),
        sender: sender.clone(),
        receiver: ActorRef::company(job.company_id),
        related_entity_id: application.id,
        related_entity_type: RelatedEntityType::Application,
        data: json!({
            "jobId": job.id,
            "jobTitle": job.title,
            "applicationId": application.id,
            "proposedRate": application.proposed_rate,
        }),
    }
}

pub(crate) fn application_accepted(
    job: &Job,
    application: &JobApplication,
    sender: &Party,
) -> NewNotification {
    NewNotification {
        kind: NotificationKind::ApplicationAccepted,
        title: "Application accepted".to_string(),
        message: format!("Your application for \"{}\" was accepted", job.title),
        sender: sender.clone(),
        receiver: ActorRef::subcontractor(application.subcontractor_id),
        related_entity_id: application.id,
        related_entity_type: RelatedEntityType::Application,
        data: json!({
            "jobId": job.id,
            "jobTitle": job.title,
            "applicationId": application.id,
        }),
    }
}

/// `automatic` marks rejections caused by another application filling the job.
pub(crate) fn application_rejected(
    job: &Job,
    application: &JobApplication,
    sender: &Party,
    automatic: bool,
) -> NewNotification {
    let message = if automatic {
        format!("\"{}\" has been filled by another applicant", job.title)
    } else {
        format!("Your application for \"{}\" was not successful", job.title)
    };
    NewNotification {
        kind: NotificationKind::ApplicationRejected,
        title: "Application rejected".to_string(),
        message,
        sender: sender.clone(),
        receiver: ActorRef::subcontractor(application.subcontractor_id),
        related_entity_id: application.id,
        related_entity_type: RelatedEntityType::Application,
        data: json!({
            "jobId": job.id,
            "jobTitle": job.title,
            "applicationId": application.id,
            "automatic": automatic,
        }),
    }
}

pub(crate) fn application_withdrawn(
    job: &Job,
    application: &JobApplication,
    sender: &Party,
) -> NewNotification {
    NewNotification {
        kind: NotificationKind::ApplicationWithdrawn,
        title: "Application withdrawn".to_string(),
        message: format!("{} withdrew from \"{}\"", application.full_name, job.title),
        sender: sender.clone(),
        receiver: ActorRef::company(application.company_id),
        related_entity_id: application.id,
        related_entity_type: RelatedEntityType::Application,
        data: json!({
            "jobId": job.id,
            "jobTitle": job.title,
            "applicationId": application.id,
        }),
    }
}

fn offer_notice(
    kind: NotificationKind,
    title: &str,
    message: String,
    job: &Job,
    offer: &Offer,
    sender: &Party,
    receiver: ActorRef,
) -> NewNotification {
    NewNotification {
        kind,
        title: title.to_string(),
        message,
        sender: sender.clone(),
        receiver,
        related_entity_id: offer.id,
        related_entity_type: RelatedEntityType::Offer,
        data: json!({
            "jobId": job.id,
            "jobTitle": job.title,
            "offerId": offer.id,
            "hourlyRate": job.hourly_rate,
            "expiresAt": offer.expires_at,
        }),
    }
}

pub(crate) fn offer_received(job: &Job, offer: &Offer, sender: &Party) -> NewNotification {
    offer_notice(
        NotificationKind::OfferReceived,
        "New job offer",
        format!("{} offered you \"{}\"", sender.name, job.title),
        job,
        offer,
        sender,
        ActorRef::subcontractor(offer.subcontractor_id),
    )
}

pub(crate) fn offer_accepted(job: &Job, offer: &Offer, sender: &Party) -> NewNotification {
    offer_notice(
        NotificationKind::OfferAccepted,
        "Offer accepted",
        format!("{} accepted your offer for \"{}\"", sender.name, job.title),
        job,
        offer,
        sender,
        ActorRef::company(offer.company_id),
    )
}

pub(crate) fn offer_rejected(job: &Job, offer: &Offer, sender: &Party) -> NewNotification {
    offer_notice(
        NotificationKind::OfferRejected,
        "Offer declined",
        format!("{} declined your offer for \"{}\"", sender.name, job.title),
        job,
        offer,
        sender,
        ActorRef::company(offer.company_id),
    )
}

pub(crate) fn offer_withdrawn(job: &Job, offer: &Offer, sender: &Party) -> NewNotification {
    offer_notice(
        NotificationKind::OfferWithdrawn,
        "Offer withdrawn",
        format!("{} withdrew the offer for \"{}\"", sender.name, job.title),
        job,
        offer,
        sender,
        ActorRef::subcontractor(offer.subcontractor_id),
    )
}

pub(crate) fn job_started(job: &Job, receiver: ActorRef, sender: &Party) -> NewNotification {
    NewNotification {
        kind: NotificationKind::JobStatusUpdate,
        title: "Job started".to_string(),
        message: format!("\"{}\" is now in progress", job.title),
        sender: sender.clone(),
        receiver,
        related_entity_id: job.id,
        related_entity_type: RelatedEntityType::Job,
        data: json!({
            "jobId": job.id,
            "jobTitle": job.title,
            "status": job.status,
            "startDate": job.timeline_start_date,
        }),
    }
}

pub(crate) fn new_message(message: &Message, sender: &Party, receiver: ActorRef) -> NewNotification {
    let preview = if message.content.is_empty() {
        "Sent an attachment".to_string()
    } else {
        message.content.chars().take(100).collect()
    };
    NewNotification {
        kind: NotificationKind::NewMessage,
        title: format!("New message from {}", sender.name),
        message: preview,
        sender: sender.clone(),
        receiver,
        related_entity_id: message.id,
        related_entity_type: RelatedEntityType::Message,
        data: json!({
            "conversationId": message.conversation_id,
            "message": message,
        }),
    }
}
