//! Notification taxonomy.
//!
//! The wire name of a [`NotificationKind`] is the socket event name clients
//! subscribe to, and the `notification_type` column value.

use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    NewApplication,
    ApplicationAccepted,
    ApplicationRejected,
    ApplicationWithdrawn,
    OfferReceived,
    OfferAccepted,
    OfferRejected,
    OfferWithdrawn,
    JobStatusUpdate,
    NewMessage,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::NewApplication => "newApplication",
            NotificationKind::ApplicationAccepted => "applicationAccepted",
            NotificationKind::ApplicationRejected => "applicationRejected",
            NotificationKind::ApplicationWithdrawn => "applicationWithdrawn",
            NotificationKind::OfferReceived => "offerReceived",
            NotificationKind::OfferAccepted => "offerAccepted",
            NotificationKind::OfferRejected => "offerRejected",
            NotificationKind::OfferWithdrawn => "offerWithdrawn",
            NotificationKind::JobStatusUpdate => "jobStatusUpdate",
            NotificationKind::NewMessage => "newMessage",
        }
    }

    /// Conversation-scoped kinds are also broadcast on the conversation channel.
    pub fn is_conversation_scoped(self) -> bool {
        self == NotificationKind::NewMessage
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for NotificationKind {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        serde_json::from_value(serde_json::Value::String(value.clone())).map_err(|_| {
            ParseEnumError {
                kind: "NotificationKind",
                value,
            }
        })
    }
}

/// Entity a notification points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelatedEntityType {
    Job,
    Offer,
    Application,
    Message,
}

impl RelatedEntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            RelatedEntityType::Job => "job",
            RelatedEntityType::Offer => "offer",
            RelatedEntityType::Application => "application",
            RelatedEntityType::Message => "message",
        }
    }
}

impl TryFrom<String> for RelatedEntityType {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "job" => Ok(RelatedEntityType::Job),
            "offer" => Ok(RelatedEntityType::Offer),
            "application" => Ok(RelatedEntityType::Application),
            "message" => Ok(RelatedEntityType::Message),
            _ => Err(ParseEnumError {
                kind: "RelatedEntityType",
                value,
            }),
        }
    }
}
