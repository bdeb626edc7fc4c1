//! Actor identities.
//!
//! Companies and subcontractors live in separate id spaces, so an actor is
//! always addressed by the `(actor_type, id)` pair, never by id alone.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;
use crate::types::DbId;

/// Kind of party taking part in a hiring transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    Company,
    Subcontractor,
    /// Sender of notifications raised by background tasks. Never authenticates.
    System,
}

impl ActorType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActorType::Company => "company",
            ActorType::Subcontractor => "subcontractor",
            ActorType::System => "system",
        }
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "company" => Ok(ActorType::Company),
            "subcontractor" => Ok(ActorType::Subcontractor),
            "system" => Ok(ActorType::System),
            other => Err(ParseEnumError {
                kind: "ActorType",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ActorType {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Address of a single actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorRef {
    pub id: DbId,
    pub actor_type: ActorType,
}

impl ActorRef {
    pub fn company(id: DbId) -> Self {
        Self {
            id,
            actor_type: ActorType::Company,
        }
    }

    pub fn subcontractor(id: DbId) -> Self {
        Self {
            id,
            actor_type: ActorType::Subcontractor,
        }
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.actor_type, self.id)
    }
}

/// An authenticated actor together with the display name carried in its token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub id: DbId,
    pub actor_type: ActorType,
    pub name: String,
}

/// Display name used when a token carries none.
const FALLBACK_COMPANY_NAME: &str = "A company";
const FALLBACK_SUBCONTRACTOR_NAME: &str = "A subcontractor";

/// Display name for notifications raised by the scheduler.
pub const SYSTEM_SENDER_NAME: &str = "Siteworks";

impl Party {
    pub fn new(actor: ActorRef, name: Option<String>) -> Self {
        let name = name.filter(|n| !n.trim().is_empty()).unwrap_or_else(|| {
            match actor.actor_type {
                ActorType::Company => FALLBACK_COMPANY_NAME,
                ActorType::Subcontractor => FALLBACK_SUBCONTRACTOR_NAME,
                ActorType::System => SYSTEM_SENDER_NAME,
            }
            .to_string()
        });
        Self {
            id: actor.id,
            actor_type: actor.actor_type,
            name,
        }
    }

    /// The background sender used by scheduled transitions.
    pub fn system() -> Self {
        Self {
            id: 0,
            actor_type: ActorType::System,
            name: SYSTEM_SENDER_NAME.to_string(),
        }
    }

    pub fn actor(&self) -> ActorRef {
        ActorRef {
            id: self.id,
            actor_type: self.actor_type,
        }
    }
}
