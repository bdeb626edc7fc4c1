//! Hiring domain enums and their state machines.
//!
//! Every enum is stored as lowercase TEXT in the database and serialized the
//! same way on the wire. The state machine helpers live here (zero internal
//! deps) so both the repositories and the lifecycle engine share one
//! definition of which transitions are legal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;

macro_rules! define_text_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $val)] $variant ),+
        }

        impl $name {
            /// All variants, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The database / wire representation.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $val ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $val => Ok($name::$variant), )+
                    other => Err(ParseEnumError {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = ParseEnumError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

define_text_enum! {
    /// Trade category a job is posted under.
    Trade {
        Electrician = "electrician",
        Plumber = "plumber",
        Carpenter = "carpenter",
        Masonry = "masonry",
    }
}

define_text_enum! {
    /// How a job came to exist.
    JobKind {
        /// Posted publicly; subcontractors apply.
        Request = "request",
        /// Created together with a direct offer to one subcontractor.
        Offer = "offer",
    }
}

define_text_enum! {
    /// Job lifecycle status.
    JobStatus {
        Pending = "pending",
        InProgress = "in_progress",
        Completed = "completed",
        Cancelled = "cancelled",
    }
}

define_text_enum! {
    /// Status shared by applications and offers.
    ApplicationStatus {
        Pending = "pending",
        Accepted = "accepted",
        Rejected = "rejected",
        Withdrawn = "withdrawn",
    }
}

define_text_enum! {
    /// Offer status. Same shape as [`ApplicationStatus`], kept distinct so the
    /// two entities cannot be confused at the type level.
    OfferStatus {
        Pending = "pending",
        Accepted = "accepted",
        Rejected = "rejected",
        Withdrawn = "withdrawn",
    }
}

// ---------------------------------------------------------------------------
// State machines
// ---------------------------------------------------------------------------

impl JobStatus {
    /// Statuses reachable from `self`. No path leads back to `Pending`.
    pub fn valid_transitions(self) -> &'static [JobStatus] {
        match self {
            JobStatus::Pending => &[JobStatus::InProgress, JobStatus::Cancelled],
            JobStatus::InProgress => &[JobStatus::Completed],
            JobStatus::Completed | JobStatus::Cancelled => &[],
        }
    }

    pub fn can_transition(self, to: JobStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// `true` once the job can no longer take on workers.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }

    /// Whether job details may still be edited or the job deleted.
    pub fn is_editable(self) -> bool {
        self == JobStatus::Pending
    }

    /// Whether a new offer may be attached to a job in this status.
    pub fn accepts_offers(self) -> bool {
        self == JobStatus::Pending
    }

    /// Whether an accept (application or offer) may still add a worker.
    pub fn accepts_assignments(self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::InProgress)
    }
}

impl ApplicationStatus {
    /// Every non-pending status is terminal.
    pub fn can_transition(self, to: ApplicationStatus) -> bool {
        self == ApplicationStatus::Pending && to != ApplicationStatus::Pending
    }

    /// Withdrawn applications do not count towards the one-per-pair rule.
    pub fn is_active(self) -> bool {
        self != ApplicationStatus::Withdrawn
    }
}

impl OfferStatus {
    pub fn can_transition(self, to: OfferStatus) -> bool {
        self == OfferStatus::Pending && to != OfferStatus::Pending
    }
}

/// Validate a job transition, returning a conflict message for invalid ones.
pub fn validate_job_transition(from: JobStatus, to: JobStatus) -> Result<(), String> {
    if from.can_transition(to) {
        Ok(())
    } else {
        Err(format!("Invalid job transition: {from} -> {to}"))
    }
}
