//! Participant domain model and recipient snapshots.
//!
//! # Responsibility
//! - Define the participant record owned by the participant registry.
//! - Define the point-in-time recipient copy written by a draw.
//!
//! # Invariants
//! - `recipient` is `None` until a successful draw, and is cleared whenever
//!   the group's membership changes.
//! - A snapshot is a copy; later edits to the recipient's own record do not
//!   flow into it.

use super::group::GroupId;
use super::ModelValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a participant.
pub type ParticipantId = Uuid;

/// Public view of a recipient, copied at draw time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientSnapshot {
    pub uuid: ParticipantId,
    pub name: String,
    pub wish: String,
}

/// Member of exactly one gift-exchange group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub uuid: ParticipantId,
    /// Owning group. Not part of the public payload.
    #[serde(skip_serializing)]
    pub group_uuid: GroupId,
    pub name: String,
    /// Free-text wish note shown to whoever draws this participant.
    pub wish: String,
    pub recipient: Option<RecipientSnapshot>,
}

impl Participant {
    /// Creates a participant with a generated stable ID and no recipient.
    pub fn new(group_uuid: GroupId, name: impl Into<String>, wish: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            group_uuid,
            name: name.into(),
            wish: wish.into(),
            recipient: None,
        }
    }

    /// Copies this participant's public fields for use as someone's recipient.
    pub fn snapshot(&self) -> RecipientSnapshot {
        RecipientSnapshot {
            uuid: self.uuid,
            name: self.name.clone(),
            wish: self.wish.clone(),
        }
    }

    /// Checks record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.name.trim().is_empty() {
            return Err(ModelValidationError::BlankParticipantName);
        }
        if self
            .recipient
            .as_ref()
            .is_some_and(|recipient| recipient.uuid == self.uuid)
        {
            return Err(ModelValidationError::SelfRecipient);
        }
        Ok(())
    }
}
