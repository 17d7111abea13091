//! Domain model for gift-exchange groups and their participants.
//!
//! # Responsibility
//! - Define the records persisted by the group and participant registries.
//! - Provide record-level validation shared by repositories and services.
//!
//! # Invariants
//! - Every record is identified by a stable UUID that is never reused.
//! - A participant belongs to exactly one group (`group_uuid`).
//! - A recipient is stored as a flat snapshot, never as a nested participant.

pub mod group;
pub mod participant;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failure for group or participant records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Group name is blank after trim.
    BlankGroupName,
    /// Participant display name is blank after trim.
    BlankParticipantName,
    /// A recipient snapshot points back at its own participant.
    SelfRecipient,
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankGroupName => write!(f, "group name must not be blank"),
            Self::BlankParticipantName => write!(f, "participant name must not be blank"),
            Self::SelfRecipient => write!(f, "participant cannot be their own recipient"),
        }
    }
}

impl Error for ModelValidationError {}
