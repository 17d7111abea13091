//! Group domain model.
//!
//! # Invariants
//! - `uuid` is globally unique.
//! - `name` is non-blank.
//! - Membership lives on the participant side (`Participant::group_uuid`).

use super::ModelValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a gift-exchange group.
pub type GroupId = Uuid;

/// A named collection of participants sharing one gift exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub uuid: GroupId,
    pub name: String,
    pub description: Option<String>,
}

impl Group {
    /// Creates a new group with a generated stable ID.
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name, description)
    }

    /// Creates a group with a caller-provided ID.
    pub fn with_id(uuid: GroupId, name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            uuid,
            name: name.into(),
            description,
        }
    }

    /// Checks record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.name.trim().is_empty() {
            return Err(ModelValidationError::BlankGroupName);
        }
        Ok(())
    }
}
