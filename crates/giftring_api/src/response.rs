//! Response envelope and status mapping.

use giftring_core::{AssignmentError, ExchangeServiceError, RepoError};
use serde::Serialize;

/// HTTP-style status codes carried by `ApiResponse`.
pub mod status {
    pub const OK: u16 = 200;
    pub const CREATED: u16 = 201;
    pub const BAD_REQUEST: u16 = 400;
    pub const NOT_FOUND: u16 = 404;
    /// Draw preconditions not met, or membership changed during the draw.
    pub const CONFLICT: u16 = 409;
    pub const UNPROCESSABLE: u16 = 422;
    pub const INTERNAL: u16 = 500;
}

/// Uniform result envelope for every request-layer operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Empty on success, human-readable error otherwise.
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(status: u16, data: T) -> Self {
        Self {
            status,
            data: Some(data),
            message: String::new(),
        }
    }

    pub fn failure(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            data: None,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Maps a service error to the status a client should see.
pub fn status_for_error(err: &ExchangeServiceError) -> u16 {
    match err {
        ExchangeServiceError::Validation(_) => status::UNPROCESSABLE,
        ExchangeServiceError::GroupNotFound(_)
        | ExchangeServiceError::ParticipantNotFound(_)
        | ExchangeServiceError::NoRecipientAssigned(_)
        | ExchangeServiceError::Repo(RepoError::NotFound(_)) => status::NOT_FOUND,
        ExchangeServiceError::Assignment(
            AssignmentError::InsufficientParticipants { .. }
            | AssignmentError::AssignmentExhausted { .. },
        )
        | ExchangeServiceError::MembershipChanged(_) => status::CONFLICT,
        ExchangeServiceError::Assignment(AssignmentError::DuplicateParticipant { .. })
        | ExchangeServiceError::InconsistentState(_)
        | ExchangeServiceError::Repo(_) => status::INTERNAL,
    }
}
