//! Core domain logic for Giftring gift exchanges.
//! This crate owns the assignment engine and the group/participant registries.

pub mod assignment;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use assignment::{
    compute_assignment, Assignment, AssignmentError, AssignmentStrategy,
    DEFAULT_GREEDY_MAX_ATTEMPTS, MIN_PARTICIPANTS,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::group::{Group, GroupId};
pub use model::participant::{Participant, ParticipantId, RecipientSnapshot};
pub use model::ModelValidationError;
pub use repo::group_repo::{GroupRepository, SqliteGroupRepository};
pub use repo::participant_repo::{ParticipantRepository, SqliteParticipantRepository};
pub use repo::{RepoError, RepoResult};
pub use service::exchange_service::{
    ExchangeService, ExchangeServiceError, GroupDetail, GroupPatch, ParticipantPatch,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
