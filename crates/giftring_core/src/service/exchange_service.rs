//! Gift-exchange use-case service.
//!
//! # Responsibility
//! - Provide group and participant CRUD entry points over the registries.
//! - Run the draw: fetch members, compute a derangement, persist snapshots.
//! - Resolve a participant's recipient snapshot.
//!
//! # Invariants
//! - A failed draw leaves every participant untouched.
//! - A draw whose group changed membership after the members were read is
//!   rejected as a whole.
//! - Lookups check existence directly; a participant must belong to the
//!   group named in the call.
//! - The service never hands out an assignment that fails re-verification.

use crate::assignment::{compute_assignment, AssignmentError, AssignmentStrategy};
use crate::model::group::{Group, GroupId};
use crate::model::participant::{Participant, ParticipantId, RecipientSnapshot};
use crate::model::ModelValidationError;
use crate::repo::group_repo::GroupRepository;
use crate::repo::participant_repo::ParticipantRepository;
use crate::repo::RepoError;
use log::{info, warn};
use rand::Rng;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from gift-exchange service operations.
#[derive(Debug)]
pub enum ExchangeServiceError {
    /// Record failed validation (blank names).
    Validation(ModelValidationError),
    GroupNotFound(GroupId),
    /// Participant does not exist or belongs to another group.
    ParticipantNotFound(ParticipantId),
    /// No successful draw has produced a recipient for this participant.
    NoRecipientAssigned(ParticipantId),
    /// Assignment engine refused or failed the draw.
    Assignment(AssignmentError),
    /// Members were added or removed while the draw was running.
    MembershipChanged(GroupId),
    /// Internal consistency mismatch between engine output and registry state.
    InconsistentState(&'static str),
    Repo(RepoError),
}

impl Display for ExchangeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::GroupNotFound(id) => write!(f, "group not found: {id}"),
            Self::ParticipantNotFound(id) => write!(f, "participant not found: {id}"),
            Self::NoRecipientAssigned(id) => {
                write!(f, "no recipient assigned to participant {id}")
            }
            Self::Assignment(err) => write!(f, "{err}"),
            Self::MembershipChanged(id) => {
                write!(f, "group {id} changed membership during the draw")
            }
            Self::InconsistentState(details) => write!(f, "inconsistent exchange state: {details}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ExchangeServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Assignment(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ExchangeServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::MembershipChanged { group_id, .. } => Self::MembershipChanged(group_id),
            other => Self::Repo(other),
        }
    }
}

impl From<ModelValidationError> for ExchangeServiceError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<AssignmentError> for ExchangeServiceError {
    fn from(value: AssignmentError) -> Self {
        Self::Assignment(value)
    }
}

/// Group read model including its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupDetail {
    #[serde(flatten)]
    pub group: Group,
    pub participants: Vec<Participant>,
}

/// Partial group update.
///
/// `name` applies only when non-blank; `description` applies when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Partial participant update.
///
/// `name` applies only when non-blank; `wish` applies when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantPatch {
    pub name: Option<String>,
    pub wish: Option<String>,
}

/// Service facade over the group and participant registries.
pub struct ExchangeService<G: GroupRepository, P: ParticipantRepository> {
    groups: G,
    participants: P,
    strategy: AssignmentStrategy,
}

impl<G: GroupRepository, P: ParticipantRepository> ExchangeService<G, P> {
    /// Creates a service using the random-cycle draw strategy.
    pub fn new(groups: G, participants: P) -> Self {
        Self {
            groups,
            participants,
            strategy: AssignmentStrategy::default(),
        }
    }

    /// Replaces the draw strategy.
    pub fn with_strategy(mut self, strategy: AssignmentStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> AssignmentStrategy {
        self.strategy
    }

    /// Lists all groups without their participants.
    pub fn list_groups(&self) -> Result<Vec<Group>, ExchangeServiceError> {
        Ok(self.groups.list_groups()?)
    }

    pub fn create_group(
        &self,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Result<Group, ExchangeServiceError> {
        let group = Group::new(name, description);
        self.groups.create_group(&group)?;
        info!(
            "event=group_create module=service status=ok group_id={}",
            group.uuid
        );
        Ok(group)
    }

    /// Loads one group with its participants and their snapshots.
    pub fn get_group(&self, group_id: GroupId) -> Result<GroupDetail, ExchangeServiceError> {
        let group = self.require_group(group_id)?;
        let participants = self.participants.list_participants(group_id)?;
        Ok(GroupDetail {
            group,
            participants,
        })
    }

    pub fn update_group(
        &self,
        group_id: GroupId,
        patch: &GroupPatch,
    ) -> Result<Group, ExchangeServiceError> {
        let mut group = self.require_group(group_id)?;
        if let Some(name) = non_blank(patch.name.as_deref()) {
            group.name = name.to_string();
        }
        if let Some(description) = &patch.description {
            group.description = Some(description.clone());
        }
        self.groups.update_group(&group)?;
        Ok(group)
    }

    /// Deletes a group; its participants go with it.
    pub fn delete_group(&self, group_id: GroupId) -> Result<(), ExchangeServiceError> {
        self.require_group(group_id)?;
        self.groups.delete_group(group_id)?;
        info!("event=group_delete module=service status=ok group_id={group_id}");
        Ok(())
    }

    /// Adds a participant; any previous draw in the group is invalidated.
    pub fn add_participant(
        &self,
        group_id: GroupId,
        name: impl Into<String>,
        wish: impl Into<String>,
    ) -> Result<Participant, ExchangeServiceError> {
        self.require_group(group_id)?;
        let participant = Participant::new(group_id, name, wish);
        self.participants.create_participant(&participant)?;
        info!(
            "event=participant_add module=service status=ok group_id={group_id} participant_id={}",
            participant.uuid
        );
        Ok(participant)
    }

    /// Edits a participant's own record. Snapshots held by others keep the
    /// values copied at draw time.
    pub fn update_participant(
        &self,
        group_id: GroupId,
        participant_id: ParticipantId,
        patch: &ParticipantPatch,
    ) -> Result<Participant, ExchangeServiceError> {
        let mut participant = self.require_member(group_id, participant_id)?;
        if let Some(name) = non_blank(patch.name.as_deref()) {
            participant.name = name.to_string();
        }
        if let Some(wish) = &patch.wish {
            participant.wish = wish.clone();
        }
        self.participants.update_participant(&participant)?;
        Ok(participant)
    }

    /// Removes a participant; any previous draw in the group is invalidated.
    pub fn remove_participant(
        &self,
        group_id: GroupId,
        participant_id: ParticipantId,
    ) -> Result<(), ExchangeServiceError> {
        self.require_member(group_id, participant_id)?;
        self.participants.delete_participant(participant_id)?;
        info!(
            "event=participant_remove module=service status=ok group_id={group_id} participant_id={participant_id}"
        );
        Ok(())
    }

    /// Runs the draw with a thread-local rng.
    pub fn run_draw(&self, group_id: GroupId) -> Result<Vec<Participant>, ExchangeServiceError> {
        self.run_draw_with_rng(group_id, &mut rand::thread_rng())
    }

    /// Runs the draw for one group and returns its participants with their
    /// freshly stored recipient snapshots.
    ///
    /// # Errors
    /// - `GroupNotFound` when the group does not exist.
    /// - `Assignment(InsufficientParticipants)` for groups smaller than three;
    ///   nothing is written in that case.
    /// - `MembershipChanged` when members were added or removed between
    ///   reading the group and storing the result; nothing is written.
    pub fn run_draw_with_rng<R: Rng + ?Sized>(
        &self,
        group_id: GroupId,
        rng: &mut R,
    ) -> Result<Vec<Participant>, ExchangeServiceError> {
        let started_at = Instant::now();
        self.require_group(group_id)?;
        let members = self.participants.list_participants(group_id)?;
        let ids: Vec<ParticipantId> = members.iter().map(|member| member.uuid).collect();

        let assignment = match compute_assignment(&ids, self.strategy, rng) {
            Ok(assignment) => assignment,
            Err(err) => {
                warn!(
                    "event=draw_run module=service status=error group_id={group_id} participants={} strategy={} error={err}",
                    ids.len(),
                    self.strategy.as_str()
                );
                return Err(err.into());
            }
        };
        if !assignment.is_derangement_of(&ids) {
            return Err(ExchangeServiceError::InconsistentState(
                "assignment failed derangement check",
            ));
        }

        if let Err(err) = self
            .participants
            .assign_recipients(group_id, assignment.pairs())
        {
            warn!(
                "event=draw_run module=service status=error group_id={group_id} participants={} strategy={} error={err}",
                ids.len(),
                self.strategy.as_str()
            );
            return Err(err.into());
        }

        info!(
            "event=draw_run module=service status=ok group_id={group_id} participants={} strategy={} attempts={} duration_ms={}",
            assignment.len(),
            self.strategy.as_str(),
            assignment.attempts(),
            started_at.elapsed().as_millis()
        );
        Ok(self.participants.list_participants(group_id)?)
    }

    /// Returns the recipient snapshot stored for a participant.
    pub fn get_recipient(
        &self,
        group_id: GroupId,
        participant_id: ParticipantId,
    ) -> Result<RecipientSnapshot, ExchangeServiceError> {
        self.require_member(group_id, participant_id)?
            .recipient
            .ok_or(ExchangeServiceError::NoRecipientAssigned(participant_id))
    }

    fn require_group(&self, group_id: GroupId) -> Result<Group, ExchangeServiceError> {
        self.groups
            .get_group(group_id)?
            .ok_or(ExchangeServiceError::GroupNotFound(group_id))
    }

    fn require_member(
        &self,
        group_id: GroupId,
        participant_id: ParticipantId,
    ) -> Result<Participant, ExchangeServiceError> {
        self.require_group(group_id)?;
        self.participants
            .get_participant(participant_id)?
            .filter(|participant| participant.group_uuid == group_id)
            .ok_or(ExchangeServiceError::ParticipantNotFound(participant_id))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}
