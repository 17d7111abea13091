//! Request handlers over a single SQLite connection.
//!
//! # Responsibility
//! - Parse raw identifiers, call the exchange service, shape envelopes.
//! - Log one metadata-only event per call.

use crate::config::ApiConfig;
use crate::response::{status, status_for_error, ApiResponse};
use giftring_core::db::{open_db, open_db_in_memory, DbError};
use giftring_core::{
    AssignmentStrategy, ExchangeService, ExchangeServiceError, Group, GroupDetail, GroupId,
    GroupPatch, Participant, ParticipantId, ParticipantPatch, RecipientSnapshot,
    SqliteGroupRepository, SqliteParticipantRepository,
};
use log::{debug, error, warn};
use rand::Rng;
use rusqlite::Connection;
use uuid::Uuid;

type SqliteExchangeService<'conn> =
    ExchangeService<SqliteGroupRepository<'conn>, SqliteParticipantRepository<'conn>>;

enum RequestFailure {
    InvalidId { field: &'static str, raw: String },
    Service(ExchangeServiceError),
}

impl From<ExchangeServiceError> for RequestFailure {
    fn from(value: ExchangeServiceError) -> Self {
        Self::Service(value)
    }
}

/// Entry point for all gift-exchange requests.
pub struct GiftringApi {
    conn: Connection,
    strategy: AssignmentStrategy,
}

impl GiftringApi {
    /// Opens (and migrates) the configured database file.
    pub fn open(config: &ApiConfig) -> Result<Self, DbError> {
        Ok(Self {
            conn: open_db(&config.db_path)?,
            strategy: config.strategy,
        })
    }

    /// Opens a throwaway in-memory database.
    pub fn open_in_memory(strategy: AssignmentStrategy) -> Result<Self, DbError> {
        Ok(Self {
            conn: open_db_in_memory()?,
            strategy,
        })
    }

    pub fn strategy(&self) -> AssignmentStrategy {
        self.strategy
    }

    pub fn list_groups(&self) -> ApiResponse<Vec<Group>> {
        self.call("list_groups", status::OK, |service| Ok(service.list_groups()?))
    }

    /// Creates a group and returns its id.
    pub fn create_group(&self, name: &str, description: Option<&str>) -> ApiResponse<GroupId> {
        self.call("create_group", status::CREATED, |service| {
            let group = service.create_group(name, description.map(str::to_string))?;
            Ok(group.uuid)
        })
    }

    pub fn get_group(&self, group_id: &str) -> ApiResponse<GroupDetail> {
        self.call("get_group", status::OK, |service| {
            Ok(service.get_group(parse_id("group_id", group_id)?)?)
        })
    }

    /// Partial update; a blank `name` keeps the current one.
    pub fn update_group(
        &self,
        group_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> ApiResponse<Group> {
        self.call("update_group", status::OK, |service| {
            let patch = GroupPatch {
                name: name.map(str::to_string),
                description: description.map(str::to_string),
            };
            Ok(service.update_group(parse_id("group_id", group_id)?, &patch)?)
        })
    }

    pub fn delete_group(&self, group_id: &str) -> ApiResponse<()> {
        self.call("delete_group", status::OK, |service| {
            Ok(service.delete_group(parse_id("group_id", group_id)?)?)
        })
    }

    /// Adds a participant and returns its id. Clears any previous draw.
    pub fn add_participant(
        &self,
        group_id: &str,
        name: &str,
        wish: &str,
    ) -> ApiResponse<ParticipantId> {
        self.call("add_participant", status::CREATED, |service| {
            let participant =
                service.add_participant(parse_id("group_id", group_id)?, name, wish)?;
            Ok(participant.uuid)
        })
    }

    pub fn update_participant(
        &self,
        group_id: &str,
        participant_id: &str,
        name: Option<&str>,
        wish: Option<&str>,
    ) -> ApiResponse<Participant> {
        self.call("update_participant", status::OK, |service| {
            let patch = ParticipantPatch {
                name: name.map(str::to_string),
                wish: wish.map(str::to_string),
            };
            Ok(service.update_participant(
                parse_id("group_id", group_id)?,
                parse_id("participant_id", participant_id)?,
                &patch,
            )?)
        })
    }

    /// Removes a participant. Clears any previous draw in the group.
    pub fn remove_participant(&self, group_id: &str, participant_id: &str) -> ApiResponse<()> {
        self.call("remove_participant", status::OK, |service| {
            Ok(service.remove_participant(
                parse_id("group_id", group_id)?,
                parse_id("participant_id", participant_id)?,
            )?)
        })
    }

    /// Runs the draw; groups under three participants get `409`.
    pub fn run_draw(&self, group_id: &str) -> ApiResponse<Vec<Participant>> {
        self.run_draw_with_rng(group_id, &mut rand::thread_rng())
    }

    pub fn run_draw_with_rng<R: Rng + ?Sized>(
        &self,
        group_id: &str,
        rng: &mut R,
    ) -> ApiResponse<Vec<Participant>> {
        self.call("run_draw", status::OK, |service| {
            Ok(service.run_draw_with_rng(parse_id("group_id", group_id)?, rng)?)
        })
    }

    /// Returns the recipient snapshot; `404` before any successful draw.
    pub fn get_recipient(
        &self,
        group_id: &str,
        participant_id: &str,
    ) -> ApiResponse<RecipientSnapshot> {
        self.call("get_recipient", status::OK, |service| {
            Ok(service.get_recipient(
                parse_id("group_id", group_id)?,
                parse_id("participant_id", participant_id)?,
            )?)
        })
    }

    fn call<T>(
        &self,
        operation: &'static str,
        success_status: u16,
        handler: impl FnOnce(&SqliteExchangeService<'_>) -> Result<T, RequestFailure>,
    ) -> ApiResponse<T> {
        let service = match self.service() {
            Ok(service) => service,
            Err(err) => {
                error!(
                    "event=api_call module=api status=error operation={operation} code={} error={err}",
                    status::INTERNAL
                );
                return ApiResponse::failure(status::INTERNAL, err.to_string());
            }
        };

        match handler(&service) {
            Ok(data) => {
                debug!(
                    "event=api_call module=api status=ok operation={operation} code={success_status}"
                );
                ApiResponse::success(success_status, data)
            }
            Err(RequestFailure::InvalidId { field, raw }) => {
                warn!(
                    "event=api_call module=api status=rejected operation={operation} code={} field={field}",
                    status::BAD_REQUEST
                );
                ApiResponse::failure(status::BAD_REQUEST, format!("invalid {field}: `{raw}`"))
            }
            Err(RequestFailure::Service(err)) => {
                let code = status_for_error(&err);
                if code >= status::INTERNAL {
                    error!(
                        "event=api_call module=api status=error operation={operation} code={code} error={err}"
                    );
                } else {
                    warn!(
                        "event=api_call module=api status=rejected operation={operation} code={code}"
                    );
                }
                ApiResponse::failure(code, err.to_string())
            }
        }
    }

    fn service(&self) -> Result<SqliteExchangeService<'_>, giftring_core::RepoError> {
        Ok(ExchangeService::new(
            SqliteGroupRepository::try_new(&self.conn)?,
            SqliteParticipantRepository::try_new(&self.conn)?,
        )
        .with_strategy(self.strategy))
    }
}

fn parse_id(field: &'static str, raw: &str) -> Result<Uuid, RequestFailure> {
    Uuid::parse_str(raw.trim()).map_err(|_| RequestFailure::InvalidId {
        field,
        raw: raw.to_string(),
    })
}
