//! Participant registry contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist participants and their recipient snapshots.
//! - Apply draw results atomically.
//!
//! # Invariants
//! - Adding or removing a participant clears every snapshot in that group,
//!   so no snapshot can reference a removed participant.
//! - `assign_recipients` writes all snapshots or none, and only when the
//!   mapping covers exactly the group's members as read inside its
//!   transaction.
//! - Editing a participant never touches snapshots held by others.

use super::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::model::group::GroupId;
use crate::model::participant::{Participant, ParticipantId, RecipientSnapshot};
use crate::model::ModelValidationError;
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::{HashMap, HashSet};

const PARTICIPANT_SELECT_SQL: &str = "SELECT
    uuid,
    group_uuid,
    name,
    wish,
    recipient_uuid,
    recipient_name,
    recipient_wish
FROM participants";

/// Registry interface for participant operations.
pub trait ParticipantRepository {
    /// Inserts a participant and clears the group's existing snapshots.
    fn create_participant(&self, participant: &Participant) -> RepoResult<ParticipantId>;
    /// Replaces name and wish of an existing participant.
    fn update_participant(&self, participant: &Participant) -> RepoResult<()>;
    fn get_participant(&self, id: ParticipantId) -> RepoResult<Option<Participant>>;
    /// Lists participants of one group in insertion order.
    fn list_participants(&self, group_id: GroupId) -> RepoResult<Vec<Participant>>;
    /// Deletes a participant and clears the remaining snapshots of its group.
    fn delete_participant(&self, id: ParticipantId) -> RepoResult<()>;
    /// Stores a recipient snapshot for every `(giver, recipient)` pair in a
    /// single immediate transaction.
    ///
    /// Snapshots are copied from the rows read inside that transaction. The
    /// write is rejected with `MembershipChanged` unless givers and recipients
    /// each equal the group's current members.
    fn assign_recipients(
        &self,
        group_id: GroupId,
        pairs: &[(ParticipantId, ParticipantId)],
    ) -> RepoResult<()>;
}

/// SQLite-backed participant registry.
pub struct SqliteParticipantRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteParticipantRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ParticipantRepository for SqliteParticipantRepository<'_> {
    fn create_participant(&self, participant: &Participant) -> RepoResult<ParticipantId> {
        participant.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        clear_group_recipients(&tx, participant.group_uuid)?;
        tx.execute(
            "INSERT INTO participants (
                uuid,
                group_uuid,
                name,
                wish,
                recipient_uuid,
                recipient_name,
                recipient_wish
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                participant.uuid.to_string(),
                participant.group_uuid.to_string(),
                participant.name.as_str(),
                participant.wish.as_str(),
                participant
                    .recipient
                    .as_ref()
                    .map(|recipient| recipient.uuid.to_string()),
                participant
                    .recipient
                    .as_ref()
                    .map(|recipient| recipient.name.as_str()),
                participant
                    .recipient
                    .as_ref()
                    .map(|recipient| recipient.wish.as_str()),
            ],
        )?;
        tx.commit()?;

        Ok(participant.uuid)
    }

    fn update_participant(&self, participant: &Participant) -> RepoResult<()> {
        participant.validate()?;

        let changed = self.conn.execute(
            "UPDATE participants
             SET
                name = ?1,
                wish = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?3;",
            params![
                participant.name.as_str(),
                participant.wish.as_str(),
                participant.uuid.to_string()
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(participant.uuid));
        }
        Ok(())
    }

    fn get_participant(&self, id: ParticipantId) -> RepoResult<Option<Participant>> {
        self.conn
            .query_row(
                &format!("{PARTICIPANT_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                read_raw_participant,
            )
            .optional()?
            .map(parse_participant)
            .transpose()
    }

    fn list_participants(&self, group_id: GroupId) -> RepoResult<Vec<Participant>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PARTICIPANT_SELECT_SQL}
             WHERE group_uuid = ?1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([group_id.to_string()])?;

        let mut participants = Vec::new();
        while let Some(row) = rows.next()? {
            participants.push(parse_participant(read_raw_participant(row)?)?);
        }
        Ok(participants)
    }

    fn delete_participant(&self, id: ParticipantId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let group_uuid: Option<String> = tx
            .query_row(
                "SELECT group_uuid FROM participants WHERE uuid = ?1;",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(group_uuid) = group_uuid else {
            return Err(RepoError::NotFound(id));
        };

        tx.execute("DELETE FROM participants WHERE uuid = ?1;", [id.to_string()])?;
        clear_group_recipients(&tx, parse_uuid(&group_uuid, "participants.group_uuid")?)?;
        tx.commit()?;

        debug!("event=participant_delete module=repo status=ok participant_id={id}");
        Ok(())
    }

    fn assign_recipients(
        &self,
        group_id: GroupId,
        pairs: &[(ParticipantId, ParticipantId)],
    ) -> RepoResult<()> {
        if pairs.iter().any(|(giver, recipient)| giver == recipient) {
            return Err(RepoError::Validation(ModelValidationError::SelfRecipient));
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let members = current_members(&tx, group_id)?;
        if !covers_members(&members, pairs) {
            warn!(
                "event=recipients_assign module=repo status=rejected group_id={group_id} members={} pairs={}",
                members.len(),
                pairs.len()
            );
            return Err(RepoError::MembershipChanged {
                group_id,
                members: members.len(),
                pairs: pairs.len(),
            });
        }

        for (giver, recipient) in pairs {
            let snapshot = &members[recipient];
            tx.execute(
                "UPDATE participants
                 SET
                    recipient_uuid = ?1,
                    recipient_name = ?2,
                    recipient_wish = ?3,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?4
                   AND group_uuid = ?5;",
                params![
                    snapshot.uuid.to_string(),
                    snapshot.name.as_str(),
                    snapshot.wish.as_str(),
                    giver.to_string(),
                    group_id.to_string(),
                ],
            )?;
        }
        tx.commit()?;

        Ok(())
    }
}

/// Snapshots of the group's members keyed by id.
fn current_members(
    conn: &Connection,
    group_id: GroupId,
) -> RepoResult<HashMap<ParticipantId, RecipientSnapshot>> {
    let mut stmt = conn.prepare(&format!("{PARTICIPANT_SELECT_SQL} WHERE group_uuid = ?1;"))?;
    let mut rows = stmt.query([group_id.to_string()])?;

    let mut members = HashMap::new();
    while let Some(row) = rows.next()? {
        let member = parse_participant(read_raw_participant(row)?)?;
        members.insert(member.uuid, member.snapshot());
    }
    Ok(members)
}

/// True when every member gives exactly once and receives exactly once.
fn covers_members(
    members: &HashMap<ParticipantId, RecipientSnapshot>,
    pairs: &[(ParticipantId, ParticipantId)],
) -> bool {
    let givers: HashSet<&ParticipantId> = pairs.iter().map(|(giver, _)| giver).collect();
    let recipients: HashSet<&ParticipantId> =
        pairs.iter().map(|(_, recipient)| recipient).collect();

    pairs.len() == members.len()
        && givers.len() == members.len()
        && recipients.len() == members.len()
        && givers.iter().all(|id| members.contains_key(*id))
        && recipients.iter().all(|id| members.contains_key(*id))
}

fn clear_group_recipients(conn: &Connection, group_id: GroupId) -> RepoResult<usize> {
    let cleared = conn.execute(
        "UPDATE participants
         SET
            recipient_uuid = NULL,
            recipient_name = NULL,
            recipient_wish = NULL,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE group_uuid = ?1
           AND recipient_uuid IS NOT NULL;",
        [group_id.to_string()],
    )?;
    if cleared > 0 {
        debug!(
            "event=recipients_clear module=repo status=ok group_id={group_id} cleared={cleared}"
        );
    }
    Ok(cleared)
}

struct RawParticipant {
    uuid: String,
    group_uuid: String,
    name: String,
    wish: String,
    recipient_uuid: Option<String>,
    recipient_name: Option<String>,
    recipient_wish: Option<String>,
}

fn read_raw_participant(row: &Row<'_>) -> rusqlite::Result<RawParticipant> {
    Ok(RawParticipant {
        uuid: row.get("uuid")?,
        group_uuid: row.get("group_uuid")?,
        name: row.get("name")?,
        wish: row.get("wish")?,
        recipient_uuid: row.get("recipient_uuid")?,
        recipient_name: row.get("recipient_name")?,
        recipient_wish: row.get("recipient_wish")?,
    })
}

fn parse_participant(raw: RawParticipant) -> RepoResult<Participant> {
    let recipient = match (raw.recipient_uuid, raw.recipient_name, raw.recipient_wish) {
        (Some(uuid), Some(name), Some(wish)) => Some(RecipientSnapshot {
            uuid: parse_uuid(&uuid, "participants.recipient_uuid")?,
            name,
            wish,
        }),
        (None, None, None) => None,
        _ => {
            return Err(RepoError::InvalidData(format!(
                "partial recipient snapshot on participant `{}`",
                raw.uuid
            )));
        }
    };

    let participant = Participant {
        uuid: parse_uuid(&raw.uuid, "participants.uuid")?,
        group_uuid: parse_uuid(&raw.group_uuid, "participants.group_uuid")?,
        name: raw.name,
        wish: raw.wish,
        recipient,
    };
    participant.validate()?;
    Ok(participant)
}
