//! Group registry contract and SQLite implementation.
//!
//! # Invariants
//! - Deleting a group deletes its participants (foreign-key cascade).
//! - Groups list in creation order.

use super::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::model::group::{Group, GroupId};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

const GROUP_SELECT_SQL: &str = "SELECT uuid, name, description FROM exchange_groups";

/// Registry interface for group CRUD operations.
pub trait GroupRepository {
    fn create_group(&self, group: &Group) -> RepoResult<GroupId>;
    /// Replaces name and description of an existing group.
    fn update_group(&self, group: &Group) -> RepoResult<()>;
    fn get_group(&self, id: GroupId) -> RepoResult<Option<Group>>;
    fn list_groups(&self) -> RepoResult<Vec<Group>>;
    /// Deletes the group together with all its participants.
    fn delete_group(&self, id: GroupId) -> RepoResult<()>;
}

/// SQLite-backed group registry.
pub struct SqliteGroupRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGroupRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl GroupRepository for SqliteGroupRepository<'_> {
    fn create_group(&self, group: &Group) -> RepoResult<GroupId> {
        group.validate()?;

        self.conn.execute(
            "INSERT INTO exchange_groups (uuid, name, description) VALUES (?1, ?2, ?3);",
            params![
                group.uuid.to_string(),
                group.name.as_str(),
                group.description.as_deref()
            ],
        )?;
        debug!("event=group_create module=repo status=ok group_id={}", group.uuid);

        Ok(group.uuid)
    }

    fn update_group(&self, group: &Group) -> RepoResult<()> {
        group.validate()?;

        let changed = self.conn.execute(
            "UPDATE exchange_groups
             SET
                name = ?1,
                description = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?3;",
            params![
                group.name.as_str(),
                group.description.as_deref(),
                group.uuid.to_string()
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(group.uuid));
        }
        Ok(())
    }

    fn get_group(&self, id: GroupId) -> RepoResult<Option<Group>> {
        self.conn
            .query_row(
                &format!("{GROUP_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                read_raw_group,
            )
            .optional()?
            .map(parse_group)
            .transpose()
    }

    fn list_groups(&self) -> RepoResult<Vec<Group>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{GROUP_SELECT_SQL} ORDER BY created_at ASC, rowid ASC;"))?;
        let mut rows = stmt.query([])?;

        let mut groups = Vec::new();
        while let Some(row) = rows.next()? {
            groups.push(parse_group(read_raw_group(row)?)?);
        }
        Ok(groups)
    }

    fn delete_group(&self, id: GroupId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM exchange_groups WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        debug!("event=group_delete module=repo status=ok group_id={id}");
        Ok(())
    }
}

struct RawGroup {
    uuid: String,
    name: String,
    description: Option<String>,
}

fn read_raw_group(row: &Row<'_>) -> rusqlite::Result<RawGroup> {
    Ok(RawGroup {
        uuid: row.get("uuid")?,
        name: row.get("name")?,
        description: row.get("description")?,
    })
}

fn parse_group(raw: RawGroup) -> RepoResult<Group> {
    let group = Group {
        uuid: parse_uuid(&raw.uuid, "exchange_groups.uuid")?,
        name: raw.name,
        description: raw.description,
    };
    group.validate()?;
    Ok(group)
}
