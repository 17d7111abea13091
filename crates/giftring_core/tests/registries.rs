use giftring_core::db::open_db_in_memory;
use giftring_core::{
    Group, GroupRepository, ModelValidationError, Participant, ParticipantRepository, RepoError,
    SqliteGroupRepository, SqliteParticipantRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn seed_group(conn: &Connection, name: &str, members: &[&str]) -> (Group, Vec<Participant>) {
    let groups = SqliteGroupRepository::try_new(conn).unwrap();
    let participants = SqliteParticipantRepository::try_new(conn).unwrap();

    let group = Group::new(name, None);
    groups.create_group(&group).unwrap();
    let members = members
        .iter()
        .map(|member| {
            let participant = Participant::new(group.uuid, *member, format!("{member} wish"));
            participants.create_participant(&participant).unwrap();
            participant
        })
        .collect();
    (group, members)
}

fn ring(members: &[Participant]) -> Vec<(Uuid, Uuid)> {
    members
        .iter()
        .enumerate()
        .map(|(index, member)| (member.uuid, members[(index + 1) % members.len()].uuid))
        .collect()
}

fn assert_no_recipients(repo: &SqliteParticipantRepository<'_>, group: &Group) {
    for member in repo.list_participants(group.uuid).unwrap() {
        assert!(member.recipient.is_none(), "{} kept a partial write", member.name);
    }
}

#[test]
fn group_create_get_update_and_list_in_creation_order() {
    let conn = setup();
    let repo = SqliteGroupRepository::try_new(&conn).unwrap();

    let first = Group::new("Office", Some("third floor".to_string()));
    let second = Group::new("Family", None);
    repo.create_group(&first).unwrap();
    repo.create_group(&second).unwrap();

    let loaded = repo.get_group(first.uuid).unwrap().unwrap();
    assert_eq!(loaded, first);

    let mut renamed = second.clone();
    renamed.name = "Cousins".to_string();
    renamed.description = Some("everyone".to_string());
    repo.update_group(&renamed).unwrap();

    let listed = repo.list_groups().unwrap();
    let names: Vec<&str> = listed.iter().map(|group| group.name.as_str()).collect();
    assert_eq!(names, ["Office", "Cousins"]);
    assert_eq!(listed[1].description.as_deref(), Some("everyone"));
}

#[test]
fn group_writes_validate_and_report_missing_rows() {
    let conn = setup();
    let repo = SqliteGroupRepository::try_new(&conn).unwrap();

    let blank = Group::new("  ", None);
    assert!(matches!(
        repo.create_group(&blank).unwrap_err(),
        RepoError::Validation(ModelValidationError::BlankGroupName)
    ));

    let ghost = Group::new("Ghost", None);
    assert!(matches!(
        repo.update_group(&ghost).unwrap_err(),
        RepoError::NotFound(id) if id == ghost.uuid
    ));
    assert!(matches!(
        repo.delete_group(ghost.uuid).unwrap_err(),
        RepoError::NotFound(id) if id == ghost.uuid
    ));
    assert!(repo.get_group(ghost.uuid).unwrap().is_none());
}

#[test]
fn deleting_group_removes_its_participants_only() {
    let conn = setup();
    let (doomed, doomed_members) = seed_group(&conn, "Doomed", &["Ann", "Bob", "Cid"]);
    let (kept, kept_members) = seed_group(&conn, "Kept", &["Dee", "Eve", "Fay"]);

    let groups = SqliteGroupRepository::try_new(&conn).unwrap();
    let participants = SqliteParticipantRepository::try_new(&conn).unwrap();
    groups.delete_group(doomed.uuid).unwrap();

    assert!(groups.get_group(doomed.uuid).unwrap().is_none());
    assert!(participants.list_participants(doomed.uuid).unwrap().is_empty());
    for member in &doomed_members {
        assert!(participants.get_participant(member.uuid).unwrap().is_none());
    }
    assert_eq!(
        participants.list_participants(kept.uuid).unwrap().len(),
        kept_members.len()
    );
}

#[test]
fn participants_list_in_insertion_order_per_group() {
    let conn = setup();
    let (group, members) = seed_group(&conn, "Club", &["Zed", "Amy", "Kim"]);
    let (_, _) = seed_group(&conn, "Other", &["Out"]);

    let repo = SqliteParticipantRepository::try_new(&conn).unwrap();
    let listed = repo.list_participants(group.uuid).unwrap();
    assert_eq!(listed, members);
    assert!(listed.iter().all(|member| member.recipient.is_none()));
}

#[test]
fn assign_recipients_persists_flat_snapshots() {
    let conn = setup();
    let (group, members) = seed_group(&conn, "Club", &["Ann", "Bob", "Cid"]);
    let repo = SqliteParticipantRepository::try_new(&conn).unwrap();

    repo.assign_recipients(group.uuid, &ring(&members)).unwrap();

    let ann = repo.get_participant(members[0].uuid).unwrap().unwrap();
    let recipient = ann.recipient.unwrap();
    assert_eq!(recipient.uuid, members[1].uuid);
    assert_eq!(recipient.name, "Bob");
    assert_eq!(recipient.wish, "Bob wish");
}

#[test]
fn assign_recipients_copies_values_stored_at_write_time() {
    let conn = setup();
    let (group, members) = seed_group(&conn, "Club", &["Ann", "Bob", "Cid"]);
    let repo = SqliteParticipantRepository::try_new(&conn).unwrap();

    let mut bob = members[1].clone();
    bob.wish = "a telescope".to_string();
    repo.update_participant(&bob).unwrap();
    repo.assign_recipients(group.uuid, &ring(&members)).unwrap();

    let ann = repo.get_participant(members[0].uuid).unwrap().unwrap();
    assert_eq!(ann.recipient.unwrap().wish, "a telescope");
}

#[test]
fn assign_recipients_rejects_outsiders_without_writing() {
    let conn = setup();
    let (group, members) = seed_group(&conn, "Club", &["Ann", "Bob", "Cid"]);
    let (_, outsiders) = seed_group(&conn, "Other", &["Out"]);
    let repo = SqliteParticipantRepository::try_new(&conn).unwrap();

    let mut pairs = ring(&members);
    pairs.push((outsiders[0].uuid, members[0].uuid));
    let err = repo.assign_recipients(group.uuid, &pairs).unwrap_err();
    assert!(matches!(
        err,
        RepoError::MembershipChanged { group_id, members: 3, pairs: 4 } if group_id == group.uuid
    ));
    assert_no_recipients(&repo, &group);

    let mut swapped = ring(&members);
    swapped[2].1 = outsiders[0].uuid;
    assert!(matches!(
        repo.assign_recipients(group.uuid, &swapped).unwrap_err(),
        RepoError::MembershipChanged { members: 3, pairs: 3, .. }
    ));
    assert_no_recipients(&repo, &group);
}

#[test]
fn assign_recipients_rejects_mapping_that_skips_members() {
    let conn = setup();
    let (group, members) = seed_group(&conn, "Club", &["Ann", "Bob", "Cid", "Dee"]);
    let repo = SqliteParticipantRepository::try_new(&conn).unwrap();

    let swap = [
        (members[0].uuid, members[1].uuid),
        (members[1].uuid, members[0].uuid),
    ];
    assert!(matches!(
        repo.assign_recipients(group.uuid, &swap).unwrap_err(),
        RepoError::MembershipChanged { members: 4, pairs: 2, .. }
    ));
    assert_no_recipients(&repo, &group);

    let mut two_to_bob = ring(&members);
    two_to_bob[2].1 = members[1].uuid;
    assert!(matches!(
        repo.assign_recipients(group.uuid, &two_to_bob).unwrap_err(),
        RepoError::MembershipChanged { members: 4, pairs: 4, .. }
    ));
    assert_no_recipients(&repo, &group);
}

#[test]
fn assign_recipients_rejects_self_pair() {
    let conn = setup();
    let (group, members) = seed_group(&conn, "Club", &["Ann", "Bob", "Cid"]);
    let repo = SqliteParticipantRepository::try_new(&conn).unwrap();

    let err = repo
        .assign_recipients(group.uuid, &[(members[0].uuid, members[0].uuid)])
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::SelfRecipient)
    ));
}

#[test]
fn adding_or_removing_members_clears_group_snapshots() {
    let conn = setup();
    let (group, members) = seed_group(&conn, "Club", &["Ann", "Bob", "Cid", "Dee"]);
    let (other, other_members) = seed_group(&conn, "Other", &["Eve", "Fay", "Gus"]);
    let repo = SqliteParticipantRepository::try_new(&conn).unwrap();

    repo.assign_recipients(group.uuid, &ring(&members)).unwrap();
    repo.assign_recipients(other.uuid, &ring(&other_members))
        .unwrap();

    repo.delete_participant(members[3].uuid).unwrap();
    let remaining = repo.list_participants(group.uuid).unwrap();
    assert_eq!(remaining.len(), 3);
    assert!(remaining.iter().all(|member| member.recipient.is_none()));
    assert!(repo
        .list_participants(other.uuid)
        .unwrap()
        .iter()
        .all(|member| member.recipient.is_some()));

    repo.assign_recipients(group.uuid, &ring(&remaining)).unwrap();
    let newcomer = Participant::new(group.uuid, "Hal", "kite");
    repo.create_participant(&newcomer).unwrap();
    assert!(repo
        .list_participants(group.uuid)
        .unwrap()
        .iter()
        .all(|member| member.recipient.is_none()));
}

#[test]
fn update_participant_changes_own_record_only() {
    let conn = setup();
    let (group, members) = seed_group(&conn, "Club", &["Ann", "Bob", "Cid"]);
    let repo = SqliteParticipantRepository::try_new(&conn).unwrap();
    repo.assign_recipients(group.uuid, &ring(&members)).unwrap();

    let mut bob = repo.get_participant(members[1].uuid).unwrap().unwrap();
    bob.name = "Robert".to_string();
    bob.wish = "a bicycle".to_string();
    repo.update_participant(&bob).unwrap();

    let bob = repo.get_participant(members[1].uuid).unwrap().unwrap();
    assert_eq!(bob.name, "Robert");
    assert!(bob.recipient.is_some());
    let ann = repo.get_participant(members[0].uuid).unwrap().unwrap();
    assert_eq!(ann.recipient.unwrap().name, "Bob");

    let ghost = Participant::new(group.uuid, "Ghost", "");
    assert!(matches!(
        repo.update_participant(&ghost).unwrap_err(),
        RepoError::NotFound(id) if id == ghost.uuid
    ));
    assert!(matches!(
        repo.delete_participant(ghost.uuid).unwrap_err(),
        RepoError::NotFound(id) if id == ghost.uuid
    ));
}
