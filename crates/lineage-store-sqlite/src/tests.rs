//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use lineage_core::{
  Error as CoreError,
  graph::audit,
  maintainer,
  member::{FamilyMember, Gender, MemberDraft, NodePosition, RelationSet},
  store::MemberStore,
};
use uuid::Uuid;

use crate::SqliteStore;

const EDITOR: &str = "editor@example.com";

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn draft(name: &str, gender: Gender) -> MemberDraft {
  MemberDraft::new(name, gender).unwrap()
}

async fn insert(s: &SqliteStore, d: MemberDraft) -> FamilyMember {
  s.insert(d, EDITOR.to_string()).await.unwrap()
}

async fn fetch(s: &SqliteStore, id: Uuid) -> FamilyMember {
  s.find_by_id(id).await.unwrap().expect("member exists")
}

// ─── Documents ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_find_roundtrip() {
  let s = store().await;

  let mut d = draft("Ada Byron", Gender::Female);
  d.birth_date = NaiveDate::from_ymd_opt(1815, 12, 10);
  d.death_date = NaiveDate::from_ymd_opt(1852, 11, 27);
  d.description = Some("Analyst".into());
  d.photo_url = Some("https://img.example.com/ada.png".into());
  d.node_position = Some(NodePosition { x: 120.5, y: -40.0 });
  let spouse = Uuid::new_v4();
  d.spouse_ids.insert(spouse);

  let created = insert(&s, d).await;
  let fetched = fetch(&s, created.id).await;

  assert_eq!(fetched.name, "Ada Byron");
  assert_eq!(fetched.gender, Gender::Female);
  assert_eq!(fetched.birth_date, NaiveDate::from_ymd_opt(1815, 12, 10));
  assert_eq!(fetched.death_date, NaiveDate::from_ymd_opt(1852, 11, 27));
  assert_eq!(fetched.description.as_deref(), Some("Analyst"));
  assert_eq!(fetched.node_position, NodePosition { x: 120.5, y: -40.0 });
  assert_eq!(fetched.spouse_ids, BTreeSet::from([spouse]));
  assert_eq!(fetched.created_by, EDITOR);
  assert_eq!(fetched.created_at, created.created_at);
}

#[tokio::test]
async fn find_missing_returns_none() {
  let s = store().await;
  assert!(s.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn draft_without_position_lands_at_origin() {
  let s = store().await;
  let m = insert(&s, draft("Ori", Gender::Male)).await;
  assert_eq!(fetch(&s, m.id).await.node_position, NodePosition::default());
}

#[tokio::test]
async fn list_is_newest_first() {
  let s = store().await;
  let first = insert(&s, draft("First", Gender::Male)).await;
  let second = insert(&s, draft("Second", Gender::Female)).await;
  let third = insert(&s, draft("Third", Gender::Male)).await;

  let ids: Vec<Uuid> = s.list().await.unwrap().iter().map(|m| m.id).collect();
  assert_eq!(ids, vec![third.id, second.id, first.id]);
}

#[tokio::test]
async fn list_carries_relation_sets() {
  let s = store().await;
  let a = insert(&s, draft("Ann", Gender::Female)).await;
  let b = insert(&s, draft("Bob", Gender::Male).with_spouses([a.id])).await;

  let all = s.list().await.unwrap();
  let b_listed = all.iter().find(|m| m.id == b.id).unwrap();
  assert_eq!(b_listed.spouse_ids, BTreeSet::from([a.id]));
  let a_listed = all.iter().find(|m| m.id == a.id).unwrap();
  assert!(a_listed.spouse_ids.is_empty());
}

#[tokio::test]
async fn replace_overwrites_attributes_and_keeps_position_when_absent() {
  let s = store().await;
  let mut d = draft("Old", Gender::Male);
  d.node_position = Some(NodePosition { x: 5.0, y: 6.0 });
  d.description = Some("to be cleared".into());
  let m = insert(&s, d).await;

  let child = Uuid::new_v4();
  let mut d = draft("New", Gender::Female);
  d.children_ids = Some(BTreeSet::from([child]));
  let replaced = s.replace(m.id, d).await.unwrap().unwrap();

  assert_eq!(replaced.name, "New");
  assert_eq!(replaced.gender, Gender::Female);
  assert_eq!(replaced.description, None);
  assert_eq!(replaced.children_ids, BTreeSet::from([child]));
  assert_eq!(replaced.node_position, NodePosition { x: 5.0, y: 6.0 });
  assert!(replaced.updated_at >= m.updated_at);
}

#[tokio::test]
async fn replace_without_children_keeps_stored_children() {
  let s = store().await;
  let child = Uuid::new_v4();
  let mut d = draft("Parent", Gender::Male);
  d.children_ids = Some(BTreeSet::from([child]));
  let m = insert(&s, d).await;

  let replaced = s.replace(m.id, draft("Parent Sr", Gender::Male)).await.unwrap().unwrap();
  assert_eq!(replaced.name, "Parent Sr");
  assert_eq!(replaced.children_ids, BTreeSet::from([child]));
}

#[tokio::test]
async fn replace_missing_returns_none() {
  let s = store().await;
  let result = s.replace(Uuid::new_v4(), draft("Nobody", Gender::Male)).await.unwrap();
  assert!(result.is_none());
}

// ─── Set mutations ───────────────────────────────────────────────────────────

#[tokio::test]
async fn add_to_set_is_idempotent_and_skips_missing_targets() {
  let s = store().await;
  let a = insert(&s, draft("Ann", Gender::Female)).await;
  let b = Uuid::new_v4();

  s.add_to_set(RelationSet::Spouses, vec![a.id, Uuid::new_v4()], b).await.unwrap();
  s.add_to_set(RelationSet::Spouses, vec![a.id], b).await.unwrap();

  assert_eq!(fetch(&s, a.id).await.spouse_ids, BTreeSet::from([b]));
  assert_eq!(s.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn pull_removes_only_the_value() {
  let s = store().await;
  let (x, y) = (Uuid::new_v4(), Uuid::new_v4());
  let mut d = draft("Parent", Gender::Female);
  d.children_ids = Some(BTreeSet::from([x, y]));
  let p = insert(&s, d).await;

  s.pull(RelationSet::Children, vec![p.id], x).await.unwrap();
  s.pull(RelationSet::Children, vec![p.id], x).await.unwrap();

  assert_eq!(fetch(&s, p.id).await.children_ids, BTreeSet::from([y]));
}

#[tokio::test]
async fn purge_missing_member_changes_nothing() {
  let s = store().await;
  let ghost = Uuid::new_v4();
  let m = insert(&s, draft("Orphan", Gender::Male).with_father(ghost)).await;

  assert!(!s.purge(ghost).await.unwrap());
  assert_eq!(fetch(&s, m.id).await.father_id, Some(ghost));
}

// ─── Maintainer scenarios ────────────────────────────────────────────────────

#[tokio::test]
async fn create_child_links_father() {
  let s = store().await;
  let f = maintainer::create(&s, draft("Frank", Gender::Male), EDITOR.into()).await.unwrap();
  let c = maintainer::create(&s, draft("Cora", Gender::Female).with_father(f.id), EDITOR.into())
    .await
    .unwrap();

  assert_eq!(fetch(&s, f.id).await.children_ids, BTreeSet::from([c.id]));
  assert_eq!(fetch(&s, c.id).await.father_id, Some(f.id));
}

#[tokio::test]
async fn spouse_link_and_unlink() {
  let s = store().await;
  let a = maintainer::create(&s, draft("Ann", Gender::Female), EDITOR.into()).await.unwrap();
  let b = maintainer::create(&s, draft("Bob", Gender::Male), EDITOR.into()).await.unwrap();

  let mut d = MemberDraft::from_member(&a);
  d.spouse_ids = BTreeSet::from([b.id]);
  maintainer::update(&s, a.id, d).await.unwrap();
  assert_eq!(fetch(&s, a.id).await.spouse_ids, BTreeSet::from([b.id]));
  assert_eq!(fetch(&s, b.id).await.spouse_ids, BTreeSet::from([a.id]));

  let mut d = MemberDraft::from_member(&fetch(&s, a.id).await);
  d.spouse_ids.clear();
  maintainer::update(&s, a.id, d).await.unwrap();
  assert!(fetch(&s, a.id).await.spouse_ids.is_empty());
  assert!(fetch(&s, b.id).await.spouse_ids.is_empty());
}

#[tokio::test]
async fn deleting_father_clears_child_link() {
  let s = store().await;
  let f = maintainer::create(&s, draft("Frank", Gender::Male), EDITOR.into()).await.unwrap();
  let m = maintainer::create(&s, draft("Mona", Gender::Female).with_spouses([f.id]), EDITOR.into())
    .await
    .unwrap();
  let c = maintainer::create(
    &s,
    draft("Cora", Gender::Female).with_father(f.id).with_mother(m.id),
    EDITOR.into(),
  )
  .await
  .unwrap();

  maintainer::delete(&s, f.id).await.unwrap();

  assert!(s.find_by_id(f.id).await.unwrap().is_none());
  let c = fetch(&s, c.id).await;
  assert_eq!(c.father_id, None);
  assert_eq!(c.mother_id, Some(m.id));
  assert!(fetch(&s, m.id).await.spouse_ids.is_empty());

  let remaining = s.list().await.unwrap();
  assert!(remaining.iter().all(|r| r.references().all(|id| id != f.id)));
  assert!(audit(&remaining).is_empty());
}

#[tokio::test]
async fn deleting_child_clears_parent_children() {
  let s = store().await;
  let f = maintainer::create(&s, draft("Frank", Gender::Male), EDITOR.into()).await.unwrap();
  let c = maintainer::create(&s, draft("Cora", Gender::Female).with_father(f.id), EDITOR.into())
    .await
    .unwrap();

  maintainer::delete(&s, c.id).await.unwrap();
  assert!(fetch(&s, f.id).await.children_ids.is_empty());
}

#[tokio::test]
async fn update_of_missing_member_is_not_found_and_writes_nothing() {
  let s = store().await;
  let a = maintainer::create(&s, draft("Ann", Gender::Female), EDITOR.into()).await.unwrap();
  let before = s.list().await.unwrap();

  let err = maintainer::update(&s, Uuid::new_v4(), draft("X", Gender::Male).with_spouses([a.id]))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::MemberNotFound(_)));
  assert_eq!(s.list().await.unwrap(), before);
}
