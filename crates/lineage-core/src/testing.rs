//! In-memory [`MemberStore`] used by the unit tests in this crate.

use std::sync::{
  Mutex,
  atomic::{AtomicBool, AtomicUsize, Ordering},
};

use chrono::Utc;
use uuid::Uuid;

use crate::{
  member::{FamilyMember, MemberDraft, RelationSet},
  store::MemberStore,
};

#[derive(Debug, thiserror::Error)]
#[error("injected store failure")]
pub struct InjectedFailure;

/// Members kept in insertion order behind a mutex.
#[derive(Default)]
pub struct MemoryStore {
  members:    Mutex<Vec<FamilyMember>>,
  fail_sets:  AtomicBool,
  set_writes: AtomicUsize,
}

impl MemoryStore {
  /// Copy of every stored member, in insertion order.
  pub fn snapshot(&self) -> Vec<FamilyMember> {
    self.members.lock().unwrap().clone()
  }

  /// Make subsequent `add_to_set` / `pull` calls fail.
  pub fn fail_set_writes(&self, fail: bool) { self.fail_sets.store(fail, Ordering::SeqCst); }

  /// Number of `add_to_set` / `pull` calls that reached the store.
  pub fn set_writes(&self) -> usize { self.set_writes.load(Ordering::SeqCst) }

  fn mutate_sets(
    &self,
    field: RelationSet,
    targets: &[Uuid],
    mut op: impl FnMut(&mut std::collections::BTreeSet<Uuid>) -> bool,
  ) -> Result<(), InjectedFailure> {
    self.set_writes.fetch_add(1, Ordering::SeqCst);
    if self.fail_sets.load(Ordering::SeqCst) {
      return Err(InjectedFailure);
    }
    let mut members = self.members.lock().unwrap();
    for m in members.iter_mut().filter(|m| targets.contains(&m.id)) {
      let set = match field {
        RelationSet::Spouses => &mut m.spouse_ids,
        RelationSet::Children => &mut m.children_ids,
      };
      if op(set) {
        m.updated_at = Utc::now();
      }
    }
    Ok(())
  }
}

impl MemberStore for MemoryStore {
  type Error = InjectedFailure;

  async fn insert(&self, draft: MemberDraft, created_by: String) -> Result<FamilyMember, Self::Error> {
    let now = Utc::now();
    let member = FamilyMember {
      id: Uuid::new_v4(),
      created_by,
      name: draft.name,
      gender: draft.gender,
      birth_date: draft.birth_date,
      death_date: draft.death_date,
      description: draft.description,
      photo_url: draft.photo_url,
      father_id: draft.father_id,
      mother_id: draft.mother_id,
      spouse_ids: draft.spouse_ids,
      children_ids: draft.children_ids.unwrap_or_default(),
      node_position: draft.node_position.unwrap_or_default(),
      created_at: now,
      updated_at: now,
    };
    self.members.lock().unwrap().push(member.clone());
    Ok(member)
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<FamilyMember>, Self::Error> {
    Ok(self.members.lock().unwrap().iter().find(|m| m.id == id).cloned())
  }

  async fn list(&self) -> Result<Vec<FamilyMember>, Self::Error> {
    Ok(self.members.lock().unwrap().iter().rev().cloned().collect())
  }

  async fn replace(&self, id: Uuid, draft: MemberDraft) -> Result<Option<FamilyMember>, Self::Error> {
    let mut members = self.members.lock().unwrap();
    let Some(m) = members.iter_mut().find(|m| m.id == id) else {
      return Ok(None);
    };
    m.name = draft.name;
    m.gender = draft.gender;
    m.birth_date = draft.birth_date;
    m.death_date = draft.death_date;
    m.description = draft.description;
    m.photo_url = draft.photo_url;
    m.father_id = draft.father_id;
    m.mother_id = draft.mother_id;
    m.spouse_ids = draft.spouse_ids;
    if let Some(children) = draft.children_ids {
      m.children_ids = children;
    }
    if let Some(pos) = draft.node_position {
      m.node_position = pos;
    }
    m.updated_at = Utc::now();
    Ok(Some(m.clone()))
  }

  async fn add_to_set(&self, field: RelationSet, targets: Vec<Uuid>, value: Uuid) -> Result<(), Self::Error> {
    self.mutate_sets(field, &targets, |set| set.insert(value))
  }

  async fn pull(&self, field: RelationSet, targets: Vec<Uuid>, value: Uuid) -> Result<(), Self::Error> {
    self.mutate_sets(field, &targets, |set| set.remove(&value))
  }

  async fn purge(&self, id: Uuid) -> Result<bool, Self::Error> {
    let mut members = self.members.lock().unwrap();
    let Some(pos) = members.iter().position(|m| m.id == id) else {
      return Ok(false);
    };
    members.remove(pos);
    for m in members.iter_mut() {
      if m.father_id == Some(id) {
        m.father_id = None;
      }
      if m.mother_id == Some(id) {
        m.mother_id = None;
      }
      m.spouse_ids.remove(&id);
      m.children_ids.remove(&id);
    }
    Ok(true)
  }
}
