//! Relationship consistency maintainer.
//!
//! Callers hand over one side of a relationship; the maintainer writes the
//! other. After every operation:
//!
//! - spouse links are symmetric: `A ∈ B.spouse_ids ⇔ B ∈ A.spouse_ids`;
//! - children mirror parents: `C ∈ B.children_ids ⇔ C.father_id = B or
//!   C.mother_id = B`, for every parent the operation touched.
//!
//! `children_ids` is only ever written from the child's side. A draft may
//! leave it out (the stored set is kept) or repeat it, but it cannot add or
//! drop a child whose own father/mother link says otherwise.
//!
//! Create and update are a sequence of independent store writes. A failure
//! partway through leaves the writes already issued in place and surfaces as
//! [`Error::Store`]. Delete delegates to [`MemberStore::purge`], which is
//! atomic on backends that support transactions.

use std::collections::BTreeSet;

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result,
  member::{FamilyMember, MemberDraft, RelationSet},
  store::MemberStore,
};

/// Every member, newest first.
pub async fn list<S: MemberStore>(store: &S) -> Result<Vec<FamilyMember>> {
  store.list().await.map_err(Error::store)
}

/// A single member; [`Error::MemberNotFound`] if absent.
pub async fn get<S: MemberStore>(store: &S, id: Uuid) -> Result<FamilyMember> {
  store
    .find_by_id(id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::MemberNotFound(id))
}

/// Persist a new member and link it into its parents' children and its
/// spouses' spouse sets.
///
/// Referenced members that do not exist are skipped on the inverse side;
/// the references stay on the new record.
pub async fn create<S: MemberStore>(
  store: &S,
  draft: MemberDraft,
  created_by: String,
) -> Result<FamilyMember> {
  if draft.children_ids.as_ref().is_some_and(|c| !c.is_empty()) {
    return Err(Error::validation(
      "childrenIds cannot be set on a new member; set fatherId or motherId on the child instead",
    ));
  }
  let member = store.insert(draft, created_by).await.map_err(Error::store)?;

  let parents: Vec<Uuid> = parents_of(member.father_id, member.mother_id)
    .into_iter()
    .collect();
  if !parents.is_empty() {
    debug!(member = %member.id, ?parents, "linking child to parents");
    store
      .add_to_set(RelationSet::Children, parents, member.id)
      .await
      .map_err(Error::store)?;
  }

  if !member.spouse_ids.is_empty() {
    let spouses: Vec<Uuid> = member.spouse_ids.iter().copied().collect();
    debug!(member = %member.id, ?spouses, "mirroring spouse links");
    store
      .add_to_set(RelationSet::Spouses, spouses, member.id)
      .await
      .map_err(Error::store)?;
  }

  info!(member = %member.id, name = %member.name, "family member created");
  Ok(member)
}

/// Replace a member's attributes and reconcile the inverse side of every
/// spouse and parent link that changed.
///
/// Fails with [`Error::MemberNotFound`] before writing anything if `id` does
/// not exist, and with [`Error::Validation`] if the draft makes the member
/// its own parent or spouse or carries a children set that disagrees with
/// the children's own parent links.
pub async fn update<S: MemberStore>(
  store: &S,
  id: Uuid,
  draft: MemberDraft,
) -> Result<FamilyMember> {
  let existing = get(store, id).await?;
  draft.check_self_reference(id)?;
  if let Some(children) = &draft.children_ids {
    check_children(store, &existing, children).await?;
  }

  let spouses_to_add: Vec<Uuid> = draft
    .spouse_ids
    .difference(&existing.spouse_ids)
    .copied()
    .collect();
  let spouses_to_remove: Vec<Uuid> = existing
    .spouse_ids
    .difference(&draft.spouse_ids)
    .copied()
    .collect();

  if !spouses_to_add.is_empty() {
    debug!(member = %id, added = ?spouses_to_add, "adding reverse spouse links");
    store
      .add_to_set(RelationSet::Spouses, spouses_to_add, id)
      .await
      .map_err(Error::store)?;
  }
  if !spouses_to_remove.is_empty() {
    debug!(member = %id, removed = ?spouses_to_remove, "dropping reverse spouse links");
    store
      .pull(RelationSet::Spouses, spouses_to_remove, id)
      .await
      .map_err(Error::store)?;
  }

  let old_parents = parents_of(existing.father_id, existing.mother_id);
  let new_parents = parents_of(draft.father_id, draft.mother_id);

  let parents_to_drop: Vec<Uuid> =
    old_parents.difference(&new_parents).copied().collect();
  let parents_to_link: Vec<Uuid> =
    new_parents.difference(&old_parents).copied().collect();

  if !parents_to_drop.is_empty() {
    debug!(member = %id, parents = ?parents_to_drop, "unlinking child from former parents");
    store
      .pull(RelationSet::Children, parents_to_drop, id)
      .await
      .map_err(Error::store)?;
  }
  if !parents_to_link.is_empty() {
    debug!(member = %id, parents = ?parents_to_link, "linking child to new parents");
    store
      .add_to_set(RelationSet::Children, parents_to_link, id)
      .await
      .map_err(Error::store)?;
  }

  let updated = store
    .replace(id, draft)
    .await
    .map_err(Error::store)?
    .ok_or(Error::MemberNotFound(id))?;

  info!(member = %id, "family member updated");
  Ok(updated)
}

/// Delete a member and scrub every reference other members hold to it.
pub async fn delete<S: MemberStore>(store: &S, id: Uuid) -> Result<()> {
  let deleted = store.purge(id).await.map_err(Error::store)?;
  if !deleted {
    return Err(Error::MemberNotFound(id));
  }
  info!(member = %id, "family member deleted");
  Ok(())
}

/// Every id in `children` must name `parent` as father or mother, and no
/// child on record that still does may be left out.
async fn check_children<S: MemberStore>(
  store: &S,
  parent: &FamilyMember,
  children: &BTreeSet<Uuid>,
) -> Result<()> {
  for child_id in children.union(&parent.children_ids) {
    let names_parent = store
      .find_by_id(*child_id)
      .await
      .map_err(Error::store)?
      .is_some_and(|child| parent.is_parent_of(&child));
    let listed = children.contains(child_id);

    if listed && !names_parent {
      return Err(Error::validation(format!(
        "childrenIds: {child_id} does not name this member as father or mother"
      )));
    }
    if !listed && names_parent {
      return Err(Error::validation(format!(
        "childrenIds: {child_id} still names this member as a parent; change the child's fatherId or motherId instead"
      )));
    }
  }
  Ok(())
}

fn parents_of(father: Option<Uuid>, mother: Option<Uuid>) -> BTreeSet<Uuid> {
  father.into_iter().chain(mother).collect()
}
