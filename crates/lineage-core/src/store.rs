//! The `MemberStore` trait: the document-store contract the maintainer
//! drives.
//!
//! The trait is implemented by storage backends (e.g.
//! `lineage-store-sqlite`). Higher layers (`lineage-api`, `lineage-server`)
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::member::{FamilyMember, MemberDraft, RelationSet};

/// Abstraction over a family-member document store.
///
/// Set mutations ([`add_to_set`](Self::add_to_set), [`pull`](Self::pull))
/// are idempotent and silently skip targets that do not exist.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait MemberStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new member and return it with its store-assigned id and
  /// timestamps. A draft without a position is placed at the origin.
  fn insert(
    &self,
    draft: MemberDraft,
    created_by: String,
  ) -> impl Future<Output = Result<FamilyMember, Self::Error>> + Send + '_;

  /// Retrieve a member by id. Returns `None` if not found.
  fn find_by_id(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<FamilyMember>, Self::Error>> + Send + '_;

  /// All members, newest first.
  fn list(
    &self,
  ) -> impl Future<Output = Result<Vec<FamilyMember>, Self::Error>> + Send + '_;

  /// Overwrite a member's attributes and relationship fields with `draft`.
  /// A draft without a position or a children set keeps the stored one.
  ///
  /// Returns the updated record, or `None` if `id` does not exist.
  fn replace(
    &self,
    id: Uuid,
    draft: MemberDraft,
  ) -> impl Future<Output = Result<Option<FamilyMember>, Self::Error>> + Send + '_;

  /// Add `value` to `field` on every member in `targets`.
  fn add_to_set(
    &self,
    field: RelationSet,
    targets: Vec<Uuid>,
    value: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove `value` from `field` on every member in `targets`.
  fn pull(
    &self,
    field: RelationSet,
    targets: Vec<Uuid>,
    value: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Scrub every reference to `id` held by other members (father, mother,
  /// spouses, children) and then delete the record itself.
  ///
  /// Returns `false` if no record was deleted. Backends that support
  /// multi-statement transactions must apply all passes atomically.
  fn purge(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
