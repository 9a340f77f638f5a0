//! Family member records, the sole entity of the genealogy collection.
//!
//! Relationships are stored as identifier references into the same
//! collection. Spouse links are symmetric and children mirror the
//! father/mother links of other members; keeping both sides in step is the
//! job of [`crate::maintainer`], not of this module.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Gender ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
  Male,
  Female,
}

impl Gender {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Male => "male",
      Self::Female => "female",
    }
  }

  /// Parse user input; surrounding whitespace and case are ignored.
  pub fn parse(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "male" => Ok(Self::Male),
      "female" => Ok(Self::Female),
      "" => Err(Error::validation("gender is required")),
      other => Err(Error::validation(format!(
        "gender must be \"male\" or \"female\", got {other:?}"
      ))),
    }
  }
}

// ─── Layout ──────────────────────────────────────────────────────────────────

/// Diagram coordinate of a member's node. Opaque to the maintainer.
/// A coordinate left out of the input is 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
  #[serde(default)]
  pub x: f64,
  #[serde(default)]
  pub y: f64,
}

// ─── Relation sets ───────────────────────────────────────────────────────────

/// The set-valued relationship fields a store can mutate in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationSet {
  Spouses,
  Children,
}

impl RelationSet {
  /// Wire name of the field, as clients see it.
  pub fn field_name(self) -> &'static str {
    match self {
      Self::Spouses => "spouseIds",
      Self::Children => "childrenIds",
    }
  }
}

// ─── FamilyMember ────────────────────────────────────────────────────────────

/// A persisted person record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMember {
  pub id:            Uuid,
  /// Identity of the editor who created the record. Never used for access
  /// control: the tree is shared.
  pub created_by:    String,
  pub name:          String,
  pub gender:        Gender,
  pub birth_date:    Option<NaiveDate>,
  pub death_date:    Option<NaiveDate>,
  pub description:   Option<String>,
  pub photo_url:     Option<String>,
  pub father_id:     Option<Uuid>,
  pub mother_id:     Option<Uuid>,
  pub spouse_ids:    BTreeSet<Uuid>,
  pub children_ids:  BTreeSet<Uuid>,
  pub node_position: NodePosition,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl FamilyMember {
  /// Iterate over every member id this record points at.
  pub fn references(&self) -> impl Iterator<Item = Uuid> + '_ {
    self
      .father_id
      .iter()
      .chain(self.mother_id.iter())
      .chain(self.spouse_ids.iter())
      .chain(self.children_ids.iter())
      .copied()
  }

  pub fn is_parent_of(&self, child: &FamilyMember) -> bool {
    child.father_id == Some(self.id) || child.mother_id == Some(self.id)
  }
}

// ─── MemberDraft ─────────────────────────────────────────────────────────────

/// Validated attributes for creating or replacing a member.
///
/// Identity and timestamps are assigned by the store and cannot be supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDraft {
  pub name:          String,
  pub gender:        Gender,
  pub birth_date:    Option<NaiveDate>,
  pub death_date:    Option<NaiveDate>,
  pub description:   Option<String>,
  pub photo_url:     Option<String>,
  pub father_id:     Option<Uuid>,
  pub mother_id:     Option<Uuid>,
  pub spouse_ids:    BTreeSet<Uuid>,
  /// `None` on replace keeps the stored set; on insert it means empty.
  pub children_ids:  Option<BTreeSet<Uuid>>,
  /// `None` on replace keeps the stored position; on insert it means origin.
  pub node_position: Option<NodePosition>,
}

impl MemberDraft {
  /// Draft with the two required attributes and everything else empty.
  ///
  /// Fails if `name` is blank once trimmed.
  pub fn new(name: impl AsRef<str>, gender: Gender) -> Result<Self> {
    Ok(Self {
      name: required_name(name.as_ref())?,
      gender,
      birth_date: None,
      death_date: None,
      description: None,
      photo_url: None,
      father_id: None,
      mother_id: None,
      spouse_ids: BTreeSet::new(),
      children_ids: None,
      node_position: None,
    })
  }

  pub fn with_father(mut self, id: Uuid) -> Self {
    self.father_id = Some(id);
    self
  }

  pub fn with_mother(mut self, id: Uuid) -> Self {
    self.mother_id = Some(id);
    self
  }

  pub fn with_spouses(mut self, ids: impl IntoIterator<Item = Uuid>) -> Self {
    self.spouse_ids = ids.into_iter().collect();
    self
  }

  /// Reject a draft that would make member `id` its own parent or spouse.
  pub fn check_self_reference(&self, id: Uuid) -> Result<()> {
    if self.father_id == Some(id) || self.mother_id == Some(id) {
      return Err(Error::validation("a member cannot be their own parent"));
    }
    if self.spouse_ids.contains(&id) {
      return Err(Error::validation("a member cannot be their own spouse"));
    }
    Ok(())
  }

  /// Build a draft that reproduces `member` as currently stored.
  pub fn from_member(member: &FamilyMember) -> Self {
    Self {
      name:          member.name.clone(),
      gender:        member.gender,
      birth_date:    member.birth_date,
      death_date:    member.death_date,
      description:   member.description.clone(),
      photo_url:     member.photo_url.clone(),
      father_id:     member.father_id,
      mother_id:     member.mother_id,
      spouse_ids:    member.spouse_ids.clone(),
      children_ids:  Some(member.children_ids.clone()),
      node_position: Some(member.node_position),
    }
  }
}

// ─── Input parsing helpers ───────────────────────────────────────────────────

/// Trim a display name and reject it if nothing is left.
pub fn required_name(raw: &str) -> Result<String> {
  let name = raw.trim();
  if name.is_empty() {
    return Err(Error::validation("name is required"));
  }
  Ok(name.to_owned())
}

/// Trim optional free text; blank collapses to `None`.
pub fn optional_text(raw: Option<String>) -> Option<String> {
  raw
    .map(|s| s.trim().to_owned())
    .filter(|s| !s.is_empty())
}

/// Parse a calendar date. Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp
/// (the date part is kept). Blank input means "no date".
pub fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>> {
  let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
    return Ok(None);
  };
  if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
    return Ok(Some(d));
  }
  DateTime::parse_from_rfc3339(s)
    .map(|dt| Some(dt.with_timezone(&Utc).date_naive()))
    .map_err(|_| Error::validation(format!("{field} is not a valid date: {s:?}")))
}

/// Parse an optional member reference. Blank input means "no reference".
pub fn parse_member_ref(field: &str, raw: Option<&str>) -> Result<Option<Uuid>> {
  let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
    return Ok(None);
  };
  Uuid::parse_str(s)
    .map(Some)
    .map_err(|_| Error::validation(format!("{field} is not a valid id: {s:?}")))
}

/// Parse a list of member references into a set; duplicates collapse.
pub fn parse_member_set<I, S>(field: &str, raw: I) -> Result<BTreeSet<Uuid>>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  raw
    .into_iter()
    .map(|s| {
      let s = s.as_ref().trim();
      Uuid::parse_str(s)
        .map_err(|_| Error::validation(format!("{field} contains an invalid id: {s:?}")))
    })
    .collect()
}
