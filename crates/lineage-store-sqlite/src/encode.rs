//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings with a fixed microsecond width so they
//! sort lexically. Calendar dates are `YYYY-MM-DD`. UUIDs are hyphenated
//! lowercase strings.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound as _, Utc};
use lineage_core::member::{FamilyMember, Gender, NodePosition, RelationSet};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_ids(ids: &BTreeSet<Uuid>) -> Vec<String> {
  ids.iter().copied().map(encode_uuid).collect()
}

fn decode_ids(raw: Vec<String>) -> Result<BTreeSet<Uuid>> {
  raw.iter().map(|s| decode_uuid(s)).collect()
}

// ─── DateTime<Utc> / NaiveDate ───────────────────────────────────────────────

/// Current time at the precision the `members` table keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Gender ───────────────────────────────────────────────────────────────────

pub fn decode_gender(s: &str) -> Result<Gender> {
  match s {
    "male" => Ok(Gender::Male),
    "female" => Ok(Gender::Female),
    other => Err(Error::UnknownGender(other.to_owned())),
  }
}

// ─── RelationSet ──────────────────────────────────────────────────────────────

/// `(table, element column)` holding the rows of a set-valued field.
pub fn set_table(field: RelationSet) -> (&'static str, &'static str) {
  match field {
    RelationSet::Spouses => ("member_spouses", "spouse_id"),
    RelationSet::Children => ("member_children", "child_id"),
  }
}

// ─── Raw row types ────────────────────────────────────────────────────────────

/// Column list matching [`RawMember::from_row`].
pub const MEMBER_COLUMNS: &str = "member_id, created_by, name, gender, birth_date, death_date, \
   description, photo_url, father_id, mother_id, position_x, position_y, created_at, updated_at";

/// A `members` row as read from SQLite, before decoding.
pub struct RawMember {
  pub member_id:   String,
  pub created_by:  String,
  pub name:        String,
  pub gender:      String,
  pub birth_date:  Option<String>,
  pub death_date:  Option<String>,
  pub description: Option<String>,
  pub photo_url:   Option<String>,
  pub father_id:   Option<String>,
  pub mother_id:   Option<String>,
  pub position_x:  f64,
  pub position_y:  f64,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawMember {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      member_id:   row.get(0)?,
      created_by:  row.get(1)?,
      name:        row.get(2)?,
      gender:      row.get(3)?,
      birth_date:  row.get(4)?,
      death_date:  row.get(5)?,
      description: row.get(6)?,
      photo_url:   row.get(7)?,
      father_id:   row.get(8)?,
      mother_id:   row.get(9)?,
      position_x:  row.get(10)?,
      position_y:  row.get(11)?,
      created_at:  row.get(12)?,
      updated_at:  row.get(13)?,
    })
  }

  /// Decode the row together with the element rows of its two sets.
  pub fn into_member(
    self,
    spouses: Vec<String>,
    children: Vec<String>,
  ) -> Result<FamilyMember> {
    Ok(FamilyMember {
      id:            decode_uuid(&self.member_id)?,
      created_by:    self.created_by,
      name:          self.name,
      gender:        decode_gender(&self.gender)?,
      birth_date:    self.birth_date.as_deref().map(decode_date).transpose()?,
      death_date:    self.death_date.as_deref().map(decode_date).transpose()?,
      description:   self.description,
      photo_url:     self.photo_url,
      father_id:     self.father_id.as_deref().map(decode_uuid).transpose()?,
      mother_id:     self.mother_id.as_deref().map(decode_uuid).transpose()?,
      spouse_ids:    decode_ids(spouses)?,
      children_ids:  decode_ids(children)?,
      node_position: NodePosition { x: self.position_x, y: self.position_y },
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}
