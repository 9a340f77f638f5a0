//! [`SqliteStore`], the SQLite implementation of [`MemberStore`].

use std::{collections::HashMap, path::Path};

use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use lineage_core::{
  member::{FamilyMember, MemberDraft, RelationSet},
  store::MemberStore,
};

use crate::{
  Result,
  encode::{
    MEMBER_COLUMNS, RawMember, encode_date, encode_dt, encode_ids, encode_uuid, now, set_table,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A family tree backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Statement helpers ───────────────────────────────────────────────────────

/// Insert `ids` as elements of `owner`'s `field`; duplicates are ignored.
fn write_set(
  conn: &rusqlite::Connection,
  field: RelationSet,
  owner: &str,
  ids: &[String],
) -> rusqlite::Result<()> {
  let (table, column) = set_table(field);
  let mut stmt = conn.prepare(&format!(
    "INSERT OR IGNORE INTO {table} (member_id, {column}) VALUES (?1, ?2)"
  ))?;
  for id in ids {
    stmt.execute(rusqlite::params![owner, id])?;
  }
  Ok(())
}

fn read_set(
  conn: &rusqlite::Connection,
  field: RelationSet,
  owner: &str,
) -> rusqlite::Result<Vec<String>> {
  let (table, column) = set_table(field);
  let mut stmt = conn.prepare(&format!(
    "SELECT {column} FROM {table} WHERE member_id = ?1"
  ))?;
  let ids = stmt
    .query_map(rusqlite::params![owner], |row| row.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(ids)
}

/// Every element row of `field`, grouped by owner.
fn read_all_sets(
  conn: &rusqlite::Connection,
  field: RelationSet,
) -> rusqlite::Result<HashMap<String, Vec<String>>> {
  let (table, column) = set_table(field);
  let mut stmt = conn.prepare(&format!("SELECT member_id, {column} FROM {table}"))?;
  let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
  let rows = stmt.query_map([], |row| {
    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
  })?;
  for row in rows {
    let (owner, element) = row?;
    grouped.entry(owner).or_default().push(element);
  }
  Ok(grouped)
}

fn touch(conn: &rusqlite::Connection, member_id: &str, at: &str) -> rusqlite::Result<()> {
  conn.execute(
    "UPDATE members SET updated_at = ?2 WHERE member_id = ?1",
    rusqlite::params![member_id, at],
  )?;
  Ok(())
}

// ─── MemberStore impl ────────────────────────────────────────────────────────

impl MemberStore for SqliteStore {
  type Error = crate::Error;

  async fn insert(&self, draft: MemberDraft, created_by: String) -> Result<FamilyMember> {
    let at = now();
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
      created_at: at,
      updated_at: at,
    };

    let id_str      = encode_uuid(member.id);
    let created_by  = member.created_by.clone();
    let name        = member.name.clone();
    let gender      = member.gender.as_str();
    let birth_date  = member.birth_date.map(encode_date);
    let death_date  = member.death_date.map(encode_date);
    let description = member.description.clone();
    let photo_url   = member.photo_url.clone();
    let father_id   = member.father_id.map(encode_uuid);
    let mother_id   = member.mother_id.map(encode_uuid);
    let position    = member.node_position;
    let at_str      = encode_dt(at);
    let spouses     = encode_ids(&member.spouse_ids);
    let children    = encode_ids(&member.children_ids);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO members (
             member_id, created_by, name, gender, birth_date, death_date,
             description, photo_url, father_id, mother_id,
             position_x, position_y, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
          rusqlite::params![
            id_str,
            created_by,
            name,
            gender,
            birth_date,
            death_date,
            description,
            photo_url,
            father_id,
            mother_id,
            position.x,
            position.y,
            at_str,
          ],
        )?;
        write_set(&tx, RelationSet::Spouses, &id_str, &spouses)?;
        write_set(&tx, RelationSet::Children, &id_str, &children)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(member)
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<FamilyMember>> {
    let id_str = encode_uuid(id);

    let found: Option<(RawMember, Vec<String>, Vec<String>)> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {MEMBER_COLUMNS} FROM members WHERE member_id = ?1"),
            rusqlite::params![id_str],
            RawMember::from_row,
          )
          .optional()?;
        let Some(raw) = raw else {
          return Ok(None);
        };
        let spouses = read_set(conn, RelationSet::Spouses, &id_str)?;
        let children = read_set(conn, RelationSet::Children, &id_str)?;
        Ok(Some((raw, spouses, children)))
      })
      .await?;

    found
      .map(|(raw, spouses, children)| raw.into_member(spouses, children))
      .transpose()
  }

  async fn list(&self) -> Result<Vec<FamilyMember>> {
    let (raws, mut spouses, mut children) = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MEMBER_COLUMNS} FROM members ORDER BY created_at DESC, rowid DESC"
        ))?;
        let raws = stmt
          .query_map([], RawMember::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        let spouses = read_all_sets(conn, RelationSet::Spouses)?;
        let children = read_all_sets(conn, RelationSet::Children)?;
        Ok((raws, spouses, children))
      })
      .await?;

    raws
      .into_iter()
      .map(|raw| {
        let s = spouses.remove(&raw.member_id).unwrap_or_default();
        let c = children.remove(&raw.member_id).unwrap_or_default();
        raw.into_member(s, c)
      })
      .collect()
  }

  async fn replace(&self, id: Uuid, draft: MemberDraft) -> Result<Option<FamilyMember>> {
    let id_str      = encode_uuid(id);
    let name        = draft.name;
    let gender      = draft.gender.as_str();
    let birth_date  = draft.birth_date.map(encode_date);
    let death_date  = draft.death_date.map(encode_date);
    let description = draft.description;
    let photo_url   = draft.photo_url;
    let father_id   = draft.father_id.map(encode_uuid);
    let mother_id   = draft.mother_id.map(encode_uuid);
    let position_x  = draft.node_position.map(|p| p.x);
    let position_y  = draft.node_position.map(|p| p.y);
    let at_str      = encode_dt(now());
    let spouses     = encode_ids(&draft.spouse_ids);
    let children    = draft.children_ids.as_ref().map(encode_ids);

    let updated = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE members SET
             name = ?2, gender = ?3, birth_date = ?4, death_date = ?5,
             description = ?6, photo_url = ?7, father_id = ?8, mother_id = ?9,
             position_x = COALESCE(?10, position_x),
             position_y = COALESCE(?11, position_y),
             updated_at = ?12
           WHERE member_id = ?1",
          rusqlite::params![
            id_str,
            name,
            gender,
            birth_date,
            death_date,
            description,
            photo_url,
            father_id,
            mother_id,
            position_x,
            position_y,
            at_str,
          ],
        )?;
        if changed == 0 {
          return Ok(false);
        }
        tx.execute(
          "DELETE FROM member_spouses WHERE member_id = ?1",
          rusqlite::params![id_str],
        )?;
        write_set(&tx, RelationSet::Spouses, &id_str, &spouses)?;
        if let Some(children) = &children {
          tx.execute(
            "DELETE FROM member_children WHERE member_id = ?1",
            rusqlite::params![id_str],
          )?;
          write_set(&tx, RelationSet::Children, &id_str, children)?;
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !updated {
      return Ok(None);
    }
    self.find_by_id(id).await
  }

  async fn add_to_set(&self, field: RelationSet, targets: Vec<Uuid>, value: Uuid) -> Result<()> {
    let (table, column) = set_table(field);
    let value_str = encode_uuid(value);
    let targets: Vec<String> = targets.into_iter().map(encode_uuid).collect();
    let at_str = encode_dt(now());

    let added = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut added = 0;
        {
          // Selecting from `members` skips targets that do not exist.
          let mut insert = tx.prepare(&format!(
            "INSERT OR IGNORE INTO {table} (member_id, {column})
             SELECT member_id, ?2 FROM members WHERE member_id = ?1"
          ))?;
          for target in &targets {
            if insert.execute(rusqlite::params![target, value_str])? > 0 {
              touch(&tx, target, &at_str)?;
              added += 1;
            }
          }
        }
        tx.commit()?;
        Ok(added)
      })
      .await?;

    debug!(field = field.field_name(), %value, added, "add_to_set");
    Ok(())
  }

  async fn pull(&self, field: RelationSet, targets: Vec<Uuid>, value: Uuid) -> Result<()> {
    let (table, column) = set_table(field);
    let value_str = encode_uuid(value);
    let targets: Vec<String> = targets.into_iter().map(encode_uuid).collect();
    let at_str = encode_dt(now());

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut removed = 0;
        {
          let mut delete = tx.prepare(&format!(
            "DELETE FROM {table} WHERE member_id = ?1 AND {column} = ?2"
          ))?;
          for target in &targets {
            if delete.execute(rusqlite::params![target, value_str])? > 0 {
              touch(&tx, target, &at_str)?;
              removed += 1;
            }
          }
        }
        tx.commit()?;
        Ok(removed)
      })
      .await?;

    debug!(field = field.field_name(), %value, removed, "pull");
    Ok(())
  }

  async fn purge(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(now());

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists = tx
          .query_row(
            "SELECT 1 FROM members WHERE member_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(false);
        }

        // 1. and 2.: parent links.
        tx.execute(
          "UPDATE members SET father_id = NULL, updated_at = ?2 WHERE father_id = ?1",
          rusqlite::params![id_str, at_str],
        )?;
        tx.execute(
          "UPDATE members SET mother_id = NULL, updated_at = ?2 WHERE mother_id = ?1",
          rusqlite::params![id_str, at_str],
        )?;

        // 3. and 4.: set memberships held by other members.
        for field in [RelationSet::Spouses, RelationSet::Children] {
          let (table, column) = set_table(field);
          tx.execute(
            &format!(
              "UPDATE members SET updated_at = ?2
               WHERE member_id IN (SELECT member_id FROM {table} WHERE {column} = ?1)"
            ),
            rusqlite::params![id_str, at_str],
          )?;
          tx.execute(
            &format!("DELETE FROM {table} WHERE {column} = ?1"),
            rusqlite::params![id_str],
          )?;
        }

        // 5.: the record and its own set rows.
        tx.execute(
          "DELETE FROM member_spouses WHERE member_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM member_children WHERE member_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM members WHERE member_id = ?1",
          rusqlite::params![id_str],
        )?;

        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(deleted)
  }
}
