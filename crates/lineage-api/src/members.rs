//! Handlers for `/family-members` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/family-members` | Newest first |
//! | `GET`    | `/family-members/{id}` | 404 if not found |
//! | `POST`   | `/family-members` | Editor only, 201 |
//! | `PUT`    | `/family-members/{id}` | Editor only, full replacement |
//! | `DELETE` | `/family-members/{id}` | Editor only |

use axum::{
  Json,
  extract::{
    Path, State,
    rejection::{JsonRejection, PathRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use lineage_core::{
  maintainer,
  member::{
    FamilyMember, Gender, MemberDraft, NodePosition, optional_text, parse_date,
    parse_member_ref, parse_member_set, required_name,
  },
  store::MemberStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiState, access::Editor, error::ApiError};

// ─── Bodies ───────────────────────────────────────────────────────────────────

/// Request body for create and update. Every field is optional at the JSON
/// level so that missing fields are reported as validation errors rather
/// than deserialisation failures.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberBody {
  pub name:          Option<String>,
  pub gender:        Option<String>,
  pub birth_date:    Option<String>,
  pub death_date:    Option<String>,
  pub description:   Option<String>,
  pub photo_url:     Option<String>,
  pub father_id:     Option<String>,
  pub mother_id:     Option<String>,
  pub spouse_ids:    Option<Vec<String>>,
  pub children_ids:  Option<Vec<String>>,
  pub node_position: Option<NodePosition>,
}

impl TryFrom<MemberBody> for MemberDraft {
  type Error = lineage_core::Error;

  fn try_from(body: MemberBody) -> Result<Self, Self::Error> {
    let name = required_name(body.name.as_deref().unwrap_or_default())?;
    let gender = Gender::parse(body.gender.as_deref().unwrap_or_default())?;

    Ok(MemberDraft {
      name,
      gender,
      birth_date: parse_date("birthDate", body.birth_date.as_deref())?,
      death_date: parse_date("deathDate", body.death_date.as_deref())?,
      description: optional_text(body.description),
      photo_url: optional_text(body.photo_url),
      father_id: parse_member_ref("fatherId", body.father_id.as_deref())?,
      mother_id: parse_member_ref("motherId", body.mother_id.as_deref())?,
      spouse_ids: parse_member_set("spouseIds", body.spouse_ids.unwrap_or_default())?,
      children_ids: body
        .children_ids
        .map(|ids| parse_member_set("childrenIds", ids))
        .transpose()?,
      node_position: body.node_position,
    })
  }
}

#[derive(Debug, Serialize)]
pub struct MemberEnvelope {
  pub member: FamilyMember,
}

#[derive(Debug, Serialize)]
pub struct MemberList {
  pub members: Vec<FamilyMember>,
}

#[derive(Debug, Serialize)]
pub struct Message {
  pub message: &'static str,
}

fn parse_body(body: Result<Json<MemberBody>, JsonRejection>) -> Result<MemberDraft, ApiError> {
  let Json(body) = body?;
  Ok(MemberDraft::try_from(body)?)
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /family-members`
pub async fn list<S>(State(state): State<ApiState<S>>) -> Result<Json<MemberList>, ApiError>
where
  S: MemberStore + 'static,
{
  let members = maintainer::list(&*state.store).await?;
  Ok(Json(MemberList { members }))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /family-members/{id}`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MemberEnvelope>, ApiError>
where
  S: MemberStore + 'static,
{
  let Path(id) = id?;
  let member = maintainer::get(&*state.store, id).await?;
  Ok(Json(MemberEnvelope { member }))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /family-members`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Editor(email): Editor,
  body: Result<Json<MemberBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MemberStore + 'static,
{
  let draft = parse_body(body)?;
  let member = maintainer::create(&*state.store, draft, email).await?;
  Ok((StatusCode::CREATED, Json(MemberEnvelope { member })))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /family-members/{id}`: the body replaces the record. An omitted
/// `spouseIds` becomes empty; an omitted `childrenIds` or `nodePosition`
/// keeps the stored value.
pub async fn update<S>(
  State(state): State<ApiState<S>>,
  Editor(email): Editor,
  id: Result<Path<Uuid>, PathRejection>,
  body: Result<Json<MemberBody>, JsonRejection>,
) -> Result<Json<MemberEnvelope>, ApiError>
where
  S: MemberStore + 'static,
{
  let Path(id) = id?;
  let draft = parse_body(body)?;
  tracing::debug!(%id, editor = %email, "update requested");
  let member = maintainer::update(&*state.store, id, draft).await?;
  Ok(Json(MemberEnvelope { member }))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /family-members/{id}`
pub async fn delete<S>(
  State(state): State<ApiState<S>>,
  Editor(email): Editor,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Message>, ApiError>
where
  S: MemberStore + 'static,
{
  let Path(id) = id?;
  tracing::debug!(%id, editor = %email, "delete requested");
  maintainer::delete(&*state.store, id).await?;
  Ok(Json(Message { message: "Family member deleted successfully" }))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn body_without_name_is_a_validation_error() {
    let body = MemberBody { gender: Some("male".into()), ..Default::default() };
    assert!(matches!(
      MemberDraft::try_from(body),
      Err(lineage_core::Error::Validation(_))
    ));
  }

  #[test]
  fn body_blank_strings_mean_absent() {
    let body = MemberBody {
      name: Some(" Ada ".into()),
      gender: Some("Female".into()),
      birth_date: Some("".into()),
      father_id: Some("".into()),
      description: Some("   ".into()),
      ..Default::default()
    };
    let draft = MemberDraft::try_from(body).unwrap();
    assert_eq!(draft.name, "Ada");
    assert_eq!(draft.gender, Gender::Female);
    assert_eq!(draft.birth_date, None);
    assert_eq!(draft.father_id, None);
    assert_eq!(draft.description, None);
    assert!(draft.spouse_ids.is_empty());
    assert_eq!(draft.children_ids, None);
  }

  #[test]
  fn body_with_bad_spouse_id_is_rejected() {
    let body = MemberBody {
      name: Some("Ada".into()),
      gender: Some("female".into()),
      spouse_ids: Some(vec!["nope".into()]),
      ..Default::default()
    };
    assert!(MemberDraft::try_from(body).is_err());
  }
}
