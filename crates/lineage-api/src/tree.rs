//! `GET /tree`: the node/edge projection a diagram client draws.

use axum::{Json, extract::State};
use lineage_core::{graph::FamilyGraph, maintainer, store::MemberStore};

use crate::{ApiState, error::ApiError};

pub async fn handler<S>(State(state): State<ApiState<S>>) -> Result<Json<FamilyGraph>, ApiError>
where
  S: MemberStore + 'static,
{
  let members = maintainer::list(&*state.store).await?;
  Ok(Json(FamilyGraph::from_members(&members)))
}
