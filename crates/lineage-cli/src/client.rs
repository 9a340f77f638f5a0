//! Async HTTP client wrapping the lineage JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use lineage_core::{graph::FamilyGraph, member::FamilyMember};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Connection settings for the lineage API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// Create/update request body. `None` fields are left out of the JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPayload {
  pub name:         String,
  pub gender:       String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub birth_date:   Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub death_date:   Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description:  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub photo_url:    Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub father_id:    Option<Uuid>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub mother_id:    Option<Uuid>,
  pub spouse_ids:   Vec<Uuid>,
  /// Left out so the server keeps the children on record.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub children_ids: Option<Vec<Uuid>>,
}

impl MemberPayload {
  /// Payload that reproduces `member` unchanged. The node position and
  /// children are not sent, so the server keeps the stored ones.
  pub fn from_member(member: &FamilyMember) -> Self {
    Self {
      name:         member.name.clone(),
      gender:       member.gender.as_str().to_string(),
      birth_date:   member.birth_date.map(|d| d.to_string()),
      death_date:   member.death_date.map(|d| d.to_string()),
      description:  member.description.clone(),
      photo_url:    member.photo_url.clone(),
      father_id:    member.father_id,
      mother_id:    member.mother_id,
      spouse_ids:   member.spouse_ids.iter().copied().collect(),
      children_ids: None,
    }
  }
}

#[derive(Deserialize)]
struct MemberEnvelope {
  member: FamilyMember,
}

#[derive(Deserialize)]
struct MemberList {
  members: Vec<FamilyMember>,
}

#[derive(Deserialize)]
struct Message {
  message: String,
}

/// Async HTTP client for the lineage JSON REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  /// Turn a non-2xx response into an error carrying the server's message.
  async fn check(resp: Response, what: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let detail = resp
      .json::<Message>()
      .await
      .map(|m| m.message)
      .unwrap_or_default();
    if detail.is_empty() {
      Err(anyhow!("{what} → {status}"))
    } else {
      Err(anyhow!("{what} → {status}: {detail}"))
    }
  }

  // ── Members ───────────────────────────────────────────────────────────────

  /// `GET /api/family-members`
  pub async fn list_members(&self) -> Result<Vec<FamilyMember>> {
    let resp = self
      .auth(self.client.get(self.url("/family-members")))
      .send()
      .await
      .context("GET /family-members failed")?;
    let resp = Self::check(resp, "GET /family-members").await?;
    let list: MemberList = resp.json().await.context("deserialising members")?;
    Ok(list.members)
  }

  /// `GET /api/family-members/{id}`
  pub async fn get_member(&self, id: Uuid) -> Result<FamilyMember> {
    let path = format!("/family-members/{id}");
    let resp = self
      .auth(self.client.get(self.url(&path)))
      .send()
      .await
      .with_context(|| format!("GET {path} failed"))?;
    let resp = Self::check(resp, &format!("GET {path}")).await?;
    let env: MemberEnvelope = resp.json().await.context("deserialising member")?;
    Ok(env.member)
  }

  /// `POST /api/family-members`
  pub async fn create_member(&self, payload: &MemberPayload) -> Result<FamilyMember> {
    let resp = self
      .auth(self.client.post(self.url("/family-members")))
      .json(payload)
      .send()
      .await
      .context("POST /family-members failed")?;
    let resp = Self::check(resp, "POST /family-members").await?;
    let env: MemberEnvelope = resp.json().await.context("deserialising member")?;
    Ok(env.member)
  }

  /// `PUT /api/family-members/{id}`
  pub async fn update_member(&self, id: Uuid, payload: &MemberPayload) -> Result<FamilyMember> {
    let path = format!("/family-members/{id}");
    let resp = self
      .auth(self.client.put(self.url(&path)))
      .json(payload)
      .send()
      .await
      .with_context(|| format!("PUT {path} failed"))?;
    let resp = Self::check(resp, &format!("PUT {path}")).await?;
    let env: MemberEnvelope = resp.json().await.context("deserialising member")?;
    Ok(env.member)
  }

  /// `DELETE /api/family-members/{id}`
  pub async fn delete_member(&self, id: Uuid) -> Result<String> {
    let path = format!("/family-members/{id}");
    let resp = self
      .auth(self.client.delete(self.url(&path)))
      .send()
      .await
      .with_context(|| format!("DELETE {path} failed"))?;
    let resp = Self::check(resp, &format!("DELETE {path}")).await?;
    let msg: Message = resp.json().await.context("deserialising response")?;
    Ok(msg.message)
  }

  // ── Tree ──────────────────────────────────────────────────────────────────

  /// `GET /api/tree`
  pub async fn tree(&self) -> Result<FamilyGraph> {
    let resp = self
      .auth(self.client.get(self.url("/tree")))
      .send()
      .await
      .context("GET /tree failed")?;
    let resp = Self::check(resp, "GET /tree").await?;
    resp.json().await.context("deserialising tree")
  }
}
