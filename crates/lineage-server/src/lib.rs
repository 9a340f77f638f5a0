//! Lineage HTTP server: configuration loading, application assembly, and the
//! startup consistency audit.

use std::path::{Path, PathBuf};

use axum::Router;
use config::{Config, ConfigError, Environment, File};
use lineage_api::{AccessPolicy, ApiState, EditorAllowlist, UserCredentials, api_router};
use lineage_core::{graph::audit, maintainer, store::MemberStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` layered
/// with `LINEAGE_*` environment variables.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  /// Accounts that may authenticate.
  #[serde(default)]
  pub users:      Vec<UserCredentials>,
  /// Emails allowed to create, update and delete members.
  #[serde(default)]
  pub editors:    Vec<String>,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("lineage.db") }

impl ServerConfig {
  /// `host:port`, ready for binding.
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// Build the access policy this configuration describes.
  pub fn access_policy(&self) -> AccessPolicy {
    AccessPolicy::new(self.users.iter().cloned(), EditorAllowlist::new(&self.editors))
  }
}

/// Environment source for `LINEAGE_*` variables. `LINEAGE_EDITORS` takes a
/// comma-separated list.
pub fn environment() -> Environment {
  Environment::with_prefix("LINEAGE")
    .try_parsing(true)
    .list_separator(",")
    .with_list_parse_key("editors")
}

/// Read `path` (if it exists) and overlay the process environment.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
  build_config(File::from(path).required(false), environment())
}

fn build_config<F>(file: F, env: Environment) -> Result<ServerConfig, ConfigError>
where
  F: config::Source + Send + Sync + 'static,
{
  let mut cfg: ServerConfig = Config::builder()
    .add_source(file)
    .add_source(env)
    .build()?
    .try_deserialize()?;
  cfg.store_path = expand_tilde(&cfg.store_path);
  Ok(cfg)
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Application ──────────────────────────────────────────────────────────────

/// The full application: the API nested under `/api`, with request tracing.
pub fn app<S>(state: ApiState<S>) -> Router
where
  S: MemberStore + 'static,
{
  Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}

/// Log every relationship inconsistency currently in the store and return
/// how many were found.
pub async fn report_inconsistencies<S: MemberStore>(store: &S) -> lineage_core::Result<usize> {
  let members = maintainer::list(store).await?;
  let found = audit(&members);
  for issue in &found {
    tracing::warn!(%issue, "relationship inconsistency");
  }
  tracing::info!(members = members.len(), inconsistencies = found.len(), "store audit finished");
  Ok(found.len())
}
