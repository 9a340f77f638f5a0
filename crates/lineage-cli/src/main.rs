//! `lineage`: command-line client for the Lineage family tree.
//!
//! # Usage
//!
//! ```text
//! lineage --url http://localhost:8080 list
//! lineage --config ~/.config/lineage/config.toml add --name "Ada Byron" --gender female
//! lineage --user ed@example.com --password secret edit <ID> --spouse <ID>
//! ```

mod client;
mod output;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, MemberPayload};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "lineage", about = "Command-line client for the Lineage family tree")]
struct Args {
  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the lineage server (default: http://localhost:8080).
  #[arg(long, env = "LINEAGE_URL")]
  url: Option<String>,

  /// Editor email used for HTTP Basic authentication.
  #[arg(long, env = "LINEAGE_USER")]
  user: Option<String>,

  /// Editor password (plaintext).
  #[arg(long, env = "LINEAGE_PASSWORD")]
  password: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List every member, newest first.
  List,
  /// Show one member with its relations resolved to names.
  Show { id: Uuid },
  /// Create a member. `--name` and `--gender` are required.
  Add(Fields),
  /// Change a member. Unspecified fields keep their current value.
  Edit {
    id: Uuid,
    #[command(flatten)]
    fields: Fields,
  },
  /// Delete a member and every reference to it.
  Rm { id: Uuid },
  /// Print every parent and spouse link.
  Tree,
}

/// Member attributes settable from the command line.
#[derive(clap::Args, Debug, Default)]
struct Fields {
  #[arg(long)]
  name: Option<String>,

  /// `male` or `female`.
  #[arg(long)]
  gender: Option<String>,

  /// Birth date, `YYYY-MM-DD`. An empty value clears it.
  #[arg(long, value_name = "DATE")]
  born: Option<String>,

  /// Death date, `YYYY-MM-DD`. An empty value clears it.
  #[arg(long, value_name = "DATE")]
  died: Option<String>,

  #[arg(long)]
  description: Option<String>,

  #[arg(long, value_name = "URL")]
  photo_url: Option<String>,

  /// Father's id, or `none` to clear.
  #[arg(long, value_name = "ID")]
  father: Option<String>,

  /// Mother's id, or `none` to clear.
  #[arg(long, value_name = "ID")]
  mother: Option<String>,

  /// Add a spouse. Repeatable.
  #[arg(long = "spouse", value_name = "ID")]
  spouses: Vec<Uuid>,

  /// Remove a spouse. Repeatable.
  #[arg(long = "remove-spouse", value_name = "ID")]
  remove_spouses: Vec<Uuid>,
}

/// Parse a parent argument: `none` (or empty) clears, anything else must be
/// an id.
fn parent_arg(raw: &str) -> Result<Option<Uuid>> {
  let raw = raw.trim();
  if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
    return Ok(None);
  }
  Uuid::parse_str(raw)
    .map(Some)
    .with_context(|| format!("{raw:?} is not a member id"))
}

fn non_empty(raw: String) -> Option<String> { (!raw.trim().is_empty()).then_some(raw) }

impl Fields {
  /// Overlay the given fields onto `payload`.
  fn apply(self, payload: &mut MemberPayload) -> Result<()> {
    if let Some(name) = self.name {
      payload.name = name;
    }
    if let Some(gender) = self.gender {
      payload.gender = gender;
    }
    if let Some(born) = self.born {
      payload.birth_date = non_empty(born);
    }
    if let Some(died) = self.died {
      payload.death_date = non_empty(died);
    }
    if let Some(description) = self.description {
      payload.description = non_empty(description);
    }
    if let Some(url) = self.photo_url {
      payload.photo_url = non_empty(url);
    }
    if let Some(father) = self.father {
      payload.father_id = parent_arg(&father)?;
    }
    if let Some(mother) = self.mother {
      payload.mother_id = parent_arg(&mother)?;
    }
    payload.spouse_ids.retain(|id| !self.remove_spouses.contains(id));
    for id in self.spouses {
      if !payload.spouse_ids.contains(&id) {
        payload.spouse_ids.push(id);
      }
    }
    Ok(())
  }

  /// Payload for a new member.
  fn into_new_payload(self) -> Result<MemberPayload> {
    if self.name.is_none() {
      bail!("--name is required");
    }
    if self.gender.is_none() {
      bail!("--gender is required");
    }
    let mut payload = MemberPayload::default();
    self.apply(&mut payload)?;
    Ok(payload)
  }
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
}

/// CLI flags override the config file, which overrides defaults.
fn resolve_config(args: &Args, file_cfg: ConfigFile) -> ApiConfig {
  let pick = |flag: &Option<String>, file: String| {
    flag.clone().or_else(|| (!file.is_empty()).then_some(file))
  };
  ApiConfig {
    base_url: pick(&args.url, file_cfg.url).unwrap_or_else(|| "http://localhost:8080".to_string()),
    username: pick(&args.user, file_cfg.username).unwrap_or_default(),
    password: pick(&args.password, file_cfg.password).unwrap_or_default(),
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let api_config = resolve_config(&args, file_cfg);
  tracing::debug!(url = %api_config.base_url, "using server");
  let client = ApiClient::new(api_config)?;

  match args.command {
    Command::List => {
      for m in client.list_members().await? {
        println!("{}", output::member_line(&m));
      }
    }
    Command::Show { id } => {
      let member = client.get_member(id).await?;
      let all = client.list_members().await?;
      println!("{}", output::member_detail(&member, &output::name_index(&all)));
    }
    Command::Add(fields) => {
      let payload = fields.into_new_payload()?;
      let member = client.create_member(&payload).await?;
      tracing::info!(id = %member.id, "member created");
      println!("{}", output::member_line(&member));
    }
    Command::Edit { id, fields } => {
      let current = client.get_member(id).await?;
      let mut payload = MemberPayload::from_member(&current);
      fields.apply(&mut payload)?;
      let member = client.update_member(id, &payload).await?;
      tracing::info!(id = %member.id, "member updated");
      println!("{}", output::member_line(&member));
    }
    Command::Rm { id } => {
      let message = client.delete_member(id).await?;
      println!("{message}");
    }
    Command::Tree => {
      let graph = client.tree().await?;
      println!("{}", output::tree_text(&graph));
    }
  }

  Ok(())
}
