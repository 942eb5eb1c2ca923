//! Runtime configuration.
//!
//! Layered with the `config` crate: TOML file (optional), then environment
//! variables prefixed `ESTEKHARE_` (nested keys use `__`, e.g.
//! `ESTEKHARE_WEBHOOK__PORT`), then command-line overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

// ─── Types ───────────────────────────────────────────────────────────────────

/// How updates reach the bot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
  /// Long polling with `getUpdates`.
  #[default]
  Polling,
  /// Telegram pushes updates to an HTTP endpoint served by the bot.
  Webhook,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
  #[serde(default = "default_webhook_host")]
  pub host:         String,
  #[serde(default = "default_webhook_port")]
  pub port:         u16,
  #[serde(default = "default_webhook_path")]
  pub path:         String,
  /// Public base URL Telegram should call, e.g. `https://bot.example.com`.
  /// When unset the webhook is assumed to be registered already.
  pub public_url:   Option<String>,
  /// Compared against the `X-Telegram-Bot-Api-Secret-Token` header.
  pub secret_token: Option<String>,
}

impl Default for WebhookConfig {
  fn default() -> Self {
    Self {
      host:         default_webhook_host(),
      port:         default_webhook_port(),
      path:         default_webhook_path(),
      public_url:   None,
      secret_token: None,
    }
  }
}

/// Bot configuration, deserialised from the layered sources.
#[derive(Clone, Deserialize)]
pub struct BotConfig {
  #[serde(default)]
  pub token:                String,
  #[serde(default = "default_data_dir")]
  pub data_dir:             PathBuf,
  #[serde(default = "default_corpus_document")]
  pub corpus_document:      PathBuf,
  #[serde(default = "default_database")]
  pub database:             PathBuf,
  #[serde(default = "default_description_document")]
  pub description_document: PathBuf,
  #[serde(default = "default_continue_document")]
  pub continue_document:    PathBuf,
  #[serde(default = "default_intent_document")]
  pub intent_document:      PathBuf,
  #[serde(default = "default_api_url")]
  pub api_url:              String,
  #[serde(default)]
  pub transport:            TransportKind,
  #[serde(default = "default_poll_timeout_secs")]
  pub poll_timeout_secs:    u64,
  #[serde(default)]
  pub webhook:              WebhookConfig,
}

// The token must never end up in logs.
impl std::fmt::Debug for BotConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("BotConfig")
      .field("token", &if self.token.is_empty() { "<unset>" } else { "<set>" })
      .field("data_dir", &self.data_dir)
      .field("database", &self.database)
      .field("corpus_document", &self.corpus_document)
      .field("transport", &self.transport)
      .finish_non_exhaustive()
  }
}

fn default_data_dir() -> PathBuf { PathBuf::from("data") }
fn default_corpus_document() -> PathBuf { PathBuf::from("input.docx") }
fn default_database() -> PathBuf { PathBuf::from("quran_istikhara.db") }
fn default_description_document() -> PathBuf { PathBuf::from("discription.docx") }
fn default_continue_document() -> PathBuf { PathBuf::from("edameh.docx") }
fn default_intent_document() -> PathBuf { PathBuf::from("niyat.docx") }
fn default_api_url() -> String { "https://api.telegram.org".to_string() }
fn default_poll_timeout_secs() -> u64 { 30 }
fn default_webhook_host() -> String { "0.0.0.0".to_string() }
fn default_webhook_port() -> u16 { 8443 }
fn default_webhook_path() -> String { "/telegram".to_string() }

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Default)]
pub struct Overrides {
  pub token:    Option<String>,
  pub data_dir: Option<PathBuf>,
}

impl BotConfig {
  /// Build the configuration from `file` (optional), the environment and
  /// `overrides`, then validate it.
  pub fn load(file: &Path, overrides: Overrides) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(
        config::Environment::with_prefix("ESTEKHARE")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .set_override_option("token", overrides.token)?
      .set_override_option(
        "data_dir",
        overrides
          .data_dir
          .map(|p| p.to_string_lossy().into_owned()),
      )?
      .build()?;

    let mut cfg: BotConfig = settings.try_deserialize()?;
    cfg.data_dir = expand_tilde(&cfg.data_dir);
    cfg.validate()?;
    Ok(cfg)
  }

  /// Fail fast on configuration the bot cannot start with.
  pub fn validate(&self) -> Result<()> {
    if self.token.trim().is_empty() {
      return Err(Error::MissingToken);
    }
    Ok(())
  }

  /// Resolve a configured file name against `data_dir`. Absolute paths are
  /// kept as they are.
  pub fn resolve(&self, file: &Path) -> PathBuf { self.data_dir.join(file) }

  pub fn database_path(&self) -> PathBuf { self.resolve(&self.database) }

  pub fn corpus_path(&self) -> PathBuf { self.resolve(&self.corpus_document) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
