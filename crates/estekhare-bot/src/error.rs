//! Error type for `estekhare-bot`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// No bot token was configured. Fatal at startup.
  #[error("bot token is not set (use --token, TOKEN or `token` in the config file)")]
  MissingToken,

  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The Bot API answered with `ok: false`.
  #[error("telegram api error {code}: {description}")]
  Api { code: i64, description: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
