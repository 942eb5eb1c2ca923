//! estekhare-bot binary.
//!
//! Reads `config.toml` (or the path given with `--config`), loads the corpus
//! into SQLite on first run and serves the bot over long polling or a webhook.
//!
//! ```sh
//! TOKEN=123:abc estekhare-bot --data-dir ./data
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context as _;
use clap::Parser;
use estekhare_bot::{
  BotConfig, Controller, Corpus, Documents, LoadOutcome, Overrides, TransportKind,
  telegram::BotApi,
  transport::{polling, webhook},
};
use estekhare_store_sqlite::SqliteCorpus;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Istikhara Telegram bot")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Telegram bot token.
  #[arg(long, env = "TOKEN", hide_env_values = true)]
  token: Option<String>,

  /// Directory holding the documents and the database.
  #[arg(long)]
  data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let cfg = BotConfig::load(&cli.config, Overrides { token: cli.token, data_dir: cli.data_dir })
    .with_context(|| format!("failed to load configuration ({})", cli.config.display()))?;
  tracing::debug!(?cfg, "configuration loaded");

  // Open the store and populate it on first run.
  let db_path = cfg.database_path();
  let store = SqliteCorpus::open(&db_path)
    .await
    .with_context(|| format!("failed to open database at {db_path:?}"))?;
  let corpus = Corpus::new(store, cfg.corpus_path());
  match corpus.ensure_loaded().await {
    Ok(LoadOutcome::Loaded(0) | LoadOutcome::SourceEmpty) => tracing::warn!(
      path = %cfg.corpus_path().display(),
      "no records loaded; readings stay unavailable until /start finds the document"
    ),
    Ok(outcome) => tracing::info!(?outcome, "corpus ready"),
    Err(e) => tracing::warn!(error = %e, "corpus loading failed; retrying on /start"),
  }

  let controller = Arc::new(Controller::new(corpus, Documents::from_config(&cfg)));
  let api = Arc::new(
    BotApi::new(&cfg.api_url, &cfg.token, Duration::from_secs(cfg.poll_timeout_secs))
      .context("failed to build HTTP client")?,
  );

  match cfg.transport {
    TransportKind::Polling => {
      tracing::info!("transport: long polling");
      api
        .delete_webhook()
        .await
        .context("failed to remove the registered webhook")?;
      polling::run(api, controller, cfg.poll_timeout_secs, shutdown_signal()).await;
    }
    TransportKind::Webhook => {
      let hook = &cfg.webhook;
      match &hook.public_url {
        Some(public) => {
          let url = format!("{}{}", public.trim_end_matches('/'), hook.path);
          api
            .set_webhook(&url, hook.secret_token.as_deref())
            .await
            .context("failed to register the webhook")?;
          tracing::info!(%url, "webhook registered");
        }
        None => tracing::warn!("webhook.public_url is not set; assuming it is registered already"),
      }

      let state = webhook::WebhookState {
        controller,
        messenger: api,
        secret: hook.secret_token.as_deref().map(Arc::from),
      };
      let app = webhook::router(&hook.path, state);
      let address = format!("{}:{}", hook.host, hook.port);

      tracing::info!("transport: webhook on http://{address}{}", hook.path);
      let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

      axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    }
  }

  Ok(())
}

/// Resolves on Ctrl-C.
async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::warn!(error = %e, "cannot listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}
