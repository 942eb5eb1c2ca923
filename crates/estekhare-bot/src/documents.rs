//! Adapters over the document reader.
//!
//! Ingestion treats an unreadable document as having no lines; display reads
//! turn the failure into a message shown in place of the content.

use std::path::{Path, PathBuf};

use crate::config::BotConfig;

/// Read `path` for ingestion. Any failure yields no lines.
pub async fn read_for_ingest(path: &Path) -> Vec<String> {
  match read(path).await {
    Ok(lines) => lines,
    Err(e) => {
      tracing::warn!(path = %path.display(), error = %e, "corpus document unreadable");
      Vec::new()
    }
  }
}

/// Read `path` for display, joining its paragraphs with newlines. Failures
/// become an in-band error message.
pub async fn read_for_display(path: &Path) -> String {
  match read(path).await {
    Ok(lines) => lines.join("\n"),
    Err(estekhare_docx::Error::NotFound(p)) => {
      tracing::warn!(path = %p.display(), "document not found");
      format!("خطا: فایل {} یافت نشد!", p.display())
    }
    Err(e) => {
      tracing::warn!(path = %path.display(), error = %e, "document unreadable");
      format!("خطا در خواندن فایل ورد: {e}")
    }
  }
}

async fn read(path: &Path) -> estekhare_docx::Result<Vec<String>> {
  let owned = path.to_path_buf();
  match tokio::task::spawn_blocking(move || estekhare_docx::read_paragraphs(owned)).await {
    Ok(result) => result,
    Err(join) => Err(estekhare_docx::Error::Io(std::io::Error::other(join))),
  }
}

/// The informational documents shown along the conversation.
#[derive(Debug, Clone)]
pub struct Documents {
  /// Shown on `/start`.
  pub description:  PathBuf,
  /// Shown on "continue".
  pub continuation: PathBuf,
  /// Shown before asking for the intent.
  pub intent:       PathBuf,
}

impl Documents {
  pub fn from_config(cfg: &BotConfig) -> Self {
    Self {
      description:  cfg.resolve(&cfg.description_document),
      continuation: cfg.resolve(&cfg.continue_document),
      intent:       cfg.resolve(&cfg.intent_document),
    }
  }
}
