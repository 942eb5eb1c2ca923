//! Document reader for the istikhara bot.
//!
//! Returns the non-empty, trimmed paragraphs of a source document in order.
//! `.docx` files are read as OOXML; anything else is read as UTF-8 text with
//! one paragraph per line.

pub mod error;
mod docx;

use std::{fs::File, io::BufReader, path::Path};

pub use docx::{paragraphs_from_docx, paragraphs_from_document_xml};
pub use error::{Error, Result};

/// Read the paragraphs of the document at `path`.
///
/// A missing file is reported as [`Error::NotFound`] so callers can tell it
/// apart from an unreadable one.
pub fn read_paragraphs(path: impl AsRef<Path>) -> Result<Vec<String>> {
  let path = path.as_ref();
  if !path.exists() {
    return Err(Error::NotFound(path.to_path_buf()));
  }

  let paragraphs = if is_docx(path) {
    paragraphs_from_docx(BufReader::new(File::open(path)?))?
  } else {
    paragraphs_from_text(&std::fs::read_to_string(path)?)
  };

  tracing::debug!(path = %path.display(), count = paragraphs.len(), "read document");
  Ok(paragraphs)
}

/// Split plain text into trimmed, non-empty lines.
pub fn paragraphs_from_text(text: &str) -> Vec<String> {
  text
    .lines()
    .map(str::trim)
    .filter(|l| !l.is_empty())
    .map(str::to_owned)
    .collect()
}

fn is_docx(path: &Path) -> bool {
  path
    .extension()
    .and_then(|e| e.to_str())
    .is_some_and(|e| e.eq_ignore_ascii_case("docx"))
}
