//! Error type for `estekhare-docx`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("file not found: {}", .0.display())]
  NotFound(PathBuf),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("zip error: {0}")]
  Zip(#[from] zip::result::ZipError),

  #[error("xml error: {0}")]
  Xml(#[from] quick_xml::Error),

  /// The archive is a zip file but lacks the main document part.
  #[error("missing document part: {0}")]
  MissingPart(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
