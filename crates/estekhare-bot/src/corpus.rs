//! One-time corpus loading: document → sections → records → store.

use std::path::PathBuf;

use estekhare_core::{CorpusStore, IngestOutcome};

use crate::documents::read_for_ingest;

/// What [`Corpus::ensure_loaded`] found or did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
  /// The store was empty; this many records were ingested.
  Loaded(usize),
  /// The store already held this many rows.
  AlreadyPopulated(usize),
  /// The document was missing, unreadable or empty; the store is still empty.
  SourceEmpty,
}

impl From<IngestOutcome> for LoadOutcome {
  fn from(outcome: IngestOutcome) -> Self {
    match outcome {
      IngestOutcome::Inserted(n) => LoadOutcome::Loaded(n),
      IngestOutcome::AlreadyPopulated(n) => LoadOutcome::AlreadyPopulated(n),
    }
  }
}

/// A corpus store together with the document it is populated from.
#[derive(Clone)]
pub struct Corpus<S> {
  store:  S,
  source: PathBuf,
}

impl<S: CorpusStore> Corpus<S> {
  pub fn new(store: S, source: impl Into<PathBuf>) -> Self {
    Self { store, source: source.into() }
  }

  pub fn store(&self) -> &S { &self.store }

  /// Populate the store from the source document if it is empty.
  ///
  /// A populated store is left alone even when the document has changed since;
  /// remove the database file to re-ingest. An unreadable document inserts
  /// nothing, and loading is attempted again on the next call.
  pub async fn ensure_loaded(&self) -> Result<LoadOutcome, S::Error> {
    let existing = self.store.count().await?;
    if existing > 0 {
      tracing::debug!(rows = existing, "corpus already populated");
      return Ok(LoadOutcome::AlreadyPopulated(existing));
    }

    let lines = read_for_ingest(&self.source).await;
    if lines.is_empty() {
      tracing::warn!(path = %self.source.display(), "no lines read from corpus document");
      return Ok(LoadOutcome::SourceEmpty);
    }

    let parsed = estekhare_corpus::parse_corpus(&lines);
    for (n, section) in parsed.sections.iter().enumerate() {
      if !section.is_complete() {
        let issues: Vec<String> = section.issues.iter().map(ToString::to_string).collect();
        let issues = issues.join(", ");
        tracing::warn!(
          section = n,
          page = %section.record.page_number,
          issues = %issues,
          "partial record"
        );
      }
    }

    let partial = parsed.partial_count();
    let outcome = self.store.ingest_if_empty(parsed.into_records()).await?;
    match outcome {
      IngestOutcome::Inserted(n) => {
        tracing::info!(
          records = n,
          partial,
          path = %self.source.display(),
          "corpus populated"
        );
      }
      IngestOutcome::AlreadyPopulated(n) => {
        tracing::info!(rows = n, "corpus populated concurrently; nothing inserted");
      }
    }
    Ok(outcome.into())
  }
}
