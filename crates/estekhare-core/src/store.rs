//! The `CorpusStore` trait and its supporting types.
//!
//! The trait is implemented by storage backends (e.g.
//! `estekhare-store-sqlite`). The bot depends on this abstraction, not on a
//! concrete backend.

use std::future::Future;

use crate::record::{NewRecord, Record};

// ─── Ingestion outcome ───────────────────────────────────────────────────────

/// What [`CorpusStore::ingest_if_empty`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
  /// The table was empty; this many records were inserted.
  Inserted(usize),
  /// The table already held this many rows; nothing was written.
  AlreadyPopulated(usize),
}

impl IngestOutcome {
  pub fn inserted(self) -> usize {
    match self {
      IngestOutcome::Inserted(n) => n,
      IngestOutcome::AlreadyPopulated(_) => 0,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a corpus store backend.
///
/// The store is append-only and populated at most once: the only write is
/// [`ingest_if_empty`](CorpusStore::ingest_if_empty), which is a no-op on a
/// non-empty table. A changed source document therefore does not refresh an
/// already populated store.
pub trait CorpusStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create the backing table if it does not exist. Safe to call repeatedly.
  fn ensure_schema(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Number of stored records.
  fn count(&self) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Insert `records` in order if and only if the store is currently empty.
  ///
  /// The emptiness check and the inserts happen atomically, so two racing
  /// callers never insert the corpus twice.
  fn ingest_if_empty(
    &self,
    records: Vec<NewRecord>,
  ) -> impl Future<Output = Result<IngestOutcome, Self::Error>> + Send + '_;

  /// Pick one record uniformly at random. `None` means the corpus is empty.
  fn pick_random(&self) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send + '_;

  /// All records whose page number equals `page` exactly, in insertion order.
  ///
  /// Matching is plain string equality: `"7"` does not match a stored `"07"`.
  fn find_by_page<'a>(
    &'a self,
    page: &'a str,
  ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send + 'a;
}
