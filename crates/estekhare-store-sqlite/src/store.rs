//! [`SqliteCorpus`]: the SQLite implementation of [`CorpusStore`].

use std::path::Path;

use rand::Rng as _;
use rand_core::{OsRng, RngCore};
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use estekhare_core::{CorpusStore, IngestOutcome, NewRecord, Record};

use crate::{Result, schema::SCHEMA};

const SELECT_RECORD: &str = "SELECT id, page_number, surah_name, verse_number,
                                    verse_text, translation, istikhara_result
                             FROM istikhara";

fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Record> {
  Ok(Record {
    id:     row.get(0)?,
    record: NewRecord {
      page_number:      row.get(1)?,
      surah_name:       row.get(2)?,
      verse_number:     row.get(3)?,
      verse_text:       row.get(4)?,
      translation:      row.get(5)?,
      istikhara_result: row.get(6)?,
    },
  })
}

fn count_rows(conn: &rusqlite::Connection) -> rusqlite::Result<usize> {
  let n: i64 = conn.query_row("SELECT COUNT(*) FROM istikhara", [], |r| r.get(0))?;
  Ok(n as usize)
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An istikhara corpus backed by a single SQLite file.
///
/// This is the storage session handed to ingestion and to the bot. Each
/// operation holds the connection only for the duration of one `call`.
/// Cloning is cheap: the inner connection handle is shared.
#[derive(Clone)]
pub struct SqliteCorpus {
  conn: tokio_rusqlite::Connection,
}

impl SqliteCorpus {
  /// Open (or create) a store at `path` and ensure the schema exists.
  ///
  /// The parent directory is created if missing.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      tokio::fs::create_dir_all(parent).await?;
    }

    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.ensure_schema().await?;
    tracing::debug!(path = %path.display(), "opened corpus store");
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.ensure_schema().await?;
    Ok(store)
  }

  /// Like [`CorpusStore::pick_random`], drawing the index from `rng`.
  pub async fn pick_random_with<R>(&self, mut rng: R) -> Result<Option<Record>>
  where
    R: RngCore + Send + 'static,
  {
    let record = self
      .conn
      .call(move |conn| {
        // One read transaction so the count and the offset see the same rows.
        let tx = conn.transaction()?;
        let count = count_rows(&tx)?;
        if count == 0 {
          return Ok(None);
        }

        let offset = rng.gen_range(0..count) as i64;
        let record = tx
          .query_row(
            &format!("{SELECT_RECORD} ORDER BY id LIMIT 1 OFFSET ?1"),
            rusqlite::params![offset],
            record_from_row,
          )
          .optional()?;
        tx.commit()?;
        Ok(record)
      })
      .await?;
    Ok(record)
  }
}

// ─── CorpusStore impl ────────────────────────────────────────────────────────

impl CorpusStore for SqliteCorpus {
  type Error = crate::Error;

  async fn ensure_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn count(&self) -> Result<usize> {
    Ok(self.conn.call(|conn| Ok(count_rows(conn)?)).await?)
  }

  async fn ingest_if_empty(&self, records: Vec<NewRecord>) -> Result<IngestOutcome> {
    let outcome = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock before counting, so a second writer
        // waits and then sees the rows inserted here.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = count_rows(&tx)?;
        if existing > 0 {
          return Ok(IngestOutcome::AlreadyPopulated(existing));
        }

        {
          let mut stmt = tx.prepare(
            "INSERT INTO istikhara (
               page_number, surah_name, verse_number,
               verse_text, translation, istikhara_result
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          )?;
          for r in &records {
            stmt.execute(rusqlite::params![
              r.page_number,
              r.surah_name,
              r.verse_number,
              r.verse_text,
              r.translation,
              r.istikhara_result,
            ])?;
          }
        }

        tx.commit()?;
        Ok(IngestOutcome::Inserted(records.len()))
      })
      .await?;

    tracing::debug!(?outcome, "ingest_if_empty");
    Ok(outcome)
  }

  async fn pick_random(&self) -> Result<Option<Record>> {
    self.pick_random_with(OsRng).await
  }

  async fn find_by_page(&self, page: &str) -> Result<Vec<Record>> {
    let page = page.to_owned();

    let records = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare(&format!("{SELECT_RECORD} WHERE page_number = ?1 ORDER BY id"))?;
        let rows = stmt
          .query_map(rusqlite::params![page], record_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(records)
  }
}
