//! Record types: the unit of storage in the istikhara corpus.
//!
//! A record is one page of the source document: the verse drawn for a reading
//! and the judgment attached to it. Records are never updated once stored.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

// ─── Fields ──────────────────────────────────────────────────────────────────

/// Names one of the six text fields of a record.
///
/// The string form is the SQLite column name.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
  PageNumber,
  SurahName,
  VerseNumber,
  VerseText,
  Translation,
  IstikharaResult,
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A record parsed from the source document but not yet stored.
///
/// Every field is free text and defaults to the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
  /// Digits taken from the page marker line, verbatim.
  pub page_number:      String,
  pub surah_name:       String,
  /// Digits taken from the verse number line, verbatim.
  pub verse_number:     String,
  /// Possibly assembled from several wrapped lines, joined by single spaces.
  pub verse_text:       String,
  pub translation:      String,
  /// The reading's conclusion, e.g. a favorable or unfavorable judgment.
  pub istikhara_result: String,
}

impl NewRecord {
  pub fn get(&self, field: Field) -> &str {
    match field {
      Field::PageNumber => &self.page_number,
      Field::SurahName => &self.surah_name,
      Field::VerseNumber => &self.verse_number,
      Field::VerseText => &self.verse_text,
      Field::Translation => &self.translation,
      Field::IstikharaResult => &self.istikhara_result,
    }
  }

  pub fn get_mut(&mut self, field: Field) -> &mut String {
    match field {
      Field::PageNumber => &mut self.page_number,
      Field::SurahName => &mut self.surah_name,
      Field::VerseNumber => &mut self.verse_number,
      Field::VerseText => &mut self.verse_text,
      Field::Translation => &mut self.translation,
      Field::IstikharaResult => &mut self.istikhara_result,
    }
  }
}

/// A record as stored in the corpus.
///
/// `id` is a storage identity only. It orders insertion but is never shown to
/// users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
  pub id:     i64,
  #[serde(flatten)]
  pub record: NewRecord,
}

impl std::ops::Deref for Record {
  type Target = NewRecord;

  fn deref(&self) -> &NewRecord { &self.record }
}
