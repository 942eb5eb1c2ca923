//! Codec from the istikhara source document to corpus records.
//!
//! Pure synchronous; no document-format or database dependencies. Callers
//! feed it the document's non-empty paragraphs in order.
//!
//! # Quick start
//!
//! ```
//! use estekhare_corpus::parse_corpus;
//!
//! let lines = ["شماره صفحه: 5", "نام سوره: بقره", "شماره صفحه: 9"];
//! let corpus = parse_corpus(&lines);
//! assert_eq!(corpus.sections.len(), 2);
//! assert_eq!(corpus.sections[0].record.page_number, "5");
//! ```

mod parse;
mod split;

use estekhare_core::NewRecord;

pub use parse::{
  PAGE_MARKER, ParseIssue, ParsedSection, RESULT_LABEL, SURAH_NAME_LABEL,
  TRANSLATION_LABEL, VERSE_NUMBER_LABEL, VERSE_TEXT_LABEL, is_decimal_digit,
  parse_section,
};
pub use split::split_sections;

/// Every section of a document, parsed.
#[derive(Debug, Clone, Default)]
pub struct ParsedCorpus {
  pub sections: Vec<ParsedSection>,
}

impl ParsedCorpus {
  /// Number of sections that parsed with at least one issue.
  pub fn partial_count(&self) -> usize {
    self.sections.iter().filter(|s| !s.is_complete()).count()
  }

  /// The records in document order, partial ones included.
  pub fn into_records(self) -> Vec<NewRecord> {
    self.sections.into_iter().map(|s| s.record).collect()
  }
}

/// Split `lines` into sections and parse each one.
///
/// A malformed section never aborts the rest; it shows up as a
/// [`ParsedSection`] with issues.
pub fn parse_corpus<S: AsRef<str>>(lines: &[S]) -> ParsedCorpus {
  ParsedCorpus {
    sections: split_sections(lines).into_iter().map(parse_section).collect(),
  }
}
