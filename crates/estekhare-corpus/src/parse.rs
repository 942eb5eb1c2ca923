//! Section parser: maps the lines of one section onto a [`NewRecord`].
//!
//! Pipeline per line:
//!   line
//!     └─ match_label()   → (Field, Extract) or continuation
//!          └─ extract     → field value, or appended verse text
//!
//! Parsing is best-effort. Nothing here fails; whatever could not be read is
//! reported as a [`ParseIssue`] next to the partially filled record.

use estekhare_core::{Field, NewRecord};
use strum::IntoEnumIterator as _;

// ─── Labels ──────────────────────────────────────────────────────────────────

/// Page marker: starts every record in the source document.
pub const PAGE_MARKER: &str = "شماره صفحه:";
pub const SURAH_NAME_LABEL: &str = "نام سوره:";
pub const VERSE_NUMBER_LABEL: &str = "شماره آیه:";
pub const VERSE_TEXT_LABEL: &str = "متن آیه:";
pub const TRANSLATION_LABEL: &str = "ترجمه (فولادوند):";
pub const RESULT_LABEL: &str = "نتیجه استخاره شما:";

#[derive(Clone, Copy)]
enum Extract {
  /// First run of decimal digits anywhere in the line.
  Digits,
  /// Everything after the first colon, trimmed.
  AfterColon,
}

/// Checked in order; the first matching prefix wins.
const LABELS: [(&str, Field, Extract); 6] = [
  (PAGE_MARKER, Field::PageNumber, Extract::Digits),
  (SURAH_NAME_LABEL, Field::SurahName, Extract::AfterColon),
  (VERSE_NUMBER_LABEL, Field::VerseNumber, Extract::Digits),
  (VERSE_TEXT_LABEL, Field::VerseText, Extract::AfterColon),
  (TRANSLATION_LABEL, Field::Translation, Extract::AfterColon),
  (RESULT_LABEL, Field::IstikharaResult, Extract::AfterColon),
];

fn match_label(line: &str) -> Option<(Field, Extract)> {
  LABELS
    .iter()
    .find(|(prefix, _, _)| line.starts_with(prefix))
    .map(|&(_, field, extract)| (field, extract))
}

// ─── Diagnostics ─────────────────────────────────────────────────────────────

/// Something the parser could not read in a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseIssue {
  /// A numeric label was present but its line held no digits.
  MissingNumber(Field),
  /// The section never set this field.
  MissingField(Field),
}

impl std::fmt::Display for ParseIssue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ParseIssue::MissingNumber(field) => write!(f, "no digits for {field}"),
      ParseIssue::MissingField(field) => write!(f, "missing {field}"),
    }
  }
}

/// The outcome of parsing one section: the record plus anything that was
/// missing from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSection {
  pub record: NewRecord,
  pub issues: Vec<ParseIssue>,
}

impl ParsedSection {
  pub fn is_complete(&self) -> bool { self.issues.is_empty() }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Decimal digits in the scripts the corpus may use: ASCII, Arabic-Indic and
/// Extended Arabic-Indic (Persian).
pub fn is_decimal_digit(c: char) -> bool {
  c.is_ascii_digit()
    || ('\u{0660}'..='\u{0669}').contains(&c)
    || ('\u{06F0}'..='\u{06F9}').contains(&c)
}

/// The first maximal run of decimal digits in `s`, verbatim.
fn first_digit_run(s: &str) -> Option<&str> {
  let start = s.find(is_decimal_digit)?;
  let rest = &s[start..];
  let len = rest.find(|c: char| !is_decimal_digit(c)).unwrap_or(rest.len());
  Some(&rest[..len])
}

fn after_colon(s: &str) -> &str {
  s.split_once(':').map(|(_, v)| v.trim()).unwrap_or_default()
}

// ─── Parser ──────────────────────────────────────────────────────────────────

/// Parse one section into a record.
///
/// Labeled lines set their field (a later duplicate label overwrites the
/// earlier value; `متن آیه:` also discards any accumulated continuation
/// text). Unlabeled lines are treated as wrapped verse text and appended to
/// `verse_text` with a single space.
pub fn parse_section<S: AsRef<str>>(section: &[S]) -> ParsedSection {
  let mut record = NewRecord::default();
  let mut issues = Vec::new();
  let mut seen: Vec<Field> = Vec::with_capacity(LABELS.len());

  for line in section {
    let line = line.as_ref();
    match match_label(line) {
      Some((field, Extract::Digits)) => {
        let digits = first_digit_run(line);
        if digits.is_none() {
          issues.push(ParseIssue::MissingNumber(field));
        }
        *record.get_mut(field) = digits.unwrap_or_default().to_owned();
        seen.push(field);
      }
      Some((field, Extract::AfterColon)) => {
        *record.get_mut(field) = after_colon(line).to_owned();
        seen.push(field);
      }
      None => {
        let text = line.trim();
        if !record.verse_text.is_empty() {
          record.verse_text.push(' ');
        }
        record.verse_text.push_str(text);
        seen.push(Field::VerseText);
      }
    }
  }

  issues.extend(
    Field::iter()
      .filter(|f| !seen.contains(f))
      .map(ParseIssue::MissingField),
  );

  ParsedSection { record, issues }
}
