//! Reply texts, keyboards and record formatting.
//!
//! Everything the user reads is produced here. The transport only turns a
//! [`Reply`] into Bot API calls.

use chrono::{DateTime, TimeZone};
use estekhare_core::NewRecord;

use crate::conversation::Action;

/// Telegram rejects messages longer than this many characters.
pub const MESSAGE_LIMIT: usize = 4096;

// ─── Texts ───────────────────────────────────────────────────────────────────

pub mod text {
  pub const CONTINUE_BUTTON: &str = "ادامه";
  pub const SEARCH_BUTTON: &str = "جستجو";
  pub const HISTORY_BUTTON: &str = "تاریخچه";
  pub const INTENT_BUTTON: &str = "نیت";
  pub const CANCEL_BUTTON: &str = "لغو";
  pub const BACK_BUTTON: &str = "بازگشت به منوی اصلی";

  pub const INTENT_PROMPT: &str = "لطفاً نیت خود را بنویسید:";
  pub const IN_PROGRESS: &str = "در حال انجام استخاره... لطفاً منتظر بمانید";
  pub const EMPTY_CORPUS: &str = "خطا: دیتابیس خالی است!";
  pub const STORAGE_FAILURE: &str = "خطا در دسترسی به دیتابیس. لطفاً دوباره امتحان کنید.";
  pub const PAGE_PROMPT: &str = "لطفاً شماره صفحه‌ای که می‌خواهید را بنویسید:";
  pub const INVALID_PAGE: &str = "لطفاً یک شماره صفحه معتبر بنویسید:";
  pub const HISTORY: &str = "تاریخچه استخاره‌های شما در پیام‌های قبلی با تگ #استخاره ذخیره شده‌اند. لطفاً پیام‌های چت را بررسی کنید.";
  pub const CANCELLED: &str = "عملیات لغو شد.";
  pub const WELCOME: &str = "به منوی اصلی خوش آمدید:";

  /// Tag every reading starts with; searching the chat for it is the history.
  pub const READING_TAG: &str = "#استخاره";
}

// ─── Replies ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
  pub label:  &'static str,
  pub action: Action,
}

/// Inline keyboard: rows of buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyboard(pub Vec<Vec<Button>>);

impl Keyboard {
  fn single(label: &'static str, action: Action) -> Self {
    Self(vec![vec![Button { label, action }]])
  }

  pub fn main_menu() -> Self {
    Self(vec![
      vec![Button { label: text::CONTINUE_BUTTON, action: Action::Continue }],
      vec![Button { label: text::SEARCH_BUTTON, action: Action::Search }],
      vec![Button { label: text::HISTORY_BUTTON, action: Action::History }],
    ])
  }

  pub fn intent() -> Self { Self::single(text::INTENT_BUTTON, Action::Intent) }

  pub fn cancel() -> Self { Self::single(text::CANCEL_BUTTON, Action::Cancel) }

  pub fn back_to_menu() -> Self { Self::single(text::BACK_BUTTON, Action::MainMenu) }
}

/// One outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
  pub text:     String,
  pub keyboard: Option<Keyboard>,
}

impl Reply {
  pub fn text(text: impl Into<String>) -> Self {
    Self { text: text.into(), keyboard: None }
  }

  pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
    Self { text: text.into(), keyboard: Some(keyboard) }
  }

  /// The message split to fit [`MESSAGE_LIMIT`], without blank parts; only
  /// the last part carries the keyboard.
  ///
  /// Blank text still yields one empty part holding the keyboard.
  pub fn chunks(&self) -> Vec<(&str, Option<&Keyboard>)> {
    let mut parts: Vec<&str> = split_message(&self.text, MESSAGE_LIMIT)
      .into_iter()
      .filter(|part| !part.trim().is_empty())
      .collect();
    if parts.is_empty() {
      parts.push("");
    }
    let last = parts.len().saturating_sub(1);
    parts
      .into_iter()
      .enumerate()
      .map(|(i, part)| (part, if i == last { self.keyboard.as_ref() } else { None }))
      .collect()
  }
}

/// Split `text` into pieces of at most `limit` characters.
///
/// Empty text yields one empty piece so a keyboard still has a carrier.
pub fn split_message(text: &str, limit: usize) -> Vec<&str> {
  let mut parts = Vec::new();
  let mut rest = text;
  while rest.chars().count() > limit {
    let cut = rest
      .char_indices()
      .nth(limit)
      .map(|(i, _)| i)
      .unwrap_or(rest.len());
    let (head, tail) = rest.split_at(cut);
    parts.push(head);
    rest = tail;
  }
  parts.push(rest);
  parts
}

// ─── Records ─────────────────────────────────────────────────────────────────

fn record_body(r: &NewRecord) -> String {
  format!(
    "شماره صفحه: {}\nنام سوره: {}\nشماره آیه: {}\nمتن آیه:\n{}\nترجمه:\n{}\nنتیجه استخاره: {}",
    r.page_number, r.surah_name, r.verse_number, r.verse_text, r.translation, r.istikhara_result,
  )
}

/// A reading: the drawn record, headed by the tag, the intent and the time.
pub fn reading<Tz>(intent: &str, at: &DateTime<Tz>, record: &NewRecord) -> String
where
  Tz: TimeZone,
  Tz::Offset: std::fmt::Display,
{
  format!(
    "{}\nنیت: {intent}\nزمان: {}\n{}",
    text::READING_TAG,
    at.format("%Y-%m-%d %H:%M:%S"),
    record_body(record),
  )
}

/// Every record found for a page, each followed by a separator line.
pub fn page_results<'a>(records: impl IntoIterator<Item = &'a NewRecord>) -> String {
  let separator = "-".repeat(50);
  records
    .into_iter()
    .map(|r| format!("{}\n{separator}\n", record_body(r)))
    .collect()
}

pub fn page_not_found(page: &str) -> String {
  format!("هیچ رکوردی برای شماره صفحه {page} یافت نشد!")
}

#[cfg(test)]
mod tests {
  use chrono::{FixedOffset, TimeZone as _};

  use super::*;

  fn sample() -> NewRecord {
    NewRecord {
      page_number:      "5".into(),
      surah_name:       "بقره".into(),
      verse_number:     "255".into(),
      verse_text:       "اللَّهُ لَا إِلَٰهَ إِلَّا هُوَ".into(),
      translation:      "خداست كه معبودى جز او نيست".into(),
      istikhara_result: "خوب است".into(),
    }
  }

  #[test]
  fn reading_layout() {
    let at = FixedOffset::east_opt(3 * 3600 + 1800)
      .unwrap()
      .with_ymd_and_hms(2024, 3, 20, 9, 5, 7)
      .unwrap();
    let text = reading("سفر", &at, &sample());
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "#استخاره");
    assert_eq!(lines[1], "نیت: سفر");
    assert_eq!(lines[2], "زمان: 2024-03-20 09:05:07");
    assert_eq!(lines[3], "شماره صفحه: 5");
    assert_eq!(lines[6], "متن آیه:");
    assert_eq!(lines[7], "اللَّهُ لَا إِلَٰهَ إِلَّا هُوَ");
    assert_eq!(lines.last().copied(), Some("نتیجه استخاره: خوب است"));
  }

  #[test]
  fn page_results_are_separated() {
    let a = sample();
    let b = NewRecord { surah_name: "آل عمران".into(), ..sample() };
    let text = page_results([&a, &b]);
    assert_eq!(text.matches(&"-".repeat(50)).count(), 2);
    assert!(text.ends_with(&format!("{}\n", "-".repeat(50))));
    assert!(text.contains("نام سوره: آل عمران"));
  }

  #[test]
  fn split_respects_char_boundaries() {
    let text = "ب".repeat(10);
    let parts = split_message(&text, 4);
    assert_eq!(parts, ["بببب", "بببب", "بب"]);
    assert_eq!(split_message("", 4), [""]);
    assert_eq!(split_message("abcd", 4), ["abcd"]);
  }

  #[test]
  fn keyboard_rides_on_last_chunk() {
    let reply = Reply::with_keyboard("x".repeat(MESSAGE_LIMIT * 2 + 1), Keyboard::main_menu());
    let chunks = reply.chunks();
    assert_eq!(chunks.len(), 3);
    assert!(chunks[0].1.is_none());
    assert!(chunks[1].1.is_none());
    assert_eq!(chunks[2].0, "x");
    assert_eq!(chunks[2].1, Some(&Keyboard::main_menu()));
  }

  #[test]
  fn blank_tail_does_not_swallow_the_keyboard() {
    let body = format!("{}\n", "x".repeat(MESSAGE_LIMIT));
    let reply = Reply::with_keyboard(body, Keyboard::back_to_menu());
    let chunks = reply.chunks();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].0.chars().count(), MESSAGE_LIMIT);
    assert_eq!(chunks[0].1, Some(&Keyboard::back_to_menu()));

    let empty = Reply::with_keyboard("  ", Keyboard::main_menu());
    assert_eq!(empty.chunks(), [("", Some(&Keyboard::main_menu()))]);
  }
}
