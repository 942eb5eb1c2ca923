//! The conversation state machine.
//!
//! ```text
//!   Idle ──intent──▶ AwaitingIntent ──text──▶ Idle   (reading sent)
//!   Idle ──search──▶ AwaitingPage   ──digits─▶ Idle  (page results sent)
//!   Awaiting* ──cancel──▶ Idle
//! ```
//!
//! `continue`, `history`, `main_menu` and `/start` answer without changing the
//! state. Free text outside the awaiting states is ignored.

use chrono::{DateTime, Local};
use estekhare_core::CorpusStore;
use strum::{AsRefStr, Display, EnumString};

use crate::{
  corpus::Corpus,
  documents::{Documents, read_for_display},
  render::{self, Keyboard, Reply, text},
  session::{SessionKey, SessionState, Sessions},
};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Inline button actions; the string form is the callback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
  Continue,
  Search,
  History,
  Intent,
  Cancel,
  MainMenu,
}

/// Something a user did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
  /// The `/start` command.
  Start,
  /// An inline button press.
  Action(Action),
  /// A free-text message that is not a command.
  Text(String),
}

// ─── Controller ──────────────────────────────────────────────────────────────

/// Drives every user's conversation against one corpus.
pub struct Controller<S> {
  corpus:    Corpus<S>,
  documents: Documents,
  sessions:  Sessions,
}

impl<S: CorpusStore> Controller<S> {
  pub fn new(corpus: Corpus<S>, documents: Documents) -> Self {
    Self { corpus, documents, sessions: Sessions::new() }
  }

  pub fn sessions(&self) -> &Sessions { &self.sessions }

  /// Handle one input for `key` and return the replies to send, in order.
  pub async fn handle(&self, key: SessionKey, input: Input) -> Vec<Reply> {
    self.handle_at(key, input, Local::now()).await
  }

  /// [`handle`](Self::handle) with an explicit clock reading.
  pub async fn handle_at(
    &self,
    key: SessionKey,
    input: Input,
    now: DateTime<Local>,
  ) -> Vec<Reply> {
    let slot = self.sessions.slot(key);
    let replies = {
      let mut state = slot.lock().await;
      let prev = *state;
      let (next, replies) = self.step(prev, input, now).await;
      if next != prev {
        tracing::debug!(?key, from = ?prev, to = ?next, "session transition");
      }
      *state = next;
      replies
    };
    drop(slot);
    self.sessions.release(key);
    replies
  }

  async fn step(
    &self,
    state: SessionState,
    input: Input,
    now: DateTime<Local>,
  ) -> (SessionState, Vec<Reply>) {
    use SessionState::*;

    match (state, input) {
      (s, Input::Start) => (s, vec![self.start().await]),

      (s, Input::Action(Action::Continue)) => {
        let body = read_for_display(&self.documents.continuation).await;
        (s, vec![Reply::with_keyboard(body, Keyboard::intent())])
      }
      (s, Input::Action(Action::History)) => {
        (s, vec![Reply::with_keyboard(text::HISTORY, Keyboard::main_menu())])
      }
      (s, Input::Action(Action::MainMenu)) => {
        (s, vec![Reply::with_keyboard(text::WELCOME, Keyboard::main_menu())])
      }

      (_, Input::Action(Action::Intent)) => {
        let body = read_for_display(&self.documents.intent).await;
        let prompt = format!("{body}\n\n{}", text::INTENT_PROMPT);
        (AwaitingIntent, vec![Reply::with_keyboard(prompt, Keyboard::cancel())])
      }
      (_, Input::Action(Action::Search)) => {
        (AwaitingPage, vec![Reply::with_keyboard(text::PAGE_PROMPT, Keyboard::cancel())])
      }

      (Idle, Input::Action(Action::Cancel)) => (Idle, Vec::new()),
      (_, Input::Action(Action::Cancel)) => {
        (Idle, vec![Reply::with_keyboard(text::CANCELLED, Keyboard::main_menu())])
      }

      (Idle, Input::Text(_)) => (Idle, Vec::new()),
      (AwaitingIntent, Input::Text(t)) => self.read_intent(&t, now).await,
      (AwaitingPage, Input::Text(t)) => self.search_page(&t).await,
    }
  }

  async fn start(&self) -> Reply {
    // Retried here so a corpus document added after startup still loads.
    if let Err(e) = self.corpus.ensure_loaded().await {
      tracing::warn!(error = %e, "corpus loading failed");
    }
    let body = read_for_display(&self.documents.description).await;
    Reply::with_keyboard(body, Keyboard::main_menu())
  }

  async fn read_intent(&self, input: &str, now: DateTime<Local>) -> (SessionState, Vec<Reply>) {
    let intent = input.trim();
    if intent.is_empty() {
      return (SessionState::AwaitingIntent, vec![Reply::text(text::INTENT_PROMPT)]);
    }

    let mut replies = vec![Reply::text(text::IN_PROGRESS)];
    match self.corpus.store().pick_random().await {
      Ok(Some(record)) => replies.push(Reply::with_keyboard(
        render::reading(intent, &now, &record),
        Keyboard::back_to_menu(),
      )),
      Ok(None) => {
        tracing::warn!("reading requested but the corpus is empty");
        replies.push(Reply::with_keyboard(text::EMPTY_CORPUS, Keyboard::main_menu()));
      }
      Err(e) => {
        tracing::warn!(error = %e, "random pick failed");
        replies.push(Reply::with_keyboard(text::STORAGE_FAILURE, Keyboard::main_menu()));
      }
    }
    (SessionState::Idle, replies)
  }

  async fn search_page(&self, input: &str) -> (SessionState, Vec<Reply>) {
    let page = input.trim();
    if page.is_empty() || !page.chars().all(estekhare_corpus::is_decimal_digit) {
      return (SessionState::AwaitingPage, vec![Reply::text(text::INVALID_PAGE)]);
    }

    let reply = match self.corpus.store().find_by_page(page).await {
      Ok(records) if records.is_empty() => {
        Reply::with_keyboard(render::page_not_found(page), Keyboard::main_menu())
      }
      Ok(records) => Reply::with_keyboard(
        render::page_results(records.iter().map(|r| &r.record)),
        Keyboard::back_to_menu(),
      ),
      Err(e) => {
        tracing::warn!(error = %e, page, "page lookup failed");
        Reply::with_keyboard(text::STORAGE_FAILURE, Keyboard::main_menu())
      }
    };
    (SessionState::Idle, vec![reply])
  }
}

#[cfg(test)]
mod tests {
  use std::{path::Path, str::FromStr as _};

  use estekhare_core::{IngestOutcome, NewRecord, Record};
  use estekhare_store_sqlite::SqliteCorpus;
  use tempfile::TempDir;

  use super::*;

  const ALICE: SessionKey = SessionKey { chat_id: 10, user_id: 10 };
  const BOB: SessionKey = SessionKey { chat_id: 20, user_id: 20 };

  const CORPUS: &str = "شماره صفحه: 5\nنام سوره: بقره\nشماره آیه: 2\nمتن آیه: ذَٰلِكَ الْكِتَابُ\n\
                        ترجمه (فولادوند): اين است كتابى\nنتیجه استخاره شما: خوب است\n\
                        شماره صفحه: 9\nنام سوره: یس\nنتیجه استخاره شما: میانه\n";

  fn documents(dir: &Path) -> Documents {
    std::fs::write(dir.join("description.txt"), "about the bot").unwrap();
    std::fs::write(dir.join("continue.txt"), "how it works").unwrap();
    std::fs::write(dir.join("intent.txt"), "make your intent").unwrap();
    Documents {
      description:  dir.join("description.txt"),
      continuation: dir.join("continue.txt"),
      intent:       dir.join("intent.txt"),
    }
  }

  async fn controller(corpus_text: Option<&str>) -> (Controller<SqliteCorpus>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("input.txt");
    if let Some(text) = corpus_text {
      std::fs::write(&source, text).unwrap();
    }
    let corpus = Corpus::new(SqliteCorpus::open_in_memory().await.unwrap(), source);
    corpus.ensure_loaded().await.unwrap();
    (Controller::new(corpus, documents(dir.path())), dir)
  }

  fn action(a: Action) -> Input { Input::Action(a) }

  fn text_input(t: &str) -> Input { Input::Text(t.to_string()) }

  #[test]
  fn callback_data_round_trips() {
    for (data, a) in [
      ("continue", Action::Continue),
      ("search", Action::Search),
      ("history", Action::History),
      ("intent", Action::Intent),
      ("cancel", Action::Cancel),
      ("main_menu", Action::MainMenu),
    ] {
      assert_eq!(Action::from_str(data).unwrap(), a);
      assert_eq!(a.as_ref(), data);
    }
    assert!(Action::from_str("unknown").is_err());
  }

  #[tokio::test]
  async fn start_shows_description_with_main_menu() {
    let (c, _dir) = controller(Some(CORPUS)).await;
    let replies = c.handle(ALICE, Input::Start).await;
    assert_eq!(replies, [Reply::with_keyboard("about the bot", Keyboard::main_menu())]);
    assert_eq!(c.sessions().state(ALICE).await, SessionState::Idle);
  }

  #[tokio::test]
  async fn start_loads_a_corpus_added_after_startup() {
    let (c, dir) = controller(None).await;
    assert_eq!(c.corpus.store().count().await.unwrap(), 0);

    std::fs::write(dir.path().join("input.txt"), CORPUS).unwrap();
    c.handle(ALICE, Input::Start).await;
    assert_eq!(c.corpus.store().count().await.unwrap(), 2);
  }

  #[tokio::test]
  async fn continue_offers_intent_button() {
    let (c, _dir) = controller(Some(CORPUS)).await;
    let replies = c.handle(ALICE, action(Action::Continue)).await;
    assert_eq!(replies, [Reply::with_keyboard("how it works", Keyboard::intent())]);
  }

  #[tokio::test]
  async fn intent_flow_draws_a_reading() {
    let (c, _dir) = controller(Some(CORPUS)).await;

    let prompt = c.handle(ALICE, action(Action::Intent)).await;
    assert_eq!(prompt.len(), 1);
    assert!(prompt[0].text.starts_with("make your intent\n\n"));
    assert!(prompt[0].text.ends_with(text::INTENT_PROMPT));
    assert_eq!(prompt[0].keyboard, Some(Keyboard::cancel()));
    assert_eq!(c.sessions().state(ALICE).await, SessionState::AwaitingIntent);

    let replies = c.handle(ALICE, text_input("  سفر به مشهد  ")).await;
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0], Reply::text(text::IN_PROGRESS));
    let reading = &replies[1];
    assert!(reading.text.starts_with("#استخاره\nنیت: سفر به مشهد\nزمان: "));
    assert!(
      reading.text.contains("شماره صفحه: 5\n") || reading.text.contains("شماره صفحه: 9\n")
    );
    assert_eq!(reading.keyboard, Some(Keyboard::back_to_menu()));
    assert_eq!(c.sessions().state(ALICE).await, SessionState::Idle);
  }

  #[tokio::test]
  async fn blank_intent_reprompts() {
    let (c, _dir) = controller(Some(CORPUS)).await;
    c.handle(ALICE, action(Action::Intent)).await;

    let replies = c.handle(ALICE, text_input("   ")).await;
    assert_eq!(replies, [Reply::text(text::INTENT_PROMPT)]);
    assert_eq!(c.sessions().state(ALICE).await, SessionState::AwaitingIntent);
  }

  #[tokio::test]
  async fn empty_corpus_ends_the_reading() {
    let (c, _dir) = controller(None).await;
    c.handle(ALICE, action(Action::Intent)).await;

    let replies = c.handle(ALICE, text_input("anything")).await;
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[1].text, text::EMPTY_CORPUS);
    assert_eq!(c.sessions().state(ALICE).await, SessionState::Idle);
  }

  #[tokio::test]
  async fn page_search_finds_records() {
    let (c, _dir) = controller(Some(CORPUS)).await;

    let prompt = c.handle(ALICE, action(Action::Search)).await;
    assert_eq!(prompt, [Reply::with_keyboard(text::PAGE_PROMPT, Keyboard::cancel())]);
    assert_eq!(c.sessions().state(ALICE).await, SessionState::AwaitingPage);

    let replies = c.handle(ALICE, text_input(" 5 ")).await;
    assert_eq!(replies.len(), 1);
    assert!(replies[0].text.contains("نام سوره: بقره"));
    assert!(replies[0].text.contains("متن آیه:\nذَٰلِكَ الْكِتَابُ"));
    assert!(!replies[0].text.contains("یس"));
    assert_eq!(replies[0].keyboard, Some(Keyboard::back_to_menu()));
    assert_eq!(c.sessions().state(ALICE).await, SessionState::Idle);
  }

  #[tokio::test]
  async fn invalid_page_keeps_awaiting_page() {
    let (c, _dir) = controller(Some(CORPUS)).await;
    c.handle(ALICE, action(Action::Search)).await;

    for bad in ["abc", "12a", "", "-5", "1 2"] {
      let replies = c.handle(ALICE, text_input(bad)).await;
      assert_eq!(replies, [Reply::text(text::INVALID_PAGE)], "input {bad:?}");
      assert_eq!(c.sessions().state(ALICE).await, SessionState::AwaitingPage);
    }

    let replies = c.handle(ALICE, text_input("9")).await;
    assert!(replies[0].text.contains("نام سوره: یس"));
    assert_eq!(c.sessions().state(ALICE).await, SessionState::Idle);
  }

  #[tokio::test]
  async fn unknown_page_returns_to_menu() {
    let (c, _dir) = controller(Some(CORPUS)).await;
    c.handle(ALICE, action(Action::Search)).await;

    let replies = c.handle(ALICE, text_input("77")).await;
    assert_eq!(
      replies,
      [Reply::with_keyboard(render::page_not_found("77"), Keyboard::main_menu())]
    );
    assert_eq!(c.sessions().state(ALICE).await, SessionState::Idle);
  }

  #[tokio::test]
  async fn persian_digits_are_looked_up_verbatim() {
    let (c, _dir) = controller(Some(CORPUS)).await;
    c.handle(ALICE, action(Action::Search)).await;

    // Accepted as digits, but stored pages use ASCII digits.
    let replies = c.handle(ALICE, text_input("۵")).await;
    assert_eq!(replies[0].text, render::page_not_found("۵"));
    assert_eq!(c.sessions().state(ALICE).await, SessionState::Idle);
  }

  #[tokio::test]
  async fn cancel_from_either_awaiting_state() {
    let (c, _dir) = controller(Some(CORPUS)).await;

    for entry in [Action::Intent, Action::Search] {
      c.handle(ALICE, action(entry)).await;
      let replies = c.handle(ALICE, action(Action::Cancel)).await;
      assert_eq!(replies, [Reply::with_keyboard(text::CANCELLED, Keyboard::main_menu())]);
      assert_eq!(c.sessions().state(ALICE).await, SessionState::Idle);
    }

    assert!(c.handle(ALICE, action(Action::Cancel)).await.is_empty());
  }

  #[tokio::test]
  async fn text_while_idle_is_ignored() {
    let (c, _dir) = controller(Some(CORPUS)).await;
    assert!(c.handle(ALICE, text_input("5")).await.is_empty());
    assert_eq!(c.sessions().state(ALICE).await, SessionState::Idle);
  }

  #[tokio::test]
  async fn menu_actions_keep_the_state() {
    let (c, _dir) = controller(Some(CORPUS)).await;
    c.handle(ALICE, action(Action::Search)).await;

    let history = c.handle(ALICE, action(Action::History)).await;
    assert_eq!(history, [Reply::with_keyboard(text::HISTORY, Keyboard::main_menu())]);
    let menu = c.handle(ALICE, action(Action::MainMenu)).await;
    assert_eq!(menu, [Reply::with_keyboard(text::WELCOME, Keyboard::main_menu())]);
    assert_eq!(c.sessions().state(ALICE).await, SessionState::AwaitingPage);
  }

  #[tokio::test]
  async fn entry_action_switches_awaiting_state() {
    let (c, _dir) = controller(Some(CORPUS)).await;
    c.handle(ALICE, action(Action::Intent)).await;
    c.handle(ALICE, action(Action::Search)).await;
    assert_eq!(c.sessions().state(ALICE).await, SessionState::AwaitingPage);
  }

  #[tokio::test]
  async fn users_have_independent_sessions() {
    let (c, _dir) = controller(Some(CORPUS)).await;

    c.handle(ALICE, action(Action::Search)).await;
    c.handle(BOB, action(Action::Intent)).await;

    let (a, b) = tokio::join!(
      c.handle(ALICE, text_input("5")),
      c.handle(BOB, text_input("نیت")),
    );
    assert!(a[0].text.contains("نام سوره: بقره"));
    assert_eq!(b[0], Reply::text(text::IN_PROGRESS));
    assert_eq!(c.sessions().state(ALICE).await, SessionState::Idle);
    assert_eq!(c.sessions().state(BOB).await, SessionState::Idle);
  }

  #[tokio::test]
  async fn finished_conversations_leave_no_session_behind() {
    let (c, _dir) = controller(Some(CORPUS)).await;

    c.handle(ALICE, action(Action::Intent)).await;
    assert_eq!(c.sessions().len(), 1);
    c.handle(ALICE, text_input("سفر")).await;
    assert!(c.sessions().is_empty());

    c.handle(BOB, action(Action::Search)).await;
    c.handle(BOB, action(Action::Cancel)).await;
    assert!(c.sessions().is_empty());

    for id in 0..500 {
      let stranger = SessionKey { chat_id: 1_000 + id, user_id: 1_000 + id };
      assert!(c.handle(stranger, text_input("hello")).await.is_empty());
    }
    assert!(c.sessions().is_empty());
  }

  #[tokio::test]
  async fn missing_documents_are_reported_in_band() {
    let (c, dir) = controller(Some(CORPUS)).await;
    std::fs::remove_file(dir.path().join("continue.txt")).unwrap();

    let replies = c.handle(ALICE, action(Action::Continue)).await;
    assert!(replies[0].text.starts_with("خطا: فایل "));
    assert_eq!(replies[0].keyboard, Some(Keyboard::intent()));
  }

  // ── Storage failures ────────────────────────────────────────────────────────

  struct BrokenStore;

  fn broken() -> std::io::Error { std::io::Error::other("disk on fire") }

  impl CorpusStore for BrokenStore {
    type Error = std::io::Error;

    async fn ensure_schema(&self) -> Result<(), Self::Error> { Err(broken()) }

    async fn count(&self) -> Result<usize, Self::Error> { Err(broken()) }

    async fn ingest_if_empty(&self, _: Vec<NewRecord>) -> Result<IngestOutcome, Self::Error> {
      Err(broken())
    }

    async fn pick_random(&self) -> Result<Option<Record>, Self::Error> { Err(broken()) }

    async fn find_by_page(&self, _: &str) -> Result<Vec<Record>, Self::Error> { Err(broken()) }
  }

  #[tokio::test]
  async fn storage_failures_end_the_conversation() {
    let dir = tempfile::tempdir().unwrap();
    let c = Controller::new(
      Corpus::new(BrokenStore, dir.path().join("input.txt")),
      documents(dir.path()),
    );

    // Loading fails quietly; the description is still shown.
    let start = c.handle(ALICE, Input::Start).await;
    assert_eq!(start[0].text, "about the bot");

    c.handle(ALICE, action(Action::Intent)).await;
    let replies = c.handle(ALICE, text_input("x")).await;
    assert_eq!(replies[1].text, text::STORAGE_FAILURE);
    assert_eq!(c.sessions().state(ALICE).await, SessionState::Idle);

    c.handle(ALICE, action(Action::Search)).await;
    let replies = c.handle(ALICE, text_input("5")).await;
    assert_eq!(replies[0].text, text::STORAGE_FAILURE);
    assert_eq!(c.sessions().state(ALICE).await, SessionState::Idle);
  }
}
