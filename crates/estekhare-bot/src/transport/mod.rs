//! Moving updates between Telegram and the [`Controller`].
//!
//! Both transports decode an [`Update`] into an [`Incoming`], run it through
//! the controller and deliver the replies with a [`Messenger`].

pub mod polling;
pub mod webhook;

use std::future::Future;

use estekhare_core::CorpusStore;

use crate::{
  conversation::{Action, Controller, Input},
  error::Result,
  render::{Keyboard, Reply},
  session::SessionKey,
  telegram::{
    BotApi,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, Update},
  },
};

// ─── Messenger ───────────────────────────────────────────────────────────────

/// Outgoing side of a transport.
pub trait Messenger: Send + Sync + 'static {
  /// Deliver `reply` to `chat_id`, split into as many messages as needed.
  fn send(&self, chat_id: i64, reply: &Reply) -> impl Future<Output = Result<()>> + Send;

  /// Answer a callback query so the client stops showing a spinner.
  fn acknowledge(&self, callback_id: &str) -> impl Future<Output = Result<()>> + Send;
}

impl From<&Keyboard> for InlineKeyboardMarkup {
  fn from(keyboard: &Keyboard) -> Self {
    let inline_keyboard = keyboard
      .0
      .iter()
      .map(|row| {
        row
          .iter()
          .map(|b| InlineKeyboardButton {
            text:          b.label.to_string(),
            callback_data: b.action.as_ref().to_string(),
          })
          .collect()
      })
      .collect();
    Self { inline_keyboard }
  }
}

impl Messenger for BotApi {
  async fn send(&self, chat_id: i64, reply: &Reply) -> Result<()> {
    for (text, keyboard) in reply.chunks() {
      // Telegram rejects empty messages.
      if text.trim().is_empty() {
        continue;
      }
      self.send_message(chat_id, text, keyboard.map(Into::into)).await?;
    }
    Ok(())
  }

  async fn acknowledge(&self, callback_id: &str) -> Result<()> {
    self.answer_callback_query(callback_id).await
  }
}

// ─── Decoding ────────────────────────────────────────────────────────────────

/// An update reduced to what the controller needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incoming {
  pub key:         SessionKey,
  /// `None` for updates that are acknowledged but otherwise ignored.
  pub input:       Option<Input>,
  /// Set for callback queries, which must be answered.
  pub callback_id: Option<String>,
}

/// Decode `update`. Updates of kinds the bot does not handle yield `None`.
pub fn incoming(update: &Update) -> Option<Incoming> {
  if let Some(message) = &update.message {
    let text = message.text.as_deref()?;
    let chat_id = message.chat.id;
    let user_id = message.from.as_ref().map_or(chat_id, |u| u.id);
    return Some(Incoming {
      key:         SessionKey { chat_id, user_id },
      input:       text_input(text),
      callback_id: None,
    });
  }

  let query = update.callback_query.as_ref()?;
  let user_id = query.from.id;
  let chat_id = query.message.as_ref().map_or(user_id, |m| m.chat.id);
  let input = match query.data.as_deref().map(str::parse::<Action>) {
    Some(Ok(action)) => Some(Input::Action(action)),
    other => {
      tracing::debug!(data = ?query.data, ok = other.is_some(), "unknown callback data");
      None
    }
  };
  Some(Incoming {
    key: SessionKey { chat_id, user_id },
    input,
    callback_id: Some(query.id.clone()),
  })
}

/// `/start` (optionally addressed as `/start@bot`) or free text. Other
/// commands are dropped.
fn text_input(text: &str) -> Option<Input> {
  let Some(command) = text.strip_prefix('/') else {
    return Some(Input::Text(text.to_string()));
  };
  let name = command.split_whitespace().next().unwrap_or_default();
  let name = name.split_once('@').map_or(name, |(name, _)| name);
  (name == "start").then_some(Input::Start)
}

// ─── Dispatch ────────────────────────────────────────────────────────────────

/// Run one update through the controller and send every reply, in order.
///
/// Delivery failures are logged; the remaining replies are still attempted.
pub async fn process_update<S, M>(controller: &Controller<S>, messenger: &M, update: &Update)
where
  S: CorpusStore,
  M: Messenger,
{
  let Some(incoming) = incoming(update) else {
    tracing::debug!(update_id = update.update_id, "ignoring update");
    return;
  };
  tracing::debug!(update_id = update.update_id, key = ?incoming.key, input = ?incoming.input, "update");

  if let Some(id) = &incoming.callback_id
    && let Err(e) = messenger.acknowledge(id).await
  {
    tracing::warn!(error = %e, "failed to answer callback query");
  }

  let Some(input) = incoming.input else { return };
  let replies = controller.handle(incoming.key, input).await;
  for reply in &replies {
    if let Err(e) = messenger.send(incoming.key.chat_id, reply).await {
      tracing::warn!(error = %e, chat_id = incoming.key.chat_id, "failed to send reply");
    }
  }
}
