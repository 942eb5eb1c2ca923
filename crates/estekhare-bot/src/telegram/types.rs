//! Bot API payloads. Only the fields the bot reads are modelled; unknown
//! fields are ignored on deserialisation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
  pub update_id:      i64,
  pub message:        Option<Message>,
  pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
  pub message_id: i64,
  pub chat:       Chat,
  pub from:       Option<User>,
  pub text:       Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
  pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
  pub id:         i64,
  #[serde(default)]
  pub first_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
  pub id:      String,
  pub from:    User,
  /// Absent when the originating message is too old.
  pub message: Option<Message>,
  pub data:    Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardMarkup {
  pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardButton {
  pub text:          String,
  pub callback_data: String,
}

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
  pub ok:          bool,
  pub result:      Option<T>,
  pub description: Option<String>,
  pub error_code:  Option<i64>,
}

// ─── Requests ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct GetUpdates<'a> {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub offset:          Option<i64>,
  pub timeout:         u64,
  pub allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
  pub chat_id:      i64,
  pub text:         &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
pub struct AnswerCallbackQuery<'a> {
  pub callback_query_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SetWebhook<'a> {
  pub url:             &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub secret_token:    Option<&'a str>,
  pub allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
pub struct DeleteWebhook {
  pub drop_pending_updates: bool,
}
