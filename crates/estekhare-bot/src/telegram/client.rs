//! Async HTTP client for the Telegram Bot API.

use std::time::Duration;

use reqwest::Client;
use serde::{Serialize, de::DeserializeOwned, de::IgnoredAny};

use super::types::{
  AnswerCallbackQuery, ApiResponse, DeleteWebhook, GetUpdates, InlineKeyboardMarkup,
  SendMessage, SetWebhook, Update,
};
use crate::error::{Error, Result};

/// Update kinds the bot subscribes to.
const ALLOWED_UPDATES: &[&str] = &["message", "callback_query"];

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
///
/// The request URL embeds the bot token, so URLs are stripped from every
/// error before it leaves this type.
#[derive(Clone)]
pub struct BotApi {
  client: Client,
  base:   String,
}

impl BotApi {
  /// `poll_timeout` is the long-poll duration; the HTTP timeout leaves some
  /// margin on top of it.
  pub fn new(api_url: &str, token: &str, poll_timeout: Duration) -> Result<Self> {
    let client = Client::builder()
      .timeout(poll_timeout + Duration::from_secs(10))
      .build()
      .map_err(|e| Error::Http(e.without_url()))?;
    Ok(Self {
      client,
      base: format!("{}/bot{token}", api_url.trim_end_matches('/')),
    })
  }

  async fn call<P, T>(&self, method: &str, params: &P) -> Result<T>
  where
    P: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let resp = self
      .client
      .post(format!("{}/{method}", self.base))
      .json(params)
      .send()
      .await
      .map_err(|e| Error::Http(e.without_url()))?;

    let body: ApiResponse<T> = resp.json().await.map_err(|e| Error::Http(e.without_url()))?;
    match body {
      ApiResponse { ok: true, result: Some(result), .. } => Ok(result),
      ApiResponse { error_code, description, .. } => Err(Error::Api {
        code:        error_code.unwrap_or_default(),
        description: description.unwrap_or_else(|| format!("{method} failed")),
      }),
    }
  }

  /// `getUpdates`, long-polling for up to `timeout_secs`.
  pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
    self
      .call(
        "getUpdates",
        &GetUpdates { offset, timeout: timeout_secs, allowed_updates: ALLOWED_UPDATES },
      )
      .await
  }

  pub async fn send_message(
    &self,
    chat_id: i64,
    text: &str,
    reply_markup: Option<InlineKeyboardMarkup>,
  ) -> Result<()> {
    let _: IgnoredAny = self
      .call("sendMessage", &SendMessage { chat_id, text, reply_markup })
      .await?;
    Ok(())
  }

  pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
    let _: IgnoredAny = self
      .call("answerCallbackQuery", &AnswerCallbackQuery { callback_query_id })
      .await?;
    Ok(())
  }

  pub async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<()> {
    let _: IgnoredAny = self
      .call(
        "setWebhook",
        &SetWebhook { url, secret_token, allowed_updates: ALLOWED_UPDATES },
      )
      .await?;
    Ok(())
  }

  /// Remove any registered webhook so `getUpdates` receives updates.
  pub async fn delete_webhook(&self) -> Result<()> {
    let _: IgnoredAny = self
      .call("deleteWebhook", &DeleteWebhook { drop_pending_updates: false })
      .await?;
    Ok(())
  }
}
