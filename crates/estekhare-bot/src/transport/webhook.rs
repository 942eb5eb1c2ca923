//! Webhook transport: Telegram POSTs each update to an axum route.

use std::sync::Arc;

use axum::{
  Router,
  body::Bytes,
  extract::State,
  http::{HeaderMap, StatusCode},
  routing::post,
};
use estekhare_core::CorpusStore;
use tower_http::trace::TraceLayer;

use super::{Messenger, process_update};
use crate::{conversation::Controller, telegram::types::Update};

/// Header Telegram fills with the secret registered through `setWebhook`.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

// ─── State ───────────────────────────────────────────────────────────────────

/// Shared state of the webhook route.
pub struct WebhookState<S, M> {
  pub controller: Arc<Controller<S>>,
  pub messenger:  Arc<M>,
  /// Required value of [`SECRET_HEADER`]; unset accepts any request.
  pub secret:     Option<Arc<str>>,
}

// Manual impl: `derive` would demand `S: Clone` and `M: Clone`.
impl<S, M> Clone for WebhookState<S, M> {
  fn clone(&self) -> Self {
    Self {
      controller: Arc::clone(&self.controller),
      messenger:  Arc::clone(&self.messenger),
      secret:     self.secret.clone(),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// A router serving `POST {path}`.
pub fn router<S, M>(path: &str, state: WebhookState<S, M>) -> Router
where
  S: CorpusStore + 'static,
  M: Messenger,
{
  let path = if path.starts_with('/') { path.to_string() } else { format!("/{path}") };
  Router::new()
    .route(&path, post(receive::<S, M>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// Accept one update. It is processed on its own task so Telegram gets its
/// answer without waiting for the replies to be sent.
async fn receive<S, M>(
  State(state): State<WebhookState<S, M>>,
  headers: HeaderMap,
  body: Bytes,
) -> StatusCode
where
  S: CorpusStore + 'static,
  M: Messenger,
{
  if let Some(secret) = &state.secret {
    let given = headers.get(SECRET_HEADER).map(|v| v.as_bytes());
    if given != Some(secret.as_bytes()) {
      tracing::warn!("webhook request with a wrong or missing secret token");
      return StatusCode::UNAUTHORIZED;
    }
  }

  let update: Update = match serde_json::from_slice(&body) {
    Ok(update) => update,
    Err(e) => {
      tracing::warn!(error = %e, "malformed webhook body");
      return StatusCode::BAD_REQUEST;
    }
  };

  tokio::spawn(async move {
    process_update(&state.controller, state.messenger.as_ref(), &update).await;
  });
  StatusCode::OK
}
