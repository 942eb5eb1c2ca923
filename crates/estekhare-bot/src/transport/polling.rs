//! Long-polling transport.
//!
//! Updates are fetched in batches with `getUpdates`. A batch is split by
//! session; each session's updates run in order on their own task and the
//! whole batch completes before the next poll.

use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use estekhare_core::CorpusStore;
use tokio::task::JoinSet;

use super::{Messenger, incoming, process_update};
use crate::{
  conversation::Controller,
  session::SessionKey,
  telegram::{BotApi, types::Update},
};

/// Pause after a failed `getUpdates` before polling again.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Poll until `shutdown` resolves.
pub async fn run<S>(
  api: Arc<BotApi>,
  controller: Arc<Controller<S>>,
  timeout_secs: u64,
  shutdown: impl Future<Output = ()>,
) where
  S: CorpusStore + 'static,
{
  tokio::pin!(shutdown);
  let mut offset: Option<i64> = None;

  tracing::info!(timeout_secs, "polling for updates");
  loop {
    let batch = tokio::select! {
      _ = &mut shutdown => break,
      batch = api.get_updates(offset, timeout_secs) => batch,
    };

    let updates = match batch {
      Ok(updates) => updates,
      Err(e) => {
        tracing::warn!(error = %e, delay = ?RETRY_DELAY, "getUpdates failed");
        tokio::select! {
          _ = &mut shutdown => break,
          _ = tokio::time::sleep(RETRY_DELAY) => continue,
        }
      }
    };

    if let Some(last) = updates.iter().map(|u| u.update_id).max() {
      offset = Some(last + 1);
    }
    dispatch_batch(&controller, &api, updates).await;
  }
  tracing::info!("polling stopped");
}

/// Handle one batch: sessions in parallel, each session's updates in order.
pub async fn dispatch_batch<S, M>(
  controller: &Arc<Controller<S>>,
  messenger: &Arc<M>,
  updates: Vec<Update>,
) where
  S: CorpusStore + 'static,
  M: Messenger,
{
  let mut sessions: Vec<Vec<Update>> = Vec::new();
  let mut index: HashMap<SessionKey, usize> = HashMap::new();
  for update in updates {
    let Some(key) = incoming(&update).map(|i| i.key) else {
      tracing::debug!(update_id = update.update_id, "ignoring update");
      continue;
    };
    let slot = *index.entry(key).or_insert_with(|| {
      sessions.push(Vec::new());
      sessions.len() - 1
    });
    sessions[slot].push(update);
  }

  let mut tasks = JoinSet::new();
  for updates in sessions {
    let controller = Arc::clone(controller);
    let messenger = Arc::clone(messenger);
    tasks.spawn(async move {
      for update in &updates {
        process_update(&controller, messenger.as_ref(), update).await;
      }
    });
  }
  while let Some(joined) = tasks.join_next().await {
    if let Err(e) = joined {
      tracing::warn!(error = %e, "update task failed");
    }
  }
}
