//! Per-user conversation state.
//!
//! Every (chat, user) pair owns one [`SessionState`] behind its own async
//! mutex. Handlers hold that mutex for the whole of one update, so a user's
//! actions are processed one at a time while other users proceed in parallel.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// Identity a conversation is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
  pub chat_id: i64,
  pub user_id: i64,
}

/// Where a user is in the conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
  #[default]
  Idle,
  /// The next free-text message is the user's intent.
  AwaitingIntent,
  /// The next free-text message should be a page number.
  AwaitingPage,
}

type Slot = Arc<tokio::sync::Mutex<SessionState>>;

/// Registry of the sessions currently in use.
///
/// A slot lives while an update for it is in flight or while it is in one of
/// the awaiting states. A key without a slot is [`SessionState::Idle`].
#[derive(Default)]
pub struct Sessions {
  slots: Mutex<HashMap<SessionKey, Slot>>,
}

impl Sessions {
  pub fn new() -> Self { Self::default() }

  fn slots(&self) -> MutexGuard<'_, HashMap<SessionKey, Slot>> {
    self.slots.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// The session slot for `key`, created idle on first use.
  ///
  /// Callers hand the slot back with [`release`](Self::release) once done.
  pub fn slot(&self, key: SessionKey) -> Slot {
    self.slots().entry(key).or_default().clone()
  }

  /// Drop the slot for `key` if it is idle and nobody else holds it.
  ///
  /// The caller's own clone of the slot must be dropped first.
  pub fn release(&self, key: SessionKey) {
    let mut slots = self.slots();
    let evict = slots.get(&key).is_some_and(|slot| {
      Arc::strong_count(slot) == 1
        && slot.try_lock().is_ok_and(|state| *state == SessionState::Idle)
    });
    if evict {
      slots.remove(&key);
    }
  }

  /// Current state of `key`; waits for an in-flight update of that session.
  pub async fn state(&self, key: SessionKey) -> SessionState {
    let Some(slot) = self.slots().get(&key).cloned() else {
      return SessionState::Idle;
    };
    *slot.lock().await
  }

  /// Number of sessions held in memory.
  pub fn len(&self) -> usize { self.slots().len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[cfg(test)]
mod tests {
  use super::*;

  const ALICE: SessionKey = SessionKey { chat_id: 1, user_id: 1 };
  const BOB: SessionKey = SessionKey { chat_id: 2, user_id: 2 };

  #[tokio::test]
  async fn new_sessions_are_idle_and_independent() {
    let sessions = Sessions::new();
    assert_eq!(sessions.state(ALICE).await, SessionState::Idle);

    *sessions.slot(ALICE).lock().await = SessionState::AwaitingPage;
    assert_eq!(sessions.state(ALICE).await, SessionState::AwaitingPage);
    assert_eq!(sessions.state(BOB).await, SessionState::Idle);
  }

  #[tokio::test]
  async fn same_key_shares_one_slot() {
    let sessions = Sessions::new();
    let a = sessions.slot(ALICE);
    let b = sessions.slot(ALICE);
    assert!(Arc::ptr_eq(&a, &b));

    let _held = a.lock().await;
    assert!(b.try_lock().is_err());
  }

  #[tokio::test]
  async fn idle_lookups_create_nothing() {
    let sessions = Sessions::new();
    for id in 0..1_000 {
      let key = SessionKey { chat_id: id, user_id: id };
      assert_eq!(sessions.state(key).await, SessionState::Idle);
    }
    assert!(sessions.is_empty());
  }

  #[tokio::test]
  async fn release_evicts_only_idle_unshared_slots() {
    let sessions = Sessions::new();

    // Awaiting: kept.
    *sessions.slot(ALICE).lock().await = SessionState::AwaitingIntent;
    sessions.release(ALICE);
    assert_eq!(sessions.len(), 1);

    // Idle but still held by someone else: kept.
    let held = sessions.slot(BOB);
    sessions.release(BOB);
    assert_eq!(sessions.len(), 2);
    drop(held);

    // Idle and unshared: gone.
    sessions.release(BOB);
    *sessions.slot(ALICE).lock().await = SessionState::Idle;
    sessions.release(ALICE);
    assert!(sessions.is_empty());
  }
}
