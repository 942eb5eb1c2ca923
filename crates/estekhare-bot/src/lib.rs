//! Telegram front end for the istikhara corpus.
//!
//! The [`Controller`] owns the per-user conversation and answers every input
//! with a list of [`Reply`] values. The [`transport`] module carries updates
//! from Telegram to the controller and the replies back, either by long
//! polling or through a webhook.

pub mod config;
pub mod conversation;
pub mod corpus;
pub mod documents;
pub mod error;
pub mod render;
pub mod session;
pub mod telegram;
pub mod transport;

pub use config::{BotConfig, Overrides, TransportKind};
pub use conversation::{Action, Controller, Input};
pub use corpus::{Corpus, LoadOutcome};
pub use documents::Documents;
pub use error::{Error, Result};
pub use render::{Keyboard, Reply};
pub use session::{SessionKey, SessionState};
