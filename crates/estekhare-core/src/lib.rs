//! Core types and trait definitions for the istikhara corpus.
//!
//! This crate is deliberately free of document, database and chat-transport
//! dependencies. Every other crate in the workspace depends on it.

// Native `async fn` in traits; the returned futures are spelled out as
// `impl Future + Send` where it matters.
#![allow(async_fn_in_trait)]

pub mod record;
pub mod store;

pub use record::{Field, NewRecord, Record};
pub use store::{CorpusStore, IngestOutcome};
