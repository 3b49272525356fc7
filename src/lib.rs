//! A single-screen diary that opens with a generated writing prompt.
//!
//! The core is the entry synchronization loop in [`sync`]: a live query over a
//! [`store::DocumentStore`] feeding the entry list, and a single draft that is
//! committed to the store and cleared once the write is acknowledged.

pub mod app;
pub mod completion;
pub mod config;
pub mod diary_entry;
pub mod document;
pub mod error;
pub mod input;
pub mod live_query;
pub mod prompt;
pub mod store;
pub mod sync;
pub mod ui;

pub use diary_entry::{DiaryEntry, Draft, EntryId};
pub use error::{DiaryError, Result};
