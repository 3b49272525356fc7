use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store-assigned identifier of a committed entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Generates a fresh, time-ordered identifier.
    pub fn generate() -> Self {
        EntryId(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A committed diary entry. Only a store hands these out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntry {
    #[serde(rename = "_id")]
    pub id: EntryId,
    pub entry_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub timestamp: DateTime<Local>,
}

impl DiaryEntry {
    /// Seals a draft into a record with a fresh id and the current time.
    pub fn from_draft(draft: Draft) -> Self {
        DiaryEntry {
            id: EntryId::generate(),
            entry_content: draft.entry_content,
            prompt: draft.prompt,
            timestamp: Local::now(),
        }
    }
}

/// The not-yet-persisted entry being edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub entry_content: String,
    pub prompt: Option<String>,
}

impl Draft {
    pub fn new(entry_content: impl Into<String>, prompt: Option<String>) -> Self {
        Draft {
            entry_content: entry_content.into(),
            prompt,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entry_content.is_empty()
    }
}
