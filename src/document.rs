//! Single-draft editing session against a [`DocumentStore`].

use std::sync::Arc;

use log::{debug, info, warn};

use crate::diary_entry::{DiaryEntry, Draft};
use crate::error::Result;
use crate::store::DocumentStore;

/// Owns the one in-flight draft. All mutation goes through `&mut self`, so
/// the draft has a single writer and cannot change while a commit is
/// awaiting the store.
pub struct DocumentSession<S> {
    store: Arc<S>,
    draft: Draft,
}

impl<S: DocumentStore> DocumentSession<S> {
    pub fn new(store: Arc<S>, initial: Draft) -> Self {
        DocumentSession {
            store,
            draft: initial,
        }
    }

    pub fn current(&self) -> &Draft {
        &self.draft
    }

    /// Replaces the whole draft. Nothing is persisted.
    pub fn stage(&mut self, draft: Draft) {
        debug!("Staging draft ({} bytes)", draft.entry_content.len());
        self.draft = draft;
    }

    /// Writes the draft to the store and, once the write has been
    /// acknowledged, resets it to empty. On failure the draft is kept.
    pub async fn commit(&mut self) -> Result<DiaryEntry> {
        match self.store.insert(self.draft.clone()).await {
            Ok(entry) => {
                info!("Committed entry {}", entry.id);
                self.draft = Draft::default();
                Ok(entry)
            }
            Err(e) => {
                warn!("Commit failed, keeping draft: {}", e);
                Err(e)
            }
        }
    }

    pub fn discard(&mut self) {
        self.draft = Draft::default();
    }
}
