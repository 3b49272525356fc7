//! The entry synchronization loop: a live list of committed entries plus the
//! one draft being written.

use std::sync::Arc;

use crate::diary_entry::{DiaryEntry, Draft};
use crate::document::DocumentSession;
use crate::error::Result;
use crate::live_query::LiveQuery;
use crate::store::{DocumentStore, IndexField};

pub struct EntrySync<S> {
    live: LiveQuery,
    session: DocumentSession<S>,
}

impl<S: DocumentStore> EntrySync<S> {
    /// Subscribes to every entry ordered by `index` and opens an empty draft.
    pub async fn subscribe(store: Arc<S>, index: IndexField) -> Result<Self> {
        let live = LiveQuery::subscribe(store.clone(), index).await?;
        let session = DocumentSession::new(store, Draft::default());
        Ok(EntrySync { live, session })
    }

    pub fn entries(&self) -> Arc<Vec<DiaryEntry>> {
        self.live.snapshot()
    }

    /// Resolves with the next result set pushed by the store.
    pub async fn changed(&mut self) -> Result<Arc<Vec<DiaryEntry>>> {
        self.live.changed().await
    }

    pub fn live_query(&self) -> &LiveQuery {
        &self.live
    }

    pub fn draft(&self) -> &Draft {
        self.session.current()
    }

    pub fn stage_edit(&mut self, draft: Draft) {
        self.session.stage(draft);
    }

    /// Persists the draft, clearing it only after the store acknowledged the
    /// write. The new entry reaches `entries()` through the subscription.
    pub async fn commit(&mut self) -> Result<DiaryEntry> {
        self.session.commit().await
    }

    pub fn discard(&mut self) {
        self.session.discard();
    }

    pub fn unsubscribe(self) {
        self.live.unsubscribe();
    }
}
