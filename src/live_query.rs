//! Push-based live queries over a [`DocumentStore`].

use std::sync::Arc;

use log::{debug, error};
use tokio::{sync::watch, task::JoinHandle};

use crate::diary_entry::DiaryEntry;
use crate::error::{DiaryError, Result};
use crate::store::{DocumentStore, IndexField};

/// A running subscription. The latest snapshot is always available through
/// [`LiveQuery::snapshot`]; dropping the handle unsubscribes.
pub struct LiveQuery {
    index: IndexField,
    results: watch::Receiver<Arc<Vec<DiaryEntry>>>,
    task: JoinHandle<()>,
}

impl LiveQuery {
    /// Runs the query once and keeps re-running it on every store write.
    pub async fn subscribe<S: DocumentStore>(store: Arc<S>, index: IndexField) -> Result<Self> {
        let mut changes = store.changes();
        // Mark the current revision seen before the first read so a write
        // landing in between still triggers a re-query.
        changes.borrow_and_update();

        let initial = store.query(index).await?;
        debug!(
            "Live query on {} opened with {} entries",
            index.name(),
            initial.len()
        );

        let (tx, results) = watch::channel(Arc::new(initial));
        let task = tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                match store.query(index).await {
                    Ok(entries) => {
                        debug!("Live query on {} refreshed: {} entries", index.name(), entries.len());
                        if tx.send(Arc::new(entries)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Live query on {} failed, closing: {}", index.name(), e);
                        break;
                    }
                }
            }
        });

        Ok(LiveQuery {
            index,
            results,
            task,
        })
    }

    pub fn index(&self) -> IndexField {
        self.index
    }

    /// The most recent result set.
    pub fn snapshot(&self) -> Arc<Vec<DiaryEntry>> {
        self.results.borrow().clone()
    }

    /// Waits for the next result set. Fails once the subscription has ended.
    pub async fn changed(&mut self) -> Result<Arc<Vec<DiaryEntry>>> {
        self.results
            .changed()
            .await
            .map_err(|_| DiaryError::SubscriptionClosed)?;
        Ok(self.results.borrow_and_update().clone())
    }

    /// A detached receiver for callers that want to observe results
    /// without holding the handle.
    pub fn watch(&self) -> watch::Receiver<Arc<Vec<DiaryEntry>>> {
        self.results.clone()
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for LiveQuery {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diary_entry::Draft;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn empty_store_yields_empty_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let live = LiveQuery::subscribe(store, IndexField::EntryContent)
            .await
            .unwrap();
        assert!(live.snapshot().is_empty());
    }

    #[tokio::test]
    async fn pushes_new_results_after_insert() {
        let store = Arc::new(MemoryStore::new());
        let mut live = LiveQuery::subscribe(store.clone(), IndexField::EntryContent)
            .await
            .unwrap();

        store.insert(Draft::new("b", None)).await.unwrap();
        let snapshot = live.changed().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].entry_content, "b");
        assert_eq!(live.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn failing_store_closes_subscription() {
        let store = Arc::new(MemoryStore::new());
        let mut live = LiveQuery::subscribe(store.clone(), IndexField::EntryContent)
            .await
            .unwrap();

        store.insert(Draft::new("before", None)).await.unwrap();
        live.changed().await.unwrap();

        // The re-query runs only once this task yields, after the store has
        // gone away.
        store.insert(Draft::new("trigger", None)).await.unwrap();
        store.set_unreachable(true);

        let err = live.changed().await.unwrap_err();
        assert!(matches!(err, DiaryError::SubscriptionClosed));
        assert_eq!(live.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn watchers_stop_after_unsubscribe() {
        let store = Arc::new(MemoryStore::new());
        let live = LiveQuery::subscribe(store.clone(), IndexField::EntryContent)
            .await
            .unwrap();
        let mut detached = live.watch();

        live.unsubscribe();
        tokio::task::yield_now().await;
        store.insert(Draft::new("unseen", None)).await.unwrap();

        assert!(detached.changed().await.is_err());
    }
}
