//! Document stores holding committed diary entries.
//!
//! A store assigns ids and timestamps on insert, answers ordered queries and
//! ticks a revision channel after every successful write so that live
//! queries know when to re-run.

use std::{
    cmp::Ordering,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering as AtomicOrdering},
};

use async_trait::async_trait;
use clap::ValueEnum;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::sync::{watch, RwLock};

use crate::diary_entry::{DiaryEntry, Draft};
use crate::error::{DiaryError, Result};

/// Field a query is indexed on. Results come back sorted by it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum IndexField {
    #[default]
    EntryContent,
    Timestamp,
}

impl IndexField {
    pub fn name(self) -> &'static str {
        match self {
            IndexField::EntryContent => "entryContent",
            IndexField::Timestamp => "timestamp",
        }
    }

    fn compare(self, a: &DiaryEntry, b: &DiaryEntry) -> Ordering {
        let primary = match self {
            IndexField::EntryContent => a.entry_content.cmp(&b.entry_content),
            IndexField::Timestamp => a.timestamp.cmp(&b.timestamp),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }

    /// Orders entries by this index, ties broken by id.
    pub fn sort(self, entries: &mut [DiaryEntry]) {
        entries.sort_by(|a, b| self.compare(a, b));
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Persists a draft as a new immutable entry and returns it.
    async fn insert(&self, draft: Draft) -> Result<DiaryEntry>;

    /// Returns every entry ordered by `index`.
    async fn query(&self, index: IndexField) -> Result<Vec<DiaryEntry>>;

    /// Revision counter bumped after each successful write.
    fn changes(&self) -> watch::Receiver<u64>;
}

/// In-memory store. Writes and reads can be made to fail.
pub struct MemoryStore {
    entries: RwLock<Vec<DiaryEntry>>,
    revision: watch::Sender<u64>,
    reject_writes: AtomicBool,
    unreachable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        MemoryStore {
            entries: RwLock::new(Vec::new()),
            revision,
            reject_writes: AtomicBool::new(false),
            unreachable: AtomicBool::new(false),
        }
    }

    /// Makes every following insert fail with `WriteRejected`.
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, AtomicOrdering::SeqCst);
    }

    /// Makes every following call fail with `StoreUnavailable`.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, AtomicOrdering::SeqCst);
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable.load(AtomicOrdering::SeqCst) {
            return Err(DiaryError::StoreUnavailable {
                message: "memory store marked unreachable".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, draft: Draft) -> Result<DiaryEntry> {
        self.check_reachable()?;
        if self.reject_writes.load(AtomicOrdering::SeqCst) {
            return Err(DiaryError::WriteRejected {
                message: "memory store is rejecting writes".to_string(),
            });
        }

        let entry = DiaryEntry::from_draft(draft);
        self.entries.write().await.push(entry.clone());
        self.revision.send_modify(|rev| *rev += 1);
        Ok(entry)
    }

    async fn query(&self, index: IndexField) -> Result<Vec<DiaryEntry>> {
        self.check_reachable()?;
        let mut entries = self.entries.read().await.clone();
        index.sort(&mut entries);
        Ok(entries)
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

#[derive(Serialize, Deserialize, Default)]
struct StoreFile {
    entries: Vec<DiaryEntry>,
}

/// Store persisted to a single JSON file, rewritten atomically on each insert.
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<Vec<DiaryEntry>>,
    revision: watch::Sender<u64>,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing file is an empty diary.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = match fs::read_to_string(&path) {
            Ok(serialized) => serde_json::from_str::<StoreFile>(&serialized)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No diary file at {}, starting empty", path.display());
                StoreFile::default()
            }
            Err(e) => {
                error!("Failed to read diary file {}: {}", path.display(), e);
                return Err(e.into());
            }
        };

        info!(
            "Opened diary store at {} with {} entries",
            path.display(),
            file.entries.len()
        );

        let (revision, _) = watch::channel(0);
        Ok(JsonFileStore {
            path,
            entries: RwLock::new(file.entries),
            revision,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save_to_file(&self, entries: &[DiaryEntry]) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir)?;
        let file = StoreFile {
            entries: entries.to_vec(),
        };
        serde_json::to_writer_pretty(&mut tmp, &file)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!("Wrote {} entries to {}", entries.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn insert(&self, draft: Draft) -> Result<DiaryEntry> {
        let mut entries = self.entries.write().await;

        let entry = DiaryEntry::from_draft(draft);
        let mut next = entries.clone();
        next.push(entry.clone());

        if let Err(e) = self.save_to_file(&next) {
            error!("Failed to persist entry {}: {}", entry.id, e);
            return Err(e);
        }

        *entries = next;
        drop(entries);
        self.revision.send_modify(|rev| *rev += 1);
        Ok(entry)
    }

    async fn query(&self, index: IndexField) -> Result<Vec<DiaryEntry>> {
        let mut entries = self.entries.read().await.clone();
        index.sort(&mut entries);
        Ok(entries)
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}
