//! Event wiring between the terminal and the diary core.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{error, info};
use tokio::sync::{mpsc, watch};

use crate::completion::CompletionClient;
use crate::diary_entry::{DiaryEntry, Draft};
use crate::input::TextInput;
use crate::prompt::PromptAcquisition;
use crate::store::DocumentStore;
use crate::sync::EntrySync;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App<S, C> {
    sync: EntrySync<S>,
    prompt: PromptAcquisition<C>,
    prompt_updates: watch::Receiver<String>,
    input: TextInput,
    status: Option<String>,
    list_live: bool,
    scroll: usize,
    notices_tx: mpsc::UnboundedSender<String>,
    notices_rx: mpsc::UnboundedReceiver<String>,
}

impl<S: DocumentStore, C: CompletionClient> App<S, C> {
    pub fn new(sync: EntrySync<S>, prompt: PromptAcquisition<C>) -> Self {
        let (notices_tx, notices_rx) = mpsc::unbounded_channel();
        let prompt_updates = prompt.subscribe();
        App {
            sync,
            prompt,
            prompt_updates,
            input: TextInput::default(),
            status: None,
            list_live: true,
            scroll: 0,
            notices_tx,
            notices_rx,
        }
    }

    pub fn entries(&self) -> Arc<Vec<DiaryEntry>> {
        self.sync.entries()
    }

    pub fn prompt_text(&self) -> String {
        self.prompt.display_text()
    }

    pub fn prompt_pending(&self) -> bool {
        self.prompt.is_pending()
    }

    pub fn input(&self) -> &TextInput {
        &self.input
    }

    pub fn draft(&self) -> &Draft {
        self.sync.draft()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Kicks off the startup prompt request in the background.
    pub fn start_prompt(&self) {
        let prompt = self.prompt.clone();
        let notices = self.notices_tx.clone();
        let pending = self.prompt.begin();
        tokio::spawn(async move {
            let _pending = pending;
            if let Err(e) = prompt.start().await {
                let _ = notices.send(format!("Could not fetch a prompt: {e}"));
            }
        });
    }

    pub fn refresh_prompt(&self) {
        let prompt = self.prompt.clone();
        let notices = self.notices_tx.clone();
        let pending = self.prompt.begin();
        tokio::spawn(async move {
            let _pending = pending;
            if let Err(e) = prompt.refresh().await {
                let _ = notices.send(format!("Could not refresh the prompt: {e}"));
            }
        });
    }

    /// Stages the input box as a full replacement draft.
    fn stage_from_input(&mut self) {
        let prompt = Some(self.prompt.display_text()).filter(|p| !p.is_empty());
        self.sync
            .stage_edit(Draft::new(self.input.value(), prompt));
    }

    /// Commits the draft. The input box is cleared only if the write landed.
    pub async fn commit(&mut self) {
        match self.sync.commit().await {
            Ok(entry) => {
                info!("Saved entry {}", entry.id);
                self.input.clear();
                self.status = Some("Entry saved".to_string());
            }
            Err(e) => {
                error!("Saving entry failed: {}", e);
                self.status = Some(format!("Could not save entry: {e}"));
            }
        }
    }

    pub fn discard(&mut self) {
        self.sync.discard();
        self.input.clear();
        self.status = Some("Draft discarded".to_string());
    }

    pub async fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => self.commit().await,
                KeyCode::Char('r') => self.refresh_prompt(),
                KeyCode::Char('d') => self.discard(),
                KeyCode::Char('c') => return Flow::Quit,
                _ => {}
            }
            return Flow::Continue;
        }

        let edited = match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Char(c) => {
                self.input.insert(c);
                true
            }
            KeyCode::Enter => {
                self.input.newline();
                true
            }
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Left => {
                self.input.left();
                false
            }
            KeyCode::Right => {
                self.input.right();
                false
            }
            KeyCode::Up => {
                self.input.up();
                false
            }
            KeyCode::Down => {
                self.input.down();
                false
            }
            KeyCode::Home => {
                self.input.home();
                false
            }
            KeyCode::End => {
                self.input.end();
                false
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(1);
                false
            }
            KeyCode::PageDown => {
                if self.scroll + 1 < self.entries().len() {
                    self.scroll += 1;
                }
                false
            }
            _ => false,
        };

        if edited {
            self.stage_from_input();
        }
        Flow::Continue
    }

    /// Waits for anything pushed from outside the keyboard: a new entry list,
    /// a new prompt, or a notice from a background request.
    pub async fn next_update(&mut self) {
        tokio::select! {
            changed = self.sync.changed(), if self.list_live => {
                if let Err(e) = changed {
                    error!("Entry list stopped updating: {}", e);
                    self.list_live = false;
                    self.status = Some(format!("Entry list stopped updating: {e}"));
                }
            }
            Ok(()) = self.prompt_updates.changed() => {}
            Some(notice) = self.notices_rx.recv() => {
                self.status = Some(notice);
            }
        }
    }
}
