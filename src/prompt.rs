//! The prompt shown above the diary, and the refresh action that replaces it.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use log::{info, warn};
use tokio::sync::watch;

use crate::completion::CompletionClient;
use crate::error::Result;

pub const DEFAULT_STARTUP_CUE: &str = "Reflect upon your day.";

/// Holds the latest raw completion. Cloning shares the same slot, so a
/// request can be spawned onto its own task.
pub struct PromptAcquisition<C> {
    client: Arc<C>,
    startup_cue: String,
    latest: Arc<watch::Sender<String>>,
    pending: Arc<AtomicUsize>,
}

impl<C> Clone for PromptAcquisition<C> {
    fn clone(&self) -> Self {
        PromptAcquisition {
            client: self.client.clone(),
            startup_cue: self.startup_cue.clone(),
            latest: self.latest.clone(),
            pending: self.pending.clone(),
        }
    }
}

impl<C: CompletionClient> PromptAcquisition<C> {
    pub fn new(client: Arc<C>, startup_cue: impl Into<String>) -> Self {
        let (latest, _) = watch::channel(String::new());
        PromptAcquisition {
            client,
            startup_cue: startup_cue.into(),
            latest: Arc::new(latest),
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The first request, seeded with the fixed startup cue.
    pub async fn start(&self) -> Result<()> {
        self.request(self.startup_cue.clone()).await
    }

    /// Asks for a new prompt using the current raw completion as the cue.
    ///
    /// Repeated refreshes feed each output back in, so the prompt drifts.
    pub async fn refresh(&self) -> Result<()> {
        let cue = self.latest.borrow().clone();
        self.request(cue).await
    }

    /// Marks a request as in flight until the returned guard is dropped.
    /// Take it before spawning so the marker is visible on the next draw.
    pub fn begin(&self) -> PendingRequest {
        self.pending.fetch_add(1, Ordering::SeqCst);
        PendingRequest {
            pending: self.pending.clone(),
        }
    }

    async fn request(&self, cue: String) -> Result<()> {
        info!("Requesting completion for cue {:?}", cue);
        let result = {
            let _pending = self.begin();
            self.client.complete(&cue).await
        };

        match result {
            Ok(text) => {
                self.latest.send_replace(text);
                Ok(())
            }
            Err(e) => {
                warn!("Completion failed, keeping previous prompt: {}", e);
                Err(e)
            }
        }
    }

    /// The completion exactly as received; this is what the next refresh sends.
    pub fn raw_text(&self) -> String {
        self.latest.borrow().clone()
    }

    pub fn display_text(&self) -> String {
        strip_for_display(&self.latest.borrow())
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.latest.subscribe()
    }
}

pub struct PendingRequest {
    pending: Arc<AtomicUsize>,
}

impl Drop for PendingRequest {
    fn drop(&mut self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Trims the text and drops every quote character.
pub fn strip_for_display(raw: &str) -> String {
    raw.trim().chars().filter(|c| !matches!(c, '\'' | '"')).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiaryError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies and records every cue it was sent.
    struct Scripted {
        replies: Mutex<VecDeque<Result<String>>>,
        cues: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn replying(replies: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Scripted {
                replies: Mutex::new(replies.into()),
                cues: Mutex::default(),
            })
        }

        fn cues(&self) -> Vec<String> {
            self.cues.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for Scripted {
        async fn complete(&self, cue: &str) -> Result<String> {
            self.cues.lock().unwrap().push(cue.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    fn unavailable() -> DiaryError {
        DiaryError::CompletionStatus {
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    #[tokio::test]
    async fn start_sends_startup_cue_once() {
        let client = Scripted::replying(vec![Ok("What made you smile?".into())]);
        let prompt = PromptAcquisition::new(client.clone(), DEFAULT_STARTUP_CUE);

        prompt.start().await.unwrap();

        assert_eq!(client.cues(), vec![DEFAULT_STARTUP_CUE.to_string()]);
        assert_eq!(prompt.display_text(), "What made you smile?");
    }

    #[tokio::test]
    async fn refresh_feeds_back_current_completion() {
        let client = Scripted::replying(vec![Ok("hello".into()), Ok("world".into())]);
        let prompt = PromptAcquisition::new(client.clone(), DEFAULT_STARTUP_CUE);

        prompt.start().await.unwrap();
        prompt.refresh().await.unwrap();

        assert_eq!(client.cues()[1], "hello");
        assert_eq!(prompt.raw_text(), "world");
    }

    #[tokio::test]
    async fn quote_stripping_is_display_only() {
        let client = Scripted::replying(vec![Ok("\"hello\"".into())]);
        let prompt = PromptAcquisition::new(client.clone(), DEFAULT_STARTUP_CUE);

        prompt.start().await.unwrap();
        assert_eq!(prompt.display_text(), "hello");

        prompt.refresh().await.unwrap();
        assert_eq!(client.cues()[1], "\"hello\"");
    }

    #[tokio::test]
    async fn failed_request_keeps_previous_prompt() {
        let client = Scripted::replying(vec![Ok("keep me".into()), Err(unavailable())]);
        let prompt = PromptAcquisition::new(client, DEFAULT_STARTUP_CUE);

        prompt.start().await.unwrap();
        assert!(prompt.refresh().await.is_err());
        assert_eq!(prompt.raw_text(), "keep me");
        assert!(!prompt.is_pending());
    }

    #[tokio::test]
    async fn subscribers_see_new_completion() {
        let client = Scripted::replying(vec![Ok("fresh".into())]);
        let prompt = PromptAcquisition::new(client, DEFAULT_STARTUP_CUE);
        let mut rx = prompt.subscribe();

        prompt.clone().start().await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), "fresh");
    }

    #[test]
    fn pending_guard_tracks_in_flight_requests() {
        let prompt = PromptAcquisition::new(Scripted::replying(vec![]), DEFAULT_STARTUP_CUE);
        let first = prompt.begin();
        let second = prompt.clone().begin();
        assert!(prompt.is_pending());

        drop(first);
        assert!(prompt.is_pending());
        drop(second);
        assert!(!prompt.is_pending());
    }

    #[test]
    fn strip_removes_all_quotes_and_outer_whitespace() {
        assert_eq!(strip_for_display("  'Don't \"stop\"'\n"), "Dont stop");
        assert_eq!(strip_for_display(""), "");
    }
}
