//! Per-session state: the current analysis, its context snapshot and the
//! conversation grounded in it.
//!
//! A [`Session`] is an explicit value owned by the caller. The loaded analysis
//! sits behind an `Arc` that is swapped wholesale on each upload; the
//! conversation is cleared whenever the snapshot it was grounded in stops
//! being the current one.

use std::fmt;
use std::sync::Arc;

use ledgerlens_analysis::cache::DEFAULT_CACHE_CAPACITY;
use ledgerlens_analysis::{serialize_context, AnalysisError, AnalysisResult, ContextSnapshot, DerivationCache, LabelSet, RawRow};

use crate::service::{ChatMessage, Conversation};

/// One successfully derived upload.
#[derive(Debug)]
pub struct LoadedAnalysis {
    pub result: Arc<AnalysisResult>,
    pub snapshot: ContextSnapshot,
}

/// Chat history plus the handle and the snapshot it is grounded in.
#[derive(Default)]
pub struct ConversationState {
    pub(crate) history: Vec<ChatMessage>,
    pub(crate) active_snapshot: Option<ContextSnapshot>,
    pub(crate) handle: Option<Box<dyn Conversation>>,
}

impl ConversationState {
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn active_snapshot(&self) -> Option<&ContextSnapshot> {
        self.active_snapshot.as_ref()
    }

    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.history.clear();
        self.active_snapshot = None;
        self.handle = None;
    }

    pub(crate) fn record_exchange(&mut self, user: &str, reply: &str) {
        self.history.push(ChatMessage::user(user));
        self.history.push(ChatMessage::assistant(reply));
    }
}

impl fmt::Debug for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationState")
            .field("history", &self.history.len())
            .field("active_snapshot", &self.active_snapshot.as_ref().map(|s| s.fingerprint()))
            .field("handle", &self.handle.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No data loaded
    Empty,
    /// Data loaded, no grounded conversation yet
    Ready,
    /// A conversation handle grounded in the current snapshot exists
    Conversing,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Ready => "ready",
            Self::Conversing => "conversing",
        }
    }
}

/// What a successful upload did to the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Snapshot differs from the previous one; conversation cleared
    NewEpoch,
    /// Snapshot identical to the current one; conversation kept
    Unchanged,
}

#[derive(Debug)]
pub struct Session {
    cache: DerivationCache,
    labels: LabelSet,
    language: String,
    current: Option<Arc<LoadedAnalysis>>,
    pub(crate) conversation: ConversationState,
    service_block: Option<String>,
}

impl Session {
    pub fn new(labels: LabelSet) -> Self {
        Self::with_cache_capacity(labels, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(labels: LabelSet, capacity: usize) -> Self {
        Self {
            cache: DerivationCache::new(capacity),
            labels,
            language: "English".to_string(),
            current: None,
            conversation: ConversationState::default(),
            service_block: None,
        }
    }

    /// Language the assistant is instructed to answer in.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn current(&self) -> Option<&Arc<LoadedAnalysis>> {
        self.current.as_ref()
    }

    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.conversation.history
    }

    /// (hits, misses) of the derivation cache
    pub fn cache_stats(&self) -> (u64, u64) {
        self.cache.stats()
    }

    pub fn phase(&self) -> SessionPhase {
        match &self.current {
            None => SessionPhase::Empty,
            Some(loaded)
                if self.conversation.handle.is_some()
                    && self.conversation.active_snapshot.as_ref() == Some(&loaded.snapshot) =>
            {
                SessionPhase::Conversing
            }
            Some(_) => SessionPhase::Ready,
        }
    }

    /// Derive an upload and make it current.
    ///
    /// The conversation survives only when the new snapshot is identical to
    /// the current one. A derivation failure clears both the analysis and the
    /// conversation.
    pub fn load_rows(&mut self, rows: &[RawRow]) -> Result<LoadOutcome, AnalysisError> {
        let result = match self.cache.derive(rows, &self.labels) {
            Ok(result) => result,
            Err(e) => {
                self.record_load_failure(&e.to_string());
                return Err(e);
            }
        };

        let snapshot = serialize_context(&result, &result.ratios);
        if self.current.as_ref().is_some_and(|c| c.snapshot == snapshot) {
            log::debug!("upload unchanged (snapshot {}), conversation kept", snapshot.fingerprint());
            self.current = Some(Arc::new(LoadedAnalysis { result, snapshot }));
            return Ok(LoadOutcome::Unchanged);
        }

        if !self.conversation.history.is_empty() || self.conversation.handle.is_some() {
            log::info!("new data loaded, conversation reset");
        }
        self.conversation.clear();
        log::info!(
            "loaded {} rows (snapshot {})",
            result.rows.len(),
            snapshot.fingerprint()
        );
        self.current = Some(Arc::new(LoadedAnalysis { result, snapshot }));
        Ok(LoadOutcome::NewEpoch)
    }

    /// An upload failed before derivation (unreadable file, bad columns).
    pub fn record_load_failure(&mut self, reason: &str) {
        log::info!("upload failed ({}), session reset", reason);
        self.current = None;
        self.conversation.clear();
    }

    /// Explicit user reset: same data, fresh conversation.
    pub fn reset_conversation(&mut self) {
        self.conversation.clear();
    }

    /// Reason AI features are blocked, if an auth failure occurred.
    pub fn service_block(&self) -> Option<&str> {
        self.service_block.as_deref()
    }

    pub(crate) fn block_service(&mut self, reason: String) {
        log::warn!("AI features blocked: {}", reason);
        self.service_block = Some(reason);
    }

    /// Lift an auth block after the key was fixed. The old handle was built
    /// with the rejected credentials, so it is dropped; history is kept.
    pub fn clear_service_block(&mut self) {
        if self.service_block.take().is_some() {
            self.detach_service();
        }
    }

    /// Drop the conversation handle so the next turn is grounded afresh on
    /// whatever service the caller passes. History is kept. Call after
    /// swapping the completion service.
    pub fn detach_service(&mut self) {
        self.conversation.handle = None;
        self.conversation.active_snapshot = None;
    }
}
