//! The per-request conversation state machine.
//!
//! One submission drives: classification → catalog-grounded prompt →
//! streaming completion through a fresh `StreamAssembler` → a finalized
//! assistant entry. Every failure resolves to a terminal entry for the turn
//! and returns the session to `Idle`; nothing is ever left half-open.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use itinera_core::{
    CatalogGateway, ClassificationError, Classifier, CompletionGateway, ConversationEntry,
    EntryId, Verdict,
};
use itinera_markup::StreamAssembler;

use crate::budget::parse_budget;
use crate::prompt::build_grounding_prompt;

// Fixed user-facing entry texts. Kept verbatim so every deployment resolves
// the same failure to the same words.
pub const MSG_REJECTED: &str = "很抱歉，我只能推荐东京的旅游产品，请提供东京旅游相关的问题哦~";
pub const MSG_BUSY: &str = "❌ 服务器繁忙，请稍后重试";
pub const MSG_INVALID_CREDENTIAL: &str = "❌ API密钥无效，请联系管理员";
pub const MSG_NETWORK: &str = "❌ 网络连接失败，请稍后重试";
pub const MSG_SERVICE_PREFIX: &str = "❌ 服务异常：";
pub const MSG_TRANSPORT: &str = "抱歉，我现在无法处理您的请求，请稍后再试。";
pub const MSG_NO_CONTENT: &str = "抱歉，本次没有生成内容，请稍后再试。";

/// Where the session is inside the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Quiescent between turns.
    Idle,
    Classifying,
    Recommending,
    Streaming,
}

/// When the in-flight assistant entry becomes visible.
///
/// Both timings exist in real deployments; this is a configuration point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryMaterialization {
    /// Create the entry on the first fragment that commits non-empty text —
    /// no flash of an empty bubble.
    #[default]
    Deferred,
    /// Create an empty streaming entry as soon as the stream opens.
    Immediate,
}

/// Session behavior knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    pub materialization: EntryMaterialization,
}

/// Ordered conversation entries plus the state machine driving one turn at
/// a time. Owned by a single task; gateways are shared, the session is not.
pub struct ConversationSession {
    classifier: Arc<dyn Classifier>,
    completion: Arc<dyn CompletionGateway>,
    catalog: Arc<dyn CatalogGateway>,
    options: SessionOptions,
    entries: Vec<ConversationEntry>,
    phase: Phase,
}

impl ConversationSession {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        completion: Arc<dyn CompletionGateway>,
        catalog: Arc<dyn CatalogGateway>,
    ) -> Self {
        Self {
            classifier,
            completion,
            catalog,
            options: SessionOptions::default(),
            entries: Vec::new(),
            phase: Phase::Idle,
        }
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Drop any non-final entry and return to `Idle`.
    ///
    /// Used on cancellation (user navigates away, widget unmounts): the
    /// assembler is discarded without `finish()`, and no partial entry
    /// survives in `streaming` status.
    pub fn discard_in_flight(&mut self) {
        let before = self.entries.len();
        self.entries.retain(|e| !e.is_streaming());
        if self.entries.len() != before {
            debug!(discarded = before - self.entries.len(), "Discarded in-flight entries");
        }
        self.phase = Phase::Idle;
    }

    /// Process one user submission to completion.
    ///
    /// `on_update` is invoked with a frozen snapshot of an entry every time
    /// one is appended or its live document changes; the caller republishes
    /// it however it likes. The call returns once the turn has resolved —
    /// the session is back in `Idle` on every path.
    pub async fn submit<F>(&mut self, text: &str, mut on_update: F)
    where
        F: FnMut(&ConversationEntry),
    {
        let query = text.trim();
        if query.is_empty() || self.phase != Phase::Idle {
            debug!(phase = ?self.phase, "Ignoring submission (empty or mid-turn)");
            return;
        }

        let user_entry = ConversationEntry::user(query);
        on_update(&user_entry);
        self.entries.push(user_entry);

        // ── Classification ──
        self.phase = Phase::Classifying;
        info!(query = %query, "Classifying query");

        match self.classifier.classify(query).await {
            Ok(Verdict::Accepted) => {}
            Ok(Verdict::Rejected) => {
                self.resolve_with_message(MSG_REJECTED, &mut on_update);
                return;
            }
            Err(ClassificationError::Unknown(detail)) => {
                // Fail open: availability over precision, an explicit policy.
                warn!(detail = %detail, "Classifier failed with unknown error; proceeding as accepted");
            }
            Err(err) => {
                warn!(error = %err, "Classification failed");
                let message = classification_message(&err);
                self.resolve_with_message(&message, &mut on_update);
                return;
            }
        }

        // ── Grounding ──
        self.phase = Phase::Recommending;
        let budget = parse_budget(query);
        debug!(?budget, "Parsed budget from query");

        let products = match self.catalog.all_products().await {
            Ok(p) => p,
            Err(err) => {
                warn!(error = %err, "Catalog unavailable");
                self.resolve_with_message(MSG_TRANSPORT, &mut on_update);
                return;
            }
        };

        let prompt = build_grounding_prompt(&products, budget, query);

        // ── Streaming ──
        let mut rx = match self.completion.stream_complete(&prompt).await {
            Ok(rx) => rx,
            Err(err) => {
                warn!(error = %err, "Completion gateway refused the stream");
                self.resolve_with_message(MSG_TRANSPORT, &mut on_update);
                return;
            }
        };

        self.phase = Phase::Streaming;
        let mut assembler = StreamAssembler::new();
        let mut live_id: Option<EntryId> = None;

        if self.options.materialization == EntryMaterialization::Immediate {
            let entry = ConversationEntry::assistant_streaming("");
            live_id = Some(entry.id.clone());
            on_update(&entry);
            self.entries.push(entry);
        }

        while let Some(item) = rx.recv().await {
            match item {
                Ok(fragment) => {
                    let committed = assembler.consume(&fragment).to_string();

                    match &live_id {
                        None if !committed.trim().is_empty() => {
                            let mut entry = ConversationEntry::assistant_streaming("");
                            entry.content = committed;
                            live_id = Some(entry.id.clone());
                            on_update(&entry);
                            self.entries.push(entry);
                        }
                        None => {} // nothing render-worthy yet
                        Some(id) => {
                            let id = id.clone();
                            if let Some(entry) = self.entry_mut(&id) {
                                if entry.content != committed {
                                    entry.content = committed;
                                    on_update(entry);
                                }
                            }
                        }
                    }
                }
                Err(err) => {
                    // Mid-stream transport failure: the unfinished entry is
                    // discarded entirely, never finalized.
                    warn!(error = %err, "Stream failed mid-turn");
                    self.entries.retain(|e| !e.is_streaming());
                    self.resolve_with_message(MSG_TRANSPORT, &mut on_update);
                    return;
                }
            }
        }

        // ── Finalization ──
        let (document, references) = assembler.finish();
        info!(
            chars = document.len(),
            references = references.len(),
            "Stream complete"
        );

        match live_id.and_then(|id| self.entry_index(&id)) {
            Some(idx) => {
                let entry = &mut self.entries[idx];
                entry.finalize(document, references);
                on_update(entry);
            }
            None if document.trim().is_empty() => {
                // The model produced nothing visible; never leave the user
                // with a silently-vanished turn.
                self.append_final(MSG_NO_CONTENT, &mut on_update);
            }
            None => {
                // Content existed but never committed mid-stream (e.g. the
                // whole output looked like one dangling marker); surface it
                // now that finish() flushed it.
                let mut entry = ConversationEntry::assistant_final("");
                entry.content = document;
                entry.referenced_ids = references;
                on_update(&entry);
                self.entries.push(entry);
            }
        }

        self.phase = Phase::Idle;
    }

    fn entry_index(&self, id: &EntryId) -> Option<usize> {
        self.entries.iter().position(|e| &e.id == id)
    }

    fn entry_mut(&mut self, id: &EntryId) -> Option<&mut ConversationEntry> {
        self.entries.iter_mut().find(|e| &e.id == id)
    }

    fn append_final<F>(&mut self, message: &str, on_update: &mut F)
    where
        F: FnMut(&ConversationEntry),
    {
        let entry = ConversationEntry::assistant_final(message);
        on_update(&entry);
        self.entries.push(entry);
    }

    /// Resolve the turn with a single fixed-text assistant entry and return
    /// to `Idle`. The cleanup is unconditional: no streaming-status entry
    /// survives any resolution path.
    fn resolve_with_message<F>(&mut self, message: &str, on_update: &mut F)
    where
        F: FnMut(&ConversationEntry),
    {
        self.entries.retain(|e| !e.is_streaming());
        self.append_final(message, on_update);
        self.phase = Phase::Idle;
    }
}

/// The fixed user-visible text for each classifier failure kind.
fn classification_message(err: &ClassificationError) -> String {
    match err {
        ClassificationError::Busy(_) => MSG_BUSY.to_string(),
        ClassificationError::InvalidCredential(_) => MSG_INVALID_CREDENTIAL.to_string(),
        ClassificationError::NetworkUnavailable(_) => MSG_NETWORK.to_string(),
        ClassificationError::ServiceUnavailable(detail) => {
            let detail = if detail.is_empty() { "请稍后重试" } else { detail };
            format!("{MSG_SERVICE_PREFIX}{detail}")
        }
        // Unknown fails open before this function is reached.
        ClassificationError::Unknown(_) => MSG_TRANSPORT.to_string(),
    }
}
