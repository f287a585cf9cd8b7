//! In-memory chat session registry.
//!
//! Maps a [`SessionKey`] to a shared [`Conversation`]. The map itself sits
//! behind a mutex held only while an entry is looked up or replaced; each
//! conversation has its own lock, held for the whole model call, so there is
//! a single writer per session and one seed per conversation.

use crate::models::{Conversation, HistoryEntry, Part, Role, SessionKey, Turn};
use crate::services::metrics;
use crate::services::providers::{
    generate_recorded, GenerationParams, GenerationRequest, Message, ModelProvider, ModelReply,
    ProviderError,
};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

/// Shared handle to one conversation.
pub type SharedConversation = Arc<RwLock<Conversation>>;

/// Stored as the acknowledgement when the seed reply carries no text.
const SEED_ACKNOWLEDGEMENT: &str = "Understood.";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to seed session {key}: {source}")]
    Seed {
        key: String,
        #[source]
        source: ProviderError,
    },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Bounds on how many sessions are kept and for how long.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Least recently used sessions are dropped beyond this count.
    pub max_sessions: Option<NonZeroUsize>,
    /// Sessions untouched for this long are treated as gone.
    pub idle_ttl: Option<Duration>,
}

impl EvictionPolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = NonZeroUsize::new(max_sessions);
        self
    }

    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = Some(idle_ttl);
        self
    }

    fn is_expired(&self, last_access: Instant, now: Instant) -> bool {
        self.idle_ttl
            .is_some_and(|ttl| now.saturating_duration_since(last_access) >= ttl)
    }
}

/// How chat sessions talk to the model.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub model: String,
    /// Sent as the first user turn of every new conversation.
    pub seed_prompt: String,
    pub params: GenerationParams,
}

struct Entry {
    conversation: SharedConversation,
    last_access: Instant,
}

pub struct SessionRegistry {
    provider: Arc<dyn ModelProvider>,
    settings: ChatSettings,
    policy: EvictionPolicy,
    sessions: Mutex<LruCache<SessionKey, Entry>>,
}

impl SessionRegistry {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        settings: ChatSettings,
        policy: EvictionPolicy,
    ) -> Self {
        let sessions = match policy.max_sessions {
            Some(cap) => LruCache::new(cap),
            None => LruCache::unbounded(),
        };

        Self {
            provider,
            settings,
            policy,
            sessions: Mutex::new(sessions),
        }
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Number of sessions currently held, including idle ones not yet swept.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Return the session for `key`, creating and seeding it on first use.
    pub async fn get_or_create(&self, key: &SessionKey) -> Result<SharedConversation, RegistryError> {
        let conversation = {
            let mut sessions = self.sessions.lock().await;
            let now = Instant::now();
            match self.touch(&mut sessions, key, now) {
                Some(conversation) => conversation,
                None => {
                    let conversation = Arc::new(RwLock::new(Conversation::new(key.clone())));
                    self.insert(&mut sessions, key.clone(), conversation.clone(), now);
                    tracing::debug!(session = %key, "Created chat session");
                    conversation
                }
            }
        };

        {
            let mut guard = conversation.write().await;
            self.seed(&mut guard).await?;
        }

        Ok(conversation)
    }

    /// Replace any session for `key` with a freshly seeded one.
    pub async fn reset(&self, key: &SessionKey) -> Result<SharedConversation, RegistryError> {
        let conversation = Arc::new(RwLock::new(Conversation::new(key.clone())));
        // Locked before it becomes visible so concurrent callers wait for the seed
        let mut guard = conversation.clone().write_owned().await;

        {
            let mut sessions = self.sessions.lock().await;
            self.insert(&mut sessions, key.clone(), conversation.clone(), Instant::now());
        }
        tracing::info!(session = %key, "Reset chat session");

        self.seed(&mut guard).await?;
        drop(guard);

        Ok(conversation)
    }

    /// Rendered history for `key`, or `None` when the session is unknown.
    pub async fn history(&self, key: &SessionKey) -> Option<Vec<HistoryEntry>> {
        let conversation = {
            let mut sessions = self.sessions.lock().await;
            self.peek(&mut sessions, key, Instant::now())?
        };

        let guard = conversation.read().await;
        Some(guard.render_history())
    }

    /// Send `parts` as the next user turn and record the model's reply.
    ///
    /// The user turn is recorded before the model is called. If the call
    /// fails the turn stays in the history, marked unanswered, and is left
    /// out of later requests.
    pub async fn send(
        &self,
        conversation: &SharedConversation,
        parts: Vec<Part>,
    ) -> Result<ModelReply, RegistryError> {
        let mut guard = conversation.write().await;
        self.send_locked(&mut guard, parts).await
    }

    /// `send` on the session currently registered for `key`, creating it on
    /// first use. A reset landing while this call waits for the conversation
    /// lock sends the turn to the replacement session.
    pub async fn chat(&self, key: &SessionKey, parts: Vec<Part>) -> Result<ModelReply, RegistryError> {
        loop {
            let conversation = self.get_or_create(key).await?;
            let mut guard = conversation.write().await;
            if !self.is_current(key, &conversation).await {
                tracing::debug!(session = %key, "Chat session replaced while waiting, retrying");
                continue;
            }
            return self.send_locked(&mut guard, parts).await;
        }
    }

    async fn send_locked(
        &self,
        conversation: &mut Conversation,
        parts: Vec<Part>,
    ) -> Result<ModelReply, RegistryError> {
        self.seed(conversation).await?;

        conversation.push(Turn::new(Role::User, parts));

        let request = GenerationRequest {
            model: self.settings.model.clone(),
            system_instruction: None,
            contents: conversation
                .request_contents()
                .into_iter()
                .map(|(role, parts)| Message { role, parts })
                .collect(),
            params: self.settings.params,
        };

        let reply = match generate_recorded(self.provider.as_ref(), "chat", &request).await {
            Ok(reply) => reply,
            Err(e) => {
                conversation.mark_last_unanswered();
                tracing::warn!(session = %conversation.key, error = %e, "Chat turn left unanswered");
                return Err(e.into());
            }
        };

        if let Some(text) = reply.text() {
            conversation.push(Turn::new(Role::Model, vec![Part::Text(text)]));
        }

        Ok(reply)
    }

    /// Whether `conversation` is still the entry registered for `key`.
    async fn is_current(&self, key: &SessionKey, conversation: &SharedConversation) -> bool {
        let sessions = self.sessions.lock().await;
        sessions
            .peek(key)
            .is_some_and(|entry| Arc::ptr_eq(&entry.conversation, conversation))
    }

    async fn seed(&self, conversation: &mut Conversation) -> Result<(), RegistryError> {
        if conversation.is_seeded() {
            return Ok(());
        }

        let prompt = vec![Part::text(self.settings.seed_prompt.as_str())];
        let request = GenerationRequest {
            model: self.settings.model.clone(),
            system_instruction: None,
            contents: vec![Message::user(prompt.clone())],
            params: self.settings.params,
        };

        let reply = generate_recorded(self.provider.as_ref(), "seed", &request)
            .await
            .map_err(|source| RegistryError::Seed {
                key: conversation.key.to_string(),
                source,
            })?;

        let acknowledgement = reply
            .text()
            .unwrap_or_else(|| SEED_ACKNOWLEDGEMENT.to_string());

        conversation.record_seed(
            Turn::new(Role::User, prompt),
            Turn::new(Role::Model, vec![Part::Text(acknowledgement)]),
        );
        tracing::info!(session = %conversation.key, "Seeded chat session");

        Ok(())
    }

    /// Live entry for `key`, marked as most recently used.
    fn touch(
        &self,
        sessions: &mut LruCache<SessionKey, Entry>,
        key: &SessionKey,
        now: Instant,
    ) -> Option<SharedConversation> {
        let expired = match sessions.get_mut(key) {
            Some(entry) if !self.policy.is_expired(entry.last_access, now) => {
                entry.last_access = now;
                return Some(entry.conversation.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.remove_expired(sessions, key);
        }
        None
    }

    /// Live entry for `key` without changing its recency.
    fn peek(
        &self,
        sessions: &mut LruCache<SessionKey, Entry>,
        key: &SessionKey,
        now: Instant,
    ) -> Option<SharedConversation> {
        let entry = sessions.peek(key)?;
        if self.policy.is_expired(entry.last_access, now) {
            self.remove_expired(sessions, key);
            return None;
        }
        Some(entry.conversation.clone())
    }

    fn remove_expired(&self, sessions: &mut LruCache<SessionKey, Entry>, key: &SessionKey) {
        if sessions.pop(key).is_some() {
            tracing::debug!(session = %key, "Chat session expired");
            metrics::record_sessions_evicted("idle", 1);
            metrics::set_active_sessions(sessions.len());
        }
    }

    fn insert(
        &self,
        sessions: &mut LruCache<SessionKey, Entry>,
        key: SessionKey,
        conversation: SharedConversation,
        now: Instant,
    ) {
        self.sweep_expired(sessions, now);

        let entry = Entry {
            conversation,
            last_access: now,
        };

        if let Some((evicted, _)) = sessions.push(key.clone(), entry) {
            if evicted != key {
                tracing::info!(session = %evicted, "Evicted least recently used chat session");
                metrics::record_sessions_evicted("capacity", 1);
            }
        }

        metrics::set_active_sessions(sessions.len());
    }

    fn sweep_expired(&self, sessions: &mut LruCache<SessionKey, Entry>, now: Instant) {
        if self.policy.idle_ttl.is_none() {
            return;
        }

        let expired: Vec<SessionKey> = sessions
            .iter()
            .filter(|(_, entry)| self.policy.is_expired(entry.last_access, now))
            .map(|(key, _)| key.clone())
            .collect();

        if expired.is_empty() {
            return;
        }

        for key in &expired {
            sessions.pop(key);
        }
        tracing::debug!(count = expired.len(), "Swept idle chat sessions");
        metrics::record_sessions_evicted("idle", expired.len());
    }
}
