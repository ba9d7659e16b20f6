//! Session registry for concurrent conversations.
//!
//! Each conversation sits behind its own async mutex, so requests within a
//! conversation run one at a time while separate conversations run in
//! parallel. Conversations idle longer than the configured timeout are
//! evicted and their state discarded.

use moka::future::Cache;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::SessionSettings;
use crate::orchestrator::{Conversation, Pipeline, Reply, Request};

pub type SessionId = Uuid;

/// A conversation shared between the registry and its caller.
pub type SharedConversation = Arc<Mutex<Conversation>>;

/// Registry of live conversations keyed by id.
pub struct SessionRegistry {
    pipeline: Arc<Pipeline>,
    sessions: Cache<SessionId, SharedConversation>,
}

impl SessionRegistry {
    pub fn new(pipeline: Arc<Pipeline>, settings: &SessionSettings) -> Self {
        let sessions = Cache::builder()
            .max_capacity(settings.max_sessions)
            .time_to_idle(settings.idle_timeout)
            .build();

        Self { pipeline, sessions }
    }

    /// Start a new conversation.
    pub async fn open(&self) -> SessionId {
        let id = Uuid::new_v4();
        let conversation = Arc::new(Mutex::new(Conversation::new(Arc::clone(&self.pipeline))));
        self.sessions.insert(id, conversation).await;
        tracing::debug!(session = %id, "Conversation opened");
        id
    }

    pub async fn get(&self, id: &SessionId) -> Option<SharedConversation> {
        self.sessions.get(id).await
    }

    /// Route a request to its conversation. `None` if the id is unknown or evicted.
    pub async fn handle(&self, id: &SessionId, request: Request) -> Option<Reply> {
        let conversation = self.get(id).await?;
        let mut conversation = conversation.lock().await;
        let reply = conversation.handle(request).await;
        tracing::debug!(
            session = %id,
            state = %conversation.state(),
            failed = reply.is_failure(),
            "Request handled"
        );
        Some(reply)
    }

    pub async fn close(&self, id: &SessionId) {
        self.sessions.invalidate(id).await;
        tracing::debug!(session = %id, "Conversation closed");
    }

    /// Approximate number of live conversations.
    pub async fn len(&self) -> u64 {
        self.sessions.run_pending_tasks().await;
        self.sessions.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
