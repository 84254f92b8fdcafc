//! Process-wide session store with deferred eviction

use super::broadcaster::ProgressBroadcaster;
use crate::models::PullResult;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<ProgressBroadcaster>>>,
    retention: Duration,
}

impl SessionRegistry {
    /// `retention` is how long a finished session stays retrievable
    pub fn new(retention: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            retention,
        }
    }

    /// New session under a fresh UUID v4 id
    pub async fn create(&self) -> Arc<ProgressBroadcaster> {
        self.get_or_create(&Uuid::new_v4().to_string()).await
    }

    pub async fn get_or_create(&self, session_id: &str) -> Arc<ProgressBroadcaster> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                debug!(session_id = %session_id, "Session created");
                Arc::new(ProgressBroadcaster::new(session_id))
            })
            .clone()
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<ProgressBroadcaster>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Remove a session; returns whether it existed
    pub async fn evict(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            info!(session_id = %session_id, "Session evicted");
        }
        removed
    }

    /// Evict `session_id` once the retention window has passed
    pub fn schedule_eviction(self: &Arc<Self>, session_id: &str) {
        let registry = Arc::clone(self);
        let session_id = session_id.to_string();
        let retention = self.retention;
        debug!(session_id = %session_id, retention_secs = retention.as_secs_f64(), "Eviction scheduled");

        tokio::spawn(async move {
            tokio::time::sleep(retention).await;
            registry.evict(&session_id).await;
        });
    }

    pub async fn pull_result(&self, session_id: &str) -> PullResult {
        match self.get(session_id).await {
            Some(session) => session.result(),
            None => PullResult::UnknownSession,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
