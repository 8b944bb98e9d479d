use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::config::SessionConfig;
use crate::core::error::{AppError, Result};
use crate::features::shipping::clients::RajaOngkirClient;
use crate::features::shipping::services::shipping_session::{SessionHandle, ShippingSession};
use crate::features::shipping::services::tier_pricing::TierPricingEngine;

struct SessionEntry {
    handle: SessionHandle,
    last_access: Instant,
}

impl SessionEntry {
    fn is_idle(&self, config: &SessionConfig, now: Instant) -> bool {
        now.duration_since(self.last_access) >= config.idle_ttl
    }
}

/// In-memory shipping sessions keyed by a server-issued id.
///
/// Sessions idle longer than `idle_ttl` are evicted, lazily on lookup and in a
/// sweep before each creation. Creation is refused once `max_sessions` live
/// sessions remain after the sweep.
pub struct ShippingSessionRegistry {
    client: Arc<RajaOngkirClient>,
    pricing: Arc<TierPricingEngine>,
    config: SessionConfig,
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
}

impl ShippingSessionRegistry {
    pub fn new(
        client: Arc<RajaOngkirClient>,
        pricing: Arc<TierPricingEngine>,
        config: SessionConfig,
    ) -> Self {
        Self {
            client,
            pricing,
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create(&self) -> Result<(Uuid, SessionHandle)> {
        let mut sessions = self.sessions.write().await;

        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_idle(&self.config, now));
        if sessions.len() < before {
            tracing::debug!("Evicted {} idle shipping sessions", before - sessions.len());
        }

        if sessions.len() >= self.config.max_sessions {
            tracing::warn!(
                "Refusing new shipping session, {} sessions live",
                sessions.len()
            );
            return Err(AppError::RateLimitExceeded(
                "Too many shipping sessions, try again later".to_string(),
            ));
        }

        let id = Uuid::now_v7();
        let handle = SessionHandle::new(ShippingSession::new(
            Arc::clone(&self.client),
            Arc::clone(&self.pricing),
        ));
        sessions.insert(
            id,
            SessionEntry {
                handle: handle.clone(),
                last_access: now,
            },
        );
        tracing::debug!("Created shipping session {}", id);

        Ok((id, handle))
    }

    /// Look up a live session and mark it as used
    pub async fn get(&self, id: &Uuid) -> Result<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();

        match sessions.get_mut(id) {
            Some(entry) if !entry.is_idle(&self.config, now) => {
                entry.last_access = now;
                Ok(entry.handle.clone())
            }
            Some(_) => {
                sessions.remove(id);
                tracing::debug!("Shipping session {} expired", id);
                Err(not_found(id))
            }
            None => Err(not_found(id)),
        }
    }

    pub async fn remove(&self, id: &Uuid) -> Result<()> {
        self.sessions
            .write()
            .await
            .remove(id)
            .map(|_| tracing::debug!("Removed shipping session {}", id))
            .ok_or_else(|| not_found(id))
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn not_found(id: &Uuid) -> AppError {
    AppError::NotFound(format!("Shipping session '{}' not found", id))
}
