//! Pooled headless-browser session manager (C4, spec §4.4).

use std::sync::Arc;
use std::time::Instant;

use legacy_types::NavigationError;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::engine::{BrowserEngine, BrowserHandle, EngineKind};

pub const DEFAULT_MAX_CONCURRENT_SESSIONS: usize = 3;
pub const HARD_CAP_MAX_CONCURRENT_SESSIONS: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct SessionMetrics {
    pub pages_processed: u64,
    pub total_load_ms: u64,
    pub memory_at_acquire_kb: u64,
    pub memory_at_release_kb: u64,
}

pub struct Session {
    pub id: Uuid,
    pub engine: EngineKind,
    pub handle: Box<dyn BrowserHandle>,
    pub metrics: SessionMetrics,
    acquired_at: Instant,
    /// Returns its pool slot automatically on drop.
    _permit: OwnedSemaphorePermit,
}

impl Session {
    pub fn record_page(&mut self, load_time_ms: u64) {
        self.metrics.pages_processed += 1;
        self.metrics.total_load_ms += load_time_ms;
    }
}

/// Bounded pool of live browser sessions. Mutated only under its internal
/// semaphore/mutex (spec §5: "Browser pool (mutated only by C4 under an
/// internal lock)").
pub struct SessionManager {
    engine: Arc<dyn BrowserEngine>,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
    replenish_attempts: Mutex<u32>,
}

impl SessionManager {
    pub fn new(engine: Arc<dyn BrowserEngine>, max_concurrent_sessions: usize) -> Self {
        let capped = max_concurrent_sessions
            .max(1)
            .min(HARD_CAP_MAX_CONCURRENT_SESSIONS);
        Self {
            engine,
            permits: Arc::new(Semaphore::new(capped)),
            max_concurrent: capped,
            replenish_attempts: Mutex::new(0),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Acquires a pool slot and a fresh handle. Retries once on a failed
    /// handle creation ("replenish"), surfacing a retryable `PoolExhausted`
    /// error if the engine cannot produce a healthy handle.
    #[instrument(skip(self))]
    pub async fn acquire(&self, engine_kind: Option<EngineKind>) -> Result<Session, NavigationError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| NavigationError::PoolExhausted)?;

        let kind = engine_kind.unwrap_or_default();
        let handle = match self.engine.new_handle(kind).await {
            Ok(h) => h,
            Err(first_err) => {
                warn!(error = %first_err, "browser handle creation failed, replenishing");
                *self.replenish_attempts.lock().await += 1;
                self.engine.new_handle(kind).await.map_err(|e| {
                    NavigationError::BrowserCrash {
                        message: format!("replenish failed: {e}"),
                    }
                })?
            }
        };

        info!(engine = ?kind, "acquired browser session");
        Ok(Session {
            id: Uuid::new_v4(),
            engine: kind,
            handle,
            metrics: SessionMetrics::default(),
            acquired_at: Instant::now(),
            _permit: permit,
        })
    }

    /// Releases a session back to the pool. Unhealthy sessions are disposed
    /// rather than reused; either way dropping `session` returns its permit.
    #[instrument(skip(self, session))]
    pub fn release(&self, session: Session) {
        let healthy = session.handle.is_healthy();
        let held_ms = session.acquired_at.elapsed().as_millis();
        if !healthy {
            warn!(session_id = %session.id, held_ms, "disposing unhealthy session");
        } else {
            info!(
                session_id = %session.id,
                held_ms,
                pages_processed = session.metrics.pages_processed,
                "released browser session"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_engine::MockBrowserEngine;

    #[tokio::test]
    async fn pool_size_is_capped_at_hard_limit() {
        let manager = SessionManager::new(Arc::new(MockBrowserEngine::new()), 100);
        assert_eq!(manager.max_concurrent(), HARD_CAP_MAX_CONCURRENT_SESSIONS);
    }

    #[tokio::test]
    async fn acquire_and_release_round_trips() {
        let manager = SessionManager::new(Arc::new(MockBrowserEngine::new()), 2);
        let session = manager.acquire(None).await.unwrap();
        assert!(session.handle.is_healthy());
        manager.release(session);
        // Slot must be available again.
        let _second = manager.acquire(None).await.unwrap();
    }

    #[tokio::test]
    async fn acquire_blocks_past_capacity_until_release() {
        let manager = Arc::new(SessionManager::new(Arc::new(MockBrowserEngine::new()), 1));
        let first = manager.acquire(None).await.unwrap();

        let manager2 = manager.clone();
        let handle = tokio::spawn(async move { manager2.acquire(None).await });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!handle.is_finished());

        manager.release(first);
        let second = handle.await.unwrap().unwrap();
        assert!(second.handle.is_healthy());
    }
}
