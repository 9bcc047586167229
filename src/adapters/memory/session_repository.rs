//! In-memory versioned session repository.
//!
//! Reference implementation of [`SessionRepository`] used by tests and by
//! the `memory` store backend for local runs without Redis. Sessions never
//! expire on their own; `expire` simulates a TTL eviction.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::SessionId;
use crate::domain::poker::Session;
use crate::ports::{CasOutcome, SessionRepository, StoreError, Versioned};

/// In-memory session repository with fault injection for tests.
///
/// Features:
/// - Monotonic version tokens shared across all sessions
/// - Conflict, latency, outage and one-shot load failure injection
/// - Write and conflict counting for assertions
#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<SessionId, Versioned<Session>>>,
    next_version: AtomicU64,
    writes: AtomicUsize,
    conflicts: AtomicUsize,
    pending_conflicts: AtomicU32,
    // Loads left until the injected failure, plus one; zero when disarmed
    load_failure_countdown: AtomicU32,
    latency_ms: AtomicU64,
    unavailable: AtomicBool,
}

impl InMemorySessionRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Number of stored sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Number of successful writes (`put` and applied CAS).
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of compare-and-swap calls that reported a conflict.
    pub fn conflict_count(&self) -> usize {
        self.conflicts.load(Ordering::SeqCst)
    }

    /// Current stored value of a session.
    pub async fn snapshot(&self, id: &SessionId) -> Option<Session> {
        self.sessions.read().await.get(id).map(|v| v.value.clone())
    }

    /// Drops a session as a TTL expiry would.
    pub async fn expire(&self, id: &SessionId) {
        self.sessions.write().await.remove(id);
    }

    /// Makes the next `count` compare-and-swap calls report a conflict.
    pub fn inject_conflicts(&self, count: u32) {
        self.pending_conflicts.store(count, Ordering::SeqCst);
    }

    /// Lets `after` loads succeed, then fails the next one with `Unavailable`.
    pub fn inject_load_failure(&self, after: u32) {
        self.load_failure_countdown
            .store(after.saturating_add(1), Ordering::SeqCst);
    }

    /// Delays every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Makes every call fail with `Unavailable` while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    async fn simulate_io(&self) -> Result<(), StoreError> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory repository marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn take_conflict(&self) -> bool {
        self.pending_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn take_load_failure(&self) -> bool {
        self.load_failure_countdown
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .map_or(false, |previous| previous == 1)
    }

    fn conflict(&self) -> CasOutcome {
        self.conflicts.fetch_add(1, Ordering::SeqCst);
        CasOutcome::Conflict
    }

    fn bump_version(&self) -> u64 {
        self.next_version.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn load(&self, id: &SessionId) -> Result<Option<Versioned<Session>>, StoreError> {
        self.simulate_io().await?;
        if self.take_load_failure() {
            return Err(StoreError::Unavailable("injected load failure".to_string()));
        }
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn put(&self, session: &Session) -> Result<u64, StoreError> {
        self.simulate_io().await?;
        let version = self.bump_version();
        self.sessions.write().await.insert(
            session.id().clone(),
            Versioned {
                version,
                value: session.clone(),
            },
        );
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(version)
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        session: &Session,
    ) -> Result<CasOutcome, StoreError> {
        self.simulate_io().await?;
        if self.take_conflict() {
            return Ok(self.conflict());
        }

        let mut sessions = self.sessions.write().await;
        let Some(stored) = sessions.get_mut(session.id()) else {
            return Ok(CasOutcome::Missing);
        };
        if stored.version != expected_version {
            return Ok(self.conflict());
        }

        let version = self.bump_version();
        *stored = Versioned {
            version,
            value: session.clone(),
        };
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(CasOutcome::Applied(version))
    }
}
