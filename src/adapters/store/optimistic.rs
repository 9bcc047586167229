//! SessionStore implemented as optimistic read-modify-write over a
//! versioned [`SessionRepository`].
//!
//! Each mutation:
//! 1. loads the session and its version
//! 2. applies the change to the aggregate in memory
//! 3. writes it back with compare-and-swap on the version that was read
//! 4. on conflict, reloads and tries again (bounded)
//!
//! Two dispatchers adding participants to the same session at once both
//! land, instead of the later write silently erasing the earlier one.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::foundation::SessionId;
use crate::domain::poker::{Membership, Session, SessionError, User};
use crate::ports::{CasOutcome, SessionRepository, SessionStore, StoreError};

/// Tuning for [`OptimisticSessionStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Write attempts per mutation before giving up with `Conflict`.
    pub max_attempts: u32,

    /// Upper bound for each individual repository call.
    pub op_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            op_timeout: Duration::from_secs(2),
        }
    }
}

impl StoreOptions {
    /// Create options with a custom attempt limit.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Create options with a custom per-call timeout.
    pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = timeout;
        self
    }
}

/// What a mutation decided to do with the loaded session.
enum Change<T> {
    /// Persist the modified session, then return the value.
    Write(T),
    /// Nothing changed; return the value without writing.
    Skip(T),
}

/// [`SessionStore`] with compare-and-swap guarded writes.
pub struct OptimisticSessionStore {
    repository: Arc<dyn SessionRepository>,
    options: StoreOptions,
}

impl OptimisticSessionStore {
    /// Create a store with default options.
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self::with_options(repository, StoreOptions::default())
    }

    /// Create a store with custom options.
    pub fn with_options(repository: Arc<dyn SessionRepository>, options: StoreOptions) -> Self {
        Self {
            repository,
            options,
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.options.op_timeout, call)
            .await
            .map_err(|_| StoreError::Timeout(self.options.op_timeout))?
    }

    async fn read(&self, id: &SessionId) -> Result<Session, StoreError> {
        self.bounded(self.repository.load(id))
            .await?
            .map(|versioned| versioned.value)
            .ok_or_else(|| StoreError::SessionNotFound(id.clone()))
    }

    async fn mutate<T, F>(&self, id: &SessionId, mut apply: F) -> Result<T, StoreError>
    where
        T: Send,
        F: FnMut(&mut Session) -> Result<Change<T>, StoreError> + Send,
    {
        let attempts = self.options.max_attempts.max(1);

        for attempt in 1..=attempts {
            let mut current = self
                .bounded(self.repository.load(id))
                .await?
                .ok_or_else(|| StoreError::SessionNotFound(id.clone()))?;

            let result = match apply(&mut current.value)? {
                Change::Skip(result) => return Ok(result),
                Change::Write(result) => result,
            };

            match self
                .bounded(
                    self.repository
                        .compare_and_swap(current.version, &current.value),
                )
                .await?
            {
                CasOutcome::Applied(_) => return Ok(result),
                CasOutcome::Missing => return Err(StoreError::SessionNotFound(id.clone())),
                CasOutcome::Conflict => {
                    tracing::debug!(
                        session_id = %id,
                        attempt,
                        version = current.version,
                        "Concurrent write detected, retrying"
                    );
                }
            }
        }

        Err(StoreError::Conflict {
            session_id: id.clone(),
            attempts,
        })
    }
}

#[async_trait]
impl SessionStore for OptimisticSessionStore {
    async fn insert_session(&self, id: &SessionId) -> Result<(), StoreError> {
        let session = Session::new(id.clone());
        self.bounded(self.repository.put(&session)).await?;
        Ok(())
    }

    async fn add_user_to_session(&self, id: &SessionId, user: &User) -> Result<(), StoreError> {
        let membership = self
            .mutate(id, |session| Ok(Change::Write(session.add_user(user.clone()))))
            .await?;

        if membership == Membership::Replaced {
            tracing::debug!(session_id = %id, uuid = %user.uuid, "Replaced existing participant");
        }
        Ok(())
    }

    async fn remove_user_from_session(
        &self,
        id: &SessionId,
        user: &User,
    ) -> Result<(), StoreError> {
        self.mutate(id, |session| match session.remove_user(&user.uuid) {
            Some(_) => Ok(Change::Write(())),
            None => Ok(Change::Skip(())),
        })
        .await
    }

    async fn get_users(&self, id: &SessionId) -> Result<Vec<User>, StoreError> {
        Ok(self.read(id).await?.into_users())
    }

    async fn update_user(&self, id: &SessionId, user: &User) -> Result<(), StoreError> {
        self.mutate(id, |session| {
            session
                .update_voting(&user.uuid, user.voting)
                .map_err(|err| match err {
                    SessionError::UserNotFound { uuid } => StoreError::UserNotFound {
                        session_id: id.clone(),
                        uuid,
                    },
                })?;
            Ok(Change::Write(()))
        })
        .await
    }

    async fn reset_votings(&self, id: &SessionId) -> Result<(), StoreError> {
        self.mutate(id, |session| {
            session.reset_votings();
            Ok(Change::Write(()))
        })
        .await
    }

    async fn count_pending_votings(&self, id: &SessionId) -> Result<usize, StoreError> {
        Ok(self.read(id).await?.pending_votings())
    }
}

impl std::fmt::Debug for OptimisticSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimisticSessionStore")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySessionRepository;

    fn sid(s: &str) -> SessionId {
        SessionId::new(s).unwrap()
    }

    fn store_with(repo: Arc<InMemorySessionRepository>) -> OptimisticSessionStore {
        OptimisticSessionStore::new(repo)
    }

    fn uuids(users: &[User]) -> Vec<String> {
        users.iter().map(|u| u.uuid.clone()).collect()
    }

    #[tokio::test]
    async fn insert_session_creates_empty_session() {
        let store = store_with(Arc::new(InMemorySessionRepository::new()));
        store.insert_session(&sid("abc")).await.unwrap();
        assert!(store.get_users(&sid("abc")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insert_session_twice_resets_participants() {
        let store = store_with(Arc::new(InMemorySessionRepository::new()));
        store.insert_session(&sid("abc")).await.unwrap();
        store
            .add_user_to_session(&sid("abc"), &User::new("1", "a"))
            .await
            .unwrap();

        store.insert_session(&sid("abc")).await.unwrap();

        assert!(store.get_users(&sid("abc")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_user_deduplicates_by_uuid() {
        let store = store_with(Arc::new(InMemorySessionRepository::new()));
        let id = sid("abc");
        store.insert_session(&id).await.unwrap();

        store.add_user_to_session(&id, &User::new("1", "a")).await.unwrap();
        store.add_user_to_session(&id, &User::new("1", "a2")).await.unwrap();

        let users = store.get_users(&id).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "a2");
    }

    #[tokio::test]
    async fn mutation_on_missing_session_is_not_found() {
        let repo = Arc::new(InMemorySessionRepository::new());
        let store = store_with(repo.clone());

        let err = store
            .add_user_to_session(&sid("nope"), &User::new("1", "a"))
            .await
            .unwrap_err();

        assert_eq!(err, StoreError::SessionNotFound(sid("nope")));
        assert_eq!(repo.session_count().await, 0);
    }

    #[tokio::test]
    async fn remove_absent_user_does_not_write() {
        let repo = Arc::new(InMemorySessionRepository::new());
        let store = store_with(repo.clone());
        let id = sid("abc");
        store.insert_session(&id).await.unwrap();
        store.add_user_to_session(&id, &User::new("1", "a")).await.unwrap();
        let writes_before = repo.write_count();

        store
            .remove_user_from_session(&id, &User::new("ghost", ""))
            .await
            .unwrap();

        assert_eq!(repo.write_count(), writes_before);
        assert_eq!(uuids(&store.get_users(&id).await.unwrap()), vec!["1"]);
    }

    #[tokio::test]
    async fn update_user_keeps_username() {
        let store = store_with(Arc::new(InMemorySessionRepository::new()));
        let id = sid("abc");
        store.insert_session(&id).await.unwrap();
        store.add_user_to_session(&id, &User::new("1", "alice")).await.unwrap();

        store
            .update_user(&id, &User::new("1", "").with_voting(13))
            .await
            .unwrap();

        let users = store.get_users(&id).await.unwrap();
        assert_eq!(users[0].username, "alice");
        assert_eq!(users[0].voting, 13);
    }

    #[tokio::test]
    async fn update_unknown_user_is_user_not_found() {
        let store = store_with(Arc::new(InMemorySessionRepository::new()));
        let id = sid("abc");
        store.insert_session(&id).await.unwrap();

        let err = store
            .update_user(&id, &User::new("ghost", "").with_voting(1))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::UserNotFound { ref uuid, .. } if uuid == "ghost"));
    }

    #[tokio::test]
    async fn reset_and_count_pending() {
        let store = store_with(Arc::new(InMemorySessionRepository::new()));
        let id = sid("abc");
        store.insert_session(&id).await.unwrap();
        store
            .add_user_to_session(&id, &User::new("1", "a").with_voting(3))
            .await
            .unwrap();
        store.add_user_to_session(&id, &User::new("2", "b")).await.unwrap();
        assert_eq!(store.count_pending_votings(&id).await.unwrap(), 1);

        store.reset_votings(&id).await.unwrap();

        assert_eq!(store.count_pending_votings(&id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn conflict_is_retried_until_applied() {
        let repo = Arc::new(InMemorySessionRepository::new());
        let store = store_with(repo.clone());
        let id = sid("abc");
        store.insert_session(&id).await.unwrap();
        repo.inject_conflicts(2);

        store.add_user_to_session(&id, &User::new("1", "a")).await.unwrap();

        assert_eq!(uuids(&store.get_users(&id).await.unwrap()), vec!["1"]);
    }

    #[tokio::test]
    async fn persistent_conflict_gives_up() {
        let repo = Arc::new(InMemorySessionRepository::new());
        let store = OptimisticSessionStore::with_options(
            repo.clone(),
            StoreOptions::default().with_max_attempts(3),
        );
        let id = sid("abc");
        store.insert_session(&id).await.unwrap();
        repo.inject_conflicts(10);

        let err = store
            .add_user_to_session(&id, &User::new("1", "a"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            StoreError::Conflict {
                session_id: id.clone(),
                attempts: 3
            }
        );
        repo.inject_conflicts(0);
        assert!(store.get_users(&id).await.unwrap().is_empty());
    }

    /// Spawns one `add_user_to_session` per user against a shared store.
    async fn add_concurrently(
        store: &Arc<OptimisticSessionStore>,
        id: &SessionId,
        users: usize,
    ) -> Vec<Result<(), StoreError>> {
        let mut tasks = Vec::new();
        for i in 0..users {
            let store = Arc::clone(store);
            let id = id.clone();
            tasks.push(tokio::spawn(async move {
                store
                    .add_user_to_session(&id, &User::new(i.to_string(), format!("u{}", i)))
                    .await
            }));
        }
        let mut results = Vec::new();
        for task in tasks {
            results.push(task.await.unwrap());
        }
        results
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_are_not_lost() {
        let repo = Arc::new(InMemorySessionRepository::new());
        let store = Arc::new(OptimisticSessionStore::with_options(
            repo.clone(),
            StoreOptions::default().with_max_attempts(50),
        ));
        let id = sid("abc");
        store.insert_session(&id).await.unwrap();
        // Every load finishes before any swap lands, so the writers overlap
        repo.set_latency(Duration::from_millis(5));

        let results = add_concurrently(&store, &id, 16).await;

        assert!(results.iter().all(Result::is_ok));
        assert!(repo.conflict_count() > 0, "writers never overlapped");
        assert_eq!(store.get_users(&id).await.unwrap().len(), 16);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn overlapping_adds_without_retries_report_conflicts() {
        let repo = Arc::new(InMemorySessionRepository::new());
        let store = Arc::new(OptimisticSessionStore::with_options(
            repo.clone(),
            StoreOptions::default().with_max_attempts(1),
        ));
        let id = sid("abc");
        store.insert_session(&id).await.unwrap();
        repo.set_latency(Duration::from_millis(5));

        let results = add_concurrently(&store, &id, 8).await;

        let applied = results.iter().filter(|r| r.is_ok()).count();
        let conflicted = results
            .iter()
            .filter(|r| matches!(r, Err(StoreError::Conflict { attempts: 1, .. })))
            .count();
        assert!(conflicted > 0);
        assert_eq!(applied + conflicted, 8);
        assert_eq!(repo.conflict_count(), conflicted);
        assert_eq!(store.get_users(&id).await.unwrap().len(), applied);
    }

    #[tokio::test]
    async fn slow_repository_times_out() {
        let repo = Arc::new(InMemorySessionRepository::new());
        let store = OptimisticSessionStore::with_options(
            repo.clone(),
            StoreOptions::default().with_op_timeout(Duration::from_millis(20)),
        );
        let id = sid("abc");
        store.insert_session(&id).await.unwrap();
        repo.set_latency(Duration::from_millis(200));

        let err = store.get_users(&id).await.unwrap_err();

        assert_eq!(err, StoreError::Timeout(Duration::from_millis(20)));
    }
}
