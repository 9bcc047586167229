//! Redis-backed versioned session repository for production deployments.
//!
//! Each session is a hash under `<key_prefix>s:<session_id>`:
//!
//! | Field | Content |
//! |-------|---------|
//! | `version` | version token of the last write |
//! | `session` | JSON-encoded session aggregate |
//!
//! Version tokens come from a single counter key so they never repeat, even
//! after a session expired and was created again. Writes refresh the TTL.
//! Conditional writes run as Lua scripts, which Redis executes atomically.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::Script;

use crate::domain::foundation::SessionId;
use crate::domain::poker::Session;
use crate::ports::{CasOutcome, SessionRepository, StoreError, Versioned};

/// Overwrite a session unconditionally with a fresh version.
///
/// KEYS[1] session hash, KEYS[2] version counter
/// ARGV[1] session json, ARGV[2] ttl seconds
const PUT_SCRIPT: &str = r#"
local version = redis.call('INCR', KEYS[2])
redis.call('DEL', KEYS[1])
redis.call('HSET', KEYS[1], 'version', version, 'session', ARGV[1])
redis.call('EXPIRE', KEYS[1], ARGV[2])
return version
"#;

/// Write a session only if the stored version matches.
///
/// KEYS[1] session hash, KEYS[2] version counter
/// ARGV[1] expected version, ARGV[2] session json, ARGV[3] ttl seconds
/// Returns -1 if the session is gone, 0 on conflict, the new version otherwise.
const CAS_SCRIPT: &str = r#"
local current = redis.call('HGET', KEYS[1], 'version')
if not current then
  return -1
end
if current ~= ARGV[1] then
  return 0
end
local version = redis.call('INCR', KEYS[2])
redis.call('HSET', KEYS[1], 'version', version, 'session', ARGV[2])
redis.call('EXPIRE', KEYS[1], ARGV[3])
return version
"#;

/// Default lifetime of an idle session.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(4 * 60 * 60);

/// Redis session repository with compare-and-swap writes.
#[derive(Clone)]
pub struct RedisSessionRepository {
    conn: MultiplexedConnection,
    key_prefix: String,
    ttl: Duration,
    put_script: Script,
    cas_script: Script,
}

impl RedisSessionRepository {
    /// Create a new Redis session repository.
    pub fn new(conn: MultiplexedConnection, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
            ttl: DEFAULT_SESSION_TTL,
            put_script: Script::new(PUT_SCRIPT),
            cas_script: Script::new(CAS_SCRIPT),
        }
    }

    /// Set how long a session lives after its last write.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Check connectivity.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    fn session_key(&self, id: &SessionId) -> String {
        session_key(&self.key_prefix, id)
    }

    fn version_key(&self) -> String {
        version_key(&self.key_prefix)
    }

    fn ttl_secs(&self) -> u64 {
        self.ttl.as_secs().max(1)
    }
}

/// Key of a session hash: `<prefix>s:<id>`.
///
/// Sessions live under their own `s:` namespace so no client-chosen id can
/// address the version counter.
pub(crate) fn session_key(prefix: &str, id: &SessionId) -> String {
    format!("{}s:{}", prefix, id)
}

/// Key of the shared version counter: `<prefix>version`.
pub(crate) fn version_key(prefix: &str) -> String {
    format!("{}version", prefix)
}

fn unavailable(err: redis::RedisError) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

#[async_trait]
impl SessionRepository for RedisSessionRepository {
    async fn load(&self, id: &SessionId) -> Result<Option<Versioned<Session>>, StoreError> {
        let mut conn = self.conn.clone();

        let (version, payload): (Option<u64>, Option<String>) = redis::cmd("HMGET")
            .arg(self.session_key(id))
            .arg("version")
            .arg("session")
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        match (version, payload) {
            (Some(version), Some(payload)) => {
                let value: Session = serde_json::from_str(&payload)?;
                Ok(Some(Versioned { version, value }))
            }
            (None, None) => Ok(None),
            _ => Err(StoreError::Serialization(format!(
                "incomplete session record for {}",
                id
            ))),
        }
    }

    async fn put(&self, session: &Session) -> Result<u64, StoreError> {
        let payload = serde_json::to_string(session)?;
        let mut conn = self.conn.clone();

        let version: u64 = self
            .put_script
            .key(self.session_key(session.id()))
            .key(self.version_key())
            .arg(payload)
            .arg(self.ttl_secs())
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable)?;

        Ok(version)
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        session: &Session,
    ) -> Result<CasOutcome, StoreError> {
        let payload = serde_json::to_string(session)?;
        let mut conn = self.conn.clone();

        let result: i64 = self
            .cas_script
            .key(self.session_key(session.id()))
            .key(self.version_key())
            .arg(expected_version)
            .arg(payload)
            .arg(self.ttl_secs())
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable)?;

        Ok(match result {
            -1 => CasOutcome::Missing,
            0 => CasOutcome::Conflict,
            version => CasOutcome::Applied(version as u64),
        })
    }
}

impl std::fmt::Debug for RedisSessionRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionRepository")
            .field("key_prefix", &self.key_prefix)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_ttl_is_four_hours() {
        assert_eq!(DEFAULT_SESSION_TTL, Duration::from_secs(14_400));
    }

    fn sid(s: &str) -> SessionId {
        SessionId::new(s).unwrap()
    }

    #[test]
    fn session_keys_are_namespaced_under_prefix() {
        assert_eq!(
            session_key("annapoker:session:", &sid("abc")),
            "annapoker:session:s:abc"
        );
        assert_eq!(version_key("annapoker:session:"), "annapoker:session:version");
    }

    #[test]
    fn counter_named_session_ids_do_not_hit_the_counter() {
        let prefix = "annapoker:session:";
        for id in ["version", "__version", "s:version", ":version", "../version"] {
            assert_ne!(session_key(prefix, &sid(id)), version_key(prefix), "id {}", id);
        }
    }

    proptest! {
        #[test]
        fn no_session_id_maps_to_the_counter_key(
            prefix in "[a-z:]{0,12}",
            raw in "[^\\s\\p{Cc}]{1,24}",
        ) {
            let id = SessionId::new(raw).unwrap();
            prop_assert_ne!(session_key(&prefix, &id), version_key(&prefix));
        }
    }

    // Redis integration tests need a running server:
    //
    // #[tokio::test]
    // #[ignore] // Run with: cargo test -- --ignored
    // async fn test_redis_session_repository() {
    //     let client = redis::Client::open("redis://127.0.0.1/").unwrap();
    //     let conn = client.get_multiplexed_tokio_connection().await.unwrap();
    //     let repo = RedisSessionRepository::new(conn, "test:session:");
    //     // ... test code
    // }
}
