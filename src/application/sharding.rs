//! ShardedDispatcher - partitions sessions across independent dispatchers.
//!
//! Each shard is a task with its own [`CommandDispatcher`] and a bounded
//! channel. A session always hashes to the same shard, so commands for one
//! session are handled in arrival order by exactly one task while different
//! sessions proceed in parallel.
//!
//! ```text
//! source ──decode──► router ──hash(sessionId) % N──┬─► shard 0 ─► store / emitter
//!                                                  ├─► shard 1 ─► store / emitter
//!                                                  └─► shard N-1
//! ```

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::domain::foundation::SessionId;
use crate::domain::poker::Command;
use crate::ports::CommandSource;

use super::context::ProcessorContext;
use super::dispatcher::{log_malformed, next_message, CommandDispatcher, DispatchStats};

/// Default channel capacity per shard.
pub const DEFAULT_SHARD_BUFFER: usize = 256;

/// Stable shard index for a session (FNV-1a over the id bytes).
pub fn shard_for(session_id: &SessionId, shard_count: usize) -> usize {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let hash = session_id
        .as_str()
        .bytes()
        .fold(OFFSET_BASIS, |hash, byte| (hash ^ byte as u64).wrapping_mul(PRIME));
    (hash % shard_count.max(1) as u64) as usize
}

/// Router in front of N dispatcher tasks.
pub struct ShardedDispatcher {
    senders: Vec<mpsc::Sender<Command>>,
    workers: Vec<JoinHandle<u64>>,
}

impl ShardedDispatcher {
    /// Spawn `shard_count` dispatcher tasks sharing the context's store and transport.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(context: &ProcessorContext, shard_count: usize, buffer: usize) -> Self {
        let shard_count = shard_count.max(1);
        let mut senders = Vec::with_capacity(shard_count);
        let mut workers = Vec::with_capacity(shard_count);

        for shard in 0..shard_count {
            let (tx, mut rx) = mpsc::channel::<Command>(buffer.max(1));
            let dispatcher = CommandDispatcher::from_context(context);

            workers.push(tokio::spawn(async move {
                let mut handled = 0u64;
                while let Some(command) = rx.recv().await {
                    dispatcher.handle(&command).await;
                    handled += 1;
                }
                tracing::debug!(shard, handled, "Shard drained");
                handled
            }));
            senders.push(tx);
        }

        tracing::info!(shards = shard_count, "Started sharded dispatcher");

        Self { senders, workers }
    }

    /// Number of shards.
    pub fn shard_count(&self) -> usize {
        self.senders.len()
    }

    /// Queue a command on the shard owning its session.
    ///
    /// Waits while that shard's channel is full. Returns `false` if the shard
    /// has stopped.
    pub async fn route(&self, command: Command) -> bool {
        let shard = shard_for(&command.session_id, self.senders.len());
        match self.senders[shard].send(command).await {
            Ok(()) => true,
            Err(mpsc::error::SendError(command)) => {
                tracing::error!(
                    shard,
                    session_id = %command.session_id,
                    command = %command.cmd,
                    "Shard stopped, dropping command"
                );
                false
            }
        }
    }

    /// Route commands until the source closes or shutdown is signalled, then
    /// let every shard finish its queued commands.
    pub async fn run<S>(self, source: &mut S, mut shutdown: watch::Receiver<bool>) -> DispatchStats
    where
        S: CommandSource + ?Sized,
    {
        let mut stats = DispatchStats::default();
        let mut watching = true;

        while let Some(body) = next_message(source, &mut shutdown, &mut watching).await {
            match Command::decode(&body) {
                Ok(command) => {
                    if self.route(command).await {
                        stats.processed += 1;
                    }
                }
                Err(e) => {
                    log_malformed(&e, &body);
                    stats.malformed += 1;
                }
            }
        }

        self.shutdown().await;
        stats
    }

    /// Close all shard channels and wait for queued commands to be handled.
    ///
    /// Returns the number of commands each shard handled.
    pub async fn shutdown(self) -> Vec<u64> {
        drop(self.senders);
        let mut handled = Vec::with_capacity(self.workers.len());
        for worker in self.workers {
            match worker.await {
                Ok(count) => handled.push(count),
                Err(e) => {
                    tracing::error!("Shard task failed: {}", e);
                    handled.push(0);
                }
            }
        }
        handled
    }
}

impl std::fmt::Debug for ShardedDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedDispatcher")
            .field("shards", &self.senders.len())
            .finish_non_exhaustive()
    }
}
