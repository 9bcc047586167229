//! CommandDispatcher - the command receive loop.
//!
//! Pulls one command at a time, applies it to the session store, and emits
//! the resulting broadcasts before pulling the next one.
//!
//! | Command | Store call | Broadcasts |
//! |---------|------------|------------|
//! | `CREATE_SESSION` | `insert_session` | none |
//! | `SAVE_USER` | `add_user_to_session` | `GET_USERS` |
//! | `GET_USERS` | none | `GET_USERS` |
//! | `UPDATE_VOTING` | `update_user`, `count_pending_votings` | `GET_USERS`, then `REVEAL_VOTINGS` once everyone voted |
//! | `RESET_VOTINGS` | `reset_votings` | `UPDATE_USERS` |
//! | `REMOVE_USER` | `remove_user_from_session` | `UPDATE_USERS` |
//!
//! A store failure on any command that needs the session replaces the
//! expected broadcast with `NO_SESSION_FOUND`; for `UPDATE_VOTING` a failure
//! after `GET_USERS` went out is reported the same way. Nothing a single command does
//! stops the loop.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

use crate::domain::foundation::SessionId;
use crate::domain::poker::{voting, Broadcast, BroadcastType, Command, CommandError, CommandKind};
use crate::ports::{CommandSource, SessionStore, StoreError};

use super::context::ProcessorContext;
use super::emitter::BroadcastEmitter;

/// Broadcasts emitted while handling one command, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub emitted: Vec<BroadcastType>,
}

impl DispatchOutcome {
    /// True if a broadcast of `kind` was emitted.
    pub fn contains(&self, kind: BroadcastType) -> bool {
        self.emitted.contains(&kind)
    }
}

/// Counters reported when the receive loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Commands decoded and handled (or routed).
    pub processed: u64,
    /// Messages skipped because they could not be decoded.
    pub malformed: u64,
}

/// Single-consumer command processor.
pub struct CommandDispatcher {
    store: Arc<dyn SessionStore>,
    emitter: BroadcastEmitter,
}

impl CommandDispatcher {
    /// Create a dispatcher over explicit collaborators.
    pub fn new(store: Arc<dyn SessionStore>, emitter: BroadcastEmitter) -> Self {
        Self { store, emitter }
    }

    /// Create a dispatcher from the shared startup context.
    pub fn from_context(context: &ProcessorContext) -> Self {
        Self::new(Arc::clone(&context.store), context.emitter())
    }

    /// Run the receive loop until the source closes or shutdown is signalled.
    ///
    /// The command being handled when shutdown is signalled is finished first.
    pub async fn run<S>(&self, source: &mut S, mut shutdown: watch::Receiver<bool>) -> DispatchStats
    where
        S: CommandSource + ?Sized,
    {
        let mut stats = DispatchStats::default();
        let mut watching = true;

        while let Some(body) = next_message(source, &mut shutdown, &mut watching).await {
            match self.handle_message(&body).await {
                Ok(_) => stats.processed += 1,
                Err(_) => stats.malformed += 1,
            }
        }

        stats
    }

    /// Decode and handle one raw message.
    ///
    /// # Errors
    ///
    /// - `Malformed` if the body is not a command; it has already been logged
    pub async fn handle_message(&self, body: &[u8]) -> Result<DispatchOutcome, CommandError> {
        match Command::decode(body) {
            Ok(command) => Ok(self.handle(&command).await),
            Err(e) => {
                log_malformed(&e, body);
                Err(e)
            }
        }
    }

    /// Apply one command and emit its broadcasts.
    pub async fn handle(&self, command: &Command) -> DispatchOutcome {
        let span = tracing::info_span!(
            "command",
            correlation_id = %Uuid::new_v4(),
            command = %command.cmd,
            session_id = %command.session_id,
        );

        async {
            tracing::info!(user = %command.username, ">>> received command");
            let mut outcome = DispatchOutcome::default();
            let id = &command.session_id;

            match command.cmd {
                CommandKind::CreateSession => {
                    if let Err(e) = self.store.insert_session(id).await {
                        tracing::error!(error_code = %e.code(), "Could not create session: {}", e);
                    }
                }
                CommandKind::SaveUser => {
                    match self.store.add_user_to_session(id, &command.user).await {
                        Ok(()) => {
                            self.publish_users(id, BroadcastType::GetUsers, &mut outcome)
                                .await;
                        }
                        Err(e) => self.session_failed(id, "add user", &e, &mut outcome).await,
                    }
                }
                CommandKind::GetUsers => {
                    self.publish_users(id, BroadcastType::GetUsers, &mut outcome)
                        .await;
                }
                CommandKind::UpdateVoting => {
                    self.update_voting(command, &mut outcome).await;
                }
                CommandKind::ResetVotings => match self.store.reset_votings(id).await {
                    Ok(()) => {
                        self.publish_users(id, BroadcastType::UpdateUsers, &mut outcome)
                            .await;
                    }
                    Err(e) => self.session_failed(id, "reset votings", &e, &mut outcome).await,
                },
                CommandKind::RemoveUser => {
                    match self.store.remove_user_from_session(id, &command.user).await {
                        Ok(()) => {
                            self.publish_users(id, BroadcastType::UpdateUsers, &mut outcome)
                                .await;
                        }
                        Err(e) => self.session_failed(id, "remove user", &e, &mut outcome).await,
                    }
                }
                CommandKind::Unknown => {
                    tracing::debug!("Ignoring unrecognized command");
                }
            }

            outcome
        }
        .instrument(span)
        .await
    }

    /// Persist the vote, publish the participant list, and reveal once the
    /// committed state has no pending votes left.
    async fn update_voting(&self, command: &Command, outcome: &mut DispatchOutcome) {
        let id = &command.session_id;

        let recorded = match self.store.update_user(id, &command.user).await {
            Ok(()) => true,
            Err(StoreError::UserNotFound { uuid, .. }) => {
                tracing::warn!(uuid = %uuid, "Vote from a user that is not in the session");
                false
            }
            Err(e) => {
                self.session_failed(id, "update voting", &e, outcome).await;
                return;
            }
        };

        let Some(participants) = self
            .publish_users(id, BroadcastType::GetUsers, outcome)
            .await
        else {
            return;
        };

        if !recorded {
            return;
        }

        match self.store.count_pending_votings(id).await {
            Ok(pending) if voting::should_reveal(pending, participants) => {
                self.send(id, Broadcast::reveal_votings(), outcome).await;
            }
            Ok(pending) => {
                tracing::debug!(pending, "Waiting for remaining votes");
            }
            Err(e) => {
                self.session_failed(id, "count pending votings", &e, outcome).await;
            }
        }
    }

    /// Read the participants and publish them as `kind`.
    ///
    /// Returns the participant count, or `None` if the session could not be
    /// read (in which case `NO_SESSION_FOUND` was published instead).
    async fn publish_users(
        &self,
        id: &SessionId,
        kind: BroadcastType,
        outcome: &mut DispatchOutcome,
    ) -> Option<usize> {
        match self.store.get_users(id).await {
            Ok(users) => {
                let count = users.len();
                self.send(id, Broadcast::users(kind, users), outcome).await;
                Some(count)
            }
            Err(e) => {
                self.session_failed(id, "read users", &e, outcome).await;
                None
            }
        }
    }

    async fn session_failed(
        &self,
        id: &SessionId,
        action: &str,
        error: &StoreError,
        outcome: &mut DispatchOutcome,
    ) {
        if error.is_not_found() {
            tracing::warn!(error_code = %error.code(), "Could not {}: {}", action, error);
        } else {
            tracing::error!(error_code = %error.code(), "Could not {}: {}", action, error);
        }
        self.send(id, Broadcast::no_session_found(), outcome).await;
    }

    async fn send(&self, id: &SessionId, broadcast: Broadcast, outcome: &mut DispatchOutcome) {
        self.emitter.emit(id, &broadcast).await;
        outcome.emitted.push(broadcast.kind);
    }
}

/// Wait for the next inbound message.
///
/// Returns `None` when the source closes or shutdown is signalled.
pub(crate) async fn next_message<S>(
    source: &mut S,
    shutdown: &mut watch::Receiver<bool>,
    watching: &mut bool,
) -> Option<Vec<u8>>
where
    S: CommandSource + ?Sized,
{
    loop {
        tokio::select! {
            changed = shutdown.changed(), if *watching => {
                match changed {
                    Ok(()) if *shutdown.borrow() => {
                        tracing::info!("Shutdown requested, leaving command loop");
                        return None;
                    }
                    Ok(()) => {}
                    // Sender dropped: no shutdown can be signalled any more.
                    Err(_) => *watching = false,
                }
            }
            body = source.receive() => {
                if body.is_none() {
                    tracing::info!("Command source closed, leaving command loop");
                }
                return body;
            }
        }
    }
}

pub(crate) fn log_malformed(error: &CommandError, body: &[u8]) {
    tracing::warn!(
        error_code = %error.code(),
        bytes = body.len(),
        "Skipping undecodable command: {}", error
    );
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("emitter", &self.emitter)
            .finish_non_exhaustive()
    }
}
