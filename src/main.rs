//! Annapoker session processor binary.
//!
//! Wires configuration, the session store and the broker together, then runs
//! the command loop until the command channel closes or Ctrl-C is pressed.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;

use annapoker::adapters::redis::{
    connection, RedisBroadcastPublisher, RedisCommandSubscriber, RedisSessionRepository,
};
use annapoker::adapters::{InMemorySessionRepository, OptimisticSessionStore, StoreOptions};
use annapoker::application::{CommandDispatcher, ProcessorContext, ShardedDispatcher};
use annapoker::config::{AppConfig, StoreBackend};
use annapoker::ports::{SessionRepository, SessionStore};
use annapoker::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    config.validate().context("validating configuration")?;
    telemetry::init(&config.logging).context("installing tracing subscriber")?;

    tracing::info!(
        backend = ?config.store.backend,
        command_channel = %config.broker.command_channel,
        broadcast_prefix = %config.broker.broadcast_prefix,
        shards = config.dispatcher.shards,
        "Starting annapoker"
    );

    let store = build_store(&config).await?;

    let broker = connection::open_client(
        &config.broker.url,
        config.broker.username.as_deref(),
        config.broker.password.as_ref(),
    )
    .context("parsing broker URL")?;
    let publish_conn = connection::connect(&broker, config.broker.connect_timeout())
        .await
        .context("connecting to broker")?;
    let publisher = RedisBroadcastPublisher::new(publish_conn);
    publisher.ping().await.context("pinging broker")?;

    let mut subscriber =
        RedisCommandSubscriber::subscribe(&broker, config.broker.command_channel.clone())
            .await
            .context("subscribing to command channel")?;

    let context = ProcessorContext::new(
        store,
        Arc::new(publisher),
        config.broker.broadcast_prefix.clone(),
    )
    .with_publish_timeout(config.broker.publish_timeout());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = shutdown_tx.send(true);
            }
            Err(e) => tracing::warn!("Could not listen for Ctrl-C: {}", e),
        }
    });

    let stats = if config.dispatcher.is_sharded() {
        ShardedDispatcher::spawn(
            &context,
            config.dispatcher.shards,
            config.dispatcher.shard_buffer,
        )
        .run(&mut subscriber, shutdown_rx)
        .await
    } else {
        CommandDispatcher::from_context(&context)
            .run(&mut subscriber, shutdown_rx)
            .await
    };

    tracing::info!(
        processed = stats.processed,
        malformed = stats.malformed,
        "Annapoker stopped"
    );

    Ok(())
}

async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn SessionStore>> {
    let repository: Arc<dyn SessionRepository> = match config.store.backend {
        StoreBackend::Redis => {
            let client = connection::open_client(
                &config.redis.url,
                config.redis.username.as_deref(),
                config.redis.password.as_ref(),
            )
            .context("parsing store URL")?;
            let conn = connection::connect(&client, config.redis.timeout())
                .await
                .context("connecting to session store")?;
            let repository = RedisSessionRepository::new(conn, config.store.key_prefix.clone())
                .with_ttl(config.store.session_ttl());
            repository.ping().await.context("pinging session store")?;
            Arc::new(repository)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory session store; state is lost on restart");
            Arc::new(InMemorySessionRepository::new())
        }
    };

    let options = StoreOptions::default()
        .with_max_attempts(config.store.max_attempts)
        .with_op_timeout(config.store.op_timeout());

    Ok(Arc::new(OptimisticSessionStore::with_options(
        repository, options,
    )))
}
