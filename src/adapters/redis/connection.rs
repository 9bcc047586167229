//! Redis client construction from configuration.

use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::IntoConnectionInfo;
use secrecy::{ExposeSecret, SecretString};

/// Build a client for `url`, applying ACL credentials kept outside the URL.
pub fn open_client(
    url: &str,
    username: Option<&str>,
    password: Option<&SecretString>,
) -> Result<redis::Client, redis::RedisError> {
    let mut info = url.into_connection_info()?;
    if let Some(username) = username {
        info.redis.username = Some(username.to_string());
    }
    if let Some(password) = password {
        info.redis.password = Some(password.expose_secret().clone());
    }
    redis::Client::open(info)
}

/// Open a multiplexed connection, giving up after `timeout`.
pub async fn connect(
    client: &redis::Client,
    timeout: Duration,
) -> Result<MultiplexedConnection, redis::RedisError> {
    match tokio::time::timeout(timeout, client.get_multiplexed_tokio_connection()).await {
        Ok(conn) => conn,
        Err(_) => Err(redis::RedisError::from((
            redis::ErrorKind::IoError,
            "connection timed out",
        ))),
    }
}
