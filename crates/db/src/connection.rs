use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use prosperity_core::config::DatabaseConfig;

pub type DbPool = sqlx::SqlitePool;

pub async fn connect(database_url: &str) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(database_url, 5, 30).await
}

pub async fn connect_with_config(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(&config.url, config.max_connections, config.timeout_secs).await
}

/// Opens the pool, creating the database file on first use.
///
/// In-memory databases are private to each connection, so they are pinned to one.
pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    let in_memory = database_url.contains(":memory:");
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(if in_memory { 1 } else { max_connections.max(1) })
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                if !in_memory {
                    sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                }
                Ok(())
            })
        })
        .connect_with(options)
        .await
}

/// Trivial round trip used by the liveness route.
pub async fn ping(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::{connect_with_settings, ping};

    #[tokio::test]
    async fn in_memory_pool_answers_ping() {
        let pool = connect_with_settings("sqlite::memory:", 4, 30).await.expect("connect");
        ping(&pool).await.expect("ping");
        assert_eq!(pool.options().get_max_connections(), 1);
    }

    #[tokio::test]
    async fn closed_pool_fails_ping() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        pool.close().await;
        assert!(ping(&pool).await.is_err());
    }
}
