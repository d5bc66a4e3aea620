use std::str::FromStr;

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::debug;

use crate::{
    Result,
    config::Config,
    networks::{Messenger, NetworkKind, Social},
    profiles::WEBSITE_PROFILES,
};

pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    init_schema(&db_pool).await?;
    Ok(db_pool)
}

pub async fn init_schema(db_pool: &SqlitePool) -> Result<()> {
    let mut statements = Vec::new();
    statements.extend(network_tables::<Social>());
    statements.extend(network_tables::<Messenger>());
    statements.push(format!(
        "CREATE TABLE IF NOT EXISTS {WEBSITE_PROFILES} (
            uuid TEXT PRIMARY KEY NOT NULL,
            host_kind TEXT NOT NULL,
            host_id INTEGER NOT NULL CHECK (host_id >= 0),
            name TEXT NOT NULL,
            url TEXT NOT NULL,
            date_added TEXT NOT NULL,
            date_verified TEXT NOT NULL,
            is_verified BOOLEAN NOT NULL DEFAULT 0
        )"
    ));
    statements.push(host_index(WEBSITE_PROFILES));

    for stmt in &statements {
        sqlx::query(stmt).execute(db_pool).await?;
    }

    debug!(statements = statements.len(), "schema ready");
    Ok(())
}

fn network_tables<K: NetworkKind>() -> [String; 3] {
    let (networks, profiles) = (K::TABLE, K::PROFILE_TABLE);
    [
        format!(
            "CREATE TABLE IF NOT EXISTS {networks} (
                uuid TEXT PRIMARY KEY NOT NULL,
                name TEXT NOT NULL,
                url TEXT NOT NULL,
                identifier TEXT NOT NULL,
                icon TEXT
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {profiles} (
                uuid TEXT PRIMARY KEY NOT NULL,
                host_kind TEXT NOT NULL,
                host_id INTEGER NOT NULL CHECK (host_id >= 0),
                network_id TEXT NOT NULL REFERENCES {networks}(uuid) ON DELETE CASCADE,
                username TEXT NOT NULL,
                date_added TEXT NOT NULL,
                date_verified TEXT NOT NULL,
                is_verified BOOLEAN NOT NULL DEFAULT 0
            )"
        ),
        host_index(profiles),
    ]
}

fn host_index(table: &str) -> String {
    format!("CREATE INDEX IF NOT EXISTS {table}_host ON {table} (host_kind, host_id)")
}

/// Single-connection in-memory pool with the schema applied.
#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();

    init_schema(&db_pool).await.unwrap();
    db_pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_is_idempotent() {
        let db_pool = memory_pool().await;
        init_schema(&db_pool).await.unwrap();

        let tables: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
                .fetch_all(&db_pool)
                .await
                .unwrap();
        let tables: Vec<_> = tables.into_iter().map(|(name,)| name).collect();
        assert_eq!(
            tables,
            [
                "instant_messenger_profiles",
                "instant_messengers",
                "social_network_profiles",
                "social_networks",
                "website_profiles",
            ]
        );
    }
}
