pub mod pool;
pub mod sql;

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use sqlx::{PgPool, SqlitePool};

use crate::config::{Config, Environment};
use crate::repositories::{DiaryRepository, UserRepository};
use sql::{PgDiaryRepository, PgUserRepository, SqliteDiaryRepository, SqliteUserRepository};

pub const IN_MEMORY_SQLITE: &str = "sqlite::memory:";

/// Connection pool for whichever backend the environment selected.
#[derive(Clone)]
pub enum Database {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

impl Database {
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        if let Some(url) = &config.database_url {
            return Self::connect_url(url, config.db_max_connections).await;
        }

        match config.environment {
            Environment::Prod => {
                let pg = &config.postgres;
                let options = PgConnectOptions::new()
                    .host(&pg.host)
                    .port(pg.port)
                    .username(&pg.user)
                    .password(&pg.password)
                    .database(&pg.name)
                    .ssl_mode(PgSslMode::Require);
                let pool = pool::create_pg_pool(options, config.db_max_connections).await?;
                Ok(Self::Postgres(pool))
            }
            Environment::Dev => Self::connect_url(IN_MEMORY_SQLITE, 1).await,
        }
    }

    /// Connect by url; the scheme picks the backend.
    pub async fn connect_url(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let scheme = url.split(':').next().unwrap_or_default();
        match scheme {
            "sqlite" => Ok(Self::Sqlite(pool::create_sqlite_pool(url).await?)),
            "postgres" | "postgresql" => {
                let options = PgConnectOptions::from_str(url).context("Invalid PostgreSQL url")?;
                Ok(Self::Postgres(
                    pool::create_pg_pool(options, max_connections).await?,
                ))
            }
            other => bail!("Unknown database type `{}`", other),
        }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        match self {
            Self::Postgres(pool) => sqlx::migrate!("./migrations/postgres")
                .run(pool)
                .await
                .context("Failed to run PostgreSQL migrations")?,
            Self::Sqlite(pool) => sqlx::migrate!("./migrations/sqlite")
                .run(pool)
                .await
                .context("Failed to run SQLite migrations")?,
        }
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        match self {
            Self::Postgres(pool) => sqlx::query_scalar::<_, i32>("SELECT 1")
                .fetch_one(pool)
                .await
                .map(|_| ()),
            Self::Sqlite(pool) => sqlx::query_scalar::<_, i32>("SELECT 1")
                .fetch_one(pool)
                .await
                .map(|_| ()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Sqlite(_) => "sqlite",
        }
    }

    pub fn diary_repository(&self) -> Arc<dyn DiaryRepository> {
        match self {
            Self::Postgres(pool) => Arc::new(PgDiaryRepository::new(pool.clone())),
            Self::Sqlite(pool) => Arc::new(SqliteDiaryRepository::new(pool.clone())),
        }
    }

    pub fn user_repository(&self) -> Arc<dyn UserRepository> {
        match self {
            Self::Postgres(pool) => Arc::new(PgUserRepository::new(pool.clone())),
            Self::Sqlite(pool) => Arc::new(SqliteUserRepository::new(pool.clone())),
        }
    }
}

#[cfg(test)]
pub(crate) async fn migrated_sqlite() -> Database {
    let db = Database::connect_url(IN_MEMORY_SQLITE, 1)
        .await
        .expect("in-memory sqlite");
    db.migrate().await.expect("sqlite migrations");
    db
}
