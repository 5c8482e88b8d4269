use std::env;
use std::str::FromStr;

use anyhow::{bail, Context};

const DEV_JWT_SECRET: &str = "feelog-dev-secret";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// In-memory SQLite, throwaway data.
    Dev,
    /// PostgreSQL.
    Prod,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" | "local" => Ok(Self::Dev),
            "prod" | "production" => Ok(Self::Prod),
            other => bail!("ENV must be `dev` or `prod`, got `{}`", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresSettings {
    pub host: String,
    pub user: String,
    pub password: String,
    pub name: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    /// Takes precedence over `environment` and `postgres` when set.
    pub database_url: Option<String>,
    pub postgres: PostgresSettings,
    pub db_max_connections: u32,

    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub auth_rate_limit: u32,

    pub jwt_secret: String,
    pub jwt_access_ttl_secs: i64,

    pub openrouter_api_key: Option<String>,
    pub analysis_model: String,
    pub analysis_api_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let environment: Environment = get_or("ENV", "dev").parse()?;

        let jwt_secret = match (get("JWT_SECRET"), environment) {
            (Some(secret), _) => secret,
            (None, Environment::Dev) => {
                tracing::warn!("JWT_SECRET is not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
            (None, Environment::Prod) => bail!("JWT_SECRET must be set when ENV=prod"),
        };

        let cors_origins = get_or("CORS_ORIGIN", "http://localhost:3000")
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Ok(Self {
            environment,
            database_url: get("DATABASE_URL"),
            postgres: PostgresSettings {
                host: get_or("DB_HOST", "localhost"),
                user: get_or("DB_USER", "ginuser"),
                password: get_or("DB_PASSWORD", "ginpassword"),
                name: get_or("DB_NAME", "emotra"),
                port: parse_number(&get_or("DB_PORT", "5432"), "DB_PORT")?,
            },
            db_max_connections: parse_number(
                &get_or("DB_MAX_CONNECTIONS", "20"),
                "DB_MAX_CONNECTIONS",
            )?,

            host: get_or("HOST", "0.0.0.0"),
            port: parse_number(&get_or("PORT", "8080"), "PORT")?,
            cors_origins,
            auth_rate_limit: parse_number(
                &get_or("AUTH_RATE_LIMIT_PER_MINUTE", "20"),
                "AUTH_RATE_LIMIT_PER_MINUTE",
            )?,

            jwt_secret,
            jwt_access_ttl_secs: parse_number(
                &get_or("JWT_ACCESS_TTL_SECS", "86400"),
                "JWT_ACCESS_TTL_SECS",
            )?,

            openrouter_api_key: get("OPENROUTER_API_KEY"),
            analysis_model: get_or("ANALYSIS_MODEL", "deepseek/deepseek-r1-0528-qwen3-8b:free"),
            analysis_api_url: get_or(
                "ANALYSIS_API_URL",
                "https://openrouter.ai/api/v1/chat/completions",
            ),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_number<T>(raw: &str, key: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{} must be a number, got `{}`", key, raw))
}
