use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow::anyhow!("unknown STORAGE_BACKEND: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(anyhow::anyhow!("unknown LOG_FORMAT: {}", other)),
        }
    }
}

pub const DEFAULT_LOG_FILTER: &str = "info,blog_publisher=debug";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub cors_origins: Vec<String>,
    pub log_filter: String,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".into());
        let port = lookup("PORT")
            .unwrap_or_else(|| "8080".into())
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("invalid PORT: {}", e))?;
        let storage = lookup("STORAGE_BACKEND")
            .map(|value| value.parse::<StorageBackend>())
            .transpose()?
            .unwrap_or(StorageBackend::Postgres);
        let database_url = lookup("DATABASE_URL");
        if storage == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set");
        }
        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "20".into())
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("invalid DATABASE_MAX_CONNECTIONS: {}", e))?;
        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let log_filter = lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.into());
        let log_format = lookup("LOG_FORMAT")
            .map(|value| value.parse::<LogFormat>())
            .transpose()?
            .unwrap_or(LogFormat::Json);

        Ok(Self {
            host,
            port,
            storage,
            database_url,
            database_max_connections,
            cors_origins,
            log_filter,
            log_format,
        })
    }
}
