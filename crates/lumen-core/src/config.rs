//! Configuration module
//!
//! Environment-driven configuration for the API service: server, database,
//! storage backend selection and upload limits. Values are read once at
//! startup via [`Config::from_env`].

use std::env;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_DB_TIMEOUT_SECS: u64 = 30;
const DEFAULT_UPLOAD_SESSION_TTL_SECS: u64 = 15 * 60;
const DEFAULT_PRESIGN_RATE_LIMIT: u32 = 50;
const DEFAULT_PRESIGN_RATE_WINDOW_SECS: u64 = 60 * 60;

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Local,
}

impl StorageBackend {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "s3" => Some(StorageBackend::S3),
            "local" => Some(StorageBackend::Local),
            _ => None,
        }
    }
}

/// Application configuration, loaded from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    server_port: u16,
    cors_origins: Vec<String>,
    /// Base URL used when building shareable token links.
    app_base_url: String,
    database_url: String,
    db_max_connections: u32,
    db_timeout_seconds: u64,
    storage_backend: StorageBackend,
    s3_bucket: Option<String>,
    s3_region: Option<String>,
    s3_endpoint: Option<String>,
    local_storage_path: Option<String>,
    local_storage_base_url: Option<String>,
    upload_session_ttl_secs: u64,
    presign_rate_limit: u32,
    presign_rate_window_secs: u64,
    environment: String,
}

impl Config {
    /// Load configuration from the environment (reads `.env` when present).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(v) => StorageBackend::parse(&v)
                .ok_or_else(|| anyhow::anyhow!("Invalid STORAGE_BACKEND: {} (expected 's3' or 'local')", v))?,
            Err(_) => StorageBackend::S3,
        };

        let config = Config {
            server_port: parse_var("SERVER_PORT", DEFAULT_PORT)?,
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            database_url,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            db_timeout_seconds: parse_var("DB_TIMEOUT_SECONDS", DEFAULT_DB_TIMEOUT_SECS)?,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok().or_else(|| env::var("AWS_REGION").ok()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            upload_session_ttl_secs: parse_var(
                "UPLOAD_SESSION_TTL_SECS",
                DEFAULT_UPLOAD_SESSION_TTL_SECS,
            )?,
            presign_rate_limit: parse_var("PRESIGN_RATE_LIMIT", DEFAULT_PRESIGN_RATE_LIMIT)?,
            presign_rate_window_secs: parse_var(
                "PRESIGN_RATE_WINDOW_SECS",
                DEFAULT_PRESIGN_RATE_WINDOW_SECS,
            )?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Fail fast on misconfiguration: the selected storage backend must be
    /// fully configured before the server starts accepting uploads.
    fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    anyhow::bail!("S3_BUCKET must be set when STORAGE_BACKEND=s3");
                }
                if self.s3_region.is_none() {
                    anyhow::bail!("S3_REGION or AWS_REGION must be set when STORAGE_BACKEND=s3");
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    anyhow::bail!("LOCAL_STORAGE_PATH must be set when STORAGE_BACKEND=local");
                }
            }
        }
        Ok(())
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn app_base_url(&self) -> &str {
        &self.app_base_url
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.db_timeout_seconds
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.local_storage_base_url.as_deref()
    }

    pub fn upload_session_ttl_secs(&self) -> u64 {
        self.upload_session_ttl_secs
    }

    pub fn presign_rate_limit(&self) -> u32 {
        self.presign_rate_limit
    }

    pub fn presign_rate_window_secs(&self) -> u64 {
        self.presign_rate_window_secs
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, anyhow::Error>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(v) => v
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_storage_backend() {
        assert_eq!(StorageBackend::parse("s3"), Some(StorageBackend::S3));
        assert_eq!(StorageBackend::parse("S3"), Some(StorageBackend::S3));
        assert_eq!(StorageBackend::parse("local"), Some(StorageBackend::Local));
        assert_eq!(StorageBackend::parse("nfs"), None);
    }
}
