use std::env;
use std::str::FromStr;

use anyhow::{Context, anyhow, bail};

use crate::workflow::QuotaYear;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    MySql,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(StorageBackend::MySql),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("unknown storage backend `{other}` (expected mysql or memory)")),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub storage: StorageBackend,
    /// Required only for the MySQL backend.
    pub database_url: Option<String>,
    pub jwt_secret: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,
    pub quota_year: QuotaYear,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let storage: StorageBackend = optional("STORAGE_BACKEND")
            .unwrap_or_else(|| "mysql".to_string())
            .parse()?;

        let database_url = optional("DATABASE_URL");
        if storage == StorageBackend::MySql && database_url.is_none() {
            bail!("DATABASE_URL must be set when STORAGE_BACKEND is mysql");
        }

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            storage,
            database_url,
            jwt_secret: required("JWT_SECRET")?,
            rate_protected_per_min: parsed("RATE_PROTECTED_PER_MIN", 1000)?,
            api_prefix: optional("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            log_dir: optional("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            quota_year: parse_quota_year(optional("LEAVE_QUOTA_YEAR").as_deref())?,
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required(key: &str) -> anyhow::Result<String> {
    optional(key).with_context(|| format!("{key} must be set"))
}

fn parsed<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value `{raw}`")),
        None => Ok(default),
    }
}

/// `request-date` charges the leave's own year; anything else must be a year.
pub fn parse_quota_year(raw: Option<&str>) -> anyhow::Result<QuotaYear> {
    match raw.map(str::trim) {
        None => Ok(QuotaYear::Fixed(2026)),
        Some("request-date") => Ok(QuotaYear::RequestDate),
        Some(year) => year
            .parse()
            .map(QuotaYear::Fixed)
            .with_context(|| format!("LEAVE_QUOTA_YEAR has an invalid value `{year}`")),
    }
}
