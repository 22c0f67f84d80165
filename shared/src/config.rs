use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{Result, ServiceError};

pub const DEFAULT_REDIS_DSN: &str = "redis://redis:6379/0";

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| ServiceError::Config(format!("Invalid {}: {}", key, e))),
        _ => Ok(default),
    }
}

fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok()
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub connect_timeout: Duration,
    pub query_timeout: Duration,
}

impl RedisConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("REDIS_DSN")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REDIS_DSN.to_string());

        Ok(Self {
            url,
            connect_timeout: Duration::from_millis(parse_or(
                &lookup,
                "REDIS_CONNECT_TIMEOUT_MS",
                1000u64,
            )?),
            query_timeout: Duration::from_millis(parse_or(
                &lookup,
                "REDIS_QUERY_TIMEOUT_MS",
                2000u64,
            )?),
        })
    }

    /// DSN with any password replaced, for logging.
    pub fn redacted_url(&self) -> String {
        match (self.url.find("://"), self.url.rfind('@')) {
            (Some(scheme_end), Some(at)) if at > scheme_end => {
                format!("{}://***{}", &self.url[..scheme_end], &self.url[at..])
            }
            _ => self.url.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub name: String,
    pub port: u16,
    pub metrics_port: u16,
    pub metrics_enabled: bool,
}

impl ServiceConfig {
    pub fn from_env(default_name: &str, default_port: u16) -> Result<Self> {
        Self::from_lookup(default_name, default_port, env_lookup)
    }

    pub fn from_lookup<F>(default_name: &str, default_port: u16, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            name: lookup("SERVICE_NAME")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default_name.to_string()),
            port: parse_or(&lookup, "HTTP_PORT", default_port)?,
            metrics_port: parse_or(&lookup, "METRICS_PORT", 9094u16)?,
            metrics_enabled: parse_or(&lookup, "METRICS_ENABLED", true)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RankingConfig {
    pub default_limit: usize,
    pub max_limit: usize,
    pub metadata_concurrency: usize,
    pub mark_synthetic_ts: bool,
    pub request_timeout: Duration,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 1000,
            metadata_concurrency: 8,
            mark_synthetic_ts: false,
            request_timeout: Duration::from_millis(5000),
        }
    }
}

impl RankingConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            default_limit: parse_or(&lookup, "RANKINGS_DEFAULT_LIMIT", defaults.default_limit)?,
            max_limit: parse_or(&lookup, "RANKINGS_MAX_LIMIT", defaults.max_limit)?,
            metadata_concurrency: parse_or(
                &lookup,
                "RANKINGS_METADATA_CONCURRENCY",
                defaults.metadata_concurrency,
            )?,
            mark_synthetic_ts: parse_or(
                &lookup,
                "RANKINGS_MARK_SYNTHETIC_TS",
                defaults.mark_synthetic_ts,
            )?,
            request_timeout: Duration::from_millis(parse_or(
                &lookup,
                "RANKINGS_REQUEST_TIMEOUT_MS",
                defaults.request_timeout.as_millis() as u64,
            )?),
        };

        if config.metadata_concurrency == 0 {
            return Err(ServiceError::Config(
                "RANKINGS_METADATA_CONCURRENCY must be at least 1".to_string(),
            ));
        }
        if config.request_timeout.is_zero() {
            return Err(ServiceError::Config(
                "RANKINGS_REQUEST_TIMEOUT_MS must be greater than 0".to_string(),
            ));
        }
        if config.default_limit > config.max_limit {
            return Err(ServiceError::Config(format!(
                "RANKINGS_DEFAULT_LIMIT ({}) exceeds RANKINGS_MAX_LIMIT ({})",
                config.default_limit, config.max_limit
            )));
        }

        Ok(config)
    }
}
