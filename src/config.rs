//! Configuration management for the sync runner

use serde::Deserialize;
use std::env;

use crate::error::{Result, SyncError};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub remote: RemoteConfig,
    pub sync: SyncSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Backing database for the SQLite document store
    pub url: String,
    /// Top-level collection holding tenants
    pub tenants_collection: String,
    /// The single tenant this device syncs against
    pub tenant_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncSettings {
    pub mode: SyncMode,
    /// Read back pushed documents to adopt the server timestamp locally
    pub read_back_timestamps: bool,
    /// `host:port` used by the TCP connectivity probe. `None` assumes online.
    pub probe_addr: Option<String>,
    pub probe_timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    Pull,
    Push,
    Both,
}

impl SyncMode {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "pull" => Ok(SyncMode::Pull),
            "push" => Ok(SyncMode::Push),
            "both" | "bidirectional" => Ok(SyncMode::Both),
            other => Err(SyncError::Config(format!("unknown SYNC_MODE '{}'", other))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: DatabaseConfig {
                url: "sqlite:./rental.db".to_string(),
            },
            remote: RemoteConfig {
                url: "sqlite:./remote.db".to_string(),
                tenants_collection: "companies".to_string(),
                tenant_id: "company_001".to_string(),
            },
            sync: SyncSettings {
                mode: SyncMode::Both,
                read_back_timestamps: true,
                probe_addr: None,
                probe_timeout_ms: 1500,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let mode = match env::var("SYNC_MODE") {
            Ok(value) => SyncMode::parse(&value)?,
            Err(_) => defaults.sync.mode,
        };

        let read_back_timestamps = match env::var("SYNC_READ_BACK_TIMESTAMPS") {
            Ok(value) => parse_bool(&value).ok_or_else(|| {
                SyncError::Config(format!("SYNC_READ_BACK_TIMESTAMPS must be a boolean, got '{}'", value))
            })?,
            Err(_) => defaults.sync.read_back_timestamps,
        };

        let tenant_id = env::var("SYNC_TENANT_ID").unwrap_or(defaults.remote.tenant_id);
        if tenant_id.trim().is_empty() || tenant_id.contains('/') {
            return Err(SyncError::Config(format!("invalid SYNC_TENANT_ID '{}'", tenant_id)));
        }

        Ok(Config {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
            },
            remote: RemoteConfig {
                url: env::var("REMOTE_DATABASE_URL").unwrap_or(defaults.remote.url),
                tenants_collection: env::var("SYNC_TENANTS_COLLECTION")
                    .unwrap_or(defaults.remote.tenants_collection),
                tenant_id,
            },
            sync: SyncSettings {
                mode,
                read_back_timestamps,
                probe_addr: env::var("SYNC_PROBE_ADDR").ok().filter(|a| !a.trim().is_empty()),
                probe_timeout_ms: env::var("SYNC_PROBE_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.sync.probe_timeout_ms),
            },
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_mode_parsing() {
        assert_eq!(SyncMode::parse("pull").unwrap(), SyncMode::Pull);
        assert_eq!(SyncMode::parse("PUSH").unwrap(), SyncMode::Push);
        assert_eq!(SyncMode::parse("bidirectional").unwrap(), SyncMode::Both);
        assert!(SyncMode::parse("sideways").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool(" 0 "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_defaults_use_single_tenant() {
        let config = Config::default();
        assert_eq!(config.remote.tenants_collection, "companies");
        assert_eq!(config.remote.tenant_id, "company_001");
        assert!(config.sync.read_back_timestamps);
    }
}
