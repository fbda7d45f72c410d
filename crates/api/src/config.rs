use std::env;
use std::str::FromStr;

use coop_cms_core::{DeletePolicy, ServiceSettings};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Where documents are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(()),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    pub store_backend: StoreBackend,
    /// PostgreSQL connection URL. Required for the postgres backend.
    pub database_url: Option<String>,
    /// Maximum database connections in the pool.
    pub db_max_connections: u32,
    /// Minimum database connections in the pool.
    pub db_min_connections: u32,
    /// Event bus channel capacity.
    pub event_bus_capacity: usize,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
    pub delete_policy: DeletePolicy,
    pub default_page_limit: u32,
    pub max_page_limit: u32,
    /// Request body limit in bytes.
    pub max_body_bytes: usize,
    /// Reject patches that change the JSON shape of an existing value.
    pub strict_patch_types: bool,
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &'static str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let store_backend = parse("STORE_BACKEND", var("STORE_BACKEND", "postgres"))?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let config = Self {
            host: var("HOST", "0.0.0.0"),
            port: parse("PORT", var("PORT", "3030"))?,
            store_backend,
            database_url,
            db_max_connections: parse("DB_MAX_CONNECTIONS", var("DB_MAX_CONNECTIONS", "20"))?,
            db_min_connections: parse("DB_MIN_CONNECTIONS", var("DB_MIN_CONNECTIONS", "5"))?,
            event_bus_capacity: parse("EVENT_BUS_CAPACITY", var("EVENT_BUS_CAPACITY", "1024"))?,
            log_level: var("LOG_LEVEL", "info"),
            delete_policy: parse("DELETE_POLICY", var("DELETE_POLICY", "soft"))?,
            default_page_limit: parse("DEFAULT_PAGE_LIMIT", var("DEFAULT_PAGE_LIMIT", "20"))?,
            max_page_limit: parse("MAX_PAGE_LIMIT", var("MAX_PAGE_LIMIT", "100"))?,
            max_body_bytes: parse("MAX_BODY_BYTES", var("MAX_BODY_BYTES", "1048576"))?,
            strict_patch_types: parse("STRICT_PATCH_TYPES", var("STRICT_PATCH_TYPES", "false"))?,
        };

        if config.event_bus_capacity == 0 {
            return Err(ConfigError::Invalid {
                name: "EVENT_BUS_CAPACITY",
                value: "0".to_string(),
            });
        }
        if config.max_page_limit == 0 {
            return Err(ConfigError::Invalid {
                name: "MAX_PAGE_LIMIT",
                value: "0".to_string(),
            });
        }
        Ok(config)
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            delete_policy: self.delete_policy,
            strict_patch_types: self.strict_patch_types,
            default_page_limit: self.default_page_limit,
            max_page_limit: self.max_page_limit,
        }
    }
}

fn parse<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_with_database_url() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/cms")]).unwrap();
        assert_eq!(config.addr(), "0.0.0.0:3030");
        assert_eq!(config.store_backend, StoreBackend::Postgres);
        assert_eq!(config.delete_policy, DeletePolicy::Soft);
        assert_eq!(config.default_page_limit, 20);
        assert_eq!(config.max_page_limit, 100);
        assert!(!config.strict_patch_types);
    }

    #[test]
    fn postgres_requires_database_url() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn memory_backend_needs_no_database() {
        let config = load(&[
            ("STORE_BACKEND", "memory"),
            ("DELETE_POLICY", "hard"),
            ("STRICT_PATCH_TYPES", "true"),
            ("PORT", "8080"),
        ])
        .unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.delete_policy, DeletePolicy::Hard);
        assert!(config.strict_patch_types);
        assert_eq!(config.port, 8080);
        assert!(config.service_settings().strict_patch_types);
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = load(&[("STORE_BACKEND", "memory"), ("PORT", "http")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "PORT",
                value: "http".to_string()
            }
        );

        let err = load(&[("STORE_BACKEND", "mongo")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "STORE_BACKEND", .. }));

        let err = load(&[("STORE_BACKEND", "memory"), ("MAX_PAGE_LIMIT", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "MAX_PAGE_LIMIT", .. }));
    }
}
