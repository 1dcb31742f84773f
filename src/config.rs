//! Runtime configuration read from the environment (after `.env` is loaded).

use crate::inventory::listing::DEFAULT_PAGE_SIZE;
use crate::vouchers::{default_aliases, parse_aliases, StatusCatalog, DEFAULT_STATUSES};
use derive_getters::Getters;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid value {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Getters)]
pub struct AppConfig {
    bind_addr: SocketAddr,
    /// `None` selects the in-memory store.
    database_url: Option<String>,
    /// `None` keeps the search index in a temporary directory.
    index_path: Option<PathBuf>,
    page_size: usize,
    migrate_on_start: bool,
    statuses: StatusCatalog,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            index_path: None,
            page_size: DEFAULT_PAGE_SIZE,
            migrate_on_start: false,
            statuses: StatusCatalog::default(),
        }
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(var, raw, "expected true or false")),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from any variable source. Unset or blank variables
    /// take their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let raw_addr = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = raw_addr
            .trim()
            .parse()
            .map_err(|err| ConfigError::invalid("BIND_ADDR", &raw_addr, err))?;

        let page_size = match get("PAGE_SIZE") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                Ok(_) => return Err(ConfigError::invalid("PAGE_SIZE", &raw, "must be positive")),
                Err(err) => return Err(ConfigError::invalid("PAGE_SIZE", &raw, err)),
            },
            None => DEFAULT_PAGE_SIZE,
        };

        let migrate_on_start = match get("MIGRATE_ON_START") {
            Some(raw) => parse_bool("MIGRATE_ON_START", &raw)?,
            None => false,
        };

        let labels: Vec<String> = match get("VOUCHER_STATUSES") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => DEFAULT_STATUSES.iter().map(|s| s.to_string()).collect(),
        };
        let defaults = StatusCatalog::default();
        let statuses = StatusCatalog::new(
            labels,
            match get("VOUCHER_STATUS_ALIASES") {
                Some(raw) => parse_aliases(&raw)
                    .map_err(|reason| ConfigError::invalid("VOUCHER_STATUS_ALIASES", &raw, reason))?,
                None => default_aliases(),
            },
            get("ENTRY_DEFAULT_STATUS").unwrap_or_else(|| defaults.entry_default().to_string()),
            get("EXIT_DEFAULT_STATUS").unwrap_or_else(|| defaults.exit_default().to_string()),
        );

        Ok(Self {
            bind_addr,
            database_url: get("DATABASE_URL"),
            index_path: get("INDEX_PATH").map(PathBuf::from),
            page_size,
            migrate_on_start,
            statuses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_addr().port(), 3000);
        assert_eq!(*config.page_size(), 5);
        assert!(config.database_url().is_none());
        assert!(config.index_path().is_none());
        assert!(!*config.migrate_on_start());
        assert_eq!(config.statuses(), &StatusCatalog::default());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("INDEX_PATH", "/var/lib/onee/index"),
            ("PAGE_SIZE", "20"),
            ("MIGRATE_ON_START", "yes"),
            ("VOUCHER_STATUSES", "Brouillon, Validé"),
            ("VOUCHER_STATUS_ALIASES", "Draft=Brouillon"),
            ("EXIT_DEFAULT_STATUS", "Brouillon"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.database_url().as_deref(), Some("sqlite::memory:"));
        assert_eq!(*config.page_size(), 20);
        assert!(*config.migrate_on_start());
        let statuses = config.statuses();
        assert_eq!(statuses.labels(), ["Brouillon", "Validé"]);
        assert_eq!(statuses.canonical("draft"), "Brouillon");
        assert_eq!(statuses.exit_default(), "Brouillon");
        assert_eq!(statuses.entry_default(), "Complété");
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config = config(&[("DATABASE_URL", "  "), ("PAGE_SIZE", "")]).unwrap();
        assert!(config.database_url().is_none());
        assert_eq!(*config.page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config(&[("PAGE_SIZE", "0")]),
            Err(ConfigError::Invalid { var: "PAGE_SIZE", .. })
        ));
        assert!(matches!(
            config(&[("BIND_ADDR", "nowhere")]),
            Err(ConfigError::Invalid { var: "BIND_ADDR", .. })
        ));
        assert!(matches!(
            config(&[("MIGRATE_ON_START", "maybe")]),
            Err(ConfigError::Invalid { var: "MIGRATE_ON_START", .. })
        ));
        assert!(matches!(
            config(&[("VOUCHER_STATUS_ALIASES", "Pending")]),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
