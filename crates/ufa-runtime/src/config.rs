//! # Runtime Configuration
//!
//! Defaults overlaid with environment variables.
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `UFA_REVALIDATE_UPDATES` | `service.revalidate_updates` | `false` |
//! | `UFA_MAX_PAYLOAD_BYTES` | `service.max_payload_bytes` | 65536 |
//! | `UFA_STORE_PATH` | `store_path` | unset (in-memory) |
//! | `UFA_LOG` | `log_filter` | `info` (falls back to `RUST_LOG`) |

use std::path::PathBuf;

use tracing::warn;
use ufa_chaincode::service::ServiceConfig;

/// Environment variable names.
pub mod env {
    /// Re-validate merged records on update.
    pub const REVALIDATE_UPDATES: &str = "UFA_REVALIDATE_UPDATES";
    /// Payload size limit in bytes.
    pub const MAX_PAYLOAD_BYTES: &str = "UFA_MAX_PAYLOAD_BYTES";
    /// Path of the file-backed store.
    pub const STORE_PATH: &str = "UFA_STORE_PATH";
    /// Log filter directive.
    pub const LOG: &str = "UFA_LOG";
    /// Fallback log filter directive.
    pub const RUST_LOG: &str = "RUST_LOG";
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Chaincode service settings.
    pub service: ServiceConfig,
    /// File-backed store location. `None` keeps state in memory.
    pub store_path: Option<PathBuf>,
    /// `tracing_subscriber::EnvFilter` directive.
    pub log_filter: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            store_path: None,
            log_filter: "info".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(env::REVALIDATE_UPDATES) {
            match parse_flag(&raw) {
                Some(flag) => config.service.revalidate_updates = flag,
                None => warn!(value = %raw, "{} must be true/false", env::REVALIDATE_UPDATES),
            }
        }

        if let Some(raw) = lookup(env::MAX_PAYLOAD_BYTES) {
            match raw.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => config.service.max_payload_bytes = limit,
                _ => warn!(value = %raw, "{} must be a positive integer", env::MAX_PAYLOAD_BYTES),
            }
        }

        if let Some(path) = lookup(env::STORE_PATH).filter(|p| !p.trim().is_empty()) {
            config.store_path = Some(PathBuf::from(path));
        }

        if let Some(filter) = lookup(env::LOG).or_else(|| lookup(env::RUST_LOG)) {
            config.log_filter = filter;
        }

        config
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
