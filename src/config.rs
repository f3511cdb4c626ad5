//! Configuration Module
//!
//! Loads accessor, cache and server settings from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::accessor::AccessorOptions;
use crate::codec::KeyCodec;

/// Runtime configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Whether reads consult the cache at all
    pub cache_enabled: bool,
    /// TTL in seconds for populated entries
    pub default_ttl: u64,
    /// Deadline in milliseconds for each cache call
    pub cache_timeout_ms: u64,
    /// Deadline in milliseconds for each store fetch
    pub store_timeout_ms: u64,
    /// Maximum number of entries the in-memory cache can hold
    pub max_entries: usize,
    /// Optional prefix for every cache key
    pub key_namespace: Option<String>,
    /// HTTP server port
    pub server_port: u16,
    /// Expired-entry sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_ENABLED` - Consult the cache: true/false, 1/0, yes/no, on/off (default: true)
    /// - `DEFAULT_TTL` - TTL in seconds (default: 3600)
    /// - `CACHE_TIMEOUT_MS` - Cache call deadline (default: 250)
    /// - `STORE_TIMEOUT_MS` - Store fetch deadline (default: 5000)
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `KEY_NAMESPACE` - Cache key prefix (default: none)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            cache_enabled: env_flag("CACHE_ENABLED", defaults.cache_enabled),
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl),
            cache_timeout_ms: env_or("CACHE_TIMEOUT_MS", defaults.cache_timeout_ms),
            store_timeout_ms: env_or("STORE_TIMEOUT_MS", defaults.store_timeout_ms),
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            key_namespace: env::var("KEY_NAMESPACE").ok().filter(|ns| !ns.is_empty()),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }

    pub fn accessor_options(&self) -> AccessorOptions {
        AccessorOptions {
            default_ttl: Duration::from_secs(self.default_ttl),
            cache_timeout: Duration::from_millis(self.cache_timeout_ms),
            store_timeout: Duration::from_millis(self.store_timeout_ms),
        }
    }

    pub fn key_codec(&self) -> KeyCodec {
        match &self.key_namespace {
            Some(ns) => KeyCodec::with_namespace(ns.clone()),
            None => KeyCodec::new(),
        }
    }
}

/// Parses `name`, falling back to `default` when unset or unparsable.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Reads a boolean switch. Unrecognized values keep `default` and are logged.
fn env_flag(name: &str, default: bool) -> bool {
    let Ok(raw) = env::var(name) else {
        return default;
    };

    match parse_flag(&raw) {
        Some(flag) => flag,
        None => {
            warn!(var = name, value = %raw, default, "unrecognized boolean, using default");
            default
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            default_ttl: 3600,
            cache_timeout_ms: 250,
            store_timeout_ms: 5000,
            max_entries: 1000,
            key_namespace: None,
            server_port: 3000,
            cleanup_interval: 1,
        }
    }
}
