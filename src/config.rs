//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// JSON file backing the record store, in-memory when unset
    pub store_path: Option<PathBuf>,
    /// Namespace applied to requests that don't name one
    pub default_namespace: Option<String>,
    /// Serialize writers per storage key
    pub key_locking: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `STORE_PATH` - Record store file (default: unset, in-memory)
    /// - `DEFAULT_NAMESPACE` - Namespace for requests without one (default: unset)
    /// - `KEY_LOCKING` - `true`/`1` to guard writes per key (default: false)
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            store_path: non_empty_var("STORE_PATH").map(PathBuf::from),
            default_namespace: non_empty_var("DEFAULT_NAMESPACE"),
            key_locking: env::var("KEY_LOCKING")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            store_path: None,
            default_namespace: None,
            key_locking: false,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert!(config.store_path.is_none());
        assert!(!config.key_locking);
    }

    #[test]
    fn test_config_from_env() {
        // One test owns these variables so parallel tests don't interfere
        env::remove_var("SERVER_PORT");
        env::remove_var("STORE_PATH");
        env::remove_var("DEFAULT_NAMESPACE");
        env::remove_var("KEY_LOCKING");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert!(config.store_path.is_none());
        assert!(config.default_namespace.is_none());
        assert!(!config.key_locking);

        env::set_var("SERVER_PORT", "8080");
        env::set_var("STORE_PATH", "/tmp/cache.json");
        env::set_var("DEFAULT_NAMESPACE", "app:");
        env::set_var("KEY_LOCKING", "TRUE");

        let config = Config::from_env();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.store_path, Some(PathBuf::from("/tmp/cache.json")));
        assert_eq!(config.default_namespace.as_deref(), Some("app:"));
        assert!(config.key_locking);

        env::set_var("SERVER_PORT", "not a port");
        env::set_var("STORE_PATH", "");
        assert_eq!(Config::from_env().server_port, 3000);
        assert!(Config::from_env().store_path.is_none());

        env::remove_var("SERVER_PORT");
        env::remove_var("STORE_PATH");
        env::remove_var("DEFAULT_NAMESPACE");
        env::remove_var("KEY_LOCKING");
    }
}
