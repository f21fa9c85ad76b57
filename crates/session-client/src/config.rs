//! Configuration types and loading
//!
//! Config precedence: env vars > config file > defaults. A pinned API
//! token comes from the SESSION_API_TOKEN env var only, never from the
//! TOML directly, to keep secrets out of checked-in files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use common::Secret;
use serde::Deserialize;

/// Root configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Backend endpoint settings.
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Pinned access token from SESSION_API_TOKEN, for service-to-service
    /// callers that resolved credentials out of band.
    #[serde(skip)]
    pub pinned_token: Option<Secret<String>>,
}

impl ApiConfig {
    /// Transport timeout for the underlying HTTP client.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Credential persistence settings. No path means process-memory only.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// TTL cache settings for read-aggregation callers. Zero disables caching.
#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_cache_ttl() -> u64 {
    60
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment
    /// variables.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if !config.api.base_url.starts_with("http://")
            && !config.api.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                config.api.base_url
            )));
        }

        if config.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if let Ok(token) = std::env::var("SESSION_API_TOKEN") {
            let token = token.trim().to_owned();
            if !token.is_empty() {
                config.api.pinned_token = Some(Secret::new(token));
            }
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("session-client.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize tests that mutate environment variables,
    /// preventing data races when tests run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn valid_toml() -> &'static str {
        r#"
[api]
base_url = "https://api.talentflow.dev"

[credentials]
path = "/var/lib/talentflow/session.json"

[cache]
ttl_secs = 30
"#
    }

    fn write_config(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("session-client-test-{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn load_valid_config_applies_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("SESSION_API_TOKEN") };
        let path = write_config("valid", valid_toml());

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api.base_url, "https://api.talentflow.dev");
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.api.pinned_token.is_none());
        assert_eq!(
            config.credentials.path.as_deref(),
            Some(Path::new("/var/lib/talentflow/session.json"))
        );
        assert_eq!(config.cache.ttl(), Duration::from_secs(30));
    }

    #[test]
    fn minimal_config_uses_all_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("SESSION_API_TOKEN") };
        let path = write_config(
            "minimal",
            "[api]\nbase_url = \"http://localhost:3000\"\n",
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.credentials.path.is_none());
        assert_eq!(config.cache.ttl_secs, 60);
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = Config::load(Path::new("/nonexistent/session-client.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn invalid_scheme_is_rejected() {
        let path = write_config("scheme", "[api]\nbase_url = \"ftp://api.example\"\n");
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("base_url"), "got: {err}");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let path = write_config(
            "timeout",
            "[api]\nbase_url = \"https://api.example\"\ntimeout_secs = 0\n",
        );
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"), "got: {err}");
    }

    #[test]
    fn env_token_overlays_config() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let path = write_config("env-token", valid_toml());

        unsafe { set_env("SESSION_API_TOKEN", "at_pinned") };
        let config = Config::load(&path).unwrap();
        unsafe { remove_env("SESSION_API_TOKEN") };

        assert_eq!(
            config.api.pinned_token.as_ref().map(|t| t.expose().as_str()),
            Some("at_pinned")
        );
    }

    #[test]
    fn resolve_path_prefers_cli_then_env() {
        let _lock = ENV_MUTEX.lock().unwrap();

        assert_eq!(
            Config::resolve_path(Some("/etc/cli.toml")),
            PathBuf::from("/etc/cli.toml")
        );

        unsafe { set_env("CONFIG_PATH", "/etc/env.toml") };
        assert_eq!(Config::resolve_path(None), PathBuf::from("/etc/env.toml"));
        unsafe { remove_env("CONFIG_PATH") };

        assert_eq!(
            Config::resolve_path(None),
            PathBuf::from("session-client.toml")
        );
    }
}
