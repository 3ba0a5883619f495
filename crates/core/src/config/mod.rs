//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Well-known cache variables (REDIS_URL, MEMCACHED_URL, CACHE_EXPIRE, ...)
//! 2. Environment variables (HUBBLE_*)
//! 3. TOML config file (if HUBBLE_CONFIG_FILE set)
//! 4. Built-in defaults

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::cache::{BackendConfig, Cache, CacheSettings, MemcachedEndpoint, MemcachedStore, RedisEndpoint, RedisStore};

mod validation;

pub use validation::ConfigError;

/// Aliases accepted for the Redis URL, lowest precedence first.
const REDIS_URL_ALIASES: &[&str] = &["REDISTOGO_URL", "REDISCLOUD_URL"];

/// Longest relative TTL memcached accepts; larger values are read as a unix timestamp.
const MAX_CACHE_EXPIRE_SECS: u64 = 30 * 24 * 60 * 60;

/// Longest cache read timeout accepted.
const MAX_CACHE_TIMEOUT_DELAY_MS: u64 = 60_000;

/// Unprefixed variables read verbatim, as hosted platforms inject them.
const WELL_KNOWN_VARS: &[&str] = &["REDIS_URL", "MEMCACHED_URL", "CACHE_EXPIRE", "CACHE_TIMEOUT_DELAY_MS"];

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. `REDIS_URL` / `REDISCLOUD_URL` / `REDISTOGO_URL`, `MEMCACHED_URL`,
///    `CACHE_EXPIRE`, `CACHE_TIMEOUT_DELAY_MS`
/// 2. Environment variables (HUBBLE_*)
/// 3. TOML config file (if HUBBLE_CONFIG_FILE set)
/// 4. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Redis endpoint URL. Selects the Redis cache backend.
    ///
    /// Set via REDIS_URL (or REDISCLOUD_URL / REDISTOGO_URL).
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Comma-separated memcached `host:port` list. Selects the Memcached backend.
    ///
    /// Set via MEMCACHED_URL environment variable.
    #[serde(default)]
    pub memcached_url: Option<String>,

    /// Seconds a cached record stays retrievable.
    ///
    /// Set via CACHE_EXPIRE environment variable.
    #[serde(default = "default_cache_expire")]
    pub cache_expire: u64,

    /// Upper bound on a cache read in milliseconds.
    ///
    /// Set via CACHE_TIMEOUT_DELAY_MS environment variable.
    #[serde(default = "default_cache_timeout_delay_ms")]
    pub cache_timeout_delay_ms: u64,

    /// Consecutive transient backend failures before the cache is disabled.
    /// Zero keeps the backend regardless of transient failures.
    ///
    /// Set via HUBBLE_CACHE_FAILURE_THRESHOLD environment variable.
    #[serde(default = "default_cache_failure_threshold")]
    pub cache_failure_threshold: u32,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via HUBBLE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via HUBBLE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via HUBBLE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of redirects followed per request.
    ///
    /// Set via HUBBLE_MAX_REDIRECTS environment variable.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_cache_expire() -> u64 {
    60 * 60 // one hour
}

fn default_cache_timeout_delay_ms() -> u64 {
    200
}

fn default_cache_failure_threshold() -> u32 {
    5
}

fn default_user_agent() -> String {
    "hubble/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_redirects() -> usize {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            memcached_url: None,
            cache_expire: default_cache_expire(),
            cache_timeout_delay_ms: default_cache_timeout_delay_ms(),
            cache_failure_threshold: default_cache_failure_threshold(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("HUBBLE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("HUBBLE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        for alias in REDIS_URL_ALIASES.iter().copied() {
            figment = figment.merge(Env::raw().only(&[alias]).map(|_| "redis_url".into()));
        }
        figment = figment.merge(Env::raw().only(WELL_KNOWN_VARS).map(|key| key.as_str().to_lowercase().into()));

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Cache tuning derived from this configuration.
    ///
    /// Out-of-range values never stop the service: zero falls back to the
    /// default and values above the maximum are clamped, with a warning.
    pub fn cache_settings(&self) -> CacheSettings {
        let expire = match self.cache_expire {
            0 => {
                warn!("cache_expire must be greater than 0, using the default");
                default_cache_expire()
            }
            secs if secs > MAX_CACHE_EXPIRE_SECS => {
                warn!(cache_expire = secs, max = MAX_CACHE_EXPIRE_SECS, "cache_expire exceeds 30 days, clamping");
                MAX_CACHE_EXPIRE_SECS
            }
            secs => secs,
        };

        let read_timeout = match self.cache_timeout_delay_ms {
            0 => {
                warn!("cache_timeout_delay_ms must be greater than 0, using the default");
                default_cache_timeout_delay_ms()
            }
            ms if ms > MAX_CACHE_TIMEOUT_DELAY_MS => {
                warn!(
                    cache_timeout_delay_ms = ms,
                    max = MAX_CACHE_TIMEOUT_DELAY_MS,
                    "cache_timeout_delay_ms exceeds 60 seconds, clamping"
                );
                MAX_CACHE_TIMEOUT_DELAY_MS
            }
            ms => ms,
        };

        CacheSettings {
            expire: Duration::from_secs(expire),
            read_timeout: Duration::from_millis(read_timeout),
            failure_threshold: self.cache_failure_threshold,
        }
    }

    /// Build the process-wide cache and start connecting it.
    ///
    /// A backend URL that cannot be parsed is logged and leaves the cache
    /// failed; the service keeps running without it.
    pub fn connect_cache(&self) -> Cache {
        let settings = self.cache_settings();
        match self.cache_backend() {
            Ok(backend) => Cache::connect(backend, settings),
            Err(e) => {
                let backend = match non_empty(self.redis_url.as_deref()) {
                    Some(_) => RedisStore::NAME,
                    None => MemcachedStore::NAME,
                };
                error!(backend = backend, error = %e, "Invalid cache backend, continuing without cache");
                Cache::failed(backend, settings)
            }
        }
    }

    /// Select the cache backend.
    ///
    /// Redis wins when both backends are configured. Returns `None` when
    /// neither is set, which runs the service without a cache.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the selected backend URL cannot be parsed.
    pub fn cache_backend(&self) -> Result<Option<BackendConfig>, ConfigError> {
        if let Some(raw) = non_empty(self.redis_url.as_deref()) {
            let endpoint = RedisEndpoint::parse(raw)
                .map_err(|reason| ConfigError::Invalid { field: "redis_url".into(), reason })?;
            return Ok(Some(BackendConfig::Redis(endpoint)));
        }

        if let Some(raw) = non_empty(self.memcached_url.as_deref()) {
            let endpoints = MemcachedEndpoint::parse_list(raw)
                .map_err(|reason| ConfigError::Invalid { field: "memcached_url".into(), reason })?;
            return Ok(Some(BackendConfig::Memcached(endpoints)));
        }

        Ok(None)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::BackendState;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.redis_url.is_none());
        assert!(config.memcached_url.is_none());
        assert_eq!(config.cache_expire, 3600);
        assert_eq!(config.cache_timeout_delay_ms, 200);
        assert_eq!(config.cache_failure_threshold, 5);
        assert_eq!(config.user_agent, "hubble/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.max_redirects, 10);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_cache_settings() {
        let config = AppConfig { cache_expire: 60, cache_timeout_delay_ms: 50, ..Default::default() };
        let settings = config.cache_settings();
        assert_eq!(settings.expire, Duration::from_secs(60));
        assert_eq!(settings.read_timeout, Duration::from_millis(50));
        assert_eq!(settings.failure_threshold, 5);
    }

    #[test]
    fn test_cache_settings_out_of_range() {
        let config = AppConfig { cache_expire: 0, cache_timeout_delay_ms: 0, ..Default::default() };
        let settings = config.cache_settings();
        assert_eq!(settings.expire, Duration::from_secs(3600));
        assert_eq!(settings.read_timeout, Duration::from_millis(200));

        let config = AppConfig {
            cache_expire: MAX_CACHE_EXPIRE_SECS + 1,
            cache_timeout_delay_ms: MAX_CACHE_TIMEOUT_DELAY_MS + 1,
            ..Default::default()
        };
        let settings = config.cache_settings();
        assert_eq!(settings.expire, Duration::from_secs(MAX_CACHE_EXPIRE_SECS));
        assert_eq!(settings.read_timeout, Duration::from_millis(MAX_CACHE_TIMEOUT_DELAY_MS));
    }

    #[test]
    fn test_connect_cache_invalid_url_runs_without_cache() {
        let config = AppConfig { redis_url: Some("redis://host:notaport".into()), ..Default::default() };
        let cache = config.connect_cache();
        assert_eq!(cache.state(), BackendState::Failed);
        assert_eq!(cache.backend(), Some("redis"));

        let config = AppConfig { memcached_url: Some("mc1:eleven".into()), ..Default::default() };
        let cache = config.connect_cache();
        assert_eq!(cache.state(), BackendState::Failed);
        assert_eq!(cache.backend(), Some("memcached"));
    }

    #[test]
    fn test_connect_cache_without_backend() {
        let cache = AppConfig::default().connect_cache();
        assert_eq!(cache.state(), BackendState::Unconfigured);
    }

    #[test]
    fn test_cache_backend_none() {
        let config = AppConfig::default();
        assert!(config.cache_backend().unwrap().is_none());
    }

    #[test]
    fn test_cache_backend_blank_url_is_none() {
        let config = AppConfig { redis_url: Some("  ".into()), ..Default::default() };
        assert!(config.cache_backend().unwrap().is_none());
    }

    #[test]
    fn test_cache_backend_redis_wins() {
        let config = AppConfig {
            redis_url: Some("redis://cache.internal:6380".into()),
            memcached_url: Some("mc1:11211".into()),
            ..Default::default()
        };
        assert!(matches!(config.cache_backend().unwrap(), Some(BackendConfig::Redis(_))));
    }

    #[test]
    fn test_cache_backend_memcached() {
        let config = AppConfig { memcached_url: Some("mc1:11211,mc2".into()), ..Default::default() };
        match config.cache_backend().unwrap() {
            Some(BackendConfig::Memcached(endpoints)) => assert_eq!(endpoints.len(), 2),
            other => panic!("expected memcached backend, got {other:?}"),
        }
    }

    #[test]
    fn test_cache_backend_invalid_redis_url() {
        let config = AppConfig { redis_url: Some("redis://host:notaport".into()), ..Default::default() };
        let result = config.cache_backend();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "redis_url"));
    }

    #[test]
    fn test_load_well_known_variables() {
        Jail::expect_with(|jail| {
            jail.set_env("MEMCACHED_URL", "mc1:11211");
            jail.set_env("CACHE_EXPIRE", "120");
            jail.set_env("CACHE_TIMEOUT_DELAY_MS", "75");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.memcached_url.as_deref(), Some("mc1:11211"));
            assert_eq!(config.cache_expire, 120);
            assert_eq!(config.cache_timeout_delay_ms, 75);
            Ok(())
        });
    }

    #[test]
    fn test_load_redis_alias_precedence() {
        Jail::expect_with(|jail| {
            jail.set_env("REDISTOGO_URL", "redis://togo:6379");
            jail.set_env("REDISCLOUD_URL", "redis://cloud:6379");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.redis_url.as_deref(), Some("redis://cloud:6379"));

            jail.set_env("REDIS_URL", "redis://primary:6379");
            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.redis_url.as_deref(), Some("redis://primary:6379"));
            Ok(())
        });
    }

    #[test]
    fn test_load_prefixed_and_file() {
        Jail::expect_with(|jail| {
            jail.create_file("hubble.toml", "user_agent = \"from-file\"\ncache_expire = 30\n")?;
            jail.set_env("HUBBLE_CONFIG_FILE", "hubble.toml");
            jail.set_env("HUBBLE_CACHE_EXPIRE", "90");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.user_agent, "from-file");
            assert_eq!(config.cache_expire, 90);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        Jail::expect_with(|jail| {
            jail.set_env("HUBBLE_TIMEOUT_MS", "50");
            assert!(matches!(AppConfig::load(), Err(ConfigError::Invalid { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_load_tolerates_bad_cache_settings() {
        Jail::expect_with(|jail| {
            jail.set_env("CACHE_TIMEOUT_DELAY_MS", "0");
            jail.set_env("CACHE_EXPIRE", "99999999");
            jail.set_env("REDIS_URL", "redis://host:notaport");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.cache_settings().read_timeout, Duration::from_millis(200));
            assert_eq!(config.cache_settings().expire, Duration::from_secs(MAX_CACHE_EXPIRE_SECS));
            assert_eq!(config.connect_cache().state(), BackendState::Failed);
            Ok(())
        });
    }
}
