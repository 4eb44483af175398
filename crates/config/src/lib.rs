use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "hearth.toml",
    "config/hearth.toml",
    "crates/config/hearth.toml",
    "../hearth.toml",
    "../config/hearth.toml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://hearth.db".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret the account service signs credentials with.
    pub jwt_secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-in-production".to_string(),
        }
    }
}

/// Settings for the external push gateway.
///
/// ```
/// use hearth_config::PushConfig;
///
/// let push = PushConfig::default();
/// assert_eq!(push.endpoint, "https://exp.host/--/api/v2/push/send");
/// assert_eq!(push.timeout_seconds, 4);
/// assert!(push.enabled);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    #[serde(default = "PushConfig::default_endpoint")]
    pub endpoint: String,
    #[serde(default = "PushConfig::default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "PushConfig::default_enabled")]
    pub enabled: bool,
}

impl PushConfig {
    fn default_endpoint() -> String {
        "https://exp.host/--/api/v2/push/send".to_string()
    }

    const fn default_timeout() -> u64 {
        4
    }

    const fn default_enabled() -> bool {
        true
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            endpoint: Self::default_endpoint(),
            timeout_seconds: Self::default_timeout(),
            enabled: Self::default_enabled(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Bound on each session's outbound delivery queue.
    #[serde(default = "RealtimeConfig::default_queue_capacity")]
    pub session_queue_capacity: usize,
    /// Seconds of transport silence before a session is force-disconnected.
    #[serde(default = "RealtimeConfig::default_idle_timeout")]
    pub idle_timeout_seconds: u64,
}

impl RealtimeConfig {
    const fn default_queue_capacity() -> usize {
        64
    }

    const fn default_idle_timeout() -> u64 {
        60
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            session_queue_capacity: Self::default_queue_capacity(),
            idle_timeout_seconds: Self::default_idle_timeout(),
        }
    }
}

/// Load the application configuration by combining defaults, an optional
/// file, and environment overrides.
///
/// ```
/// use hearth_config::load;
///
/// std::env::remove_var("HEARTH_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())
        .unwrap()
        .set_default("http.port", i64::from(defaults.http.port))
        .unwrap()
        .set_default("database.url", defaults.database.url.clone())
        .unwrap()
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )
        .unwrap()
        .set_default("auth.jwt_secret", defaults.auth.jwt_secret.clone())
        .unwrap()
        .set_default("push.endpoint", defaults.push.endpoint.clone())
        .unwrap()
        .set_default(
            "push.timeout_seconds",
            i64::try_from(defaults.push.timeout_seconds).unwrap_or(i64::MAX),
        )
        .unwrap()
        .set_default("push.enabled", defaults.push.enabled)
        .unwrap()
        .set_default(
            "realtime.session_queue_capacity",
            i64::try_from(defaults.realtime.session_queue_capacity).unwrap_or(i64::MAX),
        )
        .unwrap()
        .set_default(
            "realtime.idle_timeout_seconds",
            i64::try_from(defaults.realtime.idle_timeout_seconds).unwrap_or(i64::MAX),
        )
        .unwrap();

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("HEARTH_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via HEARTH_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(
        config::Environment::with_prefix("HEARTH")
            .separator("__")
            .try_parsing(true),
    );

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    debug!(?config, "loaded backend configuration");
    Ok(config)
}
