//! Shared configuration for geofly hosts.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `geofly_core::FacadeConfig`. The façade itself
//! never reads config files -- hosting applications load a profile here
//! and hand the result in.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use geofly_core::FacadeConfig;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

    #[error("no API key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults, overridable per profile.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named service profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Open the realtime push channel.
    #[serde(default = "default_true")]
    pub realtime: bool,

    /// Re-run the bulk read periodically.
    #[serde(default = "default_true")]
    pub polling: bool,

    /// Seconds between polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Serve the built-in demo dataset instead of the remote.
    #[serde(default)]
    pub use_static_data: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            realtime: true,
            polling: true,
            poll_interval_secs: default_poll_interval(),
            use_static_data: false,
        }
    }
}

fn default_timeout() -> u64 {
    10
}
fn default_poll_interval() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

/// A named service profile.
#[derive(Debug, Deserialize, Serialize)]
pub struct Profile {
    /// Service base URL (e.g., "https://geofence.example.com").
    pub endpoint: String,

    /// API key (plaintext -- prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Override the request timeout.
    pub timeout: Option<u64>,

    /// Override the realtime setting.
    pub realtime: Option<bool>,

    /// Override the polling setting.
    pub polling: Option<bool>,

    /// Override the poll interval.
    pub poll_interval_secs: Option<u64>,

    /// Override the static-data setting.
    pub use_static_data: Option<bool>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("rs", "geofly", "geofly").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("geofly");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from an explicit file + environment.
///
/// Environment variables use the `GEOFLY_` prefix with `_`-separated
/// nesting, e.g. `GEOFLY_DEFAULT_PROFILE`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("GEOFLY_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

/// Serialize config to TOML and write to an explicit path.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve an API key from the credential chain:
/// profile's env var, then the OS keyring, then plaintext config.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's api_key_env → env var lookup
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new("geofly", &format!("{profile_name}/api-key")) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

// ── Translation to FacadeConfig ─────────────────────────────────────

/// Build a `FacadeConfig` from a profile, with global defaults filling
/// any tuning field the profile leaves unset.
pub fn profile_to_facade_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<FacadeConfig, ConfigError> {
    let base_url: url::Url = profile
        .endpoint
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "endpoint".into(),
            reason: format!("invalid URL: {}", profile.endpoint),
        })?;

    let use_static_data = profile.use_static_data.unwrap_or(defaults.use_static_data);

    // Static mode needs no credentials; everything else does.
    let api_key = if use_static_data {
        resolve_api_key(profile, profile_name)
            .unwrap_or_else(|_| SecretString::from("demo-api-key".to_owned()))
    } else {
        resolve_api_key(profile, profile_name)?
    };

    Ok(FacadeConfig {
        base_url,
        api_key,
        use_static_data,
        realtime: profile.realtime.unwrap_or(defaults.realtime),
        polling: profile.polling.unwrap_or(defaults.polling),
        poll_interval: Duration::from_secs(
            profile
                .poll_interval_secs
                .unwrap_or(defaults.poll_interval_secs),
        ),
        request_timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
    })
}

impl Config {
    /// Look up a profile by name, falling back to the default profile.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".to_owned());

        match self.profiles.get_key_value(&name) {
            Some((key, profile)) => Ok((key.as_str(), profile)),
            None => Err(ConfigError::UnknownProfile { profile: name }),
        }
    }

    /// Resolve a named (or default) profile straight to a `FacadeConfig`.
    pub fn facade_config(&self, name: Option<&str>) -> Result<FacadeConfig, ConfigError> {
        let (profile_name, profile) = self.profile(name)?;
        profile_to_facade_config(profile, profile_name, &self.defaults)
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample_profile() -> Profile {
        Profile {
            endpoint: "https://geofence.example.com".into(),
            api_key: Some("plaintext-key".into()),
            api_key_env: None,
            timeout: None,
            realtime: None,
            polling: None,
            poll_interval_secs: None,
            use_static_data: None,
        }
    }

    #[test]
    fn profile_uses_global_defaults() {
        let config = profile_to_facade_config(&sample_profile(), "default", &Defaults::default())
            .unwrap();

        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert!(config.realtime);
        assert!(config.polling);
        assert!(!config.use_static_data);
    }

    #[test]
    fn profile_overrides_win_over_defaults() {
        let profile = Profile {
            timeout: Some(5),
            polling: Some(false),
            poll_interval_secs: Some(60),
            ..sample_profile()
        };
        let config =
            profile_to_facade_config(&profile, "default", &Defaults::default()).unwrap();

        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert!(!config.polling);
    }

    #[test]
    fn bad_endpoint_is_a_validation_error() {
        let profile = Profile {
            endpoint: "not a url".into(),
            ..sample_profile()
        };
        let result = profile_to_facade_config(&profile, "default", &Defaults::default());
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn missing_credentials_error() {
        let profile = Profile {
            api_key: None,
            ..sample_profile()
        };
        let result = profile_to_facade_config(&profile, "prod", &Defaults::default());
        assert!(matches!(result, Err(ConfigError::NoCredentials { .. })));
    }

    #[test]
    fn env_var_wins_over_plaintext() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("GEOFLY_TEST_API_KEY", "from-env");

            let profile = Profile {
                api_key_env: Some("GEOFLY_TEST_API_KEY".into()),
                ..sample_profile()
            };
            let key = resolve_api_key(&profile, "default").expect("key resolves");
            assert_eq!(secrecy::ExposeSecret::expose_secret(&key), "from-env");
            Ok(())
        });
    }

    #[test]
    fn load_config_from_toml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", r#"
                default_profile = "campus"

                [defaults]
                poll_interval_secs = 15

                [profiles.campus]
                endpoint = "https://geofence.example.com"
                api_key = "campus-key"
                use_static_data = false
            "#)?;

            let config = load_config_from(Path::new("config.toml")).expect("config loads");
            assert_eq!(config.default_profile.as_deref(), Some("campus"));
            assert_eq!(config.defaults.poll_interval_secs, 15);

            let facade = config.facade_config(None).expect("profile resolves");
            assert_eq!(facade.poll_interval, Duration::from_secs(15));
            Ok(())
        });
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let config = Config::default();
        assert!(matches!(
            config.profile(Some("nope")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.profiles.insert("demo".into(), Profile {
            endpoint: "https://geofence.example.com".into(),
            api_key: Some("demo-key".into()),
            api_key_env: None,
            timeout: Some(5),
            realtime: Some(false),
            polling: None,
            poll_interval_secs: None,
            use_static_data: Some(true),
        });

        save_config_to(&config, &path).unwrap();
        let reloaded = load_config_from(&path).unwrap();

        let (name, profile) = reloaded.profile(Some("demo")).unwrap();
        assert_eq!(name, "demo");
        assert_eq!(profile.timeout, Some(5));
        assert_eq!(profile.use_static_data, Some(true));
    }
}
