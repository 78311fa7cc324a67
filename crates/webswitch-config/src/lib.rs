//! Profile configuration for webswitch clients.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `webswitch_api::ClientConfig`.

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

use webswitch_api::{ClientConfig, Credentials};

const KEYRING_SERVICE: &str = "webswitch";
const ENV_PREFIX: &str = "WEBSWITCH_";
const PASSWORD_ENV: &str = "WEBSWITCH_PASSWORD";
const USERNAME_ENV: &str = "WEBSWITCH_USERNAME";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{profile}' not found")]
    UnknownProfile { profile: String },

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
    /// Profile used when none is named.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named switch profiles.
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

impl Config {
    /// Look up `name`, or the default profile when `name` is `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }

    /// Build the client config for `name` (or the default profile).
    pub fn client_config(&self, name: Option<&str>) -> Result<ClientConfig, ConfigError> {
        let (name, profile) = self.profile(name)?;
        profile_to_client_config(profile, name, &self.defaults)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Commit to flash after every mutation.
    #[serde(default)]
    pub autosave: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            autosave: false,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// A named switch profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Web UI root (e.g., "http://192.168.2.1").
    pub url: String,

    pub username: Option<String>,

    /// Plaintext password; prefer the keyring or an env var.
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// Override `defaults.autosave`.
    pub autosave: Option<bool>,

    /// Override `defaults.timeout`.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "webswitch", "webswitch").map_or_else(
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
    p.push("webswitch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, still merging `WEBSWITCH_*` variables.
///
/// Nested keys use a double underscore:
/// `WEBSWITCH_DEFAULTS__AUTOSAVE=true`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

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

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the password for a profile.
///
/// Order: the profile's `password_env` variable, `WEBSWITCH_PASSWORD`,
/// the system keyring (`webswitch` / `<profile>/password`), then the
/// plaintext `password` field.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a password in the system keyring for `profile_name`.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
        .and_then(|entry| entry.set_password(password))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Credentials, ConfigError> {
    let username = profile
        .username
        .clone()
        .or_else(|| std::env::var(USERNAME_ENV).ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;
    let password = resolve_password(profile, profile_name)?;
    Ok(Credentials { username, password })
}

/// Build a `ClientConfig` from a profile, falling back to `defaults` for
/// anything the profile leaves unset.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let url: url::Url = profile.url.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {}", profile.url),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "url".into(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    let credentials = resolve_credentials(profile, profile_name)?;
    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(ClientConfig::new(url, credentials)
        .with_autosave(profile.autosave.unwrap_or(defaults.autosave))
        .with_timeout(timeout))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn write(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    fn profile(url: &str) -> Profile {
        Profile {
            url: url.into(),
            username: Some("admin".into()),
            password: Some("secret".into()),
            ..Profile::default()
        }
    }

    #[test]
    fn loads_profiles_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            r#"
default_profile = "lab"

[defaults]
timeout = 10

[profiles.lab]
url = "http://192.168.2.1"
username = "admin"
password = "admin"
autosave = true
"#,
        );

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.defaults.timeout, 10);
        assert!(!cfg.defaults.autosave);

        let (name, lab) = cfg.profile(None).unwrap();
        assert_eq!(name, "lab");
        assert_eq!(lab.url, "http://192.168.2.1");
        assert_eq!(lab.autosave, Some(true));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.timeout, 30);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn unknown_profile() {
        let cfg = Config::default();
        assert!(matches!(
            cfg.profile(Some("nope")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn client_config_applies_overrides() {
        let mut p = profile("http://10.0.0.2/");
        p.timeout = Some(5);
        let client = profile_to_client_config(&p, "webswitch-test-overrides", &Defaults {
            timeout: 30,
            autosave: true,
        })
        .unwrap();

        assert_eq!(client.base_url.as_str(), "http://10.0.0.2/");
        assert_eq!(client.timeout, Duration::from_secs(5));
        assert!(client.autosave);
        assert_eq!(client.credentials.username, "admin");
    }

    #[test]
    fn plaintext_password_is_last_resort() {
        let mut p = profile("http://10.0.0.2");
        p.password_env = Some("WEBSWITCH_TEST_UNSET_PASSWORD_VARIABLE".into());
        if std::env::var(PASSWORD_ENV).is_err() {
            let pw = resolve_password(&p, "webswitch-test-plaintext").unwrap();
            assert_eq!(pw.expose_secret(), "secret");
        }
    }

    #[test]
    fn missing_username_is_no_credentials() {
        let mut p = profile("http://10.0.0.2");
        p.username = None;
        if std::env::var(USERNAME_ENV).is_err() {
            assert!(matches!(
                resolve_credentials(&p, "webswitch-test-nouser"),
                Err(ConfigError::NoCredentials { .. })
            ));
        }
    }

    #[test]
    fn rejects_bad_urls() {
        let defaults = Defaults::default();
        for url in ["not a url", "ftp://10.0.0.2"] {
            assert!(matches!(
                profile_to_client_config(&profile(url), "x", &defaults),
                Err(ConfigError::Validation { .. })
            ));
        }
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert("default".into(), profile("http://192.168.2.1"));
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        let (_, p) = loaded.profile(None).unwrap();
        assert_eq!(p.url, "http://192.168.2.1");
        assert_eq!(p.password.as_deref(), Some("secret"));
    }
}
