//! CLI-owned configuration: TOML profiles, credential resolution, and
//! translation to `aerolite_core::PollerConfig` + `aerolite_api::OAuthConfig`.
//!
//! Core never sees these types -- it receives pre-built config structs.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use aerolite_api::OAuthConfig;
use aerolite_core::PollerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub const KEYRING_SERVICE: &str = "aerolite-cli";

// ── TOML config structs ──────────────────────────────────────────────

/// CLI-owned TOML configuration. Core never touches this type.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name (used when --profile is not specified).
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
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
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// CLI-owned profile definition.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// API base URL override (defaults to the production cloud).
    pub api_base: Option<String>,

    /// Authorization server base URL override (for staging accounts).
    pub auth_base: Option<String>,

    /// Seconds between polling cycles for `watch`.
    pub scan_interval: Option<u64>,

    /// Refresh token (plaintext -- prefer keyring or env var).
    pub refresh_token: Option<String>,

    /// Environment variable name containing the refresh token.
    pub refresh_token_env: Option<String>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

// ── Config file path ─────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "aerolite", "aerolite-cli")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        })
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("aerolite-cli");
    p
}

// ── Config loading ───────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, CliError> {
    let path = config_path();

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("AEROLITE_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), CliError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg).map_err(|e| CliError::Validation {
        field: "config".into(),
        reason: format!("failed to serialize config: {e}"),
    })?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Profile resolution ───────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Look up the active profile, tolerating a missing "default" profile.
///
/// An explicitly requested profile must exist; the implicit default
/// falls back to built-in settings so `auth login` works on a fresh
/// machine.
pub fn active_profile(global: &GlobalOpts, config: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, config);
    if let Some(profile) = config.profiles.get(&name) {
        return Ok((name, profile.clone()));
    }
    if global.profile.is_some() {
        let mut available: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
        available.sort_unstable();
        return Err(CliError::ProfileNotFound {
            name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    }
    Ok((name, Profile::default()))
}

/// Translate a CLI `Profile` + global flags into a `PollerConfig`.
///
/// This is the single boundary where CLI config types cross into core types.
pub fn resolve_poller_config(
    profile: &Profile,
    global: &GlobalOpts,
) -> Result<PollerConfig, CliError> {
    let mut config = PollerConfig::default();

    // API base (flag > env > profile > built-in)
    if let Some(base) = global.api_base.as_deref().or(profile.api_base.as_deref()) {
        config.api_base = base.parse().map_err(|_| CliError::Validation {
            field: "api_base".into(),
            reason: format!("invalid URL: {base}"),
        })?;
    }

    if let Some(secs) = profile.scan_interval {
        config.scan_interval = Duration::from_secs(secs);
    }

    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(global.timeout));
    Ok(config)
}

/// Build the OAuth endpoints for a profile, honoring `auth_base`.
pub fn resolve_oauth_config(profile: &Profile) -> Result<OAuthConfig, CliError> {
    let mut oauth = OAuthConfig::default();
    if let Some(base) = profile.auth_base.as_deref() {
        let base: url::Url = base.parse().map_err(|_| CliError::Validation {
            field: "auth_base".into(),
            reason: format!("invalid URL: {base}"),
        })?;
        oauth.authorize_url = base.join("authorize").map_err(join_err)?;
        oauth.token_url = base.join("oauth/token").map_err(join_err)?;
    }
    Ok(oauth)
}

fn join_err(e: url::ParseError) -> CliError {
    CliError::Validation {
        field: "auth_base".into(),
        reason: format!("cannot build endpoint URL: {e}"),
    }
}

// ── Credential helpers ───────────────────────────────────────────────

/// Resolve a refresh token from the credential chain.
pub fn resolve_refresh_token(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<SecretString, CliError> {
    // 1. CLI flag / AEROLITE_REFRESH_TOKEN
    if let Some(ref token) = global.refresh_token {
        return Ok(SecretString::from(token.clone()));
    }

    // 2. Profile's refresh_token_env -> env var lookup
    if let Some(ref env_name) = profile.refresh_token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 3. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name)) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 4. Plaintext in config
    if let Some(ref token) = profile.refresh_token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(CliError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a refresh token in the system keyring.
pub fn store_refresh_token(profile_name: &str, token: &str) -> Result<(), CliError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))
        .map_err(keyring_err)?;
    entry.set_password(token).map_err(keyring_err)
}

/// Remove the stored refresh token, if any.
pub fn delete_refresh_token(profile_name: &str) -> Result<(), CliError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))
        .map_err(keyring_err)?;
    match entry.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(keyring_err(e)),
    }
}

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/refresh-token")
}

fn keyring_err(e: keyring::Error) -> CliError {
    CliError::Keyring {
        reason: e.to_string(),
    }
}
