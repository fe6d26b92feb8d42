//! Configuration for embedding hosts of the live feed.
//!
//! TOML profiles, optional API token resolution (env var + plaintext),
//! and translation to `sentra_core::FeedConfig`. The orchestrator itself
//! never reads files; hosts load a profile here and hand the result in.

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
use url::Url;

use sentra_core::config::{DEFAULT_BASE_URL, DEFAULT_POLL_INTERVAL};
use sentra_core::{FallbackPolicy, FeedConfig, TlsVerification};

const ENV_PREFIX: &str = "SENTRA_";
const DEFAULT_PROFILE: &str = "default";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

    #[error("token variable '{variable}' for profile '{profile}' is not set")]
    MissingToken { profile: String, variable: String },

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

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
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

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some(DEFAULT_PROFILE.into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

/// Settings applied to every profile unless it overrides them.
#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default)]
    pub insecure: bool,

    /// Request timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Detection poll period, seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    #[serde(default = "default_true")]
    pub seed_detections: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            insecure: false,
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
            seed_detections: true,
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}
fn default_true() -> bool {
    true
}

/// A named backend profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Live-feed API base (e.g. "http://127.0.0.1:8000/api/livefeed/").
    #[serde(default = "default_url")]
    pub url: String,

    /// Bearer token (plaintext; prefer `token_env`).
    pub token: Option<String>,

    /// Environment variable holding the bearer token.
    pub token_env: Option<String>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    pub insecure: Option<bool>,
    pub timeout: Option<u64>,
    pub poll_interval: Option<u64>,
    pub seed_detections: Option<bool>,

    /// Handling of streams the client cannot play directly.
    #[serde(default)]
    pub fallback: FallbackSettings,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            url: default_url(),
            token: None,
            token_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            poll_interval: None,
            seed_detections: None,
            fallback: FallbackSettings::default(),
        }
    }
}

fn default_url() -> String {
    DEFAULT_BASE_URL.into()
}

/// `[profiles.<name>.fallback]`
///
/// ```toml
/// mode = "template"
/// template = "https://gateway.local/hls/{camera_id}.m3u8"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FallbackSettings {
    /// "substitute", "template", or "reject".
    #[serde(default = "default_fallback_mode")]
    pub mode: String,

    /// Substitute resource; built-in sample clip when unset.
    pub url: Option<String>,

    /// Gateway URL with a `{camera_id}` placeholder.
    pub template: Option<String>,
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self {
            mode: default_fallback_mode(),
            url: None,
            template: None,
        }
    }
}

fn default_fallback_mode() -> String {
    "substitute".into()
}

impl Config {
    /// Look up a profile by name, or the default profile.
    ///
    /// An unconfigured default profile resolves to built-in defaults so a
    /// host works without any config file.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, Profile), ConfigError> {
        let name = name
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| DEFAULT_PROFILE.into());

        match self.profiles.get(&name) {
            Some(profile) => Ok((name, profile.clone())),
            None if name == DEFAULT_PROFILE => Ok((name, Profile::default())),
            None => Err(ConfigError::UnknownProfile { profile: name }),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "sentra", "sentra").map_or_else(
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
    p.push("sentra");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, then `SENTRA_*` environment overrides.
///
/// Nested keys use a double underscore:
/// `SENTRA_PROFILES__DEFAULT__URL`, `SENTRA_DEFAULTS__POLL_INTERVAL`.
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
    save_config_to(&config_path(), cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution ────────────────────────────────────────────────

/// Resolve the optional bearer token: `token_env` first, then plaintext.
///
/// A profile that names a `token_env` which is unset, with no plaintext
/// fallback, is an error rather than a silent anonymous connection.
pub fn resolve_token(
    profile: &Profile,
    profile_name: &str,
) -> Result<Option<SecretString>, ConfigError> {
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(Some(SecretString::from(val)));
        }
        if profile.token.is_none() {
            return Err(ConfigError::MissingToken {
                profile: profile_name.into(),
                variable: env_name.clone(),
            });
        }
    }

    Ok(profile.token.clone().map(SecretString::from))
}

// ── Translation ─────────────────────────────────────────────────────

fn fallback_policy(settings: &FallbackSettings) -> Result<FallbackPolicy, ConfigError> {
    match settings.mode.as_str() {
        "substitute" => match settings.url {
            Some(ref raw) => {
                let url = Url::parse(raw)
                    .map_err(|e| invalid("fallback.url", format!("{raw}: {e}")))?;
                Ok(FallbackPolicy::Substitute { url })
            }
            None => Ok(FallbackPolicy::default()),
        },
        "template" => {
            let template = settings
                .template
                .clone()
                .ok_or_else(|| invalid("fallback.template", "required when mode = \"template\""))?;
            Url::parse(&template.replace("{camera_id}", "CAM001"))
                .map_err(|e| invalid("fallback.template", format!("{template}: {e}")))?;
            Ok(FallbackPolicy::Template { template })
        }
        "reject" => Ok(FallbackPolicy::Reject),
        other => Err(invalid(
            "fallback.mode",
            format!("expected 'substitute', 'template', or 'reject', got '{other}'"),
        )),
    }
}

fn seconds(field: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(invalid(field, "must be at least 1 second"));
    }
    Ok(Duration::from_secs(secs))
}

/// Build a `FeedConfig` from a profile, filling gaps from `defaults`.
pub fn profile_to_feed_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<FeedConfig, ConfigError> {
    let mut base_url: Url = profile
        .url
        .parse()
        .map_err(|_| invalid("url", format!("invalid URL: {}", profile.url)))?;
    // Relative joins drop the last segment without a trailing slash.
    if !base_url.path().ends_with('/') {
        let path = format!("{}/", base_url.path());
        base_url.set_path(&path);
    }

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(FeedConfig {
        base_url,
        token: resolve_token(profile, profile_name)?,
        tls,
        timeout: seconds("timeout", profile.timeout.unwrap_or(defaults.timeout))?,
        poll_interval: seconds(
            "poll_interval",
            profile.poll_interval.unwrap_or(defaults.poll_interval),
        )?,
        fallback: fallback_policy(&profile.fallback)?,
        seed_detections: profile.seed_detections.unwrap_or(defaults.seed_detections),
    })
}

/// Load the config and build a `FeedConfig` for `profile` (or the default).
pub fn load_feed_config(profile: Option<&str>) -> Result<FeedConfig, ConfigError> {
    let config = load_config()?;
    let (name, profile) = config.profile(profile)?;
    profile_to_feed_config(&profile, &name, &config.defaults)
}
