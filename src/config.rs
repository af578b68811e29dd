//! Configuration loading.
//!
//! All settings are optional; an empty file (or no file) yields the
//! defaults that match the Spaces extension's behaviour.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Top-level bridge configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// Provider tag attached to current-user records and commands.
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Host extension lookup.
    #[serde(default)]
    pub extension: ExtensionConfig,

    /// How long to wait for an inactive extension.
    #[serde(default)]
    pub activation: ActivationConfig,

    /// Avatar URL parameters.
    #[serde(default)]
    pub avatar: AvatarConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            extension: ExtensionConfig::default(),
            activation: ActivationConfig::default(),
            avatar: AvatarConfig::default(),
        }
    }
}

/// Host extension lookup settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtensionConfig {
    /// Extension identifier (`publisher.name`).
    #[serde(default = "default_extension_id")]
    pub id: String,

    /// Delay before the deferred listener setup after construction.
    #[serde(default = "default_delay_ms")]
    pub startup_delay_ms: u64,
}

impl ExtensionConfig {
    /// Startup delay as a [`Duration`].
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            id: default_extension_id(),
            startup_delay_ms: default_delay_ms(),
        }
    }
}

/// Strategy used while the extension is still activating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationStrategy {
    /// One wait of `delay_ms`, then a single re-check.
    Fixed,
    /// Doubling waits starting at `delay_ms`, capped at `max_delay_ms`.
    Backoff,
}

/// Activation wait settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivationConfig {
    /// Wait strategy.
    #[serde(default = "default_strategy")]
    pub strategy: ActivationStrategy,

    /// First (or only) wait in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Upper bound of a single backoff wait in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Number of re-checks under the backoff strategy.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            delay_ms: default_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Gravatar URL parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AvatarConfig {
    /// Image size in pixels.
    #[serde(default = "default_avatar_size")]
    pub size: u32,

    /// Fallback image style for unknown emails.
    #[serde(default = "default_avatar_style")]
    pub default_style: String,

    /// Use the HTTPS endpoint.
    #[serde(default = "default_true")]
    pub secure: bool,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            size: default_avatar_size(),
            default_style: default_avatar_style(),
            secure: default_true(),
        }
    }
}

// Default value functions for serde

fn default_provider() -> String {
    "vslsSpaces".to_owned()
}
fn default_extension_id() -> String {
    "vsls-contrib.spaces".to_owned()
}
fn default_delay_ms() -> u64 {
    5000
}
fn default_max_delay_ms() -> u64 {
    30_000
}
fn default_max_attempts() -> u32 {
    4
}
fn default_strategy() -> ActivationStrategy {
    ActivationStrategy::Fixed
}
fn default_avatar_size() -> u32 {
    200
}
fn default_avatar_style() -> String {
    "retro".to_owned()
}
fn default_true() -> bool {
    true
}

/// Load the bridge config from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> anyhow::Result<BridgeConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config at {}: {e}", path.display()))?;
    let config: BridgeConfig = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config at {}: {e}", path.display()))?;
    Ok(config)
}

/// Resolve the default config directory (`~/.spaces-bridge/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".spaces-bridge"))
}
