use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub captions: CaptionsConfig,
    #[serde(default)]
    pub update: UpdateConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_volume")]
    pub default_volume: f32,
    /// Extra arguments appended to the mpv command line.
    #[serde(default)]
    pub mpv_args: Vec<String>,
}

/// Channel list source — either an https:// URL or a local file path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelsConfig {
    /// Path to a local playlist (m3u/m3u8/json, highest priority).
    /// Defaults to `$XDG_CONFIG_HOME/teletv/channels.m3u`.
    #[serde(default = "default_playlist_path")]
    pub playlist_path: PathBuf,
    /// URL for a remote playlist (fallback when the local file is not found).
    #[serde(default)]
    pub playlist_url: String,
}

/// Live-captioning sidecar settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionsConfig {
    #[serde(default = "default_captions_enabled")]
    pub enabled: bool,
    /// Override for the transcriber executable.  Empty means auto-discover
    /// (beside the exe, then PATH).
    #[serde(default)]
    pub command: String,
    /// Speech model name passed to the sidecar.
    #[serde(default = "default_caption_model")]
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    #[serde(default = "default_update_enabled")]
    pub check_on_startup: bool,
    #[serde(default = "default_manifest_url")]
    pub manifest_url: String,
}

/// User-configurable paths for state and cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
            mpv_args: Vec::new(),
        }
    }
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            playlist_path: default_playlist_path(),
            playlist_url: String::new(),
        }
    }
}

impl Default for CaptionsConfig {
    fn default() -> Self {
        Self {
            enabled: default_captions_enabled(),
            command: String::new(),
            model: default_caption_model(),
        }
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            check_on_startup: default_update_enabled(),
            manifest_url: default_manifest_url(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
        }
    }
}

fn default_volume() -> f32 {
    0.5
}

fn default_playlist_path() -> PathBuf {
    platform::config_dir().join("channels.m3u")
}

fn default_captions_enabled() -> bool {
    true
}

fn default_caption_model() -> String {
    "small".to_string()
}

fn default_update_enabled() -> bool {
    true
}

fn default_manifest_url() -> String {
    "https://raw.githubusercontent.com/teletv/releases/main/latest.json".to_string()
}

fn default_state_file() -> PathBuf {
    platform::data_dir().join("state.json")
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player: PlayerConfig::default(),
            channels: ChannelsConfig::default(),
            captions: CaptionsConfig::default(),
            update: UpdateConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.captions.enabled);
        assert!(config.update.check_on_startup);
        assert!(config.update.manifest_url.starts_with("https://"));
        assert_eq!(config.captions.model, "small");
        assert!(config.channels.playlist_path.ends_with("teletv/channels.m3u"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
[captions]
enabled = false
"#,
        )
        .unwrap();
        assert!(!config.captions.enabled);
        assert_eq!(config.captions.model, "small");
        assert_eq!(config.player.default_volume, 0.5);
    }
}
