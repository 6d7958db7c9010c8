use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Public mirrors implementing the resolution protocol.
pub const DEFAULT_MIRRORS: &[&str] = &[
    "https://cobalt.api.wuk.sh/api/json",
    "https://cobalt.casply.com/api/json",
    "https://api.server.social/api/json",
    "https://api.opensource.wtf/api/json",
    "https://cobalt.xyzen.dev/api/json",
    "https://cobalt.aur1.st/api/json",
    "https://k.joher.com/api/json",
    "https://api.wwebs.co/api/json",
    "https://cobalt.q1n.dev/api/json",
    "https://dl.khub.win/api/json",
];

/// Preferences sent to mirrors with every resolution request (`[request]` in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPreferences {
    pub video_codec: String,
    pub video_quality: String,
    pub audio_format: String,
    pub filename_pattern: String,
}

impl Default for RequestPreferences {
    fn default() -> Self {
        Self {
            video_codec: "h264".to_string(),
            video_quality: "1080".to_string(),
            audio_format: "mp3".to_string(),
            filename_pattern: "basic".to_string(),
        }
    }
}

/// Global configuration loaded from `~/.config/mdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MdlConfig {
    /// Mirror endpoints, tried in a fresh random order on every resolution.
    pub mirrors: Vec<String>,
    /// Per-mirror request timeout in seconds.
    pub mirror_timeout_secs: u64,
    /// Lowercase substrings of a mirror error text that mean the link itself is unusable.
    /// A match stops the mirror loop immediately.
    pub fatal_markers: Vec<String>,
    /// Lowercase substrings that mark the last failure as network-related when
    /// composing the "all mirrors failed" message.
    pub network_markers: Vec<String>,
    #[serde(default)]
    pub request: RequestPreferences,
    /// Directory for saves without a chosen destination (None = current directory).
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Seconds an error stays visible before the session falls back to idle.
    pub error_display_secs: u64,
}

impl Default for MdlConfig {
    fn default() -> Self {
        Self {
            mirrors: DEFAULT_MIRRORS.iter().map(|s| s.to_string()).collect(),
            mirror_timeout_secs: 15,
            fatal_markers: default_fatal_markers(),
            network_markers: default_network_markers(),
            request: RequestPreferences::default(),
            download_dir: None,
            error_display_secs: 4,
        }
    }
}

impl MdlConfig {
    pub fn mirror_timeout(&self) -> Duration {
        Duration::from_secs(self.mirror_timeout_secs)
    }

    pub fn error_display(&self) -> Duration {
        Duration::from_secs(self.error_display_secs)
    }

    /// Resolved download directory: configured value or the current directory.
    pub fn download_dir(&self) -> Result<PathBuf> {
        match &self.download_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }
}

pub fn default_fatal_markers() -> Vec<String> {
    ["invalid url", "private", "doesn't exist", "does not exist", "deleted"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn default_network_markers() -> Vec<String> {
    ["fetch", "network", "connect", "timed out"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: MdlConfig = toml::from_str(&data)?;
    Ok(cfg)
}
