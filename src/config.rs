use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_BOTTOM_TOLERANCE, DEFAULT_GROUP_GAP_SECS, DEFAULT_LIST_WIDTH,
    DEFAULT_POLL_INTERVAL_SECS, DEFAULT_SCROLL_THRESHOLD,
};
use crate::timeline::{PaginationSettings, RendererSettings};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory holding one sub-directory per category
    #[serde(default = "default_source_root")]
    pub root: PathBuf,
    /// Parsed conversations kept in memory
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            root: default_source_root(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Messages rendered per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Distance from an edge (viewport units) that triggers the next batch
    #[serde(default = "default_scroll_threshold")]
    pub scroll_threshold: u32,
    /// Distance from the bottom (viewport units) that still counts as pinned
    #[serde(default = "default_bottom_tolerance")]
    pub bottom_tolerance: u32,
    /// Seconds between two messages of the same sender that start a new group
    #[serde(default = "default_group_gap_secs")]
    pub group_gap_secs: i64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            scroll_threshold: default_scroll_threshold(),
            bottom_tolerance: default_bottom_tolerance(),
            group_gap_secs: default_group_gap_secs(),
        }
    }
}

impl TimelineConfig {
    pub fn renderer_settings(&self) -> RendererSettings {
        RendererSettings {
            pagination: PaginationSettings::new(self.batch_size, self.scroll_threshold),
            bottom_tolerance: self.bottom_tolerance,
            group_gap: chrono::Duration::seconds(self.group_gap_secs.max(0)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_poll_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub keybinding_mode: KeybindingMode,
    #[serde(default)]
    pub theme: ThemeVariant,
    /// Width of the conversation list pane in columns
    #[serde(default = "default_list_width")]
    pub list_width: u16,
    /// Format of times shown next to messages
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            keybinding_mode: KeybindingMode::default(),
            theme: ThemeVariant::default(),
            list_width: default_list_width(),
            time_format: default_time_format(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KeybindingMode {
    #[default]
    Vim,
    Arrows,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThemeVariant {
    #[default]
    Dark,
    #[serde(rename = "high-contrast")]
    HighContrast,
}

fn default_true() -> bool {
    true
}

fn default_source_root() -> PathBuf {
    Config::data_dir()
        .map(|dir| dir.join("conversations"))
        .unwrap_or_else(|_| PathBuf::from("conversations"))
}

fn default_cache_capacity() -> u64 {
    32
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_scroll_threshold() -> u32 {
    DEFAULT_SCROLL_THRESHOLD
}

fn default_bottom_tolerance() -> u32 {
    DEFAULT_BOTTOM_TOLERANCE
}

fn default_group_gap_secs() -> i64 {
    DEFAULT_GROUP_GAP_SECS
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_list_width() -> u16 {
    DEFAULT_LIST_WIDTH
}

fn default_time_format() -> String {
    "%H:%M".to_string()
}

impl Config {
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("backscroll");
        Ok(dir)
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn data_dir() -> Result<PathBuf> {
        let dir = dirs::data_local_dir()
            .context("Could not find data directory")?
            .join("backscroll");
        Ok(dir)
    }

    /// Load the config file, falling back to defaults when it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(Self::data_dir()?)?;
        Ok(())
    }
}
