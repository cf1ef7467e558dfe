//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml

use crate::services::sequencer::SequencerTimings;
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Sequencer timing table, all in milliseconds
#[derive(Debug, Clone, Deserialize)]
pub struct TimingsConfig {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_tour_zoom_ms")]
    pub tour_zoom_ms: u64,
    #[serde(default = "default_tour_hold_ms")]
    pub tour_hold_ms: u64,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_manual_zoom_ms")]
    pub manual_zoom_ms: u64,
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_tour_zoom_ms() -> u64 {
    1000
}

fn default_tour_hold_ms() -> u64 {
    1200
}

fn default_settle_ms() -> u64 {
    1000
}

fn default_manual_zoom_ms() -> u64 {
    600
}

impl Default for TimingsConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            tour_zoom_ms: default_tour_zoom_ms(),
            tour_hold_ms: default_tour_hold_ms(),
            settle_ms: default_settle_ms(),
            manual_zoom_ms: default_manual_zoom_ms(),
        }
    }
}

impl From<&TimingsConfig> for SequencerTimings {
    fn from(t: &TimingsConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(t.initial_delay_ms),
            tour_zoom: Duration::from_millis(t.tour_zoom_ms),
            tour_hold: Duration::from_millis(t.tour_hold_ms),
            settle: Duration::from_millis(t.settle_ms),
            manual_zoom: Duration::from_millis(t.manual_zoom_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CatalogConfig {
    /// Garment catalog TOML file; the built-in catalog is used when unset
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfilesConfig {
    /// Directory holding one `<user_id>.json` profile document per user
    #[serde(default = "default_profiles_dir")]
    pub dir: String,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self { dir: default_profiles_dir() }
    }
}

fn default_profiles_dir() -> String {
    "profiles".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval() }
    }
}

fn default_metrics_interval() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct SurfaceConfig {
    /// Capacity of the ordered focus log handed to the rendering surface
    #[serde(default = "default_focus_log_capacity")]
    pub focus_log_capacity: usize,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self { focus_log_capacity: default_focus_log_capacity() }
    }
}

fn default_focus_log_capacity() -> usize {
    64
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub timings: TimingsConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub profiles: ProfilesConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub surface: SurfaceConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    timings: SequencerTimings,
    catalog_file: Option<String>,
    profiles_dir: String,
    metrics_interval_secs: u64,
    focus_log_capacity: usize,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default".to_string())
    }
}

impl Config {
    fn from_toml(toml_config: TomlConfig, config_file: String) -> Self {
        Self {
            timings: SequencerTimings::from(&toml_config.timings),
            catalog_file: toml_config.catalog.file,
            profiles_dir: toml_config.profiles.dir,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            focus_log_capacity: toml_config.surface.focus_log_capacity,
            config_file,
        }
    }

    /// Determine config file path from args or environment
    pub fn resolve_config_path(args: &[String]) -> String {
        // Check for --config argument
        for (i, arg) in args.iter().enumerate() {
            if arg == "--config" {
                if let Some(path) = args.get(i + 1) {
                    return path.clone();
                }
            }
            if let Some(path) = arg.strip_prefix("--config=") {
                return path.to_string();
            }
        }

        // Check CONFIG_FILE environment variable
        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        "config/dev.toml".to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self::from_toml(toml_config, path.display().to_string()))
    }

    /// Load configuration from a path, falling back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "config_load_failed_using_defaults");
                Self::default()
            }
        }
    }

    /// Load configuration - tries TOML file first, falls back to defaults
    pub fn load(args: &[String]) -> Self {
        Self::load_from_path(&Self::resolve_config_path(args))
    }

    pub fn timings(&self) -> SequencerTimings {
        self.timings
    }

    pub fn catalog_file(&self) -> Option<&str> {
        self.catalog_file.as_deref()
    }

    pub fn profiles_dir(&self) -> &str {
        &self.profiles_dir
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn focus_log_capacity(&self) -> usize {
        self.focus_log_capacity
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder for tests that need fast timers
    pub fn with_timings(mut self, timings: SequencerTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_profiles_dir(mut self, dir: impl Into<String>) -> Self {
        self.profiles_dir = dir.into();
        self
    }

    pub fn with_catalog_file(mut self, file: impl Into<String>) -> Self {
        self.catalog_file = Some(file.into());
        self
    }
}
