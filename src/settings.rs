use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};
use std::time::Duration;

use crate::geometry::{DEFAULT_MIN_SIZE, ScaleOptions};
use crate::overlay::{NavigationConfig, RegistryOptions};
use crate::structure::ElementKind;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "pagelens";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_theme")]
    pub theme: String,

    /// Smallest region edge in display pixels
    #[serde(default = "default_min_region_size")]
    pub min_region_size: f64,

    #[serde(default = "default_true")]
    pub enforce_minimum: bool,

    #[serde(default = "default_true")]
    pub clamp_to_bounds: bool,

    #[serde(default = "default_true")]
    pub wrap_navigation: bool,

    #[serde(default = "default_true")]
    pub keyboard_enabled: bool,

    #[serde(default = "default_true")]
    pub announcements: bool,

    #[serde(default = "default_announcement_ttl_ms")]
    pub announcement_ttl_ms: u64,

    /// Space kept clear above a chunk scrolled into view
    #[serde(default = "default_header_offset_px")]
    pub header_offset_px: u32,

    #[serde(default = "default_structure_cache_ttl_secs")]
    pub structure_cache_ttl_secs: u64,

    #[serde(default = "default_structure_cache_capacity")]
    pub structure_cache_capacity: usize,

    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Kinds drawn on the page but skipped by keyboard navigation
    #[serde(default)]
    pub hidden_kinds: Vec<ElementKind>,
}

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_theme() -> String {
    "Oceanic Next".to_string()
}

fn default_min_region_size() -> f64 {
    DEFAULT_MIN_SIZE
}

fn default_announcement_ttl_ms() -> u64 {
    5000
}

fn default_header_offset_px() -> u32 {
    80
}

fn default_structure_cache_ttl_secs() -> u64 {
    300
}

fn default_structure_cache_capacity() -> usize {
    32
}

fn default_frame_interval_ms() -> u64 {
    16
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            theme: default_theme(),
            min_region_size: default_min_region_size(),
            enforce_minimum: true,
            clamp_to_bounds: true,
            wrap_navigation: true,
            keyboard_enabled: true,
            announcements: true,
            announcement_ttl_ms: default_announcement_ttl_ms(),
            header_offset_px: default_header_offset_px(),
            structure_cache_ttl_secs: default_structure_cache_ttl_secs(),
            structure_cache_capacity: default_structure_cache_capacity(),
            frame_interval_ms: default_frame_interval_ms(),
            hidden_kinds: Vec::new(),
        }
    }
}

impl Settings {
    pub fn scale_options(&self) -> ScaleOptions {
        ScaleOptions {
            enforce_minimum: self.enforce_minimum,
            min_size: self.min_region_size,
            clamp_to_bounds: self.clamp_to_bounds,
        }
    }

    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            scale: self.scale_options(),
            hidden_kinds: self.hidden_kinds.clone(),
        }
    }

    pub fn navigation_config(&self) -> NavigationConfig {
        NavigationConfig {
            wrap: self.wrap_navigation,
            enabled: self.keyboard_enabled,
            announce: self.announcements,
        }
    }

    pub fn announcement_ttl(&self) -> Duration {
        Duration::from_millis(self.announcement_ttl_ms)
    }

    pub fn structure_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.structure_cache_ttl_secs)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings into the global, from `path` or the default location.
///
/// A missing file is created with defaults; a broken one is logged and
/// ignored.
pub fn load_settings(path: Option<&Path>) {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match preferred_config_path() {
            Some(path) => path,
            None => {
                warn!("Could not determine config directory, using default settings");
                return;
            }
        },
    };

    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        save_settings_to_file(&settings_snapshot(), &path);
    }
}

fn load_settings_from_path(path: &Path) {
    match fs::read_to_string(path) {
        Ok(content) => match parse_settings(&content) {
            Ok((settings, migrated)) => {
                debug!("Loaded settings from {path:?}");
                if migrated {
                    save_settings_to_file(&settings, path);
                }
                if let Ok(mut global) = SETTINGS.write() {
                    *global = settings;
                }
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

/// Parse settings YAML, migrating old versions. The flag tells whether a
/// migration happened.
pub fn parse_settings(content: &str) -> Result<(Settings, bool), serde_yaml::Error> {
    let mut settings: Settings = serde_yaml::from_str(content)?;
    let migrated = settings.version < CURRENT_VERSION;
    if migrated {
        migrate_settings(&mut settings);
    }
    Ok((settings, migrated))
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    // Pre-release configs allowed a negative minimum to mean "off"
    if settings.version < 1 && settings.min_region_size < 0.0 {
        settings.min_region_size = default_min_region_size();
        settings.enforce_minimum = false;
    }

    settings.version = CURRENT_VERSION;
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = match generate_settings_yaml(settings) {
        Ok(content) => content,
        Err(e) => {
            error!("Failed to serialize settings: {e}");
            return;
        }
    };

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

fn generate_settings_yaml(settings: &Settings) -> Result<String, serde_yaml::Error> {
    let mut content = String::from(SETTINGS_HEADER);
    content.push_str(&serde_yaml::to_string(settings)?);
    Ok(content)
}

const SETTINGS_HEADER: &str = r#"# ============================================================================
# pagelens settings
# ============================================================================
# min_region_size     smallest region edge in display pixels
# hidden_kinds        any of: heading, table, picture, code_block, formula, text
#                     (drawn on the page, skipped by keyboard navigation)
# header_offset_px    space left above a chunk scrolled into view

"#;

// Public API for reading settings

/// Copy of the current global settings
pub fn settings_snapshot() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

pub fn get_theme_name() -> String {
    SETTINGS
        .read()
        .map(|s| s.theme.clone())
        .unwrap_or_else(|_| default_theme())
}
