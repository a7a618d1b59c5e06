use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};
use std::time::Duration;

use crate::pdf::{
    DEFAULT_NEXT_TO_MARGIN, DEFAULT_SAME_LINE_MARGIN, DEFAULT_SCROLL_MARGIN,
    DEFAULT_SELECTION_DEBOUNCE_MS, MergeMargins, Zoom,
};

pub const CURRENT_VERSION: u32 = 2;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "papernote";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Scale change per zoom action
    #[serde(default = "default_zoom_step")]
    pub zoom_step: f64,

    /// Zoom requests arriving within this window after a zoom are dropped
    #[serde(default = "default_zoom_settle_ms")]
    pub zoom_settle_ms: u64,

    #[serde(default = "default_min_scale")]
    pub min_scale: f64,

    /// Subtracted from the fit-to-width scale on document load
    #[serde(default = "default_fit_width_margin")]
    pub fit_width_margin: f64,

    /// Pixels kept above a highlight when jumping to it
    #[serde(default = "default_scroll_margin_px")]
    pub scroll_margin_px: f64,

    #[serde(default = "default_selection_debounce_ms")]
    pub selection_debounce_ms: u64,

    /// Delay before a jump's scroll listener starts listening
    #[serde(default = "default_jump_arm_delay_ms")]
    pub jump_arm_delay_ms: u64,

    #[serde(default = "default_same_line_margin_px")]
    pub same_line_margin_px: f64,

    #[serde(default = "default_next_to_margin_px")]
    pub next_to_margin_px: f64,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_zoom_step() -> f64 {
    Zoom::DEFAULT_STEP
}

fn default_zoom_settle_ms() -> u64 {
    Zoom::DEFAULT_SETTLE_MS
}

fn default_min_scale() -> f64 {
    Zoom::MIN_SCALE
}

fn default_fit_width_margin() -> f64 {
    Zoom::FIT_WIDTH_MARGIN
}

fn default_scroll_margin_px() -> f64 {
    DEFAULT_SCROLL_MARGIN
}

fn default_selection_debounce_ms() -> u64 {
    DEFAULT_SELECTION_DEBOUNCE_MS
}

fn default_jump_arm_delay_ms() -> u64 {
    100
}

fn default_same_line_margin_px() -> f64 {
    DEFAULT_SAME_LINE_MARGIN
}

fn default_next_to_margin_px() -> f64 {
    DEFAULT_NEXT_TO_MARGIN
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            zoom_step: default_zoom_step(),
            zoom_settle_ms: default_zoom_settle_ms(),
            min_scale: default_min_scale(),
            fit_width_margin: default_fit_width_margin(),
            scroll_margin_px: default_scroll_margin_px(),
            selection_debounce_ms: default_selection_debounce_ms(),
            jump_arm_delay_ms: default_jump_arm_delay_ms(),
            same_line_margin_px: default_same_line_margin_px(),
            next_to_margin_px: default_next_to_margin_px(),
        }
    }
}

impl Settings {
    pub fn merge_margins(&self) -> MergeMargins {
        MergeMargins {
            same_line: self.same_line_margin_px,
            next_to: self.next_to_margin_px,
        }
    }

    pub fn zoom(&self) -> Zoom {
        Zoom::new(self.zoom_step, self.zoom_settle_ms, self.min_scale)
    }

    pub fn jump_arm_delay(&self) -> Duration {
        Duration::from_millis(self.jump_arm_delay_ms)
    }

    /// Read settings from a YAML file, migrating older versions in memory
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut settings = read_settings_file(path)?;
        if settings.version < CURRENT_VERSION {
            migrate_settings(&mut settings);
        }
        Ok(settings)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory {parent:?}"))?;
            }
        }

        fs::write(path, generate_settings_yaml(self))
            .with_context(|| format!("Failed to save settings to {path:?}"))?;
        debug!("Saved settings to {path:?}");
        Ok(())
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load the user's settings into the process-wide copy.
///
/// A missing file is created with defaults; an unreadable one is logged and
/// the defaults stay in effect.
pub fn load_settings() {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };

    if !path.exists() {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Err(e) = Settings::default().save_to_path(&path) {
            error!("{e:#}");
        }
        return;
    }

    match read_settings_file(&path) {
        Ok(mut settings) => {
            debug!("Loaded settings from {path:?}");

            if settings.version < CURRENT_VERSION {
                migrate_settings(&mut settings);
                if let Err(e) = settings.save_to_path(&path) {
                    error!("{e:#}");
                }
            }

            if let Ok(mut global) = SETTINGS.write() {
                *global = settings;
            }
        }
        Err(e) => error!("{e:#}"),
    }
}

fn read_settings_file(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {path:?}"))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse settings file {path:?}"))
}

/// Snapshot of the process-wide settings
pub fn get_settings() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    // v1 stored the zoom step as a percentage
    if settings.version < 2 && settings.zoom_step >= 1.0 {
        settings.zoom_step /= 100.0;
    }

    settings.version = CURRENT_VERSION;
}

fn generate_settings_yaml(settings: &Settings) -> String {
    let mut content = String::new();

    content.push_str(SETTINGS_HEADER);
    content.push_str(&format!("version: {}\n", settings.version));
    content.push('\n');
    content.push_str("# Zoom\n");
    content.push_str(&format!("zoom_step: {}\n", settings.zoom_step));
    content.push_str(&format!("zoom_settle_ms: {}\n", settings.zoom_settle_ms));
    content.push_str(&format!("min_scale: {}\n", settings.min_scale));
    content.push_str(&format!("fit_width_margin: {}\n", settings.fit_width_margin));
    content.push('\n');
    content.push_str("# Scrolling and selection\n");
    content.push_str(&format!("scroll_margin_px: {}\n", settings.scroll_margin_px));
    content.push_str(&format!(
        "selection_debounce_ms: {}\n",
        settings.selection_debounce_ms
    ));
    content.push_str(&format!("jump_arm_delay_ms: {}\n", settings.jump_arm_delay_ms));
    content.push('\n');
    content.push_str("# Merging of selection rectangles\n");
    content.push_str(&format!(
        "same_line_margin_px: {}\n",
        settings.same_line_margin_px
    ));
    content.push_str(&format!("next_to_margin_px: {}\n", settings.next_to_margin_px));

    content
}

const SETTINGS_HEADER: &str = r#"# ============================================================================
# papernote settings
# ============================================================================
# Delete a line to fall back to its default.

"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "version: 2\nzoom_step: 0.1\n").unwrap();

        let settings = Settings::load_from_path(&path).unwrap();

        assert_eq!(settings.zoom_step, 0.1);
        assert_eq!(settings.zoom_settle_ms, 200);
        assert_eq!(settings.scroll_margin_px, 10.0);
        assert_eq!(settings.jump_arm_delay_ms, 100);
    }

    #[test]
    fn saved_file_loads_back_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let settings = Settings {
            zoom_step: 0.25,
            next_to_margin_px: 12.5,
            ..Settings::default()
        };

        settings.save_to_path(&path).unwrap();

        assert_eq!(Settings::load_from_path(&path).unwrap(), settings);
    }

    #[test]
    fn v1_percentage_zoom_step_is_migrated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "version: 1\nzoom_step: 5\n").unwrap();

        let settings = Settings::load_from_path(&path).unwrap();

        assert_eq!(settings.version, CURRENT_VERSION);
        assert!((settings.zoom_step - 0.05).abs() < 1e-9);
    }

    #[test]
    fn invalid_yaml_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "zoom_step: [").unwrap();

        let err = Settings::load_from_path(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse settings file"));
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(Settings::load_from_path(&dir.path().join("absent.yaml")).is_err());
    }
}
