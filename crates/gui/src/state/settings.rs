//! Application settings

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::i18n::Lang;
use crate::session::ViewerSettings;

/// Generation service connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Base URL of the generation service
    pub url: String,
    /// Send evaluation failures to the service error log
    pub report_errors: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            report_errors: true,
        }
    }
}

/// Sketch pad settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchSettings {
    /// Brush width in canvas pixels
    pub brush_size: f32,
    /// Canvas edge length in pixels
    pub canvas_size: u32,
}

impl Default for SketchSettings {
    fn default() -> Self {
        Self {
            brush_size: 4.0,
            canvas_size: 512,
        }
    }
}

/// UI settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Font size in points
    pub font_size: f32,
    pub language: Lang,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            language: Lang::Ru,
        }
    }
}

/// All application settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub service: ServiceSettings,
    pub viewer: ViewerSettings,
    pub sketch: SketchSettings,
    pub ui: UiSettings,
}

impl AppSettings {
    fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "sketchforge", "sketchforge")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings from the platform config dir, or defaults if missing or unreadable
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Option<Self> {
        let json = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&json) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!("Ignoring malformed settings file {}: {e}", path.display());
                None
            }
        }
    }

    /// Save settings to file
    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Err(e) = self.save_to(&path) {
                tracing::warn!("Failed to save settings: {e}");
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = AppSettings::default();
        settings.service.url = "http://example.test:9000".to_string();
        settings.viewer.invert_wheel = true;
        settings.save_to(&path).unwrap();
        assert_eq!(AppSettings::load_from(&path), Some(settings));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "viewer": { "show_grid": false } }"#).unwrap();
        let settings = AppSettings::load_from(&path).unwrap();
        assert!(!settings.viewer.show_grid);
        assert!(settings.viewer.show_axes);
        assert_eq!(settings.sketch.canvas_size, 512);
    }

    #[test]
    fn test_malformed_file_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(AppSettings::load_from(&path).is_none());
    }
}
