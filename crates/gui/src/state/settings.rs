//! Application settings

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shared::{Rgb, ViewerOptions};

use crate::composite::{DEFAULT_BACKGROUND, DEFAULT_CANVAS_SIZE, DEFAULT_GUIDE_OPACITY};
use crate::viewport::indicator;

const SETTINGS_FILE: &str = "settings.json";

/// Interface language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    Ru,
    En,
}

/// 3D viewport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    /// Edge of the square offscreen render surface in pixels
    pub surface_size: u32,
    /// Grid lines in each direction from origin
    pub grid_range: i32,
    pub grid_cell: f32,
    /// Grid line opacity (0.0 - 1.0)
    pub grid_opacity: f32,
    /// Show camera info overlay
    pub show_camera_info: bool,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            surface_size: 600,
            grid_range: 10,
            grid_cell: 1.0,
            grid_opacity: 0.6,
            show_camera_info: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Minimum spacing between captures
    pub throttle_ms: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self { throttle_ms: 100 }
    }
}

impl CaptureSettings {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

/// Thumbnail canvas settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeSettings {
    pub size: u32,
    pub background: Rgb,
    pub guide_opacity: f32,
    /// Alignment guide drawn under the snapshot
    pub guide_path: Option<PathBuf>,
}

impl Default for CompositeSettings {
    fn default() -> Self {
        Self {
            size: DEFAULT_CANVAS_SIZE,
            background: DEFAULT_BACKGROUND,
            guide_opacity: DEFAULT_GUIDE_OPACITY,
            guide_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    pub visible: bool,
    pub size: u32,
    pub distance: f32,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            visible: true,
            size: indicator::DEFAULT_SIZE,
            distance: indicator::DEFAULT_DISTANCE,
        }
    }
}

/// UI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Font size in points
    pub font_size: f32,
    pub language: Language,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            language: Language::default(),
        }
    }
}

/// All application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub options: ViewerOptions,
    pub viewport: ViewportSettings,
    pub capture: CaptureSettings,
    pub composite: CompositeSettings,
    pub indicator: IndicatorSettings,
    pub ui: UiSettings,
}

impl AppSettings {
    fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "modelshot", "modelshot")
            .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
    }

    /// Load settings from file, or return default if not found
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(json) => Self::from_json(&json),
            Err(_) => Self::default(),
        }
    }

    /// Malformed JSON yields defaults
    pub fn from_json(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed settings: {e}");
            Self::default()
        })
    }

    /// Save settings to file
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            return;
        };
        if let Some(dir) = path.parent() {
            if std::fs::create_dir_all(dir).is_err() {
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    tracing::warn!("Failed to save settings to {}: {e}", path.display());
                }
            }
            Err(e) => tracing::warn!("Failed to serialize settings: {e}"),
        }
    }
}
