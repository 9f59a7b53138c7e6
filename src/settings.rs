use crate::error::SettingsError;
use crate::stroke::{StrokeStyle, DEFAULT_LINE_WIDTH};
use egui::Color32;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Environment variable naming an alternative settings file
pub const CONFIG_ENV_VAR: &str = "SKETCHBOARD_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "sketchboard.json";

/// Application settings. Missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old settings
pub struct Settings {
    /// Initial stroke color as RGB
    pub stroke_color: [u8; 3],
    pub line_width: f32,
    pub min_line_width: f32,
    pub max_line_width: f32,
    /// Fixed canvas size; when absent the canvas fills the space available on the first frame
    pub canvas_size: Option<[u32; 2]>,
    /// Directory the native share target writes `drawing.png` into
    pub share_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stroke_color: [0, 0, 0],
            line_width: DEFAULT_LINE_WIDTH,
            min_line_width: 1.0,
            max_line_width: 50.0,
            canvas_size: None,
            share_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load from `$SKETCHBOARD_CONFIG` or `./sketchboard.json`, falling back
    /// to defaults when the file is missing or invalid.
    pub fn load_or_default() -> Self {
        let path = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if !path.exists() {
            log::debug!("No settings file at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load(&path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                log::warn!("Ignoring settings file {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    pub fn stroke_style(&self) -> StrokeStyle {
        let [r, g, b] = self.stroke_color;
        StrokeStyle {
            color: Color32::from_rgb(r, g, b),
            width: self.line_width,
        }
    }

    /// Width range for the slider and the stroke controller. An inverted
    /// range is reordered so clamping never panics.
    pub fn line_width_range(&self) -> RangeInclusive<f32> {
        if self.min_line_width <= self.max_line_width {
            self.min_line_width..=self.max_line_width
        } else {
            self.max_line_width..=self.min_line_width
        }
    }

    /// Repair ranges that would make clamping panic or misbehave
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.min_line_width.is_finite() && self.min_line_width > 0.0) {
            self.min_line_width = defaults.min_line_width;
        }
        if !self.max_line_width.is_finite() || self.max_line_width < self.min_line_width {
            self.max_line_width = self.min_line_width.max(defaults.max_line_width);
        }
        if !self.line_width.is_finite() {
            self.line_width = defaults.line_width;
        }
        self.line_width = self.line_width.clamp(self.min_line_width, self.max_line_width);
        if let Some([width, height]) = self.canvas_size {
            if width == 0 || height == 0 {
                log::warn!("Ignoring empty canvas size {}x{}", width, height);
                self.canvas_size = None;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings = Settings::from_json(r#"{ "line_width": 12.0 }"#).unwrap();
        assert_eq!(settings.line_width, 12.0);
        assert_eq!(settings.stroke_color, [0, 0, 0]);
        assert_eq!(settings.canvas_size, None);
    }

    #[test]
    fn test_invalid_ranges_are_repaired() {
        let settings =
            Settings::from_json(r#"{ "min_line_width": -3.0, "max_line_width": 0.5, "line_width": 400.0 }"#).unwrap();
        assert_eq!(settings.min_line_width, 1.0);
        assert!(settings.max_line_width >= settings.min_line_width);
        assert_eq!(settings.line_width, settings.max_line_width);
    }

    #[test]
    fn test_zero_canvas_size_is_dropped() {
        let settings = Settings::from_json(r#"{ "canvas_size": [0, 300] }"#).unwrap();
        assert_eq!(settings.canvas_size, None);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(Settings::from_json("{ nope"), Err(SettingsError::Parse(_))));
    }

    #[test]
    fn test_inverted_range_is_reordered() {
        let settings = Settings {
            min_line_width: 10.0,
            max_line_width: 5.0,
            ..Settings::default()
        };
        assert_eq!(settings.line_width_range(), 5.0..=10.0);
    }

    #[test]
    fn test_stroke_style_from_settings() {
        let settings = Settings {
            stroke_color: [255, 0, 0],
            ..Settings::default()
        };
        assert_eq!(settings.stroke_style().color, Color32::RED);
        assert_eq!(settings.stroke_style().width, DEFAULT_LINE_WIDTH);
    }
}
