use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub camera: CameraConfig,
    pub tracking: TrackingConfig,
    pub pinch: PinchConfig,
    pub direction: DirectionConfig,
    pub gesture: GestureConfig,
    pub cursor: CursorConfig,
    pub scroll: ScrollConfig,
    pub zoom: ZoomConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Flip frames horizontally so moving the hand right moves the cursor right.
    pub mirror: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub model_path: String,
    /// Hand presence score below which a detection is dropped.
    pub min_presence: f32,
    /// Keypoints are rescaled so the frame width maps to this many units.
    pub reference_width: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PinchConfig {
    pub threshold_px: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionConfig {
    pub dead_zone_px: f32,
    pub scale_px: f32,
    pub max_component: f32,
    pub max_slope: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Thumb and pinky tips must both be farther than this from the wrist.
    pub extension_px: f32,
    pub dwell_ms: u64,
    /// Only look for the mode-cycle pose while a pinch is active.
    pub require_pinch: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    pub drag_after_secs: f32,
    pub click_min_secs: f32,
    pub click_cooldown_frames: u32,
    pub base_step_px: f32,
    pub max_speed: f32,
    pub speed_ramp_secs: f32,
    pub shallow_gain: f32,
    /// Slopes steeper than this move vertically at the full step rate.
    pub steep_slope: f32,
    pub safety_margin_px: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub gain: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub out_below_px: f32,
    pub in_above_px: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub show_preview: bool,
    pub window_title: String,
    pub landmark_dot_size: usize,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: 640,
            height: 480,
            fps: 30,
            mirror: true,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            model_path: "models/hand_landmark.onnx".to_string(),
            min_presence: 0.5,
            reference_width: 640.0,
        }
    }
}

impl Default for PinchConfig {
    fn default() -> Self {
        Self { threshold_px: 55.0 }
    }
}

impl Default for DirectionConfig {
    fn default() -> Self {
        Self {
            dead_zone_px: 3.0,
            scale_px: 80.0,
            max_component: 2.0,
            max_slope: 10.0,
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            extension_px: 120.0,
            dwell_ms: 200,
            require_pinch: true,
        }
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            drag_after_secs: 0.3,
            click_min_secs: 0.05,
            click_cooldown_frames: 5,
            base_step_px: 10.0,
            max_speed: 1.8,
            speed_ramp_secs: 5.0,
            shallow_gain: 3.0,
            steep_slope: 10.0,
            safety_margin_px: 5,
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self { gain: 2.0 }
    }
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            out_below_px: 30.0,
            in_above_px: 70.0,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_preview: true,
            window_title: "Pinch Pilot".to_string(),
            landmark_dot_size: 4,
        }
    }
}

impl AppConfig {
    pub const DEFAULT_PATH: &'static str = "config.json";

    /// Load the config at `path`, falling back to defaults when the file is
    /// missing or unparsable. The result is validated and written back so new
    /// fields show up in the file.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = fs::read_to_string(path)?;
            // Missing fields take their defaults via #[serde(default)]
            match serde_json::from_str::<AppConfig>(&content) {
                Ok(c) => {
                    info!("Loaded configuration from {}", path.display());
                    c
                }
                Err(e) => {
                    warn!("Error parsing config {}: {}. Loading defaults.", path.display(), e);
                    Self::default()
                }
            }
        } else {
            info!("Configuration file not found. Creating default at {}", path.display());
            Self::default()
        };

        config.validate()?;
        config.save(path)?;

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Check that values are within usable ranges. Returns the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(Error::Config(format!(
                "camera resolution must be non-zero, got {}x{}",
                self.camera.width, self.camera.height
            )));
        }
        if !(0.0..=1.0).contains(&self.tracking.min_presence) {
            return Err(Error::Config(format!(
                "tracking.min_presence must be in [0, 1], got {}",
                self.tracking.min_presence
            )));
        }
        if self.tracking.reference_width <= 0.0 {
            return Err(Error::Config("tracking.reference_width must be > 0".to_string()));
        }
        if self.pinch.threshold_px <= 0.0 {
            return Err(Error::Config(format!(
                "pinch.threshold_px must be > 0, got {}",
                self.pinch.threshold_px
            )));
        }
        if self.direction.scale_px <= 0.0
            || self.direction.max_component <= 0.0
            || self.direction.max_slope <= 0.0
            || self.direction.dead_zone_px < 0.0
        {
            return Err(Error::Config(
                "direction: scale_px, max_component and max_slope must be > 0, dead_zone_px >= 0"
                    .to_string(),
            ));
        }
        if self.gesture.extension_px <= 0.0 {
            return Err(Error::Config("gesture.extension_px must be > 0".to_string()));
        }
        if self.cursor.click_min_secs < 0.0
            || self.cursor.click_min_secs >= self.cursor.drag_after_secs
        {
            return Err(Error::Config(format!(
                "cursor.click_min_secs ({}) must be >= 0 and below drag_after_secs ({})",
                self.cursor.click_min_secs, self.cursor.drag_after_secs
            )));
        }
        if self.cursor.max_speed < 1.0 || self.cursor.speed_ramp_secs <= 0.0 {
            return Err(Error::Config(
                "cursor.max_speed must be >= 1 and speed_ramp_secs > 0".to_string(),
            ));
        }
        if self.cursor.safety_margin_px < 0 {
            return Err(Error::Config("cursor.safety_margin_px must be >= 0".to_string()));
        }
        if self.zoom.out_below_px > self.zoom.in_above_px {
            return Err(Error::Config(format!(
                "zoom.out_below_px ({}) must not exceed in_above_px ({})",
                self.zoom.out_below_px, self.zoom.in_above_px
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_reference_tuning() {
        let config = AppConfig::default();
        assert_eq!(config.pinch.threshold_px, 55.0);
        assert_eq!(config.gesture.extension_px, 120.0);
        assert_eq!(config.gesture.dwell_ms, 200);
        assert_eq!(config.cursor.click_cooldown_frames, 5);
        assert_eq!(config.cursor.safety_margin_px, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.camera.width, 640);
        assert!(path.exists());
    }

    #[test]
    fn test_partial_file_fills_missing_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "pinch": { "threshold_px": 40.0 }, "cursor": { "max_speed": 2.5 } }"#)
            .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.pinch.threshold_px, 40.0);
        assert_eq!(config.cursor.max_speed, 2.5);
        assert_eq!(config.cursor.drag_after_secs, 0.3);

        // Saved back with every field present
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("drag_after_secs"));
    }

    #[test]
    fn test_garbage_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json at all").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.pinch.threshold_px, 55.0);
    }

    #[test]
    fn test_validate_rejects_inverted_click_window() {
        let mut config = AppConfig::default();
        config.cursor.click_min_secs = 0.5;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_inverted_zoom_band() {
        let mut config = AppConfig::default();
        config.zoom.out_below_px = 90.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_values_in_file_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "tracking": { "min_presence": 3.0 } }"#).unwrap();

        assert!(AppConfig::load(&path).is_err());
    }
}
