//! Scene, motion and front-end settings.
//!
//! Every field has a serde default equal to the values the page ships with,
//! so an empty TOML file yields the stock scene.

use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarfolioConfig {
    pub camera: CameraConfig,
    pub scroll: ScrollConfig,
    pub frame: FrameConfig,
    pub stars: StarsConfig,
    pub assets: AssetsConfig,
    pub clipboard: ClipboardConfig,
    pub web: WebConfig,
    pub terminal: TerminalConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub initial_position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            initial_position: [-10.0, 0.0, 50.0],
        }
    }
}

/// Linear scroll-to-camera coefficients plus the per-event spin deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub z_per_offset: f32,
    pub x_per_offset: f32,
    pub yaw_per_offset: f32,
    pub earth_spin: [f32; 3],
    pub avatar_spin: [f32; 3],
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            z_per_offset: -0.02,
            x_per_offset: -0.0005,
            yaw_per_offset: -0.0001,
            earth_spin: [0.05, 0.075, 0.05],
            avatar_spin: [0.0, 0.04, 0.04],
        }
    }
}

/// How frame deltas relate to wall-clock time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MotionMode {
    /// Fixed delta per refresh callback; speed follows the display rate.
    #[default]
    PerCallback,
    /// Deltas scaled by `elapsed * reference_hz`, so a display running at
    /// `reference_hz` matches `PerCallback` exactly.
    TimeScaled { reference_hz: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub torus_spin: [f32; 3],
    pub earth_spin: [f32; 3],
    pub mode: MotionMode,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            torus_spin: [0.01, 0.005, 0.01],
            earth_spin: [0.005, 0.0, 0.0],
            mode: MotionMode::PerCallback,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarsConfig {
    pub count: usize,
    /// Width of the cube stars are scattered in, centred on the origin.
    pub spread: f32,
}

impl Default for StarsConfig {
    fn default() -> Self {
        Self {
            count: 200,
            spread: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub background: String,
    pub avatar: String,
    pub earth: String,
    pub earth_normal: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            background: "space.jpg".into(),
            avatar: "duncan.png".into(),
            earth: "earth.png".into(),
            earth_normal: "normal.jpg".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardConfig {
    pub success_message: String,
    pub failure_prefix: String,
    /// Text copied by front ends that have no page to read it from.
    pub text: Option<String>,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            success_message: "Email has been copied!".into(),
            failure_prefix: "Failed to copy email".into(),
            text: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub canvas_id: String,
    pub copy_source_id: String,
    pub copy_trigger_id: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            canvas_id: "bg".into(),
            copy_source_id: "copy-text".into(),
            copy_trigger_id: "copy-text-btn".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    pub fps: u32,
    /// Page pixels scrolled per wheel notch or key press.
    pub scroll_step: f32,
    /// Deepest scroll position, in page pixels.
    pub max_scroll: f32,
    /// Width / height of a terminal cell.
    pub cell_aspect: f32,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            scroll_step: 60.0,
            max_scroll: 4000.0,
            cell_aspect: 0.5,
        }
    }
}

impl StarfolioConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))
    }

    /// Load config from a TOML file.
    ///
    /// Missing fields take their defaults. A file that parses but fails
    /// validation is logged and replaced by the default config.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::ParseError(format!("failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&content)?;

        if let Err(e) = config.validate() {
            warn!("config validation warning: {e}");
            warn!("falling back to default config");
            return Ok(Self::default());
        }

        info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let camera = &self.camera;
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(ConfigError::ValidationError(format!(
                "camera.fov_degrees must be in (0, 180), got {}",
                camera.fov_degrees
            )));
        }
        if !(camera.near > 0.0) {
            return Err(ConfigError::ValidationError(
                "camera.near must be positive".into(),
            ));
        }
        if camera.near >= camera.far {
            return Err(ConfigError::ValidationError(format!(
                "camera.near ({}) must be less than camera.far ({})",
                camera.near, camera.far
            )));
        }
        if !(self.stars.spread.is_finite() && self.stars.spread >= 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "stars.spread must be finite and not negative, got {}",
                self.stars.spread
            )));
        }
        if let MotionMode::TimeScaled { reference_hz } = self.frame.mode {
            if !(reference_hz > 0.0) {
                return Err(ConfigError::ValidationError(
                    "frame.mode.reference_hz must be positive".into(),
                ));
            }
        }
        if matches!(&self.clipboard.text, Some(text) if text.is_empty()) {
            return Err(ConfigError::ValidationError(
                "clipboard.text must not be empty when set".into(),
            ));
        }
        let cell_aspect = self.terminal.cell_aspect;
        if !(cell_aspect.is_finite() && cell_aspect > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "terminal.cell_aspect must be positive and finite, got {cell_aspect}"
            )));
        }
        if self.terminal.fps == 0 {
            return Err(ConfigError::ValidationError(
                "terminal.fps must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_stock_scene() {
        let config = StarfolioConfig::from_toml_str("").unwrap();
        assert_eq!(config, StarfolioConfig::default());
        assert_eq!(config.stars.count, 200);
        assert_eq!(config.scroll.z_per_offset, -0.02);
        assert_eq!(config.frame.torus_spin, [0.01, 0.005, 0.01]);
        assert_eq!(config.frame.mode, MotionMode::PerCallback);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = StarfolioConfig::from_toml_str(
            r#"
            [stars]
            count = 50

            [frame.mode]
            kind = "time_scaled"
            reference_hz = 60.0

            [clipboard]
            text = "someone@example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.stars.count, 50);
        assert_eq!(config.stars.spread, 100.0);
        assert_eq!(config.frame.mode, MotionMode::TimeScaled { reference_hz: 60.0 });
        assert_eq!(config.clipboard.text.as_deref(), Some("someone@example.com"));
        assert_eq!(config.clipboard.success_message, "Email has been copied!");
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = StarfolioConfig::from_toml_str("[stars\ncount = ").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn validation_rejects_inverted_clip_planes() {
        let mut config = StarfolioConfig::default();
        config.camera.near = 10.0;
        config.camera.far = 1.0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn validation_rejects_nan_fov_and_empty_copy_text() {
        let mut config = StarfolioConfig::default();
        config.camera.fov_degrees = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = StarfolioConfig::default();
        config.clipboard.text = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_reported() {
        let err = StarfolioConfig::load_from_path(Path::new("/nonexistent/starfolio.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!(
            "starfolio-invalid-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[stars]\nspread = -1.0\n").unwrap();
        let config = StarfolioConfig::load_from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config, StarfolioConfig::default());
    }

    #[test]
    fn infinite_star_spread_falls_back_to_defaults() {
        let config = StarfolioConfig::from_toml_str("[stars]\nspread = inf\n").unwrap();
        assert!(config.stars.spread.is_infinite());
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let path = std::env::temp_dir().join(format!(
            "starfolio-inf-spread-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[stars]\nspread = inf\n").unwrap();
        let config = StarfolioConfig::load_from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config, StarfolioConfig::default());
    }

    #[test]
    fn validation_rejects_degenerate_cell_aspect() {
        for value in ["0.0", "-0.5", "nan", "inf"] {
            let config =
                StarfolioConfig::from_toml_str(&format!("[terminal]\ncell_aspect = {value}\n"))
                    .unwrap();
            assert!(
                matches!(config.validate(), Err(ConfigError::ValidationError(_))),
                "cell_aspect = {value} should be rejected"
            );
        }
    }
}
