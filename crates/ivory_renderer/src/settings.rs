//! Render settings.
//!
//! The flat configuration record handed to the renderer by a front-end.
//! Field names are snake_case in JSON; the camelCase names used by the
//! interactive parameter form are accepted as aliases.

use std::path::{Path, PathBuf};

use ivory_math::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Camera;

/// Default file name for the main render.
pub const DEFAULT_OUTPUT: &str = "output.exr";

/// Default file name for the work-distribution visualization.
pub const DEFAULT_DEBUG_OUTPUT: &str = "debug.exr";

/// Errors raised when a configuration would produce degenerate geometry.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Aspect ratio must be positive, got {0}")]
    NonPositiveAspectRatio(f32),

    #[error("Image width must be at least 1 pixel")]
    ZeroImageWidth,

    #[error("Samples per pixel must be at least 1")]
    ZeroSamples,

    #[error("Vertical field of view must be in (0, 180) degrees, got {0}")]
    FovOutOfRange(f32),

    #[error("Look-from and look-at are the same point")]
    DegenerateView,

    #[error("View-up vector is parallel to the view direction")]
    ParallelViewUp,

    #[error("Defocus angle must be non-negative, got {0}")]
    NegativeDefocusAngle(f32),

    #[error("Focus distance must be positive, got {0}")]
    NonPositiveFocusDistance(f32),

    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),

    #[error("Output path is empty")]
    EmptyOutputPath,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Immutable-per-render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Fan pixel work out over the rayon pool instead of a single scan-line loop
    #[serde(alias = "useThreading")]
    pub use_threading: bool,

    #[serde(alias = "aspectRatio")]
    pub aspect_ratio: f32,

    #[serde(alias = "imagePlaneWidth")]
    pub image_width: u32,

    #[serde(alias = "samplesPerPixel")]
    pub samples_per_pixel: u32,

    /// Maximum number of bounces per camera ray
    #[serde(alias = "maxDepth")]
    pub max_depth: u32,

    /// Vertical field of view in degrees
    #[serde(alias = "cameraFov")]
    pub vfov: f32,

    #[serde(alias = "cameraLookFrom")]
    pub look_from: Vec3,

    #[serde(alias = "cameraLookAt")]
    pub look_at: Vec3,

    #[serde(alias = "cameraViewUp")]
    pub vup: Vec3,

    /// Cone angle in degrees of rays through each pixel; 0 disables depth of field
    #[serde(alias = "cameraDefocusAngle")]
    pub defocus_angle: f32,

    #[serde(alias = "cameraFocusDistance")]
    pub focus_distance: f32,

    #[serde(alias = "filename")]
    pub output: PathBuf,

    pub debug_output: PathBuf,

    /// Base seed for per-pixel sampling; a fresh one is drawn when absent
    pub seed: Option<u64>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            use_threading: true,
            aspect_ratio: 16.0 / 9.0,
            image_width: 1200,
            samples_per_pixel: 500,
            max_depth: 50,
            vfov: 20.0,
            look_from: Vec3::new(13.0, 2.0, 3.0),
            look_at: Vec3::ZERO,
            vup: Vec3::Y,
            defocus_angle: 0.6,
            focus_distance: 10.0,
            output: PathBuf::from(DEFAULT_OUTPUT),
            debug_output: PathBuf::from(DEFAULT_DEBUG_OUTPUT),
            seed: None,
        }
    }
}

impl RenderSettings {
    /// Parse settings from a JSON document. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check every numeric invariant the camera relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.as_os_str().is_empty() || self.debug_output.as_os_str().is_empty() {
            return Err(ConfigError::EmptyOutputPath);
        }
        Camera::from_settings(self).validate()
    }

    /// Derived image height: max(1, round(width / aspect_ratio)).
    pub fn image_height(&self) -> u32 {
        image_height_for(self.image_width, self.aspect_ratio)
    }
}

/// Image height for a width and aspect ratio, never less than one row.
pub fn image_height_for(image_width: u32, aspect_ratio: f32) -> u32 {
    let height = (image_width as f32 / aspect_ratio).round();
    if height.is_finite() && height >= 1.0 {
        height as u32
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = RenderSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.image_height(), 675);
    }

    #[test]
    fn test_image_height_rounding() {
        assert_eq!(image_height_for(400, 16.0 / 9.0), 225);
        assert_eq!(image_height_for(100, 1.5), 67);
        assert_eq!(image_height_for(100, 1.0), 100);
        // Extremely wide images still get a row
        assert_eq!(image_height_for(10, 1000.0), 1);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = RenderSettings::from_json_str(
            r#"{ "image_width": 320, "samples_per_pixel": 8, "use_threading": false }"#,
        )
        .unwrap();
        assert_eq!(settings.image_width, 320);
        assert_eq!(settings.samples_per_pixel, 8);
        assert!(!settings.use_threading);
        assert_eq!(settings.max_depth, 50);
        assert_eq!(settings.output, PathBuf::from(DEFAULT_OUTPUT));
    }

    #[test]
    fn test_camel_case_aliases() {
        let settings = RenderSettings::from_json_str(
            r#"{
                "imagePlaneWidth": 64,
                "cameraLookFrom": [0.0, 0.0, 5.0],
                "cameraViewUp": [0.0, 1.0, 0.0],
                "filename": "render.exr"
            }"#,
        )
        .unwrap();
        assert_eq!(settings.image_width, 64);
        assert_eq!(settings.look_from, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(settings.output, PathBuf::from("render.exr"));
    }

    #[test]
    fn test_malformed_json() {
        let err = RenderSettings::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = RenderSettings::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_rejects_bad_values() {
        let base = RenderSettings::default();

        let s = RenderSettings { aspect_ratio: 0.0, ..base.clone() };
        assert!(matches!(s.validate(), Err(ConfigError::NonPositiveAspectRatio(_))));

        let s = RenderSettings { image_width: 0, ..base.clone() };
        assert!(matches!(s.validate(), Err(ConfigError::ZeroImageWidth)));

        let s = RenderSettings { samples_per_pixel: 0, ..base.clone() };
        assert!(matches!(s.validate(), Err(ConfigError::ZeroSamples)));

        let s = RenderSettings { vfov: 180.0, ..base.clone() };
        assert!(matches!(s.validate(), Err(ConfigError::FovOutOfRange(_))));

        let s = RenderSettings { look_at: base.look_from, ..base.clone() };
        assert!(matches!(s.validate(), Err(ConfigError::DegenerateView)));

        let s = RenderSettings {
            look_from: Vec3::new(0.0, 5.0, 0.0),
            look_at: Vec3::ZERO,
            vup: Vec3::Y,
            ..base.clone()
        };
        assert!(matches!(s.validate(), Err(ConfigError::ParallelViewUp)));

        let s = RenderSettings { defocus_angle: -1.0, ..base.clone() };
        assert!(matches!(s.validate(), Err(ConfigError::NegativeDefocusAngle(_))));

        let s = RenderSettings { focus_distance: 0.0, ..base.clone() };
        assert!(matches!(s.validate(), Err(ConfigError::NonPositiveFocusDistance(_))));

        let s = RenderSettings { vfov: f32::NAN, ..base.clone() };
        assert!(matches!(s.validate(), Err(ConfigError::NonFinite(_))));

        let s = RenderSettings { output: PathBuf::new(), ..base };
        assert!(matches!(s.validate(), Err(ConfigError::EmptyOutputPath)));
    }

    #[test]
    fn test_zero_max_depth_is_valid() {
        let s = RenderSettings { max_depth: 0, ..RenderSettings::default() };
        assert!(s.validate().is_ok());
    }
}
