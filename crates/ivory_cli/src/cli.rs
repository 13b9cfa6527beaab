use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ivory_renderer::{scenes, HittableList, RenderSettings, Vec3};
use log::LevelFilter;
use rand::RngCore;

/// Log levels selectable from the command line
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Built-in scenes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SceneChoice {
    /// Ground, a grid of random small spheres and three large spheres
    Cover,
    /// Ground with one diffuse, one glass and one metal sphere
    ThreeSpheres,
}

impl SceneChoice {
    pub fn build(self, rng: &mut dyn RngCore) -> HittableList {
        match self {
            SceneChoice::Cover => scenes::cover(rng),
            SceneChoice::ThreeSpheres => scenes::three_spheres(),
        }
    }

    /// Camera framing for scenes that are not built around the default view.
    fn apply_view(self, settings: &mut RenderSettings) {
        if self == SceneChoice::ThreeSpheres {
            settings.look_from = Vec3::new(-2.0, 2.0, 1.0);
            settings.look_at = Vec3::new(0.0, 0.0, -1.0);
            settings.vfov = 20.0;
            settings.defocus_angle = 10.0;
            settings.focus_distance = 3.4;
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "ivory")]
#[command(about = "A Monte Carlo path tracer for spheres")]
pub struct Args {
    /// JSON settings file; flags given on the command line take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Image width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Image aspect ratio (width / height)
    #[arg(long)]
    pub aspect_ratio: Option<f32>,

    /// Number of samples per pixel
    #[arg(long, short = 's')]
    pub samples: Option<u32>,

    /// Maximum number of bounces per camera ray
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Vertical field of view in degrees
    #[arg(long)]
    pub fov: Option<f32>,

    /// Render on a single thread in scan-line order
    #[arg(long)]
    pub sequential: bool,

    /// Base sampling seed; a fresh one is drawn per render when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Main output file (.exr keeps linear HDR values, other formats are 8-bit)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output file for the pixel-coordinate debug image
    #[arg(long)]
    pub debug_output: Option<PathBuf>,

    /// Scene to render
    #[arg(long, value_enum, default_value = "cover")]
    pub scene: SceneChoice,

    /// Seed for scene generation
    #[arg(long)]
    pub scene_seed: Option<u64>,

    /// Set the logging level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

impl Args {
    /// Resolve settings, then apply flag overrides.
    ///
    /// The base is the config file when one is given, otherwise the defaults
    /// framed for the chosen scene. A config file keeps its own camera.
    pub fn settings(&self) -> Result<RenderSettings> {
        let mut settings = match &self.config {
            Some(path) => RenderSettings::from_json_file(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => {
                let mut settings = RenderSettings::default();
                self.scene.apply_view(&mut settings);
                settings
            }
        };

        if let Some(width) = self.width {
            settings.image_width = width;
        }
        if let Some(aspect_ratio) = self.aspect_ratio {
            settings.aspect_ratio = aspect_ratio;
        }
        if let Some(samples) = self.samples {
            settings.samples_per_pixel = samples;
        }
        if let Some(max_depth) = self.max_depth {
            settings.max_depth = max_depth;
        }
        if let Some(fov) = self.fov {
            settings.vfov = fov;
        }
        if self.sequential {
            settings.use_threading = false;
        }
        if self.seed.is_some() {
            settings.seed = self.seed;
        }
        if let Some(output) = &self.output {
            settings.output = output.clone();
        }
        if let Some(debug_output) = &self.debug_output {
            settings.debug_output = debug_output.clone();
        }

        settings.validate().context("Invalid render settings")?;
        Ok(settings)
    }
}
