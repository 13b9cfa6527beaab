//! Core path tracing renderer.
//!
//! Implements Monte Carlo path tracing with:
//! - Iterative bounce loop bounded by a depth budget
//! - Anti-aliasing via jittered multi-sampling
//! - Sequential or rayon-parallel pixel fan-out with disjoint writes
//! - Per-pixel deterministic seeding, so both modes produce the same image

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Instant;

use ivory_math::Interval;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use thiserror::Error;

use crate::output::{ImageSink, OutputError};
use crate::settings::{ConfigError, RenderSettings};
use crate::{Camera, Color, FrameBuffer, Hittable, Ray};

/// Lower bound of the hit interval; keeps scattered rays from re-hitting
/// the surface they leave.
pub const HIT_EPSILON: f32 = 0.001;

/// How pixel work is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One thread, scan-line order
    Sequential,
    /// Rows fan out over the rayon pool, columns fan out within each row
    Parallel,
}

impl ExecutionMode {
    pub fn from_threading(use_threading: bool) -> Self {
        if use_threading {
            ExecutionMode::Parallel
        } else {
            ExecutionMode::Sequential
        }
    }
}

/// The two buffers produced by a render.
#[derive(Debug, Clone)]
pub struct RenderedFrames {
    /// Averaged radiance estimate per pixel
    pub main: FrameBuffer,
    /// Normalized pixel coordinates as color, for inspecting work layout
    pub debug: FrameBuffer,
    /// Base seed the per-pixel generators were derived from
    pub seed: u64,
}

/// Compute the color seen by a ray.
///
/// Follows the ray through at most `depth` scatter events, carrying the
/// product of attenuations forward. Escaping rays pick up the sky color;
/// absorbed rays and rays that run out of budget contribute black.
pub fn ray_color(ray: &Ray, world: &dyn Hittable, depth: u32, rng: &mut dyn RngCore) -> Color {
    let mut throughput = Color::ONE;
    let mut ray = *ray;

    for _ in 0..depth {
        let Some(rec) = world.hit(&ray, Interval::new(HIT_EPSILON, f32::INFINITY)) else {
            return throughput * sky_gradient(&ray);
        };

        match rec.material.scatter(&ray, &rec, rng) {
            Some(result) => {
                throughput *= result.attenuation;
                ray = result.scattered;
            }
            None => return Color::ZERO,
        }
    }

    Color::ZERO
}

/// Compute sky gradient background.
///
/// White looking straight down, (0.5, 0.7, 1.0) looking straight up.
pub fn sky_gradient(ray: &Ray) -> Color {
    let unit_direction = ray.direction().normalize();
    let a = 0.5 * (unit_direction.y + 1.0);
    let white = Color::new(1.0, 1.0, 1.0);
    let blue = Color::new(0.5, 0.7, 1.0);
    white * (1.0 - a) + blue * a
}

/// Render a single pixel with multi-sampling.
pub fn render_pixel(
    camera: &Camera,
    world: &dyn Hittable,
    x: u32,
    y: u32,
    rng: &mut dyn RngCore,
) -> Color {
    let mut pixel_color = Color::ZERO;

    for _ in 0..camera.samples_per_pixel() {
        let ray = camera.get_ray(x, y, rng);
        pixel_color += ray_color(&ray, world, camera.max_depth(), rng);
    }

    pixel_color * camera.samples_scale()
}

/// Pixel coordinate mapped to [0, 1] on each axis, as a color.
pub fn debug_color(x: u32, y: u32, width: u32, height: u32) -> Color {
    let axis = |i: u32, n: u32| if n > 1 { i as f32 / (n - 1) as f32 } else { 0.0 };
    Color::new(axis(x, width), axis(y, height), 0.0)
}

/// Seed for the generator of pixel (x, y), mixed from the render seed.
pub fn pixel_seed(seed: u64, x: u32, y: u32) -> u64 {
    // splitmix64 finalizer over the packed coordinate
    let mut z = seed ^ ((u64::from(y) << 32) | u64::from(x));
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Evaluate `shade` once for every pixel and collect the results.
///
/// `shade(x, y)` returns the (main, debug) colors for that pixel. Every
/// cell of both buffers is written by exactly one call; in parallel mode
/// each task owns a disjoint slice, so no locking is involved.
pub fn for_each_pixel<F>(
    width: u32,
    height: u32,
    mode: ExecutionMode,
    shade: F,
) -> (FrameBuffer, FrameBuffer)
where
    F: Fn(u32, u32) -> (Color, Color) + Sync,
{
    fan_out(width, height, mode, shade, |remaining| {
        report_rows_remaining(remaining, height)
    })
}

/// Pixel fan-out shared by both modes. `progress` receives the number of
/// rows still outstanding after each row completes.
fn fan_out<F, P>(
    width: u32,
    height: u32,
    mode: ExecutionMode,
    shade: F,
    progress: P,
) -> (FrameBuffer, FrameBuffer)
where
    F: Fn(u32, u32) -> (Color, Color) + Sync,
    P: Fn(u32) + Sync,
{
    let mut main = FrameBuffer::new(width, height);
    let mut debug = FrameBuffer::new(width, height);
    let row_len = width.max(1) as usize;

    match mode {
        ExecutionMode::Sequential => {
            let rows = main
                .pixels_mut()
                .chunks_mut(row_len)
                .zip(debug.pixels_mut().chunks_mut(row_len));
            for (y, (row, debug_row)) in rows.enumerate() {
                let cells = row.iter_mut().zip(debug_row.iter_mut());
                for (x, (pixel, debug_pixel)) in cells.enumerate() {
                    (*pixel, *debug_pixel) = shade(x as u32, y as u32);
                }
                progress(height - (y as u32 + 1));
            }
        }
        ExecutionMode::Parallel => {
            let finished = AtomicU32::new(0);
            main.pixels_mut()
                .par_chunks_mut(row_len)
                .zip(debug.pixels_mut().par_chunks_mut(row_len))
                .enumerate()
                .for_each(|(y, (row, debug_row))| {
                    row.par_iter_mut()
                        .zip(debug_row.par_iter_mut())
                        .enumerate()
                        .for_each(|(x, (pixel, debug_pixel))| {
                            (*pixel, *debug_pixel) = shade(x as u32, y as u32);
                        });
                    let done = finished.fetch_add(1, Ordering::Relaxed) + 1;
                    progress(height - done);
                });
        }
    }

    (main, debug)
}

/// Best-effort progress: every row at debug level, roughly every tenth at info.
fn report_rows_remaining(remaining: u32, height: u32) {
    let step = (height / 10).max(1);
    if remaining % step == 0 {
        log::info!("Rows remaining: {}", remaining);
    } else {
        log::debug!("Rows remaining: {}", remaining);
    }
}

/// Render the scene into a main and a debug buffer.
///
/// Initializes the camera first, so configuration errors surface before any
/// ray is traced.
pub fn render(
    camera: &mut Camera,
    world: &dyn Hittable,
    mode: ExecutionMode,
    seed: u64,
) -> Result<RenderedFrames, ConfigError> {
    camera.initialize()?;
    let camera: &Camera = camera;

    let (width, height) = (camera.image_width(), camera.image_height());
    log::info!(
        "Rendering {}x{} @ {} spp, depth {} ({:?}, {} threads)",
        width,
        height,
        camera.samples_per_pixel(),
        camera.max_depth(),
        mode,
        match mode {
            ExecutionMode::Sequential => 1,
            ExecutionMode::Parallel => rayon::current_num_threads(),
        }
    );

    let start = Instant::now();
    let (main, debug) = for_each_pixel(width, height, mode, |x, y| {
        let mut rng = StdRng::seed_from_u64(pixel_seed(seed, x, y));
        (
            render_pixel(camera, world, x, y, &mut rng),
            debug_color(x, y, width, height),
        )
    });
    log::info!("Rendered in {:.2?}", start.elapsed());

    Ok(RenderedFrames { main, debug, seed })
}

/// Errors that stop a render before any pixel is produced.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("A render is already in progress")]
    AlreadyRunning,

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Result of a completed render, including the fate of both image writes.
#[derive(Debug)]
pub struct RenderReport {
    pub frames: RenderedFrames,
    pub main_write: Result<(), OutputError>,
    pub debug_write: Result<(), OutputError>,
}

impl RenderReport {
    /// True when both buffers reached the sink.
    pub fn all_written(&self) -> bool {
        self.main_write.is_ok() && self.debug_write.is_ok()
    }
}

/// Front-end entry point that allows only one render at a time.
#[derive(Debug, Default)]
pub struct RenderSession {
    in_progress: AtomicBool,
}

/// Clears the in-progress flag on every exit path.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RenderSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while `run` is executing.
    pub fn is_rendering(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Validate `settings`, render `world` and hand both buffers to `sink`.
    ///
    /// A call made while another is running is rejected. Image write
    /// failures are logged and reported but do not fail the render.
    pub fn run(
        &self,
        settings: &RenderSettings,
        world: &dyn Hittable,
        sink: &dyn ImageSink,
    ) -> Result<RenderReport, RenderError> {
        let _guard = InFlight::acquire(&self.in_progress).ok_or_else(|| {
            log::warn!("Render requested while another is in progress; ignoring");
            RenderError::AlreadyRunning
        })?;

        settings.validate()?;

        let seed = settings.seed.unwrap_or_else(rand::random);
        log::info!("Render started (seed {})", seed);

        let mut camera = Camera::from_settings(settings);
        let mode = ExecutionMode::from_threading(settings.use_threading);
        let frames = render(&mut camera, world, mode, seed)?;

        let main_write = write_frame(sink, &frames.main, &settings.output);
        let debug_write = write_frame(sink, &frames.debug, &settings.debug_output);
        log::info!("Done.");

        Ok(RenderReport {
            frames,
            main_write,
            debug_write,
        })
    }
}

fn write_frame(sink: &dyn ImageSink, frame: &FrameBuffer, path: &Path) -> Result<(), OutputError> {
    log::debug!(
        "Writing {}x{} frame to {}",
        frame.width(),
        frame.height(),
        path.display()
    );
    sink.write(frame, path).map_err(|e| {
        log::error!("Failed to write image {}: {}", path.display(), e);
        e
    })
}
