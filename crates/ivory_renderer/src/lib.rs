//! Ivory Renderer - CPU Path Tracing
//!
//! A Monte Carlo path tracer for spheres with diffuse, metal and glass
//! materials. Renders sequentially or across the rayon pool and writes
//! linear floating-point images.

mod camera;
mod frame;
mod hittable;
mod material;
mod output;
mod renderer;
mod settings;
mod sphere;

pub mod sampling;
pub mod scenes;

pub use camera::Camera;
pub use frame::{color_to_rgba, linear_to_gamma, FrameBuffer};
pub use hittable::{HitRecord, Hittable, HittableList};
pub use material::{
    cannot_refract, near_zero, reflect, reflectance, refract, Color, Dielectric, Lambertian,
    Material, Metal, ScatterResult,
};
pub use output::{FileSink, ImageSink, OutputError};
pub use renderer::{
    debug_color, for_each_pixel, pixel_seed, ray_color, render, render_pixel, sky_gradient,
    ExecutionMode, RenderError, RenderReport, RenderSession, RenderedFrames, HIT_EPSILON,
};
pub use settings::{
    image_height_for, ConfigError, RenderSettings, DEFAULT_DEBUG_OUTPUT, DEFAULT_OUTPUT,
};
pub use sphere::Sphere;

/// Re-export Vec3 and common math types from ivory_math
pub use ivory_math::{Interval, Ray, Vec3};
