//! Camera for ray generation.

use crate::sampling::{random_in_unit_disk, sample_square};
use crate::settings::{image_height_for, ConfigError, RenderSettings};
use crate::Ray;
use ivory_math::Vec3;
use rand::RngCore;

/// Camera for generating rays into the scene.
///
/// Configure with the `with_*` builders, then call [`Camera::initialize`]
/// once per render to validate the configuration and derive the viewport.
/// Any builder call returns the camera to the uninitialized state.
#[derive(Debug, Clone)]
pub struct Camera {
    // Image settings
    image_width: u32,
    aspect_ratio: f32,
    samples_per_pixel: u32,
    max_depth: u32,

    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    // Lens settings
    vfov: f32,          // Vertical field of view in degrees
    defocus_angle: f32, // Variation angle of rays through each pixel
    focus_dist: f32,    // Distance from camera to plane of perfect focus

    // Cached computed values (set by initialize())
    initialized: bool,
    image_height: u32,
    center: Vec3,
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
    samples_scale: f32,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self {
            image_width: 100,
            aspect_ratio: 1.0,
            samples_per_pixel: 10,
            max_depth: 10,
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            vfov: 90.0,
            defocus_angle: 0.0,
            focus_dist: 10.0,
            initialized: false,
            image_height: 100,
            center: Vec3::ZERO,
            pixel00_loc: Vec3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
            defocus_disk_u: Vec3::ZERO,
            defocus_disk_v: Vec3::ZERO,
            samples_scale: 0.1,
        }
    }

    /// Build an uninitialized camera from a settings record.
    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self::new()
            .with_image(settings.image_width, settings.aspect_ratio)
            .with_quality(settings.samples_per_pixel, settings.max_depth)
            .with_position(settings.look_from, settings.look_at, settings.vup)
            .with_lens(settings.vfov, settings.defocus_angle, settings.focus_distance)
    }

    /// Set image width and aspect ratio; the height is derived.
    pub fn with_image(mut self, width: u32, aspect_ratio: f32) -> Self {
        self.image_width = width;
        self.aspect_ratio = aspect_ratio;
        self.initialized = false;
        self
    }

    /// Set quality settings.
    pub fn with_quality(mut self, samples: u32, max_depth: u32) -> Self {
        self.samples_per_pixel = samples;
        self.max_depth = max_depth;
        self.initialized = false;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self.initialized = false;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, defocus_angle: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.defocus_angle = defocus_angle;
        self.focus_dist = focus_dist;
        self.initialized = false;
        self
    }

    /// Check the configuration for values that would yield NaN or
    /// degenerate viewport geometry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scalars = [
            ("aspect ratio", self.aspect_ratio),
            ("field of view", self.vfov),
            ("defocus angle", self.defocus_angle),
            ("focus distance", self.focus_dist),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite(name));
            }
        }
        let vectors = [
            ("look-from", self.look_from),
            ("look-at", self.look_at),
            ("view-up", self.vup),
        ];
        for (name, value) in vectors {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite(name));
            }
        }

        if self.aspect_ratio <= 0.0 {
            return Err(ConfigError::NonPositiveAspectRatio(self.aspect_ratio));
        }
        if self.image_width == 0 {
            return Err(ConfigError::ZeroImageWidth);
        }
        if self.samples_per_pixel == 0 {
            return Err(ConfigError::ZeroSamples);
        }
        if self.vfov <= 0.0 || self.vfov >= 180.0 {
            return Err(ConfigError::FovOutOfRange(self.vfov));
        }

        let view = self.look_from - self.look_at;
        if view.length_squared() < 1e-12 {
            return Err(ConfigError::DegenerateView);
        }
        if self.vup.cross(view.normalize()).length_squared() < 1e-12 {
            return Err(ConfigError::ParallelViewUp);
        }

        if self.defocus_angle < 0.0 {
            return Err(ConfigError::NegativeDefocusAngle(self.defocus_angle));
        }
        if self.focus_dist <= 0.0 {
            return Err(ConfigError::NonPositiveFocusDistance(self.focus_dist));
        }

        Ok(())
    }

    /// Validate the configuration and derive the viewport state.
    ///
    /// Must be called before generating rays. Calling it again recomputes
    /// the same state.
    pub fn initialize(&mut self) -> Result<(), ConfigError> {
        self.validate()?;

        self.image_height = image_height_for(self.image_width, self.aspect_ratio);
        self.samples_scale = 1.0 / self.samples_per_pixel as f32;
        self.center = self.look_from;

        // Calculate viewport dimensions
        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * self.focus_dist;
        let viewport_width =
            viewport_height * (self.image_width as f32 / self.image_height as f32);

        // Calculate camera basis vectors
        self.w = (self.look_from - self.look_at).normalize();
        self.u = self.vup.cross(self.w).normalize();
        self.v = self.w.cross(self.u);

        // Calculate viewport vectors
        let viewport_u = viewport_width * self.u;
        let viewport_v = -viewport_height * self.v;

        // Calculate pixel delta vectors
        self.pixel_delta_u = viewport_u / self.image_width as f32;
        self.pixel_delta_v = viewport_v / self.image_height as f32;

        // Calculate upper left pixel location
        let viewport_upper_left =
            self.center - self.focus_dist * self.w - viewport_u / 2.0 - viewport_v / 2.0;

        self.pixel00_loc = viewport_upper_left + 0.5 * (self.pixel_delta_u + self.pixel_delta_v);

        // Calculate defocus disk basis vectors
        let defocus_radius = self.focus_dist * (self.defocus_angle / 2.0).to_radians().tan();
        self.defocus_disk_u = self.u * defocus_radius;
        self.defocus_disk_v = self.v * defocus_radius;

        self.initialized = true;
        log::debug!(
            "Camera initialized: {}x{}, {} spp, depth {}",
            self.image_width,
            self.image_height,
            self.samples_per_pixel,
            self.max_depth
        );
        Ok(())
    }

    /// Generate a jittered ray for pixel (x, y).
    pub fn get_ray(&self, x: u32, y: u32, rng: &mut dyn RngCore) -> Ray {
        debug_assert!(self.initialized, "Camera::initialize must run before get_ray");

        let offset = sample_square(rng);

        let pixel_sample = self.pixel00_loc
            + ((x as f32) + offset.x) * self.pixel_delta_u
            + ((y as f32) + offset.y) * self.pixel_delta_v;

        let ray_origin = if self.defocus_angle <= 0.0 {
            self.center
        } else {
            self.defocus_disk_sample(rng)
        };

        Ray::new(ray_origin, pixel_sample - ray_origin)
    }

    /// Sample a point on the defocus disk.
    fn defocus_disk_sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        let p = random_in_unit_disk(rng);
        self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn image_width(&self) -> u32 {
        self.image_width
    }

    /// Derived image height; only meaningful after `initialize`.
    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    pub fn samples_per_pixel(&self) -> u32 {
        self.samples_per_pixel
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Get the samples scale factor (1 / samples_per_pixel).
    pub fn samples_scale(&self) -> f32 {
        self.samples_scale
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn forward_camera(width: u32, aspect: f32) -> Camera {
        Camera::new()
            .with_image(width, aspect)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_lens(90.0, 0.0, 1.0)
    }

    #[test]
    fn test_camera_initialize() {
        let mut camera = forward_camera(800, 4.0 / 3.0);
        assert!(!camera.is_initialized());

        camera.initialize().unwrap();

        assert!(camera.is_initialized());
        assert_eq!(camera.image_height(), 600);
        assert_eq!(camera.center, Vec3::ZERO);
        assert!((camera.w - Vec3::Z).length() < 0.001);
        assert!((camera.u - Vec3::X).length() < 0.001);
        assert!((camera.v - Vec3::Y).length() < 0.001);
        assert!((camera.samples_scale() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_pixel_grid_spans_viewport() {
        // 90 degree fov at focus distance 1: viewport is 2 units tall and wide
        let mut camera = forward_camera(100, 1.0);
        camera.initialize().unwrap();

        assert!((camera.pixel_delta_u - Vec3::new(0.02, 0.0, 0.0)).length() < 1e-6);
        assert!((camera.pixel_delta_v - Vec3::new(0.0, -0.02, 0.0)).length() < 1e-6);
        assert!((camera.pixel00_loc - Vec3::new(-0.99, 0.99, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_camera_ray_direction() {
        let mut camera = forward_camera(100, 1.0);
        camera.initialize().unwrap();

        let mut rng = StdRng::seed_from_u64(42);

        // Center ray should point roughly towards -Z
        let ray = camera.get_ray(50, 50, &mut rng);
        assert!(ray.direction().z < 0.0);
        assert_eq!(ray.origin(), Vec3::ZERO);

        // Corner ray stays inside its pixel footprint
        let ray = camera.get_ray(0, 0, &mut rng);
        let target = ray.at(1.0);
        assert!(target.x >= -1.0 - 1e-5 && target.x <= -0.98 + 1e-5);
        assert!(target.y <= 1.0 + 1e-5 && target.y >= 0.98 - 1e-5);
    }

    #[test]
    fn test_defocus_origins_within_disk() {
        let mut camera = forward_camera(10, 1.0).with_lens(90.0, 10.0, 5.0);
        camera.initialize().unwrap();

        let radius = 5.0 * (5.0f32).to_radians().tan();
        let mut rng = StdRng::seed_from_u64(9);
        let mut moved = false;
        for _ in 0..200 {
            let ray = camera.get_ray(5, 5, &mut rng);
            let offset = ray.origin() - camera.center();
            assert!(offset.length() <= radius + 1e-4);
            assert!(offset.z.abs() < 1e-5);
            moved |= offset.length() > 0.0;
        }
        assert!(moved);
    }

    #[test]
    fn test_initialize_rejects_parallel_up() {
        let mut camera = forward_camera(10, 1.0).with_position(
            Vec3::ZERO,
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::Y,
        );
        assert!(matches!(camera.initialize(), Err(ConfigError::ParallelViewUp)));
        assert!(!camera.is_initialized());
    }

    #[test]
    fn test_builder_resets_initialization() {
        let mut camera = forward_camera(10, 1.0);
        camera.initialize().unwrap();
        let camera = camera.with_quality(4, 2);
        assert!(!camera.is_initialized());
    }
}
