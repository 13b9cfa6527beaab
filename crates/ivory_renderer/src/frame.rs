//! Floating-point frame buffer.
//!
//! Row-major RGB storage for render output plus the conversions needed by
//! image sinks.

use crate::Color;
use ivory_math::Interval;

/// Row-major buffer of linear RGB colors, `width * height` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl FrameBuffer {
    /// Create a new frame buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        y as usize * self.width as usize + x as usize
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let i = self.index(x, y);
        self.pixels[i] = color;
    }

    /// All pixels in row-major order.
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Rows from top to bottom, each `width` pixels long.
    pub fn rows(&self) -> impl Iterator<Item = &[Color]> + '_ {
        self.pixels.chunks(self.width.max(1) as usize)
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [Color] {
        &mut self.pixels
    }

    /// Average color over the whole frame.
    pub fn mean(&self) -> Color {
        if self.pixels.is_empty() {
            return Color::ZERO;
        }
        let sum: Color = self.pixels.iter().copied().sum();
        sum / self.pixels.len() as f32
    }

    /// Interleaved linear RGB floats, for HDR formats.
    pub fn to_rgb_f32(&self) -> Vec<f32> {
        self.pixels.iter().flat_map(|c| [c.x, c.y, c.z]).collect()
    }

    /// Convert to gamma-encoded RGBA bytes (for LDR formats or display).
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| color_to_rgba(*c)).collect()
    }
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    const INTENSITY: Interval = Interval::new(0.0, 0.999);
    let to_byte = |c: f32| (256.0 * INTENSITY.clamp(linear_to_gamma(c))) as u8;
    [to_byte(color.x), to_byte(color.y), to_byte(color.z), 255]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_black_and_sized() {
        let frame = FrameBuffer::new(4, 3);
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 3);
        assert_eq!(frame.pixels().len(), 12);
        assert!(frame.pixels().iter().all(|c| *c == Color::ZERO));
    }

    #[test]
    fn test_set_get_row_major() {
        let mut frame = FrameBuffer::new(4, 3);
        frame.set(1, 2, Color::new(0.1, 0.2, 0.3));
        assert_eq!(frame.get(1, 2), Color::new(0.1, 0.2, 0.3));
        assert_eq!(frame.pixels()[2 * 4 + 1], Color::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_rows_top_to_bottom() {
        let mut frame = FrameBuffer::new(3, 2);
        frame.set(2, 0, Color::X);
        frame.set(0, 1, Color::Y);

        let rows: Vec<&[Color]> = frame.rows().collect();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.len() == 3));
        assert_eq!(rows[0][2], Color::X);
        assert_eq!(rows[1][0], Color::Y);

        assert_eq!(FrameBuffer::new(0, 5).rows().count(), 0);
    }

    #[test]
    fn test_mean() {
        let mut frame = FrameBuffer::new(2, 1);
        frame.set(0, 0, Color::new(1.0, 0.0, 0.0));
        frame.set(1, 0, Color::new(0.0, 0.0, 1.0));
        assert_eq!(frame.mean(), Color::new(0.5, 0.0, 0.5));
    }

    #[test]
    fn test_rgb_f32_interleaving() {
        let mut frame = FrameBuffer::new(2, 1);
        frame.set(1, 0, Color::new(4.0, 5.0, 6.0));
        assert_eq!(frame.to_rgb_f32(), vec![0.0, 0.0, 0.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert_eq!(linear_to_gamma(-1.0), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 0.0001);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_color_to_rgba_clamps() {
        assert_eq!(color_to_rgba(Color::ZERO), [0, 0, 0, 255]);
        assert_eq!(color_to_rgba(Color::splat(4.0)), [255, 255, 255, 255]);
        assert_eq!(color_to_rgba(Color::new(0.25, 0.0, 0.0))[0], 128);
    }
}
