//! Float RGBA canvas the rasterizer draws into

use image::RgbaImage;

/// Straight-alpha RGBA canvas, pixels stored as `[f32; 4]` in row-major order
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pixels: Vec<[f32; 4]>,
}

impl Canvas {
    /// Create a canvas initialized to transparent black
    pub fn new(width: u32, height: u32) -> Self {
        let pixel_count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            pixels: vec![[0.0, 0.0, 0.0, 0.0]; pixel_count],
        }
    }

    pub fn fill(&mut self, color: [f32; 4]) {
        self.pixels.fill(color);
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize) * (self.width as usize) + (x as usize))
    }

    /// Returns None if coordinates are out of bounds
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Composite `color` over a pixel with the given coverage (0-1)
    ///
    /// Out of bounds coordinates are ignored.
    #[inline]
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: [f32; 4], coverage: f32) {
        let Some(index) = self.index(x, y) else {
            return;
        };
        let src_alpha = (color[3] * coverage).clamp(0.0, 1.0);
        if src_alpha <= 0.0 {
            return;
        }
        let dst = self.pixels[index];
        let dst_weight = dst[3] * (1.0 - src_alpha);
        let out_alpha = src_alpha + dst_weight;
        if out_alpha <= f32::EPSILON {
            self.pixels[index] = [0.0; 4];
            return;
        }

        self.pixels[index] = [
            (color[0] * src_alpha + dst[0] * dst_weight) / out_alpha,
            (color[1] * src_alpha + dst[1] * dst_weight) / out_alpha,
            (color[2] * src_alpha + dst[2] * dst_weight) / out_alpha,
            out_alpha,
        ];
    }

    /// Quantize to 8-bit RGBA
    pub fn to_rgba8(&self) -> RgbaImage {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for pixel in &self.pixels {
            bytes.extend(pixel.iter().map(|c| quantize(*c)));
        }
        // Buffer length always matches the dimensions
        RgbaImage::from_raw(self.width, self.height, bytes)
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }
}

#[inline]
fn quantize(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_canvas_is_transparent() {
        let canvas = Canvas::new(4, 3);
        assert_eq!(canvas.get_pixel(3, 2), Some([0.0; 4]));
        assert_eq!(canvas.get_pixel(4, 0), None);
    }

    #[test]
    fn test_blend_over_opaque() {
        let mut canvas = Canvas::new(2, 2);
        canvas.fill([1.0, 1.0, 1.0, 1.0]);
        canvas.blend_pixel(0, 0, [0.0, 0.0, 0.0, 1.0], 0.5);

        let pixel = canvas.get_pixel(0, 0).unwrap();
        assert!((pixel[0] - 0.5).abs() < 1e-6);
        assert_eq!(pixel[3], 1.0);
    }

    #[test]
    fn test_blend_over_transparent_keeps_color() {
        let mut canvas = Canvas::new(1, 1);
        canvas.blend_pixel(0, 0, [1.0, 0.0, 0.0, 1.0], 0.25);

        let pixel = canvas.get_pixel(0, 0).unwrap();
        // Straight alpha: color stays pure red, only alpha reflects coverage
        assert!((pixel[0] - 1.0).abs() < 1e-6);
        assert!((pixel[3] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_bounds_blend_is_ignored() {
        let mut canvas = Canvas::new(2, 2);
        canvas.blend_pixel(5, 5, [1.0; 4], 1.0);
        assert!(canvas.to_rgba8().pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn test_to_rgba8() {
        let mut canvas = Canvas::new(2, 1);
        canvas.fill([1.0, 0.5, 0.0, 1.0]);
        let image = canvas.to_rgba8();
        assert_eq!(image.dimensions(), (2, 1));
        assert_eq!(image.get_pixel(1, 0).0, [255, 128, 0, 255]);
    }
}
