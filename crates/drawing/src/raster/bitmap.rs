//! Transformed bitmap drawing

use glam::{Affine2, Vec2};
use image::RgbaImage;

use super::canvas::Canvas;

/// Draw `pixels` centred on the object origin under `transform`
///
/// Each covered device pixel is inverse-mapped into the bitmap and sampled
/// bilinearly in premultiplied space.
pub fn draw_image(canvas: &mut Canvas, pixels: &RgbaImage, transform: Affine2, opacity: f32) {
    let (w, h) = (pixels.width() as f32, pixels.height() as f32);
    if w == 0.0 || h == 0.0 || transform.matrix2.determinant().abs() < 1e-8 {
        return;
    }

    let half = Vec2::new(w / 2.0, h / 2.0);
    let corners = [
        Vec2::new(-half.x, -half.y),
        Vec2::new(half.x, -half.y),
        Vec2::new(half.x, half.y),
        Vec2::new(-half.x, half.y),
    ]
    .map(|c| transform.transform_point2(c));
    let min = corners.iter().fold(corners[0], |m, c| m.min(*c));
    let max = corners.iter().fold(corners[0], |m, c| m.max(*c));

    let x0 = min.x.floor().max(0.0) as u32;
    let y0 = min.y.floor().max(0.0) as u32;
    let x1 = (max.x.ceil().max(0.0) as u32).min(canvas.width);
    let y1 = (max.y.ceil().max(0.0) as u32).min(canvas.height);

    let inverse = transform.inverse();
    for y in y0..y1 {
        for x in x0..x1 {
            let local = inverse.transform_point2(Vec2::new(x as f32 + 0.5, y as f32 + 0.5)) + half;
            if local.x < 0.0 || local.y < 0.0 || local.x >= w || local.y >= h {
                continue;
            }
            let color = sample_bilinear(pixels, local.x - 0.5, local.y - 0.5);
            canvas.blend_pixel(x, y, color, opacity);
        }
    }
}

/// Bilinear sample with clamped edges, returned as straight-alpha floats
fn sample_bilinear(pixels: &RgbaImage, u: f32, v: f32) -> [f32; 4] {
    let max_x = pixels.width() - 1;
    let max_y = pixels.height() - 1;
    let u = u.clamp(0.0, max_x as f32);
    let v = v.clamp(0.0, max_y as f32);
    let (ix, iy) = (u.floor() as u32, v.floor() as u32);
    let (fx, fy) = (u - ix as f32, v - iy as f32);
    let (nx, ny) = ((ix + 1).min(max_x), (iy + 1).min(max_y));

    let taps = [
        (ix, iy, (1.0 - fx) * (1.0 - fy)),
        (nx, iy, fx * (1.0 - fy)),
        (ix, ny, (1.0 - fx) * fy),
        (nx, ny, fx * fy),
    ];
    let mut acc = [0.0f32; 4];
    for (x, y, weight) in taps {
        let [r, g, b, a] = pixels.get_pixel(x, y).0.map(|c| c as f32 / 255.0);
        let wa = weight * a;
        acc[0] += r * wa;
        acc[1] += g * wa;
        acc[2] += b * wa;
        acc[3] += wa;
    }
    if acc[3] <= f32::EPSILON {
        return [0.0; 4];
    }
    [acc[0] / acc[3], acc[1] / acc[3], acc[2] / acc[3], acc[3]]
}
