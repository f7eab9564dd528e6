//! Path flattening and non-zero scanline filling
//!
//! Points are mapped to device space as they are added, so curves are
//! flattened against the final pixel grid.

use glam::{Affine2, Vec2};

use super::canvas::Canvas;
use crate::constants::{CURVE_TOLERANCE, SUBSCANLINES};

const MAX_CURVE_SEGMENTS: u32 = 64;

/// Flattened path in device pixels
#[derive(Debug, Clone, Default)]
pub struct Path {
    contours: Vec<Vec<Vec2>>,
}

impl Path {
    pub fn is_empty(&self) -> bool {
        self.contours.iter().all(|c| c.len() < 2)
    }

    /// Bounding box as (min, max), None for an empty path
    pub fn bounds(&self) -> Option<(Vec2, Vec2)> {
        let mut points = self.contours.iter().flatten();
        let first = *points.next()?;
        Some(points.fold((first, first), |(min, max), p| (min.min(*p), max.max(*p))))
    }

    /// Edges of all contours, each contour implicitly closed
    fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.contours.iter().filter(|c| c.len() >= 2).flat_map(|contour| {
            contour
                .iter()
                .zip(contour.iter().cycle().skip(1))
                .map(|(a, b)| (*a, *b))
        })
    }
}

/// Builds a [`Path`] from object-local drawing commands
pub struct PathBuilder {
    transform: Affine2,
    path: Path,
    current: Vec<Vec2>,
}

impl PathBuilder {
    /// `transform` maps the coordinates passed to the builder into device pixels
    pub fn new(transform: Affine2) -> Self {
        Self {
            transform,
            path: Path::default(),
            current: Vec::new(),
        }
    }

    fn last(&self) -> Vec2 {
        self.current.last().copied().unwrap_or(Vec2::ZERO)
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.close();
        self.current.push(self.transform.transform_point2(Vec2::new(x, y)));
    }

    pub fn line_to(&mut self, x: f32, y: f32) {
        self.current.push(self.transform.transform_point2(Vec2::new(x, y)));
    }

    pub fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let p0 = self.last();
        let p1 = self.transform.transform_point2(Vec2::new(x1, y1));
        let p2 = self.transform.transform_point2(Vec2::new(x, y));

        let deviation = (p0 - 2.0 * p1 + p2).length();
        let segments = segment_count(deviation * 0.25);
        for i in 1..=segments {
            let t = i as f32 / segments as f32;
            let mt = 1.0 - t;
            self.current.push(p0 * (mt * mt) + p1 * (2.0 * mt * t) + p2 * (t * t));
        }
    }

    pub fn cubic_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let p0 = self.last();
        let p1 = self.transform.transform_point2(Vec2::new(x1, y1));
        let p2 = self.transform.transform_point2(Vec2::new(x2, y2));
        let p3 = self.transform.transform_point2(Vec2::new(x, y));

        let deviation = (p0 - 2.0 * p1 + p2)
            .length()
            .max((p1 - 2.0 * p2 + p3).length());
        let segments = segment_count(deviation * 0.75);
        for i in 1..=segments {
            let t = i as f32 / segments as f32;
            let mt = 1.0 - t;
            self.current.push(
                p0 * (mt * mt * mt)
                    + p1 * (3.0 * mt * mt * t)
                    + p2 * (3.0 * mt * t * t)
                    + p3 * (t * t * t),
            );
        }
    }

    /// Finish the current contour
    pub fn close(&mut self) {
        if self.current.len() >= 2 {
            self.path.contours.push(std::mem::take(&mut self.current));
        } else {
            self.current.clear();
        }
    }

    /// Add a closed polygon
    pub fn polygon(&mut self, points: &[Vec2]) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.move_to(first.x, first.y);
        for p in rest {
            self.line_to(p.x, p.y);
        }
        self.close();
    }

    pub fn finish(mut self) -> Path {
        self.close();
        self.path
    }
}

fn segment_count(deviation: f32) -> u32 {
    let n = (deviation / CURVE_TOLERANCE).sqrt().ceil();
    if n.is_finite() {
        (n as u32).clamp(1, MAX_CURVE_SEGMENTS)
    } else {
        1
    }
}

/// Fill a path with the non-zero winding rule
pub fn fill_path(canvas: &mut Canvas, path: &Path, color: [f32; 4], opacity: f32) {
    let Some((min, max)) = path.bounds() else {
        return;
    };
    let x0 = min.x.floor().max(0.0) as i64;
    let x1 = (max.x.ceil() as i64).min(canvas.width as i64);
    let y0 = min.y.floor().max(0.0) as i64;
    let y1 = (max.y.ceil() as i64).min(canvas.height as i64);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let edges: Vec<(Vec2, Vec2)> = path.edges().filter(|(a, b)| a.y != b.y).collect();
    let span_width = (x1 - x0) as usize;
    let mut coverage = vec![0.0f32; span_width];
    let mut crossings: Vec<(f32, i32)> = Vec::new();
    let weight = 1.0 / SUBSCANLINES as f32;

    for y in y0..y1 {
        coverage.fill(0.0);
        for sub in 0..SUBSCANLINES {
            let sample_y = y as f32 + (sub as f32 + 0.5) * weight;

            crossings.clear();
            for (a, b) in &edges {
                let (top, bottom, winding) = if a.y < b.y { (a, b, 1) } else { (b, a, -1) };
                if sample_y < top.y || sample_y >= bottom.y {
                    continue;
                }
                let t = (sample_y - top.y) / (bottom.y - top.y);
                crossings.push((top.x + t * (bottom.x - top.x), winding));
            }
            crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut winding = 0;
            let mut span_start = 0.0;
            for (x, dir) in &crossings {
                let was_inside = winding != 0;
                winding += dir;
                let inside = winding != 0;
                if !was_inside && inside {
                    span_start = *x;
                } else if was_inside && !inside {
                    add_span(&mut coverage, span_start - x0 as f32, x - x0 as f32, weight);
                }
            }
        }

        for (i, cov) in coverage.iter().enumerate() {
            if *cov > 0.0 {
                canvas.blend_pixel(x0 as u32 + i as u32, y as u32, color, cov.min(1.0) * opacity);
            }
        }
    }
}

/// Accumulate horizontal coverage for `[start, end)` with fractional ends
fn add_span(coverage: &mut [f32], start: f32, end: f32, weight: f32) {
    let len = coverage.len() as f32;
    let start = start.clamp(0.0, len);
    let end = end.clamp(0.0, len);
    if end <= start {
        return;
    }

    let first = start.floor() as usize;
    let last = end.floor() as usize;
    if first == last {
        coverage[first] += (end - start) * weight;
        return;
    }
    coverage[first] += (first as f32 + 1.0 - start) * weight;
    for cell in &mut coverage[first + 1..last] {
        *cell += weight;
    }
    if last < coverage.len() {
        coverage[last] += (end - last as f32) * weight;
    }
}
