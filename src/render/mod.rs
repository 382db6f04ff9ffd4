//! Rasterization of layer content and composition of whole documents.
//!
//! Stroke capture and ink rendering belong to an external drawing engine,
//! reached through the [`Rasterizer`] trait. [`StrokeRasterizer`] renders the
//! bundled [`Drawing`](crate::stroke::Drawing) blob format.

pub mod blend;
pub mod composite;

use crate::stroke::{Drawing, Stroke};
use egui::{Pos2, Rect};
use image::{Rgba, RgbaImage};

pub use composite::{fit_scale, fitted_size, render_composite, render_layer};

/// Turns an opaque content blob into pixels
pub trait Rasterizer {
    /// Bounds of the drawn content in canvas coordinates; `Rect::NOTHING` if blank
    fn content_bounds(&self, content: &[u8]) -> Rect;

    /// Renders the `source` region of the content, scaled by `scale`, into a
    /// transparent image of `size` pixels
    fn rasterize(&self, content: &[u8], source: Rect, scale: f32, size: [u32; 2]) -> RgbaImage;
}

/// Software rasterizer for JSON stroke drawings.
///
/// Each stroke is stamped as a chain of round discs into a coverage mask,
/// then blended once so overlapping stamps never darken a translucent stroke.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrokeRasterizer;

impl Rasterizer for StrokeRasterizer {
    fn content_bounds(&self, content: &[u8]) -> Rect {
        Drawing::from_bytes_lossy(content).bounds()
    }

    fn rasterize(&self, content: &[u8], source: Rect, scale: f32, size: [u32; 2]) -> RgbaImage {
        let [width, height] = size;
        let mut image = RgbaImage::new(width, height);
        if width == 0 || height == 0 || scale.is_nan() || scale <= 0.0 {
            return image;
        }
        let drawing = Drawing::from_bytes_lossy(content);
        let mut mask = vec![false; width as usize * height as usize];
        for stroke in drawing.strokes() {
            mask.fill(false);
            stamp_stroke(&mut mask, size, stroke, source.min, scale);
            let [r, g, b, a] = stroke.color().to_srgba_unmultiplied();
            let color = Rgba([r, g, b, a]);
            for (index, covered) in mask.iter().enumerate() {
                if *covered {
                    let x = (index % width as usize) as u32;
                    let y = (index / width as usize) as u32;
                    let dst = image.get_pixel_mut(x, y);
                    *dst = blend::blend_pixel(*dst, color, 1.0);
                }
            }
        }
        image
    }
}

fn stamp_stroke(mask: &mut [bool], size: [u32; 2], stroke: &Stroke, origin: Pos2, scale: f32) {
    let radius = (stroke.thickness() * scale / 2.0).max(0.5);
    let to_pixels = |p: Pos2| Pos2::new((p.x - origin.x) * scale, (p.y - origin.y) * scale);
    let points: Vec<Pos2> = stroke.points().iter().copied().map(to_pixels).collect();

    if !radius.is_finite() {
        return;
    }
    // Stamps outside this rect cannot touch the mask
    let visible = Rect::from_min_max(Pos2::ZERO, Pos2::new(size[0] as f32, size[1] as f32))
        .expand(radius);

    match points.as_slice() {
        [] => {}
        [single] => {
            if visible.contains(*single) {
                stamp_disc(mask, size, *single, radius);
            }
        }
        _ => {
            let spacing = (radius * 0.5).max(0.5);
            for segment in points.windows(2) {
                let Some((a, b)) = clip_segment(segment[0], segment[1], visible) else {
                    continue;
                };
                let steps = ((b - a).length() / spacing).ceil().max(1.0) as usize;
                for step in 0..=steps {
                    let t = step as f32 / steps as f32;
                    stamp_disc(mask, size, a.lerp(b, t), radius);
                }
            }
        }
    }
}

/// Liang-Barsky clip of the segment `a`-`b` to `clip`. `None` if the segment
/// misses it or has a non-finite endpoint.
fn clip_segment(a: Pos2, b: Pos2, clip: Rect) -> Option<(Pos2, Pos2)> {
    if !(a.x.is_finite() && a.y.is_finite() && b.x.is_finite() && b.y.is_finite()) {
        return None;
    }
    let delta = b - a;
    let (mut enter, mut exit) = (0.0f32, 1.0f32);
    let edges = [
        (-delta.x, a.x - clip.min.x),
        (delta.x, clip.max.x - a.x),
        (-delta.y, a.y - clip.min.y),
        (delta.y, clip.max.y - a.y),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            enter = enter.max(t);
        } else {
            exit = exit.min(t);
        }
        if enter > exit {
            return None;
        }
    }
    Some((a + delta * enter, a + delta * exit))
}

fn stamp_disc(mask: &mut [bool], size: [u32; 2], center: Pos2, radius: f32) {
    let [width, height] = size;
    let min_x = (center.x - radius).floor().max(0.0) as u32;
    let min_y = (center.y - radius).floor().max(0.0) as u32;
    let max_x = ((center.x + radius).ceil().max(0.0) as u32).min(width);
    let max_y = ((center.y + radius).ceil().max(0.0) as u32).min(height);
    let radius_sq = radius * radius;
    for y in min_y..max_y {
        for x in min_x..max_x {
            let dx = x as f32 + 0.5 - center.x;
            let dy = y as f32 + 0.5 - center.y;
            if dx * dx + dy * dy <= radius_sq {
                mask[(y * width + x) as usize] = true;
            }
        }
    }
}
