use super::Rasterizer;
use super::blend;
use crate::document::CanvasColor;
use crate::layer::Layer;
use egui::{Pos2, Rect, Vec2};
use image::{Rgba, RgbaImage};

/// Largest scale that fits `source` inside `target` without cropping
pub fn fit_scale(source: Vec2, target: [u32; 2]) -> f32 {
    let [width, height] = target;
    (width as f32 / source.x).min(height as f32 / source.y)
}

/// Pixel size of `source` scaled by `fit_scale`, at least 1x1
pub fn fitted_size(source: Vec2, target: [u32; 2]) -> [u32; 2] {
    let scale = fit_scale(source, target);
    let [width, height] = target;
    [
        ((source.x * scale).round() as u32).clamp(1, width.max(1)),
        ((source.y * scale).round() as u32).clamp(1, height.max(1)),
    ]
}

fn has_area(size: Vec2) -> bool {
    size.x.is_finite() && size.y.is_finite() && size.x > 0.0 && size.y > 0.0
}

/// Renders a single layer's drawn region, letterboxed into `target`, with
/// the layer's opacity applied. Returns `None` for a blank layer.
pub fn render_layer(layer: &Layer, rasterizer: &dyn Rasterizer, target: [u32; 2]) -> Option<RgbaImage> {
    if target[0] == 0 || target[1] == 0 || !layer.has_content() {
        return None;
    }
    let bounds = rasterizer.content_bounds(layer.content());
    if !has_area(bounds.size()) {
        return None;
    }
    let scale = fit_scale(bounds.size(), target);
    let size = fitted_size(bounds.size(), target);
    let mut image = rasterizer.rasterize(layer.content(), bounds, scale, size);
    blend::apply_opacity(&mut image, layer.opacity());
    Some(image)
}

/// Composites visible layers bottom to top over an optional background fill,
/// scaled to fit the canvas into `target`. Returns `None` for an empty
/// canvas or target.
pub fn render_composite(
    layers: &[Layer],
    canvas_size: Vec2,
    background: Option<CanvasColor>,
    rasterizer: &dyn Rasterizer,
    target: [u32; 2],
) -> Option<RgbaImage> {
    if target[0] == 0 || target[1] == 0 || !has_area(canvas_size) {
        return None;
    }
    let scale = fit_scale(canvas_size, target);
    let [width, height] = fitted_size(canvas_size, target);
    let fill = background.map_or([0; 4], CanvasColor::to_rgba8);
    let mut output = RgbaImage::from_pixel(width, height, Rgba(fill));

    let source = Rect::from_min_size(Pos2::ZERO, canvas_size);
    for layer in layers.iter().filter(|layer| layer.is_visible() && layer.has_content()) {
        let pixels = rasterizer.rasterize(layer.content(), source, scale, [width, height]);
        blend::blend_image(&mut output, &pixels, layer.opacity());
    }
    Some(output)
}
