use image::{Rgba, RgbaImage};

/// Source-over blend of `top` onto `bottom` with `top` scaled by `opacity`.
/// Both colors are unmultiplied.
pub fn blend_pixel(bottom: Rgba<u8>, top: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let sa = top[3] as f32 / 255.0 * opacity.clamp(0.0, 1.0);
    let da = bottom[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    if out_a <= f32::EPSILON {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |s: u8, d: u8| -> u8 {
        (((s as f32 * sa) + (d as f32 * da * (1.0 - sa))) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend(top[0], bottom[0]),
        blend(top[1], bottom[1]),
        blend(top[2], bottom[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Blends `top` over `base` at `opacity`. Only the overlapping region is touched.
pub fn blend_image(base: &mut RgbaImage, top: &RgbaImage, opacity: f32) {
    if opacity <= 0.0 {
        return;
    }
    let width = base.width().min(top.width());
    let height = base.height().min(top.height());
    for y in 0..height {
        for x in 0..width {
            let src = *top.get_pixel(x, y);
            if src[3] == 0 {
                continue;
            }
            let dst = base.get_pixel_mut(x, y);
            *dst = blend_pixel(*dst, src, opacity);
        }
    }
}

/// Scales the alpha channel of every pixel by `opacity`
pub fn apply_opacity(image: &mut RgbaImage, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity >= 1.0 {
        return;
    }
    for pixel in image.pixels_mut() {
        pixel[3] = (pixel[3] as f32 * opacity).round() as u8;
    }
}
