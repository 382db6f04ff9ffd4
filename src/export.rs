use crate::document::{CanvasColor, Document};
use crate::render::{self, Rasterizer, blend};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use thiserror::Error;

/// Largest raster `export_document` will allocate, in pixels
pub const MAX_EXPORT_PIXELS: u64 = 1 << 28;

/// Errors that can occur while exporting a document
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Canvas has no drawable area")]
    EmptyCanvas,

    #[error("Canvas of {width}x{height} pixels is too large to export")]
    CanvasTooLarge { width: u64, height: u64 },

    #[error("Failed to encode image: {0}")]
    EncodeError(#[from] image::ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Lossless PNG with alpha
    Png,
    /// Lossy JPEG, quality 1-100
    Jpeg { quality: u8 },
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg { .. } => "jpg",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub include_background: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            include_background: true,
        }
    }
}

/// Renders `document` at canvas resolution and encodes it.
///
/// JPEG has no alpha channel, so without a background the composite is
/// flattened over white.
pub fn export_document(
    document: &Document,
    options: ExportOptions,
    rasterizer: &dyn Rasterizer,
) -> Result<Vec<u8>, ExportError> {
    let canvas = document.canvas_size();
    let (width, height) = (canvas.x.ceil() as u64, canvas.y.ceil() as u64);
    let fits_u32 = width <= u64::from(u32::MAX) && height <= u64::from(u32::MAX);
    if !fits_u32 || width * height > MAX_EXPORT_PIXELS {
        return Err(ExportError::CanvasTooLarge { width, height });
    }
    let target = [width as u32, height as u32];
    let background = options
        .include_background
        .then(|| document.background_color());
    let image = render::render_composite(
        document.layers().layers(),
        canvas,
        background,
        rasterizer,
        target,
    )
    .ok_or(ExportError::EmptyCanvas)?;

    let bytes = encode(&image, options.format)?;
    log::info!(
        "Exported {} ({}x{}, {} bytes as {})",
        document.name(),
        image.width(),
        image.height(),
        bytes.len(),
        options.format.extension()
    );
    Ok(bytes)
}

/// Encodes an RGBA raster in the requested format
pub fn encode(image: &RgbaImage, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    match format {
        ExportFormat::Png => {
            PngEncoder::new(&mut bytes).write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
        ExportFormat::Jpeg { quality } => {
            let rgb = flatten(image, CanvasColor::WHITE);
            JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100)).write_image(
                &rgb,
                image.width(),
                image.height(),
                ExtendedColorType::Rgb8,
            )?;
        }
    }
    Ok(bytes)
}

/// Composites `image` over an opaque `backdrop` and drops the alpha channel
fn flatten(image: &RgbaImage, backdrop: CanvasColor) -> Vec<u8> {
    let [r, g, b, _] = backdrop.to_rgba8();
    let base = Rgba([r, g, b, 255]);
    image
        .pixels()
        .flat_map(|pixel| {
            let out = blend::blend_pixel(base, *pixel, 1.0);
            [out[0], out[1], out[2]]
        })
        .collect()
}
