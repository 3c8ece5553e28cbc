use crate::format::OutputFormat;
use anyhow::{Context, Result};
use image::{
    codecs::{
        jpeg::JpegEncoder,
        png::{CompressionType, FilterType as PngFilterType, PngEncoder},
    },
    imageops::FilterType,
    ColorType, DynamicImage, ImageEncoder,
};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// One resize or crop: read `source`, write `destination` at exactly `width`×`height`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub quality: u8,
}

/// Performs the pixel work for a run. Calls for one platform arrive concurrently.
pub trait ImageTransformer: Sync {
    /// Scale the whole source to the target size.
    fn resize(&self, request: &TransformRequest) -> Result<()>;

    /// Scale the source to cover the target size, then cut out the centre.
    fn crop(&self, request: &TransformRequest) -> Result<()>;
}

/// [`ImageTransformer`] backed by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateTransformer;

impl ImageTransformer for ImageCrateTransformer {
    fn resize(&self, request: &TransformRequest) -> Result<()> {
        let source = load_image(&request.source)?;
        let resized = source.resize_exact(request.width, request.height, FilterType::Lanczos3);
        save_image(&resized, request)
    }

    fn crop(&self, request: &TransformRequest) -> Result<()> {
        let source = load_image(&request.source)?;
        let cropped = source.resize_to_fill(request.width, request.height, FilterType::Lanczos3);
        save_image(&cropped, request)
    }
}

fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("Failed to load image {}", path.display()))
}

fn save_image(image: &DynamicImage, request: &TransformRequest) -> Result<()> {
    let path = &request.destination;
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out_file = BufWriter::new(file);

    match request.format {
        OutputFormat::Png => {
            let rgba_image = image.to_rgba8();
            write_png(rgba_image.as_raw(), &mut out_file, image.width(), image.height())?;
        }
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb_image = image.to_rgb8();
            let encoder = JpegEncoder::new_with_quality(&mut out_file, request.quality);
            encoder.write_image(
                rgb_image.as_raw(),
                image.width(),
                image.height(),
                ColorType::Rgb8,
            )?;
        }
        format => {
            // BMP and TGA encoders only take 8-bit colour
            DynamicImage::ImageRgba8(image.to_rgba8())
                .write_to(&mut out_file, format.image_output_format(request.quality))
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
    }

    out_file
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

// Encode image data as PNG with compression
fn write_png<W: Write>(image_data: &[u8], w: W, width: u32, height: u32) -> Result<()> {
    let encoder = PngEncoder::new_with_quality(w, CompressionType::Best, PngFilterType::Adaptive);
    encoder.write_image(image_data, width, height, ColorType::Rgba8)?;
    Ok(())
}
