//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image::ImageReader` with format sniffing |
//! | Crop | `image::imageops::crop_imm` on the covering whole-pixel region |
//! | Resample | `image::imageops::resize` with `Lanczos3`, then cut at the sub-pixel offset |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! Alpha is dropped at decode time; the output codec has no alpha channel.

use super::backend::{BackendError, Dimensions, ImageBackend, SourceImage};
use super::calculations::CropRect;
use super::params::Quality;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, ImageReader, RgbImage};
use std::io::Cursor;

/// Largest surface the backend will allocate: 16384 × 16384 pixels.
pub const DEFAULT_MAX_SURFACE_PIXELS: u64 = 16384 * 16384;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    max_surface_pixels: u64,
}

impl RustBackend {
    pub fn new() -> Self {
        Self {
            max_surface_pixels: DEFAULT_MAX_SURFACE_PIXELS,
        }
    }

    /// Backend that refuses surfaces larger than `max_pixels`.
    pub fn with_surface_limit(max_pixels: u64) -> Self {
        Self {
            max_surface_pixels: max_pixels,
        }
    }

    fn check_surface(&self, target: Dimensions) -> Result<(), BackendError> {
        if target.width == 0 || target.height == 0 {
            return Err(BackendError::RenderSurface(format!(
                "{}x{} has no pixels",
                target.width, target.height
            )));
        }
        if target.pixel_count() > self.max_surface_pixels {
            return Err(BackendError::RenderSurface(format!(
                "{}x{} exceeds the {} pixel limit",
                target.width, target.height, self.max_surface_pixels
            )));
        }
        Ok(())
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, BackendError> {
        let img = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .decode()
            .map_err(|e| BackendError::SourceDecode(e.to_string()))?;
        if img.width() == 0 || img.height() == 0 {
            return Err(BackendError::SourceDecode("image has no pixels".into()));
        }
        Ok(SourceImage::new(img.to_rgb8(), bytes.len()))
    }

    fn render(
        &self,
        source: &SourceImage,
        crop: &CropRect,
        target: Dimensions,
    ) -> Result<RgbImage, BackendError> {
        self.check_surface(target)?;
        let plan = crop.resample_plan(source.dimensions(), target);
        self.check_surface(plan.scaled)?;

        let (x, y, w, h) = plan.region;
        let region = imageops::crop_imm(source.pixels(), x, y, w, h).to_image();
        let scaled = imageops::resize(
            &region,
            plan.scaled.width,
            plan.scaled.height,
            FilterType::Lanczos3,
        );
        if plan.scaled == target {
            return Ok(scaled);
        }
        let (ox, oy) = plan.offset;
        Ok(imageops::crop_imm(&scaled, ox, oy, target.width, target.height).to_image())
    }

    fn encode(&self, surface: &RgbImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, quality.value() as u8)
            .write_image(
                surface.as_raw(),
                surface.width(),
                surface.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| BackendError::Encode(e.to_string()))?;
        if buf.is_empty() {
            return Err(BackendError::Encode("encoder produced no data".into()));
        }
        Ok(buf)
    }
}
