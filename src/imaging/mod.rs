//! Image processing: crop geometry and the transform pipeline.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (format sniffed from content) |
//! | **Auto crop** | [`auto_crop`], centered 16:9 |
//! | **Manual crop** | [`clamp_viewport`] + [`viewport_to_crop`] |
//! | **Resample** | Lanczos3 via `image::imageops::resize` |
//! | **Compress** | JPEG, quality ladder 95 → 55 under a 2 MiB budget |
//!
//! The module is split into:
//! - **Calculations**: Pure crop geometry (unit testable)
//! - **Parameters**: Quality, compression bounds, aspect presets
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`transform`], the render-then-search loop

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, SourceImage};
pub use calculations::{
    AUTO_ASPECT, CropRect, MAX_SCALE, ResamplePlan, Viewport, ViewportState, auto_crop,
    center_crop, clamp_viewport, cover_fit, pan_to, viewport_to_crop, zoom_to,
};
pub use operations::{ProcessedResult, auto_transform, quality_ladder, transform};
pub use params::{ASPECT_PRESETS, AspectPreset, CompressionParams, DEFAULT_MAX_BYTES, Quality};
pub use rust_backend::RustBackend;
