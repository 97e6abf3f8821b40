//! # InstaCrops
//!
//! Crop a photo to a fixed aspect ratio, resize it to an exact pixel target,
//! and compress it under a size ceiling.
//!
//! # Architecture: Geometry → Render → Search
//!
//! ```text
//! 1. Crop      source dims (+ viewport state)  →  CropRect     (pure math)
//! 2. Render    source + CropRect               →  W×H surface  (Lanczos3, once)
//! 3. Compress  surface                         →  JPEG bytes   (95, 85, … until ≤ 2 MiB)
//! ```
//!
//! Crops come from one of two places:
//!
//! - **Automatic**: [`imaging::auto_crop`] takes the largest centered 16:9
//!   rectangle.
//! - **Manual**: an interactive cropper keeps a [`imaging::ViewportState`]
//!   (zoom and pan of the image under a fixed-ratio window). On confirmation
//!   [`imaging::viewport_to_crop`] maps the window back to source pixels.
//!
//! Each transform is a pure function of its inputs. State that outlives a
//! single call (the current result, a pending manual crop, the persisted
//! conversion counter) lives in [`session::Session`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Crop geometry, the backend trait, and the transform pipeline |
//! | [`session`] | One-at-a-time orchestration, result ownership, counting |
//! | [`counter`] | Persisted total of completed conversions |
//! | [`config`] | `instacrops.toml` loading, validation and defaults |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Single Output Codec
//!
//! Every result is a baseline JPEG. The size budget is searched by lowering
//! quality only; dimensions never shrink to make the budget, so a
//! 1920×1080 request always yields 1920×1080.
//!
//! ## Integer Quality
//!
//! Quality is an integer percent. The ladder 95, 85, 75, 65, 55 is exact and
//! the floor comparison can't be thrown off by accumulated float error.
//!
//! ## Fixed Auto Ratio
//!
//! Automatic mode always crops 16:9, whatever the configured target. A
//! non-16:9 target is honoured and the picture is stretched; a warning is
//! logged.

pub mod config;
pub mod counter;
pub mod imaging;
pub mod output;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;
