//! Orchestration of one user's crop-and-compress workflow.
//!
//! A [`Session`] owns the backend, the pipeline settings, the conversion
//! counter and whatever result is currently on display. It enforces the
//! rules the pipeline itself does not care about:
//!
//! - Only one transform at a time. Every entry point takes `&mut self`, so
//!   transforms never overlap; a submission while a manual crop is waiting
//!   for confirmation fails with [`SessionError::Busy`].
//! - A manual crop is confirmed at most once. The pending image is taken on
//!   confirmation, so a second confirmation gets [`SessionError::NoPendingCrop`].
//! - The counter goes up by exactly one per successful transform and never
//!   on failure.
//! - A new result replaces the previous one; [`Session::reset`] drops it.
//!
//! ```text
//!            submit_auto ──────────────┐
//!  Idle ──┤                            ├─► Processing ─► Success | Error
//!            open_manual ─► pending ─► confirm_manual
//!                               └────► cancel_manual ─► Idle
//! ```

use crate::config::Config;
use crate::counter::ConversionCounter;
use crate::imaging::{
    AspectPreset, BackendError, CompressionParams, Dimensions, ImageBackend, ProcessedResult,
    SourceImage, Viewport, ViewportState, auto_transform, clamp_viewport, transform,
    viewport_to_crop,
};
use crate::output::download_filename;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("A manual crop is still waiting for confirmation")]
    Busy,
    #[error("No image is waiting for a manual crop")]
    NoPendingCrop,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStatus {
    Idle,
    Processing,
    Success,
    Error,
}

/// A finished transform together with what the presenter needs to show it.
#[derive(Debug, Clone)]
pub struct SessionResult {
    /// Size of the uploaded file in bytes.
    pub original_size: usize,
    pub processed: ProcessedResult,
}

impl SessionResult {
    /// How much smaller the output is, in whole percent. Negative if it grew.
    pub fn savings_percent(&self) -> i64 {
        if self.original_size == 0 {
            return 0;
        }
        let ratio = self.processed.len() as f64 / self.original_size as f64;
        ((1.0 - ratio) * 100.0).round() as i64
    }

    /// Suggested download name, e.g. `instacrops-1920x1080.jpg`.
    pub fn filename(&self) -> String {
        download_filename(self.processed.width, self.processed.height)
    }
}

pub struct Session<B: ImageBackend> {
    backend: B,
    params: CompressionParams,
    auto_target: Dimensions,
    state_dir: Option<PathBuf>,
    counter: ConversionCounter,
    status: ProcessingStatus,
    result: Option<SessionResult>,
    pending: Option<SourceImage>,
}

impl<B: ImageBackend> Session<B> {
    /// Session with an in-memory counter.
    pub fn new(backend: B, config: &Config) -> Self {
        Self {
            backend,
            params: config.compression.params(),
            auto_target: config.output.dimensions(),
            state_dir: None,
            counter: ConversionCounter::default(),
            status: ProcessingStatus::Idle,
            result: None,
            pending: None,
        }
    }

    /// Load the counter from `dir` and persist every increment there.
    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.counter = ConversionCounter::load(&dir);
        self.state_dir = Some(dir);
        self
    }

    pub fn status(&self) -> ProcessingStatus {
        self.status
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    pub fn total_converted(&self) -> u64 {
        self.counter.total_converted
    }

    pub fn has_pending_crop(&self) -> bool {
        self.pending.is_some()
    }

    /// Decode, auto-crop to 16:9 and transform to the configured target.
    pub fn submit_auto(&mut self, bytes: &[u8]) -> Result<&SessionResult, SessionError> {
        self.begin()?;
        self.status = ProcessingStatus::Processing;

        let outcome = self.backend.decode(bytes).and_then(|source| {
            auto_transform(&self.backend, &source, self.auto_target, &self.params)
        });
        self.finish(outcome, bytes.len())
    }

    /// Decode an upload and hold it for manual cropping.
    ///
    /// Returns the source dimensions so the caller can lay out its viewport.
    pub fn open_manual(&mut self, bytes: &[u8]) -> Result<Dimensions, SessionError> {
        self.begin()?;
        match self.backend.decode(bytes) {
            Ok(source) => {
                let dims = source.dimensions();
                self.pending = Some(source);
                self.status = ProcessingStatus::Idle;
                Ok(dims)
            }
            Err(e) => {
                warn!(error = %e, "upload could not be decoded");
                self.status = ProcessingStatus::Error;
                Err(e.into())
            }
        }
    }

    /// Crop the pending image as shown in `viewport` and transform it to
    /// the preset's target.
    ///
    /// The viewport state is clamped before conversion, so a caller that
    /// skipped clamping still gets an in-bounds crop.
    pub fn confirm_manual(
        &mut self,
        preset: AspectPreset,
        viewport: Viewport,
        state: ViewportState,
    ) -> Result<&SessionResult, SessionError> {
        let source = self.pending.take().ok_or(SessionError::NoPendingCrop)?;
        self.status = ProcessingStatus::Processing;

        let dims = source.dimensions();
        let state = clamp_viewport(dims, viewport, state);
        let crop = viewport_to_crop(dims, viewport, state);
        let outcome = transform(
            &self.backend,
            &source,
            &crop,
            preset.dimensions(),
            &self.params,
        );
        self.finish(outcome, source.encoded_len())
    }

    /// Discard the image waiting for a manual crop, untouched.
    pub fn cancel_manual(&mut self) {
        self.pending = None;
    }

    /// Drop the current result and return to idle.
    pub fn reset(&mut self) {
        self.result = None;
        self.status = ProcessingStatus::Idle;
    }

    fn begin(&mut self) -> Result<(), SessionError> {
        if self.pending.is_some() {
            return Err(SessionError::Busy);
        }
        // superseded
        self.result = None;
        Ok(())
    }

    fn finish(
        &mut self,
        outcome: Result<ProcessedResult, BackendError>,
        original_size: usize,
    ) -> Result<&SessionResult, SessionError> {
        match outcome {
            Ok(processed) => {
                self.record_success();
                self.status = ProcessingStatus::Success;
                let stored = self.result.insert(SessionResult {
                    original_size,
                    processed,
                });
                Ok(&*stored)
            }
            Err(e) => {
                warn!(error = %e, "transform failed");
                self.status = ProcessingStatus::Error;
                Err(e.into())
            }
        }
    }

    fn record_success(&mut self) {
        match &self.state_dir {
            Some(dir) => match self.counter.increment_and_save(dir) {
                Ok(total) => info!(total, "conversion counted"),
                Err(e) => warn!(error = %e, dir = %dir.display(), "could not persist counter"),
            },
            None => self.counter.total_converted += 1,
        }
    }
}

/// Whether `bytes` look like an image format we can decode.
///
/// The upload gate: content that fails this check is rejected before the
/// session ever sees it.
pub fn is_image_upload(bytes: &[u8]) -> bool {
    image::guess_format(bytes).is_ok()
}
