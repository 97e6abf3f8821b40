//! High-level image operations.
//!
//! These functions combine crop geometry with backend execution: render the
//! crop into a target-sized surface once, then search down the quality
//! ladder until the encoded output fits the byte budget.

use super::backend::{BackendError, Dimensions, ImageBackend, SourceImage};
use super::calculations::{AUTO_ASPECT, CropRect, auto_crop};
use super::params::{CompressionParams, Quality};
use tracing::{debug, info, warn};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// The encoded output of one transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedResult {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Quality of the returned encoding.
    pub quality: Quality,
    /// Number of encodes performed.
    pub attempts: u32,
}

impl ProcessedResult {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Qualities the compression loop may try, in order.
///
/// Starts at `initial_quality` and keeps stepping down while the next step
/// stays strictly above `quality_floor`. The defaults give
/// `[95, 85, 75, 65, 55]`. Never empty.
pub fn quality_ladder(params: &CompressionParams) -> Vec<Quality> {
    let floor = params.quality_floor.value();
    let step = params.quality_step.max(1);
    let mut ladder = vec![params.initial_quality];
    let mut current = params.initial_quality.value();

    while current > step && current - step > floor {
        current -= step;
        ladder.push(Quality::new(current));
    }
    ladder
}

/// Crop, resize and compress `source` into a `target`-sized JPEG.
///
/// The output always has exactly `target` dimensions. It fits
/// `params.max_bytes` whenever some quality on the ladder achieves that;
/// otherwise the last (lowest quality) encoding is returned. Size alone is
/// never an error.
#[tracing::instrument(level = "debug", skip(backend, source, params), fields(source = ?source.dimensions()))]
pub fn transform(
    backend: &impl ImageBackend,
    source: &SourceImage,
    crop: &CropRect,
    target: Dimensions,
    params: &CompressionParams,
) -> Result<ProcessedResult> {
    let surface = backend.render(source, crop, target)?;

    let mut attempts = 0;
    let mut last = None;
    for quality in quality_ladder(params) {
        let bytes = backend.encode(&surface, quality)?;
        attempts += 1;
        let fits = bytes.len() as u64 <= params.max_bytes;
        debug!(quality = quality.value(), size = bytes.len(), fits, "encoded");
        last = Some((bytes, quality));
        if fits {
            break;
        }
    }

    let (bytes, quality) =
        last.ok_or_else(|| BackendError::Encode("no quality to encode at".into()))?;
    if bytes.len() as u64 > params.max_bytes {
        warn!(
            size = bytes.len(),
            max = params.max_bytes,
            quality = quality.value(),
            "output still over budget at the quality floor"
        );
    }
    info!(
        width = target.width,
        height = target.height,
        size = bytes.len(),
        quality = quality.value(),
        attempts,
        "transform complete"
    );

    Ok(ProcessedResult {
        bytes,
        width: target.width,
        height: target.height,
        quality,
        attempts,
    })
}

/// Auto-crop to 16:9 and transform to `target`.
///
/// The crop ratio is fixed regardless of `target`; a non-16:9 target
/// stretches the image.
pub fn auto_transform(
    backend: &impl ImageBackend,
    source: &SourceImage,
    target: Dimensions,
    params: &CompressionParams,
) -> Result<ProcessedResult> {
    let (aw, ah) = AUTO_ASPECT;
    if target.width as u64 * ah as u64 != target.height as u64 * aw as u64 {
        warn!(
            width = target.width,
            height = target.height,
            "auto crop is 16:9 but the target is not; output will be stretched"
        );
    }
    let crop = auto_crop(source.dimensions());
    transform(backend, source, &crop, target, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    const MIB: usize = 1024 * 1024;

    fn source(backend: &MockBackend) -> SourceImage {
        backend.decode(&[0; 16]).unwrap()
    }

    // =========================================================================
    // quality_ladder tests
    // =========================================================================

    #[test]
    fn default_ladder_has_five_steps() {
        let ladder: Vec<u32> = quality_ladder(&CompressionParams::default())
            .into_iter()
            .map(Quality::value)
            .collect();
        assert_eq!(ladder, vec![95, 85, 75, 65, 55]);
    }

    #[test]
    fn ladder_stops_above_floor() {
        let params = CompressionParams {
            initial_quality: Quality::new(90),
            quality_floor: Quality::new(70),
            quality_step: 10,
            ..Default::default()
        };
        let ladder: Vec<u32> = quality_ladder(&params)
            .into_iter()
            .map(Quality::value)
            .collect();
        // 70 would land on the floor, so it is never tried
        assert_eq!(ladder, vec![90, 80]);
    }

    #[test]
    fn ladder_always_has_initial_quality() {
        let params = CompressionParams {
            initial_quality: Quality::new(40),
            quality_floor: Quality::new(50),
            ..Default::default()
        };
        assert_eq!(quality_ladder(&params), vec![Quality::new(40)]);
    }

    #[test]
    fn ladder_with_zero_step_terminates() {
        let params = CompressionParams {
            quality_step: 0,
            ..Default::default()
        };
        assert_eq!(quality_ladder(&params).len(), 45);
    }

    // =========================================================================
    // transform tests
    // =========================================================================

    #[test]
    fn small_first_encode_stops_immediately() {
        let backend = MockBackend::new();
        let src = source(&backend);
        let crop = auto_crop(src.dimensions());

        let result = transform(
            &backend,
            &src,
            &crop,
            Dimensions::new(1920, 1080),
            &CompressionParams::default(),
        )
        .unwrap();

        assert_eq!(result.quality.value(), 95);
        assert_eq!(result.attempts, 1);
        assert_eq!(backend.encoded_qualities(), vec![95]);
    }

    #[test]
    fn steps_down_until_within_budget() {
        // 3 MiB at 95, shrinking by 0.5 MiB per step → fits at 75
        let backend = MockBackend::with_sizes(Dimensions::new(64, 36), |q| {
            3 * MIB - (95 - q.value() as usize) / 10 * (MIB / 2)
        });
        let src = source(&backend);

        let result = transform(
            &backend,
            &src,
            &CropRect::full(src.dimensions()),
            Dimensions::new(1920, 1080),
            &CompressionParams::default(),
        )
        .unwrap();

        assert_eq!(backend.encoded_qualities(), vec![95, 85, 75]);
        assert_eq!(result.quality.value(), 75);
        assert_eq!(result.len(), 2 * MIB);
    }

    #[test]
    fn exactly_at_budget_is_accepted() {
        let backend = MockBackend::with_sizes(Dimensions::new(16, 9), |_| 2 * MIB);
        let src = source(&backend);
        let result = transform(
            &backend,
            &src,
            &CropRect::full(src.dimensions()),
            Dimensions::new(16, 9),
            &CompressionParams::default(),
        )
        .unwrap();
        assert_eq!(result.attempts, 1);
    }

    #[test]
    fn never_fits_returns_last_attempt() {
        let backend =
            MockBackend::with_sizes(Dimensions::new(64, 36), |q| 5 * MIB + q.value() as usize);
        let src = source(&backend);

        let result = transform(
            &backend,
            &src,
            &CropRect::full(src.dimensions()),
            Dimensions::new(1080, 1920),
            &CompressionParams::default(),
        )
        .unwrap();

        assert_eq!(backend.encoded_qualities(), vec![95, 85, 75, 65, 55]);
        assert_eq!(result.attempts, 5);
        assert_eq!(result.quality.value(), 55);
        assert_eq!(result.len(), 5 * MIB + 55);
        assert_eq!((result.width, result.height), (1080, 1920));
    }

    #[test]
    fn output_dimensions_are_the_target() {
        let backend = MockBackend::new();
        let src = source(&backend);
        let crop = CropRect {
            sx: 10.0,
            sy: 10.0,
            s_width: 7.0,
            s_height: 3.0,
        };
        let result = transform(
            &backend,
            &src,
            &crop,
            Dimensions::new(1440, 1080),
            &CompressionParams::default(),
        )
        .unwrap();
        assert_eq!((result.width, result.height), (1440, 1080));
        assert!(matches!(
            backend.get_operations()[1],
            RecordedOp::Render {
                width: 1440,
                height: 1080,
                ..
            }
        ));
    }

    #[test]
    fn renders_once_before_encoding() {
        let backend = MockBackend::with_sizes(Dimensions::new(64, 36), |_| 3 * MIB);
        let src = source(&backend);
        transform(
            &backend,
            &src,
            &CropRect::full(src.dimensions()),
            Dimensions::new(64, 36),
            &CompressionParams::default(),
        )
        .unwrap();

        let ops = backend.get_operations();
        let renders = ops
            .iter()
            .filter(|op| matches!(op, RecordedOp::Render { .. }))
            .count();
        assert_eq!(renders, 1);
        assert!(matches!(ops[1], RecordedOp::Render { .. }));
    }

    #[test]
    fn render_failure_propagates_without_encoding() {
        let backend = MockBackend::failing_render();
        let src = source(&backend);
        let result = transform(
            &backend,
            &src,
            &CropRect::full(src.dimensions()),
            Dimensions::new(1920, 1080),
            &CompressionParams::default(),
        );
        assert!(matches!(result, Err(BackendError::RenderSurface(_))));
        assert!(backend.encoded_qualities().is_empty());
    }

    #[test]
    fn encode_failure_mid_ladder_propagates() {
        // over budget at 95, then the encoder gives up
        let backend = MockBackend::with_sizes(Dimensions::new(64, 36), |_| 3 * MIB)
            .failing_encode_below(90);
        let src = source(&backend);
        let result = transform(
            &backend,
            &src,
            &CropRect::full(src.dimensions()),
            Dimensions::new(1920, 1080),
            &CompressionParams::default(),
        );
        assert!(matches!(result, Err(BackendError::Encode(_))));
        assert_eq!(backend.encoded_qualities(), vec![95, 85]);
    }

    #[test]
    fn auto_transform_uses_16_9_crop() {
        let backend = MockBackend::with_sizes(Dimensions::new(400, 300), |_| 100);
        let src = source(&backend);
        auto_transform(
            &backend,
            &src,
            Dimensions::new(1920, 1080),
            &CompressionParams::default(),
        )
        .unwrap();

        let expected = CropRect {
            sx: 0.0,
            sy: 37.5,
            s_width: 400.0,
            s_height: 225.0,
        };
        assert!(backend.get_operations().contains(&RecordedOp::Render {
            crop: expected,
            width: 1920,
            height: 1080,
        }));
    }
}
