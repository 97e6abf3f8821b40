//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the transform
//! pipeline needs: decode, render and encode.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use a recording mock with scripted encode sizes so the
//! quality search can be exercised without touching a codec.

use super::calculations::CropRect;
use super::params::Quality;
use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The input bytes are not a decodable raster image.
    #[error("Failed to decode source image: {0}")]
    SourceDecode(String),
    /// The output surface could not be allocated.
    #[error("Cannot allocate render surface: {0}")]
    RenderSurface(String),
    /// The encoder failed or produced no data.
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Pixel dimensions of a source image or an output target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// A decoded, immutable source raster.
///
/// Remembers the size of the encoded input so results can report how much
/// smaller the output is.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: RgbImage,
    encoded_len: usize,
}

impl SourceImage {
    pub fn new(pixels: RgbImage, encoded_len: usize) -> Self {
        Self {
            pixels,
            encoded_len,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn encoded_len(&self) -> usize {
        self.encoded_len
    }
}

/// Trait for image processing backends.
///
/// Implementations must be deterministic: the same surface encoded at the
/// same quality yields the same bytes.
pub trait ImageBackend {
    /// Decode raw file bytes into a source image.
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, BackendError>;

    /// Resample the `crop` region of `source` into a new `target`-sized surface.
    fn render(
        &self,
        source: &SourceImage,
        crop: &CropRect,
        target: Dimensions,
    ) -> Result<RgbImage, BackendError>;

    /// Encode a surface with the backend's lossy codec.
    fn encode(&self, surface: &RgbImage, quality: Quality) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend that records operations without doing pixel work.
    ///
    /// `decode` yields a blank image of `source_dims` (or fails on empty
    /// input); `encode` returns `encoded_size(quality)` zero bytes, or fails
    /// for qualities below `fail_encode_below`.
    pub struct MockBackend {
        pub source_dims: Dimensions,
        pub encoded_size: Box<dyn Fn(Quality) -> usize>,
        pub fail_render: bool,
        pub fail_encode_below: Option<u32>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode(usize),
        Render {
            crop: CropRect,
            width: u32,
            height: u32,
        },
        Encode {
            quality: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::with_sizes(Dimensions::new(320, 180), |_| 1024)
        }

        pub fn with_sizes(
            source_dims: Dimensions,
            encoded_size: impl Fn(Quality) -> usize + 'static,
        ) -> Self {
            Self {
                source_dims,
                encoded_size: Box::new(encoded_size),
                fail_render: false,
                fail_encode_below: None,
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn failing_render() -> Self {
            Self {
                fail_render: true,
                ..Self::new()
            }
        }

        /// Same backend, but `encode` errors below `quality`.
        pub fn failing_encode_below(self, quality: u32) -> Self {
            Self {
                fail_encode_below: Some(quality),
                ..self
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn encoded_qualities(&self) -> Vec<u32> {
            self.get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Encode { quality } => Some(quality),
                    _ => None,
                })
                .collect()
        }
    }

    impl ImageBackend for MockBackend {
        fn decode(&self, bytes: &[u8]) -> Result<SourceImage, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Decode(bytes.len()));
            if bytes.is_empty() {
                return Err(BackendError::SourceDecode("empty input".into()));
            }
            let pixels = RgbImage::new(self.source_dims.width, self.source_dims.height);
            Ok(SourceImage::new(pixels, bytes.len()))
        }

        fn render(
            &self,
            _source: &SourceImage,
            crop: &CropRect,
            target: Dimensions,
        ) -> Result<RgbImage, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Render {
                crop: *crop,
                width: target.width,
                height: target.height,
            });
            if self.fail_render {
                return Err(BackendError::RenderSurface("mock refused".into()));
            }
            Ok(RgbImage::new(target.width, target.height))
        }

        fn encode(&self, _surface: &RgbImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                quality: quality.value(),
            });
            if self
                .fail_encode_below
                .is_some_and(|limit| quality.value() < limit)
            {
                return Err(BackendError::Encode("mock produced no data".into()));
            }
            Ok(vec![0; (self.encoded_size)(quality)])
        }
    }

    #[test]
    fn mock_records_decode() {
        let backend = MockBackend::new();
        let source = backend.decode(&[1, 2, 3]).unwrap();
        assert_eq!(source.dimensions(), Dimensions::new(320, 180));
        assert_eq!(source.encoded_len(), 3);
        assert_eq!(backend.get_operations(), vec![RecordedOp::Decode(3)]);
    }

    #[test]
    fn mock_decode_empty_is_source_error() {
        let backend = MockBackend::new();
        assert!(matches!(
            backend.decode(&[]),
            Err(BackendError::SourceDecode(_))
        ));
    }

    #[test]
    fn mock_encode_uses_scripted_size() {
        let backend = MockBackend::with_sizes(Dimensions::new(10, 10), |q| q.value() as usize);
        let surface = RgbImage::new(2, 2);
        let bytes = backend.encode(&surface, Quality::new(85)).unwrap();
        assert_eq!(bytes.len(), 85);
        assert_eq!(backend.encoded_qualities(), vec![85]);
    }

    #[test]
    fn dimensions_pixel_count_does_not_overflow() {
        assert_eq!(
            Dimensions::new(u32::MAX, 2).pixel_count(),
            u32::MAX as u64 * 2
        );
    }
}
