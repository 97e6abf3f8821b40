//! Parameter types for the transform pipeline.
//!
//! These structs describe *what* to produce, not *how*. They are the
//! interface between [`operations`](super::operations) (which runs the
//! quality search) and the [`backend`](super::backend) (which does the pixel
//! and codec work).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality in percent (1–100). Clamped on construction.
//! - [`CompressionParams`]: Byte budget and the quality ladder bounds.
//! - [`AspectPreset`]: The fixed output ratios offered for manual cropping.

/// Quality setting for lossy image encoding, in percent (1-100).
///
/// Kept as an integer so that stepping down the ladder is exact:
/// `95 - 4 * 10 == 55`, with no floating drift around the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Two mebibytes, the default output ceiling.
pub const DEFAULT_MAX_BYTES: u64 = 2 * 1024 * 1024;

/// Bounds of the compression-size loop.
///
/// Encoding starts at `initial_quality` and steps down by `quality_step`
/// while the output exceeds `max_bytes`. A step that would land at or below
/// `quality_floor` is never taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionParams {
    pub max_bytes: u64,
    pub initial_quality: Quality,
    pub quality_floor: Quality,
    pub quality_step: u32,
}

impl Default for CompressionParams {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            initial_quality: Quality(95),
            quality_floor: Quality(50),
            quality_step: 10,
        }
    }
}

/// An output aspect ratio with its canonical pixel target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectPreset {
    pub label: &'static str,
    pub ratio: (u32, u32),
    pub width: u32,
    pub height: u32,
}

/// Manual-crop ratios, in the order they are offered.
pub const ASPECT_PRESETS: &[AspectPreset] = &[
    AspectPreset {
        label: "16:9",
        ratio: (16, 9),
        width: 1920,
        height: 1080,
    },
    AspectPreset {
        label: "4:3",
        ratio: (4, 3),
        width: 1440,
        height: 1080,
    },
    AspectPreset {
        label: "1:1",
        ratio: (1, 1),
        width: 1080,
        height: 1080,
    },
    AspectPreset {
        label: "3:4",
        ratio: (3, 4),
        width: 1080,
        height: 1440,
    },
    AspectPreset {
        label: "9:16",
        ratio: (9, 16),
        width: 1080,
        height: 1920,
    },
];

impl AspectPreset {
    /// Look up a preset by its label (`"4:3"`). Also accepts `"4-3"` and `"4x3"`.
    pub fn find(label: &str) -> Option<AspectPreset> {
        let normalized = label.trim().replace(['-', 'x', 'X'], ":");
        ASPECT_PRESETS
            .iter()
            .find(|p| p.label == normalized)
            .copied()
    }

    /// The preset used when nothing else is chosen (16:9).
    pub fn landscape() -> AspectPreset {
        ASPECT_PRESETS[0]
    }

    pub fn dimensions(&self) -> super::backend::Dimensions {
        super::backend::Dimensions {
            width: self.width,
            height: self.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(55).value(), 55);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn compression_defaults() {
        let p = CompressionParams::default();
        assert_eq!(p.max_bytes, 2_097_152);
        assert_eq!(p.initial_quality.value(), 95);
        assert_eq!(p.quality_floor.value(), 50);
        assert_eq!(p.quality_step, 10);
    }

    #[test]
    fn presets_match_their_ratio() {
        for preset in ASPECT_PRESETS {
            let (rw, rh) = preset.ratio;
            assert_eq!(
                preset.width as u64 * rh as u64,
                preset.height as u64 * rw as u64,
                "{} target is not {}:{}",
                preset.label,
                rw,
                rh
            );
        }
    }

    #[test]
    fn find_preset_by_label() {
        let p = AspectPreset::find("4:3").unwrap();
        assert_eq!((p.width, p.height), (1440, 1080));
        assert_eq!(AspectPreset::find("9-16").unwrap().height, 1920);
        assert_eq!(AspectPreset::find(" 1x1 ").unwrap().width, 1080);
        assert!(AspectPreset::find("21:9").is_none());
    }

    #[test]
    fn landscape_is_first_preset() {
        assert_eq!(AspectPreset::landscape().label, "16:9");
    }
}
