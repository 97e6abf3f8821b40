//! Pure crop geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! Coordinates are `f64` in source pixel space; a crop may start or end on a
//! fractional pixel (a 3000×4000 portrait auto-crops to a 1687.5px tall box).

use super::backend::Dimensions;

/// Ratio used by automatic cropping.
pub const AUTO_ASPECT: (u32, u32) = (16, 9);

/// Upper bound of the manual zoom control.
pub const MAX_SCALE: f64 = 3.0;

/// Slack used when checking containment of computed rectangles.
const EPSILON: f64 = 1e-6;

/// A sub-rectangle of the source image, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub sx: f64,
    pub sy: f64,
    pub s_width: f64,
    pub s_height: f64,
}

impl CropRect {
    /// The whole source image.
    pub fn full(source: Dimensions) -> Self {
        Self {
            sx: 0.0,
            sy: 0.0,
            s_width: source.width as f64,
            s_height: source.height as f64,
        }
    }

    /// Whether the rectangle is non-empty and lies inside a `width × height` image.
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        let (w, h) = (width as f64, height as f64);
        let slack_x = EPSILON * w.max(1.0);
        let slack_y = EPSILON * h.max(1.0);
        self.s_width > 0.0
            && self.s_height > 0.0
            && self.sx >= -slack_x
            && self.sy >= -slack_y
            && self.sx + self.s_width <= w + slack_x
            && self.sy + self.s_height <= h + slack_y
    }

    /// Whole-pixel region covering the rectangle: `(x, y, width, height)`.
    ///
    /// Edges are floored and ceiled outward, clamped to the image, and the
    /// result is never narrower or shorter than one pixel.
    pub fn pixel_bounds(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let (x0, x1) = cover_span(self.sx, self.s_width, width);
        let (y0, y1) = cover_span(self.sy, self.s_height, height);
        (x0, y0, x1 - x0, y1 - y0)
    }

    /// How to resample this rectangle onto `target` without distorting it.
    ///
    /// The covering [`pixel_bounds`](Self::pixel_bounds) region is scaled by
    /// the same factor that maps the fractional rectangle onto `target`, and
    /// the target window is then cut at the rectangle's offset. Fractional
    /// edges land within half an output pixel.
    pub fn resample_plan(&self, source: Dimensions, target: Dimensions) -> ResamplePlan {
        let region = self.pixel_bounds(source.width, source.height);
        let (x, y, w, h) = region;
        let (scaled_w, offset_x) = scale_span(self.sx, self.s_width, x, w, target.width);
        let (scaled_h, offset_y) = scale_span(self.sy, self.s_height, y, h, target.height);
        ResamplePlan {
            region,
            scaled: Dimensions::new(scaled_w, scaled_h),
            offset: (offset_x, offset_y),
        }
    }

    pub fn aspect(&self) -> f64 {
        self.s_width / self.s_height
    }
}

/// Recipe for rendering a fractional [`CropRect`] with whole-pixel operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResamplePlan {
    /// `(x, y, width, height)` cut from the source.
    pub region: (u32, u32, u32, u32),
    /// Size the region is resampled to. Never smaller than the target.
    pub scaled: Dimensions,
    /// Top-left of the target window inside the scaled region.
    pub offset: (u32, u32),
}

fn cover_span(start: f64, len: f64, limit: u32) -> (u32, u32) {
    let limit_f = limit as f64;
    let lo = start.floor().clamp(0.0, limit_f - 1.0) as u32;
    let hi = (start + len).ceil().clamp(0.0, limit_f) as u32;
    (lo, hi.max(lo + 1))
}

/// Scaled length of a covering region and the window offset within it.
///
/// The span is clipped to the region and treated as at least one source
/// pixel, so the scaled region is at most three times the target.
fn scale_span(
    start: f64,
    len: f64,
    region_start: u32,
    region_len: u32,
    target: u32,
) -> (u32, u32) {
    let region_lo = region_start as f64;
    let region_hi = region_lo + region_len as f64;
    let lo = start.max(region_lo).min(region_hi);
    let hi = (start + len).min(region_hi);
    let span = (hi - lo).max(1.0).min(region_len as f64);

    let factor = target as f64 / span;
    let scaled = ((region_len as f64 * factor).round() as u32).max(target);
    let offset = ((lo - region_lo) * factor).round() as u32;
    (scaled, offset.min(scaled - target))
}

/// Automatic 16:9 center crop.
///
/// # Examples
/// ```
/// # use instacrops::imaging::{auto_crop, Dimensions};
/// let crop = auto_crop(Dimensions { width: 4000, height: 3000 });
/// assert_eq!((crop.sx, crop.sy, crop.s_width, crop.s_height), (0.0, 375.0, 4000.0, 2250.0));
/// ```
pub fn auto_crop(source: Dimensions) -> CropRect {
    center_crop(source, AUTO_ASPECT)
}

/// Largest centered rectangle of the given aspect ratio that fits the source.
///
/// Sources wider than the ratio keep their full height and lose the sides;
/// everything else (including an exact match) keeps the full width and loses
/// top and bottom. The comparison is done on integers so an exact match
/// always returns the full frame.
pub fn center_crop(source: Dimensions, aspect: (u32, u32)) -> CropRect {
    debug_assert!(source.width > 0 && source.height > 0, "empty source");
    let (aw, ah) = aspect;
    let (w, h) = (source.width as f64, source.height as f64);

    let wider = source.width as u64 * ah as u64 > source.height as u64 * aw as u64;
    if wider {
        let s_width = h * aw as f64 / ah as f64;
        CropRect {
            sx: (w - s_width) / 2.0,
            sy: 0.0,
            s_width,
            s_height: h,
        }
    } else {
        let s_height = w * ah as f64 / aw as f64;
        CropRect {
            sx: 0.0,
            sy: (h - s_height) / 2.0,
            s_width: w,
            s_height,
        }
    }
}

/// Size of the box the manual cropper shows the image through, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Pan and zoom of the source image inside the viewport.
///
/// Offsets locate the rendered image's top-left corner relative to the
/// viewport's top-left corner. After clamping they are always `<= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl ViewportState {
    /// State at zoom `scale` with the image centered under the viewport.
    pub fn centered(source: Dimensions, viewport: Viewport, scale: f64) -> Self {
        let scale = scale.clamp(1.0, MAX_SCALE);
        let (base_w, base_h) = cover_fit(source, viewport);
        clamp_viewport(
            source,
            viewport,
            Self {
                scale,
                offset_x: (viewport.width - base_w * scale) / 2.0,
                offset_y: (viewport.height - base_h * scale) / 2.0,
            },
        )
    }
}

/// Base render size that fully covers the viewport while preserving aspect.
pub fn cover_fit(source: Dimensions, viewport: Viewport) -> (f64, f64) {
    let (sw, sh) = (source.width as f64, source.height as f64);
    let image_aspect = sw / sh;
    let viewport_aspect = viewport.width / viewport.height;

    if image_aspect > viewport_aspect {
        (viewport.height * sw / sh, viewport.height)
    } else {
        (viewport.width, viewport.width * sh / sw)
    }
}

/// Clamp scale to `>= 1` and both offsets so the viewport never leaves the image.
///
/// Idempotent. Must be reapplied whenever scale or offsets change.
pub fn clamp_viewport(
    source: Dimensions,
    viewport: Viewport,
    state: ViewportState,
) -> ViewportState {
    let scale = if state.scale.is_finite() {
        state.scale.max(1.0)
    } else {
        1.0
    };
    let (base_w, base_h) = cover_fit(source, viewport);
    let min_x = (viewport.width - base_w * scale).min(0.0);
    let min_y = (viewport.height - base_h * scale).min(0.0);

    ViewportState {
        scale,
        offset_x: clamp_offset(state.offset_x, min_x),
        offset_y: clamp_offset(state.offset_y, min_y),
    }
}

fn clamp_offset(value: f64, min: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(min, 0.0)
}

/// Move the image to a new offset, keeping the clamp invariant.
pub fn pan_to(
    source: Dimensions,
    viewport: Viewport,
    state: ViewportState,
    offset_x: f64,
    offset_y: f64,
) -> ViewportState {
    clamp_viewport(
        source,
        viewport,
        ViewportState {
            offset_x,
            offset_y,
            ..state
        },
    )
}

/// Change zoom (limited to `[1, MAX_SCALE]`) and re-clamp the offsets.
pub fn zoom_to(
    source: Dimensions,
    viewport: Viewport,
    state: ViewportState,
    scale: f64,
) -> ViewportState {
    clamp_viewport(
        source,
        viewport,
        ViewportState {
            scale: scale.min(MAX_SCALE),
            ..state
        },
    )
}

/// Convert the confirmed viewport state into a crop in source pixels.
///
/// The state is expected to be clamped; an unclamped state can produce a
/// rectangle that reaches outside the source.
pub fn viewport_to_crop(source: Dimensions, viewport: Viewport, state: ViewportState) -> CropRect {
    let (base_w, _) = cover_fit(source, viewport);
    let pixel_ratio = source.width as f64 / (base_w * state.scale);

    CropRect {
        sx: state.offset_x.abs() * pixel_ratio,
        sy: state.offset_y.abs() * pixel_ratio,
        s_width: viewport.width * pixel_ratio,
        s_height: viewport.height * pixel_ratio,
    }
}
