//! CLI output formatting.
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! ## Result
//!
//! ```text
//! instacrops-1920x1080.jpg
//!     Dimensions: 1920x1080
//!     Original: 4.21 MB
//!     Processed: 1.18 MB (72% smaller)
//!     Quality: 85 (2 attempts)
//! ```

use crate::imaging::ASPECT_PRESETS;
use crate::session::SessionResult;

const UNITS: &[&str] = &["Bytes", "KB", "MB", "GB"];

/// Human-readable size in base-1024 units with up to `decimals` places.
///
/// Trailing zeros are dropped: `1536 → "1.5 KB"`, `2097152 → "2 MB"`.
pub fn format_bytes(bytes: u64, decimals: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let mut number = format!("{value:.decimals$}");
    if number.contains('.') {
        number = number.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    format!("{number} {}", UNITS[unit])
}

/// File name offered for a result of the given dimensions.
pub fn download_filename(width: u32, height: u32) -> String {
    format!("instacrops-{width}x{height}.jpg")
}

pub fn format_result(result: &SessionResult) -> Vec<String> {
    let processed = &result.processed;
    let savings = result.savings_percent();
    let change = if savings >= 0 {
        format!("{savings}% smaller")
    } else {
        format!("{}% larger", -savings)
    };
    let attempts = match processed.attempts {
        1 => "1 attempt".to_string(),
        n => format!("{n} attempts"),
    };

    vec![
        result.filename(),
        format!("    Dimensions: {}x{}", processed.width, processed.height),
        format!(
            "    Original: {}",
            format_bytes(result.original_size as u64, 2)
        ),
        format!(
            "    Processed: {} ({change})",
            format_bytes(processed.len() as u64, 2)
        ),
        format!("    Quality: {} ({attempts})", processed.quality.value()),
    ]
}

pub fn print_result(result: &SessionResult) {
    for line in format_result(result) {
        println!("{line}");
    }
}

/// One line per manual-crop ratio: label and pixel target.
pub fn format_ratios() -> Vec<String> {
    ASPECT_PRESETS
        .iter()
        .map(|p| format!("{:<5} {}x{}", p.label, p.width, p.height))
        .collect()
}

pub fn print_ratios() {
    for line in format_ratios() {
        println!("{line}");
    }
}

pub fn format_stats(total_converted: u64) -> Vec<String> {
    let noun = if total_converted == 1 {
        "image"
    } else {
        "images"
    };
    vec![format!("Converted {total_converted} {noun}")]
}

pub fn print_stats(total_converted: u64) {
    for line in format_stats(total_converted) {
        println!("{line}");
    }
}
