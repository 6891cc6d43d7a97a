//! Length conversions for the package's native unit
//!
//! DOCX drawings measure extents and offsets in EMU (English Metric
//! Units): 914400 per inch, 12700 per point, 9525 per CSS pixel at 96dpi.

pub const EMU_PER_INCH: i64 = 914_400;
pub const EMU_PER_POINT: i64 = 12_700;
pub const EMU_PER_PIXEL: i64 = 9_525;

/// Convert points to EMU.
pub fn points_to_emu(points: f32) -> i64 {
    (points as f64 * EMU_PER_POINT as f64).round() as i64
}

/// Convert pixels (at 96dpi) to EMU.
pub fn pixels_to_emu(pixels: u32) -> i64 {
    pixels as i64 * EMU_PER_PIXEL
}

/// Convert inches to EMU.
pub fn inches_to_emu(inches: f32) -> i64 {
    (inches as f64 * EMU_PER_INCH as f64).round() as i64
}
