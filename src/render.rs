//! Debug text rendering of result grids.
//!
//! Purely a diagnostic aid: one glyph per cell followed by a single space,
//! rows separated by a newline. Not part of the visibility contract and no
//! other serialization format is defined.

use std::fmt::Write;

use crate::grid::Grid;

/// Render the boolean projection of `result` as a glyph grid: `visible`
/// wherever intensity > 0, `hidden` elsewhere.
pub fn visibility_to_string(result: &Grid<f64>, visible: char, hidden: char) -> String {
    let mut out = String::new();
    for y in 0..result.height() {
        for x in 0..result.width() {
            out.push(if result.at(x, y) > 0.0 { visible } else { hidden });
            out.push(' ');
        }
        out.push('\n');
    }
    out
}

/// Render the raw intensities of `result`, rounded to `decimal_places`.
pub fn intensity_to_string(result: &Grid<f64>, decimal_places: usize) -> String {
    let mut out = String::new();
    for y in 0..result.height() {
        for x in 0..result.width() {
            let _ = write!(out, "{:.*} ", decimal_places, result.at(x, y));
        }
        out.push('\n');
    }
    out
}
