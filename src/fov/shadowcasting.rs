//! Recursive shadowcasting scan algorithm.
//!
//! The classic eight-octant recursive shadowcasting walk: each octant is
//! scanned row by row, tracking a slope window that narrows as opaque cells
//! cast shadows. Intensity falls off linearly with distance under the
//! calculation's metric, reaching zero just past the radius; an unbounded
//! radius yields flat 1.0 for every visible cell.
//!
//! Honors the engine's merge contract: every write keeps the maximum of the
//! stored and computed intensity, and no cell is assumed to start at zero.

use crate::fov::{FovAlgorithm, FovCalculation};
use crate::grid::Grid;

/// Octant transforms mapping scan-space deltas onto grid deltas.
/// Rows are (xx, xy, yx, yy) multipliers.
const OCTANTS: [(isize, isize, isize, isize); 8] = [
    (1, 0, 0, 1),
    (0, 1, 1, 0),
    (0, -1, 1, 0),
    (-1, 0, 0, 1),
    (-1, 0, 0, -1),
    (0, -1, -1, 0),
    (0, 1, -1, 0),
    (1, 0, 0, -1),
];

/// Recursive shadowcasting [`FovAlgorithm`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Shadowcasting;

impl FovAlgorithm for Shadowcasting {
    fn scan(&self, transparency: &Grid<bool>, calc: &FovCalculation, result: &mut Grid<f64>) {
        let scan = Scan {
            transparency,
            calc,
            // Linear falloff to zero one step beyond the radius; infinite
            // radius makes this 0 and every visible cell fully lit.
            decay: if calc.radius.is_finite() {
                1.0 / (calc.radius + 1.0)
            } else {
                0.0
            },
            // Rows to walk per octant: the radius, capped at far enough to
            // cross the whole grid from any origin.
            bound: {
                let extent = (transparency.width() + transparency.height()) as isize;
                if calc.radius.is_finite() {
                    (calc.radius.ceil() as isize).min(extent)
                } else {
                    extent
                }
            },
        };

        scan.light_origin(result);
        for octant in OCTANTS {
            scan.cast(result, 1, 1.0, 0.0, octant);
        }
    }
}

struct Scan<'a> {
    transparency: &'a Grid<bool>,
    calc: &'a FovCalculation,
    decay: f64,
    bound: isize,
}

impl Scan<'_> {
    /// The origin is always visible at full intensity, cone or not.
    fn light_origin(&self, result: &mut Grid<f64>) {
        let (ox, oy) = self.calc.origin;
        if result.at(ox, oy) < 1.0 {
            result.set(ox, oy, 1.0);
        }
    }

    /// Max-merge the intensity for the cell at offset `(dx, dy)`, skipping
    /// cells beyond the radius or outside the cone.
    fn light(&self, result: &mut Grid<f64>, x: usize, y: usize, dx: isize, dy: isize) {
        let distance = self.calc.shape.distance(dx as f64, dy as f64);
        if distance > self.calc.radius {
            return;
        }
        if let Some(cone) = &self.calc.cone {
            if !cone.contains(dx as f64, dy as f64) {
                return;
            }
        }
        let intensity = 1.0 - self.decay * distance;
        if intensity > result.at(x, y) {
            result.set(x, y, intensity);
        }
    }

    /// Scan one octant from `row` outward while the slope window
    /// `[end, start]` stays open.
    fn cast(
        &self,
        result: &mut Grid<f64>,
        row: isize,
        mut start: f64,
        end: f64,
        octant: (isize, isize, isize, isize),
    ) {
        if start < end {
            return;
        }
        let (xx, xy, yx, yy) = octant;
        let (ox, oy) = (self.calc.origin.0 as isize, self.calc.origin.1 as isize);

        let mut new_start = 0.0;
        let mut blocked = false;
        let mut distance = row;
        while distance <= self.bound && !blocked {
            let dy = -distance;
            for dx in -distance..=0 {
                let left_slope = (dx as f64 - 0.5) / (dy as f64 + 0.5);
                let right_slope = (dx as f64 + 0.5) / (dy as f64 - 0.5);
                if start < right_slope {
                    continue;
                }
                if end > left_slope {
                    break;
                }

                let cx = ox + dx * xx + dy * xy;
                let cy = oy + dx * yx + dy * yy;
                if cx < 0 || cy < 0 {
                    continue;
                }
                let (cx, cy) = (cx as usize, cy as usize);
                if !self.transparency.in_bounds(cx, cy) {
                    continue;
                }

                self.light(result, cx, cy, dx * xx + dy * xy, dx * yx + dy * yy);

                let opaque = !self.transparency.at(cx, cy);
                if blocked {
                    if opaque {
                        new_start = right_slope;
                    } else {
                        blocked = false;
                        start = new_start;
                    }
                } else if opaque && distance < self.bound {
                    // Shadow begins: recurse into the still-lit strip above
                    // it, then narrow this row's window past the blocker.
                    blocked = true;
                    self.cast(result, distance + 1, start, left_slope, octant);
                    new_start = right_slope;
                }
            }
            distance += 1;
        }
    }
}
