//! Field-of-view engine: the stateful calculation contract.
//!
//! The engine owns a result grid of light intensities, tracks which cells
//! were visible before and after the latest calculation, and delegates the
//! actual grid walk to a pluggable [`FovAlgorithm`]. Fresh calculations
//! zero the grid first; append calculations max-merge into it, which is how
//! several overlapping sources combine into one field of view.

pub mod shadowcasting;

pub use shadowcasting::Shadowcasting;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::grid::{Grid, Point};
use crate::render;

/// Shape of the radius falloff, i.e. how distance from the origin is
/// measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RadiusShape {
    /// Euclidean distance (circular field of view). The default.
    #[default]
    Circle,
    /// Manhattan distance (diamond field of view).
    Diamond,
    /// Chebyshev distance (square field of view).
    Square,
}

impl RadiusShape {
    /// Distance of the offset `(dx, dy)` from the origin under this shape.
    pub fn distance(self, dx: f64, dy: f64) -> f64 {
        match self {
            RadiusShape::Circle => (dx * dx + dy * dy).sqrt(),
            RadiusShape::Diamond => dx.abs() + dy.abs(),
            RadiusShape::Square => dx.abs().max(dy.abs()),
        }
    }
}

/// Angular restriction limiting a calculation to a cone.
///
/// `angle` is the cone's center in degrees, where 0° points up (toward
/// decreasing y) and angles increase clockwise. `span` is the total arc
/// width; the cone extends `span / 2` degrees to either side of `angle`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cone {
    pub angle: f64,
    pub span: f64,
}

impl Cone {
    /// Whether the offset `(dx, dy)` from the origin falls inside the cone.
    pub fn contains(&self, dx: f64, dy: f64) -> bool {
        if dx == 0.0 && dy == 0.0 {
            return true;
        }
        // 0 degrees = up, clockwise, matching compass orientation on a
        // screen grid where y grows downward.
        let cell_angle = dx.atan2(-dy).to_degrees().rem_euclid(360.0);
        let diff = (cell_angle - self.angle + 540.0).rem_euclid(360.0) - 180.0;
        diff.abs() <= self.span / 2.0
    }
}

/// Parameters of one FOV calculation.
///
/// Built with [`FovCalculation::new`] plus the builder methods; anything
/// left unset keeps its default: unbounded radius, circular falloff, full
/// 360° coverage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FovCalculation {
    pub origin: Point,
    pub radius: f64,
    pub shape: RadiusShape,
    pub cone: Option<Cone>,
}

impl FovCalculation {
    /// An unbounded, circular, full-circle calculation from `origin`.
    pub fn new(origin: Point) -> Self {
        FovCalculation {
            origin,
            radius: f64::INFINITY,
            shape: RadiusShape::Circle,
            cone: None,
        }
    }

    /// Limit the maximum distance of the field of view.
    pub fn radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Choose the distance metric used for radius falloff.
    pub fn shape(mut self, shape: RadiusShape) -> Self {
        self.shape = shape;
        self
    }

    /// Restrict the calculation to a cone centered on `angle` degrees with
    /// a total arc of `span` degrees.
    pub fn cone(mut self, angle: f64, span: f64) -> Self {
        self.cone = Some(Cone { angle, span });
        self
    }
}

/// Rejected calculation parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FovError {
    #[error("fov origin ({x}, {y}) is outside the {width}x{height} grid")]
    OriginOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    #[error("fov radius must be non-negative, got {0}")]
    InvalidRadius(f64),
    #[error("fov cone parameters must be finite, got angle={angle}, span={span}")]
    InvalidCone { angle: f64, span: f64 },
}

/// Strategy that performs the actual grid walk for one calculation.
///
/// Implementations write visibility intensities for `calc` into `result`.
/// Two rules make append calculations compose:
///
/// - never assume a cell starts at zero;
/// - only ever raise a cell's stored value (keep the max of the stored and
///   the newly computed intensity), never lower it.
///
/// The engine does not police these rules; an algorithm that breaks them
/// silently corrupts merged results, so implementations should unit-test
/// the max-merge behavior directly.
///
/// Implementations must not reset the grid or fire events themselves; the
/// engine handles both around the call.
pub trait FovAlgorithm {
    fn scan(&self, transparency: &Grid<bool>, calc: &FovCalculation, result: &mut Grid<f64>);
}

/// Read-only boolean view over an engine's result grid.
///
/// Computed per query from the live intensities (`intensity > 0`), so it
/// can never go stale. Obtained from [`FovEngine::bool_view`].
#[derive(Clone, Copy)]
pub struct BoolFovView<'a> {
    result: &'a Grid<f64>,
}

impl BoolFovView<'_> {
    pub fn width(&self) -> usize {
        self.result.width()
    }

    pub fn height(&self) -> usize {
        self.result.height()
    }

    /// Whether the cell at `(x, y)` is visible.
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.result.at(x, y) > 0.0
    }
}

type ResetListener = Box<dyn FnMut()>;
type RecalculatedListener = Box<dyn FnMut(&FovCalculation)>;

/// Stateful field-of-view engine.
///
/// Bound at construction to a read-only transparency grid (`true` = the
/// cell passes light) whose dimensions fix the engine's dimensions for its
/// lifetime. The transparency grid is shared, never copied; several engines
/// may reference the same one.
///
/// The engine is single-threaded: every operation runs to completion on the
/// caller's thread and there is no internal locking. Callers that share an
/// engine across threads must serialize access themselves.
pub struct FovEngine<A = Shadowcasting> {
    transparency: Arc<Grid<bool>>,
    result: Grid<f64>,
    current: HashSet<Point>,
    previous: HashSet<Point>,
    algorithm: A,
    reset_listeners: Vec<ResetListener>,
    recalculated_listeners: Vec<RecalculatedListener>,
}

impl FovEngine<Shadowcasting> {
    /// Engine with the default recursive shadowcasting algorithm.
    pub fn new(transparency: Arc<Grid<bool>>) -> Self {
        FovEngine::with_algorithm(transparency, Shadowcasting)
    }
}

impl<A: FovAlgorithm> FovEngine<A> {
    /// Engine delegating its grid walk to `algorithm`.
    pub fn with_algorithm(transparency: Arc<Grid<bool>>, algorithm: A) -> Self {
        let result = Grid::new(transparency.width(), transparency.height(), 0.0);
        FovEngine {
            transparency,
            result,
            current: HashSet::new(),
            previous: HashSet::new(),
            algorithm,
            reset_listeners: Vec::new(),
            recalculated_listeners: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.result.width()
    }

    pub fn height(&self) -> usize {
        self.result.height()
    }

    /// The transparency grid this engine reads from.
    pub fn transparency(&self) -> &Arc<Grid<bool>> {
        &self.transparency
    }

    /// The raw intensity results of the latest calculation.
    pub fn result_view(&self) -> &Grid<f64> {
        &self.result
    }

    /// Intensity at `(x, y)`; 0.0 means not visible.
    pub fn intensity(&self, x: usize, y: usize) -> f64 {
        self.result.at(x, y)
    }

    /// Live boolean projection of the result grid.
    pub fn bool_view(&self) -> BoolFovView<'_> {
        BoolFovView { result: &self.result }
    }

    /// Whether the cell at `(x, y)` is currently visible.
    pub fn is_visible(&self, x: usize, y: usize) -> bool {
        self.result.at(x, y) > 0.0
    }

    /// Cells visible after the latest calculation.
    pub fn current_fov(&self) -> impl Iterator<Item = Point> + '_ {
        self.current.iter().copied()
    }

    /// Cells that became visible in the latest calculation.
    pub fn newly_seen(&self) -> impl Iterator<Item = Point> + '_ {
        self.current.difference(&self.previous).copied()
    }

    /// Cells that lost visibility in the latest calculation.
    ///
    /// Append calculations only grow the current set, so this stays empty
    /// until the next fresh [`calculate`](Self::calculate) or
    /// [`reset`](Self::reset).
    pub fn newly_unseen(&self) -> impl Iterator<Item = Point> + '_ {
        self.previous.difference(&self.current).copied()
    }

    /// Subscribe to reset notifications. Listeners run synchronously in
    /// subscription order; a panicking listener unwinds into the caller of
    /// `reset`/`calculate`.
    pub fn on_reset(&mut self, listener: impl FnMut() + 'static) {
        self.reset_listeners.push(Box::new(listener));
    }

    /// Subscribe to recalculated notifications, fired once per completed
    /// append (including the one inside a fresh calculate) with the
    /// calculation's parameters. Same delivery semantics as
    /// [`on_reset`](Self::on_reset).
    pub fn on_recalculated(&mut self, listener: impl FnMut(&FovCalculation) + 'static) {
        self.recalculated_listeners.push(Box::new(listener));
    }

    /// Clear all visibility, cycling the current FOV set into the previous
    /// one so history queries keep working across the reset.
    pub fn reset(&mut self) {
        // Cycle current into previous, reusing both sets' storage.
        std::mem::swap(&mut self.previous, &mut self.current);
        self.current.clear();
        self.result.fill(0.0);
        log::debug!("fov reset ({}x{})", self.width(), self.height());
        for listener in &mut self.reset_listeners {
            listener();
        }
    }

    /// Start a fresh field of view: reset, then append `calc`.
    pub fn calculate(&mut self, calc: FovCalculation) -> Result<(), FovError> {
        self.validate(&calc)?;
        self.reset();
        self.calculate_append(calc)
    }

    /// Merge `calc` into the existing results without resetting.
    ///
    /// This is the one path for combining several sources (e.g. several
    /// lights) into one result grid; each append only raises intensities.
    pub fn calculate_append(&mut self, calc: FovCalculation) -> Result<(), FovError> {
        self.validate(&calc)?;
        let calc = normalize_cone(calc);
        self.algorithm.scan(&self.transparency, &calc, &mut self.result);
        self.refresh_current();
        log::trace!(
            "fov recalculated: origin=({}, {}) radius={} shape={:?} cone={:?} visible={}",
            calc.origin.0,
            calc.origin.1,
            calc.radius,
            calc.shape,
            calc.cone,
            self.current.len(),
        );
        for listener in &mut self.recalculated_listeners {
            listener(&calc);
        }
        Ok(())
    }

    fn validate(&self, calc: &FovCalculation) -> Result<(), FovError> {
        let (x, y) = calc.origin;
        if !self.result.in_bounds(x, y) {
            return Err(FovError::OriginOutOfBounds {
                x,
                y,
                width: self.width(),
                height: self.height(),
            });
        }
        if calc.radius.is_nan() || calc.radius < 0.0 {
            return Err(FovError::InvalidRadius(calc.radius));
        }
        // NaN or infinite cone parameters would survive normalization as
        // NaN and dark the entire cone, so they are rejected up front.
        if let Some(cone) = &calc.cone {
            if !cone.angle.is_finite() || !cone.span.is_finite() {
                return Err(FovError::InvalidCone {
                    angle: cone.angle,
                    span: cone.span,
                });
            }
        }
        Ok(())
    }

    /// Recompute the current FOV set from the result grid's non-zero cells.
    fn refresh_current(&mut self) {
        self.current.clear();
        for (x, y) in self.result.positions() {
            if self.result.at(x, y) > 0.0 {
                self.current.insert((x, y));
            }
        }
    }

    /// Glyph rendering of the boolean projection with custom glyphs; see
    /// [`render::visibility_to_string`].
    pub fn to_glyph_string(&self, visible: char, hidden: char) -> String {
        render::visibility_to_string(&self.result, visible, hidden)
    }

    /// Raw intensities rounded to `decimal_places`; see
    /// [`render::intensity_to_string`].
    pub fn to_intensity_string(&self, decimal_places: usize) -> String {
        render::intensity_to_string(&self.result, decimal_places)
    }
}

/// Clamp the cone's span into `[0, 360]` and normalize its center angle
/// into `[0, 360)` before the descriptor is recorded or handed to the
/// algorithm.
fn normalize_cone(mut calc: FovCalculation) -> FovCalculation {
    if let Some(cone) = calc.cone.as_mut() {
        cone.span = cone.span.clamp(0.0, 360.0);
        cone.angle = cone.angle.rem_euclid(360.0);
    }
    calc
}

impl<A> fmt::Display for FovEngine<A> {
    /// Default glyph rendering: `+` for visible cells, `-` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render::visibility_to_string(&self.result, '+', '-'))
    }
}
