//! Flat row-major grid storage used throughout the crate.
//!
//! Both the caller-supplied transparency grid (`Grid<bool>`) and the
//! engine's result grid (`Grid<f64>`) use the same layout:
//! index = y * width + x.

/// A cell coordinate, `(x, y)` with `y` growing downward.
pub type Point = (usize, usize);

/// Fixed-size 2D grid over a flat `Vec` (row-major: index = y * width + x).
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Create a grid with every cell set to `fill`.
    pub fn new(width: usize, height: usize, fill: T) -> Self {
        Grid {
            width,
            height,
            cells: vec![fill; width * height],
        }
    }

    /// Reset every cell to `fill` without reallocating.
    pub fn fill(&mut self, fill: T) {
        for cell in &mut self.cells {
            *cell = fill.clone();
        }
    }
}

impl<T> Grid<T> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether `(x, y)` lies inside the grid.
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Read the cell at `(x, y)`.
    ///
    /// # Panics
    /// Panics if `(x, y)` is out of bounds.
    pub fn get(&self, x: usize, y: usize) -> &T {
        assert!(self.in_bounds(x, y), "grid access out of bounds: ({x}, {y})");
        &self.cells[y * self.width + x]
    }

    /// Write the cell at `(x, y)`.
    ///
    /// # Panics
    /// Panics if `(x, y)` is out of bounds.
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        assert!(self.in_bounds(x, y), "grid access out of bounds: ({x}, {y})");
        self.cells[y * self.width + x] = value;
    }

    /// Iterate over all coordinates in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Point> + use<T> {
        let width = self.width;
        let height = self.height;
        (0..height).flat_map(move |y| (0..width).map(move |x| (x, y)))
    }

    /// Borrow the flat backing storage (row-major).
    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }
}

impl<T: Copy> Grid<T> {
    /// Copy out the cell at `(x, y)`.
    pub fn at(&self, x: usize, y: usize) -> T {
        *self.get(x, y)
    }
}
