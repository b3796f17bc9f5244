//! Concrete generation steps.
//!
//! Both steps carve a `Grid<bool>` transparency component (tagged
//! `"transparency"`) that later feeds an FOV engine, drawing randomness
//! from the global RNG so callers can seed generation deterministically.

use rand::Rng;

use crate::grid::Grid;
use crate::mapgen::{
    ComponentRequirement, GenerationContext, GenerationError, GenerationStep, TRANSPARENCY_TAG,
};
use crate::rng;

/// Carves non-overlap-checked rectangular rooms and connects consecutive
/// room centers with L-shaped corridors.
pub struct RandomRoomsStep {
    name: String,
    pub rooms: usize,
    pub min_size: usize,
    pub max_size: usize,
}

impl RandomRoomsStep {
    pub fn new(rooms: usize, min_size: usize, max_size: usize) -> Self {
        RandomRoomsStep {
            name: "RandomRooms".to_string(),
            rooms,
            min_size,
            max_size,
        }
    }
}

impl GenerationStep for RandomRoomsStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_components(&self) -> Vec<ComponentRequirement> {
        vec![ComponentRequirement::tagged::<Grid<bool>>(TRANSPARENCY_TAG)]
    }

    fn on_perform(&mut self, context: &mut GenerationContext) -> Result<(), GenerationError> {
        if self.rooms == 0 {
            return Err(GenerationError::InvalidConfiguration {
                step: self.name.clone(),
                parameter: "rooms".to_string(),
                message: "at least one room is required".to_string(),
            });
        }
        if self.min_size == 0 || self.max_size < self.min_size {
            return Err(GenerationError::InvalidConfiguration {
                step: self.name.clone(),
                parameter: "min_size/max_size".to_string(),
                message: format!(
                    "room sizes must satisfy 1 <= min_size <= max_size, got {}..={}",
                    self.min_size, self.max_size
                ),
            });
        }
        // One cell of solid border is kept on every edge.
        if context.width() < self.max_size + 2 || context.height() < self.max_size + 2 {
            return Err(GenerationError::InvalidConfiguration {
                step: self.name.clone(),
                parameter: "max_size".to_string(),
                message: format!(
                    "rooms up to {0}x{0} do not fit a {1}x{2} map with a solid border",
                    self.max_size,
                    context.width(),
                    context.height()
                ),
            });
        }

        let (width, height) = (context.width(), context.height());
        let grid = context
            .get_tagged_mut::<Grid<bool>>(TRANSPARENCY_TAG)
            .expect("requirement checked by perform");

        let mut centers = Vec::with_capacity(self.rooms);
        for _ in 0..self.rooms {
            let (x, y, w, h) = rng::with_global_rng(|rng| {
                let w = rng.gen_range(self.min_size..=self.max_size);
                let h = rng.gen_range(self.min_size..=self.max_size);
                let x = rng.gen_range(1..width - w);
                let y = rng.gen_range(1..height - h);
                (x, y, w, h)
            });
            for cy in y..y + h {
                for cx in x..x + w {
                    grid.set(cx, cy, true);
                }
            }
            centers.push((x + w / 2, y + h / 2));
        }

        for pair in centers.windows(2) {
            carve_corridor(grid, pair[0], pair[1]);
        }
        Ok(())
    }
}

/// Horizontal-then-vertical corridor between two cells.
fn carve_corridor(grid: &mut Grid<bool>, from: (usize, usize), to: (usize, usize)) {
    let (x0, y0) = from;
    let (x1, y1) = to;
    for x in x0.min(x1)..=x0.max(x1) {
        grid.set(x, y0, true);
    }
    for y in y0.min(y1)..=y0.max(y1) {
        grid.set(x1, y, true);
    }
}

/// Drunkard's-walk carver: wanders from the map center, opening every cell
/// it visits.
pub struct RandomWalkStep {
    name: String,
    pub steps: usize,
}

impl RandomWalkStep {
    pub fn new(steps: usize) -> Self {
        RandomWalkStep {
            name: "RandomWalk".to_string(),
            steps,
        }
    }
}

impl GenerationStep for RandomWalkStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_components(&self) -> Vec<ComponentRequirement> {
        vec![ComponentRequirement::tagged::<Grid<bool>>(TRANSPARENCY_TAG)]
    }

    fn on_perform(&mut self, context: &mut GenerationContext) -> Result<(), GenerationError> {
        let (width, height) = (context.width(), context.height());
        if width < 3 || height < 3 {
            return Err(GenerationError::InvalidConfiguration {
                step: self.name.clone(),
                parameter: "context".to_string(),
                message: format!("a {width}x{height} map leaves no interior to walk"),
            });
        }

        let grid = context
            .get_tagged_mut::<Grid<bool>>(TRANSPARENCY_TAG)
            .expect("requirement checked by perform");

        let (mut x, mut y) = (width / 2, height / 2);
        grid.set(x, y, true);
        for _ in 0..self.steps {
            let direction = rng::with_global_rng(|rng| rng.gen_range(0..4u8));
            // Stay one cell inside the border; blocked moves are skipped.
            match direction {
                0 => x += usize::from(x + 2 < width),
                1 => x -= usize::from(x > 1),
                2 => y += usize::from(y + 2 < height),
                _ => y -= usize::from(y > 1),
            }
            grid.set(x, y, true);
        }
        Ok(())
    }
}
