//! Interactive FOV viewer - mouse controls the view origin in real-time.

use std::sync::Arc;

use minifb::{Key, MouseButton, MouseMode, Window, WindowOptions};

use crate::fov::{FovCalculation, FovEngine, RadiusShape};
use crate::grid::Grid;
use crate::mapgen::{Generator, RandomRoomsStep, RandomWalkStep, TRANSPARENCY_TAG};

/// Configuration for the interactive viewer
#[derive(Clone)]
pub struct ViewerConfig {
    /// Grid size (width x height in cells)
    pub grid_size: (usize, usize),
    /// Pixel scale factor (each cell = scale x scale pixels)
    pub scale: usize,
    /// Initial view radius
    pub radius: f64,
    /// Initial distance metric
    pub shape: RadiusShape,
    /// Arc width used when cone mode is toggled on
    pub cone_span: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            grid_size: (60, 60),
            scale: 12,
            radius: 12.0,
            shape: RadiusShape::Circle,
            cone_span: 90.0,
        }
    }
}

/// Interactive viewer for exploring FOV calculations on an editable map.
pub struct InteractiveViewer {
    config: ViewerConfig,
    transparency: Grid<bool>,
    engine: FovEngine,
    /// Extra view sources appended on top of the mouse-driven one.
    lights: Vec<(usize, usize)>,
    window: Window,
    buffer: Vec<u32>,
    last_wall_pos: (usize, usize),
}

impl InteractiveViewer {
    /// Create a new interactive viewer with the given configuration
    pub fn new(config: ViewerConfig) -> Result<Self, String> {
        let (grid_w, grid_h) = config.grid_size;
        let window_w = grid_w * config.scale;
        let window_h = grid_h * config.scale;

        let window = Window::new(
            "FOV Grid - Interactive Viewer (ESC to exit)",
            window_w,
            window_h,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| e.to_string())?;

        let transparency = generate_map(grid_w, grid_h)?;
        let engine = FovEngine::new(Arc::new(transparency.clone()));
        let buffer = vec![0u32; window_w * window_h];

        Ok(Self {
            config,
            transparency,
            engine,
            lights: Vec::new(),
            window,
            buffer,
            last_wall_pos: (usize::MAX, usize::MAX),
        })
    }

    /// Run the interactive viewer loop
    pub fn run(&mut self) -> Result<(), String> {
        let (grid_w, grid_h) = self.config.grid_size;
        let scale = self.config.scale;

        // Limit to ~60fps
        self.window.set_target_fps(60);

        let mut cone_enabled = false;
        let mut cone_angle = 0.0f64;

        println!("=== Interactive FOV Viewer ===");
        println!("Controls:");
        println!("  Mouse      - Move view origin");
        println!("  Left Click - Toggle wall");
        println!("  A          - Drop an extra light at the cursor (append)");
        println!("  C          - Clear extra lights");
        println!("  1/2/3      - Metric: Circle/Diamond/Square");
        println!("  +/-        - Adjust radius");
        println!("  T          - Toggle cone restriction ON/OFF");
        println!("  Q/E        - Rotate cone");
        println!("  M          - Regenerate map");
        println!("  ESC        - Exit");
        println!();

        while self.window.is_open() && !self.window.is_key_down(Key::Escape) {
            // Handle keyboard input
            if self.window.is_key_pressed(Key::Key1, minifb::KeyRepeat::No) {
                self.config.shape = RadiusShape::Circle;
                println!("Metric: Circle (Euclidean)");
            }
            if self.window.is_key_pressed(Key::Key2, minifb::KeyRepeat::No) {
                self.config.shape = RadiusShape::Diamond;
                println!("Metric: Diamond (Manhattan)");
            }
            if self.window.is_key_pressed(Key::Key3, minifb::KeyRepeat::No) {
                self.config.shape = RadiusShape::Square;
                println!("Metric: Square (Chebyshev)");
            }

            // Radius adjustment
            if self.window.is_key_pressed(Key::Equal, minifb::KeyRepeat::Yes)
                || self.window.is_key_pressed(Key::NumPadPlus, minifb::KeyRepeat::Yes)
            {
                self.config.radius = (self.config.radius + 1.0).min(64.0);
                println!("Radius: {:.0}", self.config.radius);
            }
            if self.window.is_key_pressed(Key::Minus, minifb::KeyRepeat::Yes)
                || self.window.is_key_pressed(Key::NumPadMinus, minifb::KeyRepeat::Yes)
            {
                self.config.radius = (self.config.radius - 1.0).max(1.0);
                println!("Radius: {:.0}", self.config.radius);
            }

            if self.window.is_key_pressed(Key::T, minifb::KeyRepeat::No) {
                cone_enabled = !cone_enabled;
                println!(
                    "Cone restriction: {}",
                    if cone_enabled { "ON" } else { "OFF" }
                );
            }
            if self.window.is_key_pressed(Key::Q, minifb::KeyRepeat::Yes) {
                cone_angle = (cone_angle - 15.0).rem_euclid(360.0);
                println!("Cone angle: {cone_angle:.0}");
            }
            if self.window.is_key_pressed(Key::E, minifb::KeyRepeat::Yes) {
                cone_angle = (cone_angle + 15.0).rem_euclid(360.0);
                println!("Cone angle: {cone_angle:.0}");
            }

            if self.window.is_key_pressed(Key::C, minifb::KeyRepeat::No) {
                self.lights.clear();
                println!("Extra lights cleared");
            }

            if self.window.is_key_pressed(Key::M, minifb::KeyRepeat::No) {
                self.transparency = generate_map(grid_w, grid_h)?;
                self.rebuild_engine();
                self.lights.clear();
                println!("Map regenerated");
            }

            // Handle mouse input
            if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Discard) {
                let grid_x = (mx as usize / scale).min(grid_w - 1);
                let grid_y = (my as usize / scale).min(grid_h - 1);

                // Toggle wall on left click (once per cell while held)
                if self.window.get_mouse_down(MouseButton::Left) {
                    if self.last_wall_pos != (grid_x, grid_y) {
                        let open = self.transparency.at(grid_x, grid_y);
                        self.transparency.set(grid_x, grid_y, !open);
                        self.rebuild_engine();
                        self.last_wall_pos = (grid_x, grid_y);
                    }
                } else {
                    self.last_wall_pos = (usize::MAX, usize::MAX);
                }

                if self.window.is_key_pressed(Key::A, minifb::KeyRepeat::No) {
                    self.lights.push((grid_x, grid_y));
                    println!("Light dropped at ({grid_x}, {grid_y})");
                }

                // Fresh calculation from the cursor, then append the
                // dropped lights on top; the result grid max-merges them.
                let mut calc = FovCalculation::new((grid_x, grid_y))
                    .radius(self.config.radius)
                    .shape(self.config.shape);
                if cone_enabled {
                    calc = calc.cone(cone_angle, self.config.cone_span);
                }
                if let Err(e) = self.engine.calculate(calc) {
                    log::warn!("calculation rejected: {e}");
                }
                for &light in &self.lights {
                    let append = FovCalculation::new(light)
                        .radius(self.config.radius)
                        .shape(self.config.shape);
                    if let Err(e) = self.engine.calculate_append(append) {
                        log::warn!("append rejected: {e}");
                    }
                }

                self.render_to_buffer((grid_x, grid_y));
            }

            // Update window
            self.window
                .update_with_buffer(&self.buffer, grid_w * scale, grid_h * scale)
                .map_err(|e| e.to_string())?;
        }

        Ok(())
    }

    /// The engine references its transparency grid immutably for its
    /// lifetime, so map edits swap in a fresh engine.
    fn rebuild_engine(&mut self) {
        self.engine = FovEngine::new(Arc::new(self.transparency.clone()));
    }

    /// Render the engine's intensities to the pixel buffer
    fn render_to_buffer(&mut self, origin: (usize, usize)) {
        let (grid_w, grid_h) = self.config.grid_size;
        let scale = self.config.scale;

        for gy in 0..grid_h {
            for gx in 0..grid_w {
                let intensity = self.engine.intensity(gx, gy) as f32;
                let wall = !self.transparency.at(gx, gy);

                // Warm torch tint for lit floor, gray for lit walls
                let (r, g, b) = if (gx, gy) == origin {
                    (255, 255, 255)
                } else if wall {
                    let v = 40 + (intensity * 120.0) as u32;
                    (v, v, v)
                } else {
                    (
                        (intensity * 255.0) as u32,
                        (intensity * 200.0) as u32,
                        (intensity * 110.0) as u32,
                    )
                };

                let color_u32 = (r << 16) | (g << 8) | b;

                // Fill scaled pixels
                for sy in 0..scale {
                    for sx in 0..scale {
                        let px = gx * scale + sx;
                        let py = gy * scale + sy;
                        let idx = py * (grid_w * scale) + px;
                        self.buffer[idx] = color_u32;
                    }
                }
            }
        }
    }
}

/// Run the generation pipeline and pull out the finished transparency grid.
fn generate_map(width: usize, height: usize) -> Result<Grid<bool>, String> {
    let context = Generator::new(width, height)
        .add_step(RandomRoomsStep::new(8, 5, 11))
        .add_step(RandomWalkStep::new(width * height / 2))
        .generate()
        .map_err(|e| e.to_string())?;
    context
        .get_tagged::<Grid<bool>>(TRANSPARENCY_TAG)
        .cloned()
        .ok_or_else(|| "generator did not produce a transparency grid".to_string())
}
