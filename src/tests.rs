//! Tests for the FOV engine, map generation, and supporting pieces.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use crate::fov::{FovAlgorithm, FovCalculation, FovError};
use crate::mapgen::{Generator, RandomRoomsStep, RandomWalkStep, TRANSPARENCY_TAG};
use crate::{FovEngine, GenerationError, Grid, Point, RadiusShape};

/// Tests that draw from the process-wide RNG hold this lock so seeded
/// sequences are not interleaved across test threads.
static RNG_LOCK: Mutex<()> = Mutex::new(());

fn open_grid(width: usize, height: usize) -> Arc<Grid<bool>> {
    Arc::new(Grid::new(width, height, true))
}

fn engine(width: usize, height: usize) -> FovEngine {
    FovEngine::new(open_grid(width, height))
}

fn visible_set(engine: &FovEngine<impl FovAlgorithm>) -> HashSet<Point> {
    engine.current_fov().collect()
}

#[test]
fn test_fresh_calculate_is_deterministic() {
    let mut engine = engine(9, 9);
    let calc = FovCalculation::new((4, 4)).radius(3.0);

    engine.calculate(calc).unwrap();
    let first = engine.result_view().clone();

    engine.calculate(calc).unwrap();
    assert_eq!(
        &first,
        engine.result_view(),
        "identical calculations must produce identical result grids"
    );
}

#[test]
fn test_thirteen_cell_circle() {
    let mut engine = engine(5, 5);
    engine
        .calculate(FovCalculation::new((2, 2)).radius(2.0))
        .unwrap();

    let mut expected = HashSet::new();
    for y in 0..5usize {
        for x in 0..5usize {
            let dx = x as f64 - 2.0;
            let dy = y as f64 - 2.0;
            if (dx * dx + dy * dy).sqrt() <= 2.0 {
                expected.insert((x, y));
            }
        }
    }
    assert_eq!(expected.len(), 13);
    assert_eq!(visible_set(&engine), expected);
}

#[test]
fn test_wall_blocks_row() {
    let mut transparency = Grid::new(5, 5, true);
    transparency.set(3, 2, false);
    let mut engine = FovEngine::new(Arc::new(transparency));

    engine
        .calculate(FovCalculation::new((2, 2)).radius(2.0))
        .unwrap();

    println!("{}", engine);
    assert!(engine.is_visible(3, 2), "the wall itself is seen");
    assert!(
        !engine.is_visible(4, 2),
        "cells behind the wall on its row stay dark"
    );
}

#[test]
fn test_radius_shapes() {
    // Radius 1 separates the metrics: Chebyshev lights the full 3x3 block,
    // Euclidean and Manhattan only the orthogonal neighbors.
    let mut engine = engine(5, 5);

    engine
        .calculate(
            FovCalculation::new((2, 2))
                .radius(1.0)
                .shape(RadiusShape::Square),
        )
        .unwrap();
    assert_eq!(visible_set(&engine).len(), 9, "square radius 1 is a 3x3 block");

    engine
        .calculate(
            FovCalculation::new((2, 2))
                .radius(1.0)
                .shape(RadiusShape::Diamond),
        )
        .unwrap();
    assert_eq!(visible_set(&engine).len(), 5, "diamond radius 1 is a plus shape");

    engine
        .calculate(
            FovCalculation::new((2, 2))
                .radius(1.0)
                .shape(RadiusShape::Circle),
        )
        .unwrap();
    assert_eq!(visible_set(&engine).len(), 5, "circle radius 1 is a plus shape");
}

#[test]
fn test_unbounded_radius_defaults() {
    // Defaults: unbounded radius, circular shape, no cone.
    let mut engine = engine(9, 9);
    engine.calculate(FovCalculation::new((0, 0))).unwrap();

    for (x, y) in [(0, 0), (8, 8), (8, 0), (0, 8), (4, 4)] {
        assert!(
            (engine.intensity(x, y) - 1.0).abs() < 1e-9,
            "unbounded radius on an open grid lights ({x}, {y}) fully"
        );
    }
    assert_eq!(visible_set(&engine).len(), 81);
}

#[test]
fn test_append_max_merges() {
    let transparency = open_grid(9, 9);
    let a = FovCalculation::new((1, 4)).radius(3.0);
    let b = FovCalculation::new((7, 4)).radius(3.0);

    let mut only_a = FovEngine::new(Arc::clone(&transparency));
    only_a.calculate(a).unwrap();
    let mut only_b = FovEngine::new(Arc::clone(&transparency));
    only_b.calculate(b).unwrap();

    let mut both = FovEngine::new(Arc::clone(&transparency));
    both.calculate(a).unwrap();
    both.calculate_append(b).unwrap();

    for (x, y) in both.result_view().positions() {
        let expected = only_a.intensity(x, y).max(only_b.intensity(x, y));
        assert!(
            (both.intensity(x, y) - expected).abs() < 1e-9,
            "cell ({x}, {y}) should hold the max of both sources"
        );
    }
}

#[test]
fn test_append_never_lowers() {
    let mut engine = engine(9, 9);
    engine
        .calculate(FovCalculation::new((4, 4)).radius(4.0))
        .unwrap();
    let before = engine.result_view().clone();

    // A tiny second source must not dim anything the first one lit.
    engine
        .calculate_append(FovCalculation::new((0, 0)).radius(1.0))
        .unwrap();
    for (x, y) in before.positions() {
        assert!(
            engine.intensity(x, y) >= before.at(x, y),
            "append lowered cell ({x}, {y})"
        );
    }
}

#[test]
fn test_history_across_fresh_calculations() {
    let mut engine = engine(11, 11);

    engine
        .calculate(FovCalculation::new((2, 5)).radius(2.0))
        .unwrap();
    let v1 = visible_set(&engine);

    engine
        .calculate(FovCalculation::new((8, 5)).radius(2.0))
        .unwrap();
    let v2 = visible_set(&engine);

    let newly_seen: HashSet<Point> = engine.newly_seen().collect();
    let newly_unseen: HashSet<Point> = engine.newly_unseen().collect();

    assert_eq!(newly_seen, &v2 - &v1);
    assert_eq!(newly_unseen, &v1 - &v2);
}

#[test]
fn test_append_keeps_newly_unseen_empty() {
    let mut engine = engine(11, 11);
    engine
        .calculate(FovCalculation::new((2, 5)).radius(2.0))
        .unwrap();
    engine
        .calculate_append(FovCalculation::new((8, 5)).radius(2.0))
        .unwrap();

    assert_eq!(
        engine.newly_unseen().count(),
        0,
        "appends only grow the current set"
    );
    let current = visible_set(&engine);
    assert!(current.contains(&(8, 5)));
    assert!(current.contains(&(2, 5)));
}

#[test]
fn test_reset_clears_fully() {
    let mut engine = engine(7, 7);
    engine
        .calculate(FovCalculation::new((3, 3)).radius(3.0))
        .unwrap();
    let seen = visible_set(&engine);
    assert!(!seen.is_empty());

    engine.reset();

    for (x, y) in (0..7).flat_map(|y| (0..7).map(move |x| (x, y))) {
        assert_eq!(engine.intensity(x, y), 0.0);
        assert!(!engine.bool_view().get(x, y));
    }
    assert_eq!(engine.current_fov().count(), 0);
    // History survives the reset: everything previously seen is now unseen.
    let newly_unseen: HashSet<Point> = engine.newly_unseen().collect();
    assert_eq!(newly_unseen, seen);
}

#[test]
fn test_boolean_projection_tracks_result_grid() {
    let mut engine = engine(7, 7);
    engine
        .calculate(FovCalculation::new((3, 3)).radius(2.0))
        .unwrap();
    engine
        .calculate_append(FovCalculation::new((0, 0)).radius(1.0))
        .unwrap();

    let view = engine.bool_view();
    for (x, y) in engine.result_view().positions() {
        assert_eq!(
            view.get(x, y),
            engine.intensity(x, y) > 0.0,
            "projection desynchronized at ({x}, {y})"
        );
    }
}

#[test]
fn test_notification_counts_and_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut engine = engine(5, 5);

    let reset_log = Rc::clone(&log);
    engine.on_reset(move || reset_log.borrow_mut().push("reset"));
    let recalc_log = Rc::clone(&log);
    engine.on_recalculated(move |_| recalc_log.borrow_mut().push("recalculated"));

    engine
        .calculate(FovCalculation::new((2, 2)).radius(2.0))
        .unwrap();
    assert_eq!(*log.borrow(), vec!["reset", "recalculated"]);

    engine
        .calculate_append(FovCalculation::new((0, 0)).radius(1.0))
        .unwrap();
    assert_eq!(*log.borrow(), vec!["reset", "recalculated", "recalculated"]);
}

#[test]
fn test_subscribers_run_in_insertion_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut engine = engine(5, 5);

    let first = Rc::clone(&log);
    engine.on_recalculated(move |_| first.borrow_mut().push("first"));
    let second = Rc::clone(&log);
    engine.on_recalculated(move |_| second.borrow_mut().push("second"));

    engine
        .calculate_append(FovCalculation::new((2, 2)).radius(1.0))
        .unwrap();
    assert_eq!(*log.borrow(), vec!["first", "second"]);
}

#[test]
fn test_recalculated_payload_carries_descriptor() {
    let received = Rc::new(RefCell::new(None));
    let mut engine = engine(9, 9);

    let sink = Rc::clone(&received);
    engine.on_recalculated(move |calc| *sink.borrow_mut() = Some(*calc));

    let calc = FovCalculation::new((4, 4))
        .radius(3.0)
        .shape(RadiusShape::Diamond)
        .cone(90.0, 60.0);
    engine.calculate_append(calc).unwrap();

    assert_eq!(received.borrow().as_ref(), Some(&calc));
}

#[test]
fn test_cone_restricts_to_forward_arc() {
    let mut engine = engine(11, 11);
    engine
        .calculate(FovCalculation::new((5, 5)).radius(4.0).cone(0.0, 90.0))
        .unwrap();

    assert!(engine.is_visible(5, 5), "origin is always lit");
    assert!(engine.is_visible(5, 1), "straight ahead is lit");
    assert!(!engine.is_visible(5, 9), "directly behind stays dark");
    assert!(!engine.is_visible(1, 5), "far left stays dark");
    assert!(!engine.is_visible(9, 5), "far right stays dark");

    // Every lit cell (other than the origin) lies within 45 degrees of the
    // cone's center line.
    for (x, y) in visible_set(&engine) {
        if (x, y) == (5, 5) {
            continue;
        }
        let dx = x as f64 - 5.0;
        let dy = y as f64 - 5.0;
        let angle = dx.atan2(-dy).to_degrees().rem_euclid(360.0);
        let diff = ((angle + 540.0).rem_euclid(360.0) - 180.0).abs();
        assert!(diff <= 45.0 + 1e-9, "cell ({x}, {y}) at {angle:.1} deg is outside the cone");
    }
}

#[test]
fn test_oversized_span_clamps_to_full_circle() {
    let transparency = open_grid(9, 9);

    let mut coned = FovEngine::new(Arc::clone(&transparency));
    coned
        .calculate(FovCalculation::new((4, 4)).radius(3.0).cone(45.0, 720.0))
        .unwrap();

    let mut full = FovEngine::new(Arc::clone(&transparency));
    full.calculate(FovCalculation::new((4, 4)).radius(3.0))
        .unwrap();

    assert_eq!(visible_set(&coned), visible_set(&full));
}

#[test]
fn test_out_of_bounds_origin_is_rejected() {
    let fired = Rc::new(RefCell::new(0usize));
    let mut engine = engine(5, 5);
    let counter = Rc::clone(&fired);
    engine.on_recalculated(move |_| *counter.borrow_mut() += 1);

    let err = engine
        .calculate(FovCalculation::new((5, 2)).radius(2.0))
        .unwrap_err();
    assert!(matches!(err, FovError::OriginOutOfBounds { x: 5, y: 2, .. }));
    assert_eq!(*fired.borrow(), 0, "rejected calculations fire no events");
    assert_eq!(engine.current_fov().count(), 0);
}

#[test]
fn test_non_finite_cone_is_rejected() {
    let mut engine = engine(5, 5);

    let err = engine
        .calculate(FovCalculation::new((2, 2)).radius(2.0).cone(f64::NAN, 90.0))
        .unwrap_err();
    assert!(matches!(err, FovError::InvalidCone { .. }));

    let err = engine
        .calculate(FovCalculation::new((2, 2)).radius(2.0).cone(0.0, f64::NAN))
        .unwrap_err();
    assert!(matches!(err, FovError::InvalidCone { .. }));

    let err = engine
        .calculate(
            FovCalculation::new((2, 2))
                .radius(2.0)
                .cone(f64::INFINITY, 90.0),
        )
        .unwrap_err();
    assert!(matches!(err, FovError::InvalidCone { .. }));
}

#[test]
fn test_negative_radius_is_rejected() {
    let mut engine = engine(5, 5);
    let err = engine
        .calculate(FovCalculation::new((2, 2)).radius(-1.0))
        .unwrap_err();
    assert!(matches!(err, FovError::InvalidRadius(r) if r == -1.0));
}

/// Strategy stub that raises a fixed cell to a fixed intensity, honoring
/// the max-merge contract.
struct FixedCell {
    cell: Point,
    intensity: f64,
}

impl FovAlgorithm for FixedCell {
    fn scan(&self, _transparency: &Grid<bool>, _calc: &FovCalculation, result: &mut Grid<f64>) {
        let (x, y) = self.cell;
        if self.intensity > result.at(x, y) {
            result.set(x, y, self.intensity);
        }
    }
}

#[test]
fn test_injected_algorithm_drives_the_engine() {
    let mut engine = FovEngine::with_algorithm(
        open_grid(3, 3),
        FixedCell {
            cell: (1, 1),
            intensity: 0.25,
        },
    );

    engine.calculate(FovCalculation::new((0, 0))).unwrap();
    assert_eq!(engine.intensity(1, 1), 0.25);
    assert_eq!(visible_set(&engine), HashSet::from([(1, 1)]));

    // The engine performs no implicit reset on append, so the stored value
    // survives a weaker overlapping scan.
    engine.calculate_append(FovCalculation::new((0, 0))).unwrap();
    assert_eq!(engine.intensity(1, 1), 0.25);
}

#[test]
fn test_glyph_and_intensity_rendering() {
    let mut result = Grid::new(3, 2, 0.0f64);
    result.set(0, 0, 0.5);
    result.set(2, 1, 1.0);

    let glyphs = crate::render::visibility_to_string(&result, '+', '-');
    assert_eq!(glyphs, "+ - - \n- - + \n");

    let values = crate::render::intensity_to_string(&result, 1);
    assert_eq!(values, "0.5 0.0 0.0 \n0.0 0.0 1.0 \n");
}

#[test]
fn test_engine_display_uses_default_glyphs() {
    let mut engine = engine(3, 3);
    engine
        .calculate(FovCalculation::new((1, 1)).radius(0.0))
        .unwrap();
    assert_eq!(format!("{engine}"), "- - - \n- + - \n- - - \n");
}

#[test]
fn test_missing_component_fails_fast() {
    let result = Generator::with_empty_context(20, 20)
        .add_step(RandomRoomsStep::new(3, 3, 5))
        .generate();

    let err = result.unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, GenerationError::MissingComponent { .. }));
    assert!(message.contains("RandomRooms"), "message names the step: {message}");
    assert!(
        message.contains("\"transparency\""),
        "message names the missing component tag: {message}"
    );
}

#[test]
fn test_invalid_step_parameter_fails_fast() {
    let result = Generator::new(20, 20)
        .add_step(RandomRoomsStep::new(0, 3, 5))
        .generate();

    let err = result.unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, GenerationError::InvalidConfiguration { .. }));
    assert!(message.contains("RandomRooms"), "message names the step: {message}");
    assert!(message.contains("rooms"), "message names the parameter: {message}");
}

#[test]
fn test_generated_map_feeds_the_engine() {
    let _guard = RNG_LOCK.lock().unwrap();
    crate::rng::seed_global_rng(1234);

    let context = Generator::new(30, 30)
        .add_step(RandomRoomsStep::new(4, 4, 7))
        .add_step(RandomWalkStep::new(200))
        .generate()
        .unwrap();
    let transparency = context
        .get_tagged::<Grid<bool>>(TRANSPARENCY_TAG)
        .unwrap()
        .clone();

    // Pick any open cell as the origin.
    let origin = transparency
        .positions()
        .find(|&(x, y)| transparency.at(x, y))
        .expect("generation opened at least one cell");

    let mut engine = FovEngine::new(Arc::new(transparency));
    engine
        .calculate(FovCalculation::new(origin).radius(8.0))
        .unwrap();
    assert!(engine.is_visible(origin.0, origin.1));
}

#[test]
fn test_seeded_generation_is_reproducible() {
    let _guard = RNG_LOCK.lock().unwrap();

    let generate = || {
        crate::rng::seed_global_rng(99);
        let context = Generator::new(25, 25)
            .add_step(RandomRoomsStep::new(3, 4, 6))
            .generate()
            .unwrap();
        context
            .get_tagged::<Grid<bool>>(TRANSPARENCY_TAG)
            .unwrap()
            .clone()
    };

    assert_eq!(generate(), generate(), "same seed, same map");
}

#[test]
fn test_generation_context_debug_is_compact() {
    // Components are type-erased; Debug reports dimensions and registry
    // size so contexts can appear in assertion failures.
    let context = Generator::new(10, 8).generate().unwrap();
    let debug = format!("{context:?}");
    assert!(debug.contains("width: 10"), "got: {debug}");
    assert!(debug.contains("height: 8"), "got: {debug}");
    assert!(debug.contains("components: 1"), "got: {debug}");
}

#[test]
fn test_grid_basics() {
    let mut grid = Grid::new(4, 3, 0i32);
    assert_eq!(grid.width(), 4);
    assert_eq!(grid.height(), 3);
    assert!(grid.in_bounds(3, 2));
    assert!(!grid.in_bounds(4, 0));
    assert!(!grid.in_bounds(0, 3));

    grid.set(3, 2, 7);
    assert_eq!(grid.at(3, 2), 7);
    assert_eq!(grid.positions().count(), 12);

    grid.fill(1);
    assert!(grid.as_slice().iter().all(|&v| v == 1));
}
