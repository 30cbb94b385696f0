// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time field engine.
//!
//! One engine owns one pixel grid size and one viewport, and turns
//! them into an `EscapeField`: per pixel, the number of iterations of
//! z ← z² + c before the orbit escaped, or the cap if it never did.
//!
//! Computing every pixel independently is correct but wasteful: huge
//! swaths of any view are either solid interior or smooth gradient.
//! The engine instead recurses on rectangles.  It computes the border
//! of a rectangle, and if every border pixel came out identical it
//! fills the interior with that value sight unseen; otherwise it
//! splits the rectangle into quadrants and tries again.  The fill is
//! a bet, not a proof: a rectangle can have a uniform border and
//! still contain an island of the set (or a filament) inside, and the
//! bet papers over it.  That trade-off is deliberate and inherited
//! from the classic boundary-tracing fractal renderers; the ≤2-pixel
//! base case bounds how wrong it can be.
//!
//! Nothing here spawns threads.  A compute pass is synchronous and
//! pure; the caller decides whether to run it off the interactive
//! thread, and is responsible for not mutating the viewport while a
//! pass is in flight.

use num::clamp;
use num::Complex;
use std::f64::consts::LN_2;

use planes::{Pixel, PlaneMapper, Viewport};
use EngineError;

/// A grid of escape counts, one per pixel, each in
/// `[0, max_iterations]`.  A value equal to the cap means the point
/// never escaped and is treated as inside the set.  Produced fresh by
/// every compute pass; there is no incremental update.
#[derive(Clone, Debug, PartialEq)]
pub struct EscapeField {
    width: usize,
    height: usize,
    cells: Vec<u32>,
}

impl EscapeField {
    /// A zeroed grid.  Zero doubles as the "not yet computed"
    /// sentinel during the recursive fill; the rare pixel whose true
    /// escape count is zero just gets recomputed to the same value.
    fn new(width: usize, height: usize) -> EscapeField {
        EscapeField {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    /// Width of the grid in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the grid in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The escape count at a pixel.  Panics on out-of-range
    /// coordinates, like any slice index.
    pub fn get(&self, px: usize, py: usize) -> u32 {
        self.cells[py * self.width + px]
    }

    fn set(&mut self, px: usize, py: usize, value: u32) {
        self.cells[py * self.width + px] = value;
    }

    /// The whole grid, row-major, for callers that want to walk it
    /// flat.
    pub fn cells(&self) -> &[u32] {
        &self.cells
    }
}

/// Owns the viewport and computes escape fields for it.  The grid
/// size is fixed per instance; the viewport moves underneath it via
/// [`pan`], [`adjust_zoom`], [`zoom_to`], and [`reset`], or wholesale
/// via [`set_viewport`] when restoring a bookmark.
///
/// [`pan`]: #method.pan
/// [`adjust_zoom`]: #method.adjust_zoom
/// [`zoom_to`]: #method.zoom_to
/// [`reset`]: #method.reset
/// [`set_viewport`]: #method.set_viewport
#[derive(Debug)]
pub struct FieldEngine {
    width: usize,
    height: usize,
    viewport: Viewport,
}

impl FieldEngine {
    /// An engine for a `width × height` pixel grid, framing the whole
    /// set at the default viewport.
    pub fn new(width: usize, height: usize) -> Result<FieldEngine, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::EmptyPlane);
        }
        Ok(FieldEngine {
            width,
            height,
            viewport: Viewport::default(),
        })
    }

    /// Width of the pixel grid.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the pixel grid.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Snapshot the current viewport, e.g. to persist a bookmark.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Replace the viewport wholesale, e.g. restoring a bookmark.
    /// The values are not validated here; a nonsense zoom or cap from
    /// stale persisted data surfaces as an error on the next
    /// `compute`.
    pub fn set_viewport(&mut self, view: Viewport) {
        self.viewport = view;
    }

    /// Compute the escape field for the current viewport.  This is
    /// the expensive call; everything else on the engine is cheap
    /// bookkeeping around it.
    pub fn compute(&self) -> Result<EscapeField, EngineError> {
        if self.viewport.max_iterations == 0 {
            return Err(EngineError::BadIterationCap);
        }
        let map = PlaneMapper::new(self.width, self.height, &self.viewport)?;
        let mut field = EscapeField::new(self.width, self.height);
        self.fill_rectangle(&map, &mut field, 0, 0, self.width - 1, self.height - 1);
        Ok(field)
    }

    /// Recursive rectangular subdivision with border tracing.  The
    /// rectangle is inclusive on all four sides.  Quadrants share
    /// their border pixels with each other and with the parent; the
    /// "only compute if still zero" guard makes the overlap a no-op.
    fn fill_rectangle(
        &self,
        map: &PlaneMapper,
        field: &mut EscapeField,
        x1: usize,
        y1: usize,
        x2: usize,
        y2: usize,
    ) {
        let rect_width = x2 - x1 + 1;
        let rect_height = y2 - y1 + 1;

        // Base case: too small to trace a border around.
        if rect_width <= 2 || rect_height <= 2 {
            for py in y1..=y2 {
                for px in x1..=x2 {
                    self.fill_point(map, field, px, py);
                }
            }
            return;
        }

        let mut border_value: Option<u32> = None;
        let mut all_same = true;

        // Top and bottom edges.
        for px in x1..=x2 {
            for &py in &[y1, y2] {
                self.fill_point(map, field, px, py);
                let v = field.get(px, py);
                match border_value {
                    None => border_value = Some(v),
                    Some(b) => {
                        if v != b {
                            all_same = false;
                        }
                    }
                }
            }
        }

        // Left and right edges, skipping the corners already done.
        for py in (y1 + 1)..y2 {
            for &px in &[x1, x2] {
                self.fill_point(map, field, px, py);
                if Some(field.get(px, py)) != border_value {
                    all_same = false;
                }
            }
        }

        // A uniform border almost always means a uniform interior, so
        // fill it without computing it.  "Almost": an island of the
        // set inside the rectangle gets painted over.  Accepted.
        if all_same {
            if let Some(v) = border_value {
                for py in (y1 + 1)..y2 {
                    for px in (x1 + 1)..x2 {
                        field.set(px, py, v);
                    }
                }
                return;
            }
        }

        let mid_x = (x1 + x2) / 2;
        let mid_y = (y1 + y2) / 2;

        self.fill_rectangle(map, field, x1, y1, mid_x, mid_y);
        self.fill_rectangle(map, field, mid_x, y1, x2, mid_y);
        self.fill_rectangle(map, field, x1, mid_y, mid_x, y2);
        self.fill_rectangle(map, field, mid_x, mid_y, x2, y2);
    }

    /// Compute a single pixel if it is still the zero sentinel.
    fn fill_point(&self, map: &PlaneMapper, field: &mut EscapeField, px: usize, py: usize) {
        if field.get(px, py) == 0 {
            let c = map.pixel_to_point(&Pixel(px, py));
            field.set(px, py, self.escape_time(c));
        }
    }

    /// Escape count for a single complex point under the current
    /// iteration cap.
    ///
    /// Two closed-form membership tests run first: points inside the
    /// main cardioid or the period-2 bulb never escape, and those two
    /// regions are most of the set's area, so skipping the iteration
    /// there is a large win at whole-set zoom levels.  Everything
    /// else iterates z ← z² + c until |z|² exceeds 4.
    ///
    /// An escaped count is refined with the normalized iteration
    /// count ("smooth coloring") before truncation, which only
    /// decides which of two adjacent bands a near-boundary pixel
    /// falls into; no fractional value is stored.  If the logarithms
    /// go non-finite at the boundary, the raw count stands.
    pub fn escape_time(&self, c: Complex<f64>) -> u32 {
        let max = self.viewport.max_iterations;

        // Main cardioid.
        let q = (c.re - 0.25) * (c.re - 0.25) + c.im * c.im;
        if q * (q + (c.re - 0.25)) <= 0.25 * c.im * c.im {
            return max;
        }

        // Period-2 bulb.
        if (c.re + 1.0) * (c.re + 1.0) + c.im * c.im <= 0.0625 {
            return max;
        }

        let mut z: Complex<f64> = Complex { re: 0.0, im: 0.0 };
        let mut iteration = 0;
        while z.norm_sqr() <= 4.0 && iteration < max {
            z = z * z + c;
            iteration += 1;
        }

        if iteration < max {
            let log_zn = z.norm_sqr().ln() / 2.0;
            let nu = (log_zn / LN_2).ln() / LN_2;
            let smoothed = (iteration as f64) + 1.0 - nu;
            if smoothed.is_finite() {
                iteration = clamp(smoothed, 0.0, max as f64) as u32;
            }
        }

        iteration
    }

    /// Shift the viewport center.  Deltas are in normalized viewport
    /// units, roughly [-1, 1] across the screen, so a drag gesture
    /// can pass its pixel delta divided by the surface size and the
    /// view tracks the finger at any zoom.
    pub fn pan(&mut self, delta_x: f64, delta_y: f64) {
        let aspect = (self.width as f64) / (self.height as f64);
        let range_y = 2.0 / self.viewport.zoom;
        let range_x = range_y * aspect;

        self.viewport.center_x += delta_x * range_x;
        self.viewport.center_y += delta_y * range_y;
    }

    /// Multiply the zoom.  Factors above 1 zoom in, below 1 zoom out.
    pub fn adjust_zoom(&mut self, factor: f64) -> Result<(), EngineError> {
        if !(factor > 0.0) || !factor.is_finite() {
            return Err(EngineError::BadZoomFactor(factor));
        }
        self.viewport.zoom *= factor;
        Ok(())
    }

    /// Re-center on the complex point currently under pixel
    /// `(px, py)`, then multiply the zoom.  The pixel is mapped with
    /// the viewport as it stands, before the zoom changes, so the
    /// tapped feature ends up centered.  Out-of-range pixels clamp to
    /// the grid edge rather than erroring; gesture coordinates are
    /// not trustworthy enough to be a contract.
    pub fn zoom_to(&mut self, px: usize, py: usize, factor: f64) -> Result<(), EngineError> {
        if !(factor > 0.0) || !factor.is_finite() {
            return Err(EngineError::BadZoomFactor(factor));
        }
        let map = PlaneMapper::new(self.width, self.height, &self.viewport)?;
        let point = map.pixel_to_point(&map.clamp_pixel(px, py));

        self.viewport.center_x = point.re;
        self.viewport.center_y = point.im;
        self.viewport.zoom *= factor;
        Ok(())
    }

    /// Restore the default whole-set framing.  The iteration cap is
    /// left alone; resetting the view should not throw away a cap the
    /// user dialed in.
    pub fn reset(&mut self) {
        let cap = self.viewport.max_iterations;
        self.viewport = Viewport::default();
        self.viewport.max_iterations = cap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    /// The optimization-free reference path: every pixel computed
    /// directly through the same mapper.  Uniform-fill and this must
    /// agree wherever the interior really is uniform.
    fn compute_direct(engine: &FieldEngine) -> EscapeField {
        let map = PlaneMapper::new(engine.width, engine.height, &engine.viewport).unwrap();
        let mut field = EscapeField::new(engine.width, engine.height);
        for py in 0..engine.height {
            for px in 0..engine.width {
                let c = map.pixel_to_point(&Pixel(px, py));
                field.set(px, py, engine.escape_time(c));
            }
        }
        field
    }

    /// Plain escape iteration with no shortcuts and no smoothing,
    /// for cross-checking the closed-form membership tests.
    fn naive_iterate(c: Complex<f64>, limit: u32) -> u32 {
        let mut z: Complex<f64> = Complex { re: 0.0, im: 0.0 };
        for i in 0..limit {
            z = z * z + c;
            if z.norm_sqr() > 4.0 {
                return i;
            }
        }
        limit
    }

    fn engine_with(view: Viewport, width: usize, height: usize) -> FieldEngine {
        let mut engine = FieldEngine::new(width, height).unwrap();
        engine.set_viewport(view);
        engine
    }

    #[test]
    fn whole_set_scenario_terminates_with_expected_shape() {
        let view = Viewport {
            center_x: -0.5,
            center_y: 0.0,
            zoom: 0.6,
            max_iterations: 50,
        };
        let engine = engine_with(view, 4, 4);
        let field = engine.compute().unwrap();

        // Pixel (2, 2) maps to the center, inside the main cardioid.
        assert_eq!(field.get(2, 2), 50);
        // The corners are far outside the set and escape immediately.
        for &(px, py) in &[(0, 0), (3, 0), (0, 3), (3, 3)] {
            assert!(
                field.get(px, py) < 10,
                "corner ({}, {}) escaped at {}",
                px,
                py,
                field.get(px, py)
            );
        }
    }

    #[test]
    fn every_cell_is_bounded_by_the_cap() {
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..20 {
            let view = Viewport {
                center_x: rng.gen_range(-2.0, 2.0),
                center_y: rng.gen_range(-2.0, 2.0),
                zoom: rng.gen_range(0.1, 100.0),
                max_iterations: 64,
            };
            let engine = engine_with(view, 8, 8);
            let field = engine.compute().unwrap();
            assert!(field.cells().iter().all(|&v| v <= 64));
        }
    }

    #[test]
    fn closed_form_shortcuts_agree_with_iteration() {
        let engine = FieldEngine::new(4, 4).unwrap();
        let max = engine.viewport().max_iterations;
        // Inside the cardioid: the origin and the cusp; inside the
        // bulb: its center and a point near its edge.
        let members = [
            Complex::new(0.0, 0.0),
            Complex::new(0.25, 0.0),
            Complex::new(-0.1, 0.1),
            Complex::new(-1.0, 0.0),
            Complex::new(-1.2, 0.0),
        ];
        for &c in &members {
            assert_eq!(engine.escape_time(c), max, "shortcut missed {}", c);
            // Run far past the engine's cap: still never escapes.
            assert_eq!(naive_iterate(c, 20_000), 20_000, "iteration escaped {}", c);
        }
    }

    #[test]
    fn escape_time_matches_naive_iteration_outside_the_set() {
        let engine = FieldEngine::new(4, 4).unwrap();
        let max = engine.viewport().max_iterations;
        // Well outside: smoothing may shift the count by a band or
        // so, but both paths must agree the point escapes.
        for &c in &[
            Complex::new(1.0, 1.0),
            Complex::new(-2.5, 0.1),
            Complex::new(0.5, 0.5),
        ] {
            let smooth = engine.escape_time(c);
            let raw = naive_iterate(c, max);
            assert!(smooth < max);
            assert!(raw < max);
            assert!(
                (i64::from(smooth) - i64::from(raw)).abs() <= 2,
                "smooth {} vs raw {} for {}",
                smooth,
                raw,
                c
            );
        }
    }

    #[test]
    fn uniform_interior_matches_the_direct_path() {
        // Deep inside the cardioid: everything is at the cap, the
        // border is uniform, and the fill must agree with computing
        // every pixel.
        let inside = Viewport {
            center_x: -0.5,
            center_y: 0.0,
            zoom: 50.0,
            max_iterations: 64,
        };
        let engine = engine_with(inside, 16, 16);
        let optimized = engine.compute().unwrap();
        assert_eq!(optimized, compute_direct(&engine));
        assert!(optimized.cells().iter().all(|&v| v == 64));

        // Far outside the set: every orbit escapes on the first
        // iteration and smoothing truncates everything to zero, so
        // the region is uniform in the other direction.
        let outside = Viewport {
            center_x: 10.0,
            center_y: 10.0,
            zoom: 1.0,
            max_iterations: 64,
        };
        let engine = engine_with(outside, 16, 16);
        let optimized = engine.compute().unwrap();
        assert_eq!(optimized, compute_direct(&engine));
        assert!(optimized.cells().iter().all(|&v| v == 0));
    }

    #[test]
    fn reset_then_compute_matches_a_fresh_engine() {
        let mut engine = FieldEngine::new(8, 8).unwrap();
        engine.pan(0.7, -0.3);
        engine.adjust_zoom(12.0).unwrap();
        engine.zoom_to(1, 6, 3.0).unwrap();
        engine.reset();

        let fresh = FieldEngine::new(8, 8).unwrap();
        assert_eq!(engine.viewport(), fresh.viewport());
        assert_eq!(engine.compute().unwrap(), fresh.compute().unwrap());
    }

    #[test]
    fn pan_round_trip_restores_the_center() {
        let mut engine = FieldEngine::new(8, 6).unwrap();
        let before = engine.viewport();
        engine.pan(0.3, -0.2);
        engine.pan(-0.3, 0.2);
        let after = engine.viewport();
        assert!(close(before.center_x, after.center_x));
        assert!(close(before.center_y, after.center_y));
    }

    #[test]
    fn pan_scales_with_the_aspect_aware_range() {
        let mut engine = FieldEngine::new(800, 600).unwrap();
        let before = engine.viewport();
        engine.pan(1.0, 1.0);
        let after = engine.viewport();
        let range_y = 2.0 / before.zoom;
        let range_x = range_y * (800.0 / 600.0);
        assert!(close(after.center_x - before.center_x, range_x));
        assert!(close(after.center_y - before.center_y, range_y));
    }

    #[test]
    fn zoom_to_with_unit_factor_moves_center_only() {
        let mut engine = FieldEngine::new(8, 6).unwrap();
        let map = PlaneMapper::new(8, 6, &engine.viewport()).unwrap();
        let expected = map.pixel_to_point(&Pixel(2, 5));

        engine.zoom_to(2, 5, 1.0).unwrap();
        let view = engine.viewport();
        assert!(close(view.zoom, 0.6));
        assert!(close(view.center_x, expected.re));
        assert!(close(view.center_y, expected.im));
    }

    #[test]
    fn zoom_to_clamps_wild_pixels() {
        let mut tapped = FieldEngine::new(8, 6).unwrap();
        tapped.zoom_to(999, 999, 2.0).unwrap();

        let mut cornered = FieldEngine::new(8, 6).unwrap();
        cornered.zoom_to(7, 5, 2.0).unwrap();

        assert_eq!(tapped.viewport(), cornered.viewport());
    }

    #[test]
    fn invalid_geometry_fails_fast() {
        assert_eq!(
            FieldEngine::new(0, 8).unwrap_err(),
            EngineError::EmptyPlane
        );

        let mut engine = FieldEngine::new(8, 8).unwrap();
        let mut view = engine.viewport();
        view.zoom = 0.0;
        engine.set_viewport(view);
        assert_eq!(engine.compute().unwrap_err(), EngineError::BadZoom(0.0));

        let mut view = Viewport::default();
        view.max_iterations = 0;
        engine.set_viewport(view);
        assert_eq!(
            engine.compute().unwrap_err(),
            EngineError::BadIterationCap
        );

        let mut engine = FieldEngine::new(8, 8).unwrap();
        assert!(engine.adjust_zoom(0.0).is_err());
        assert!(engine.adjust_zoom(-2.0).is_err());
        assert!(engine.zoom_to(1, 1, 0.0).is_err());
    }
}
