//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and a window on the complex plane.  Unlike a renderer that takes
//! two explicit corners, an interactive explorer describes its window
//! with a Viewport: a center point and a zoom.  The zoom fixes the
//! height of the window at 2/zoom, and the width follows from the
//! aspect ratio of the pixel grid, so a square pixel stays square no
//! matter what shape the screen is.
//!
//! Every consumer of the grid must go through the same mapper.  The
//! border-tracing optimization fills some pixels directly and infers
//! others, and if the two paths disagreed about where a pixel lands on
//! the complex plane the seams would be visible.

use num::Complex;

use EngineError;

/// The window onto the complex plane that the engine renders, plus
/// the iteration cap that goes with it.  This is the whole of the
/// state a bookmark needs to capture: snapshot it with
/// `FieldEngine::viewport`, restore it with `set_viewport`, and the
/// engine never has to know what a bookmark is.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Real coordinate of the center of the window.
    pub center_x: f64,
    /// Imaginary coordinate of the center of the window.
    pub center_y: f64,
    /// Magnification.  The window is 2/zoom units of the complex
    /// plane tall; larger means closer.  Must be a positive real.
    pub zoom: f64,
    /// Escape cap.  A point that survives this many iterations is
    /// treated as inside the set.  Must be at least 1.
    pub max_iterations: u32,
}

impl Default for Viewport {
    /// The classic framing: the whole set comfortably in view,
    /// centered on the real axis between the cardioid and the bulb.
    fn default() -> Viewport {
        Viewport {
            center_x: -0.5,
            center_y: 0.0,
            zoom: 0.6,
            max_iterations: 256,
        }
    }
}

/// Describes the width and height of an integral plane that is
/// assumed to start at 0,0; all values are assumed to be non-negative
/// integers.
#[derive(Copy, Clone, Debug)]
pub struct IntegralPlane(pub usize, pub usize);

/// Describes the lower-left corner and upper-right corner of the
/// window on the complex plane, treating the real part of each value
/// as the x-component and the imaginary part as the y-component.
#[derive(Copy, Clone, Debug)]
pub struct ComplexPlane(pub Complex<f64>, pub Complex<f64>);

/// Describes the x, y of a point in the pixel grid.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Contains the definitions of two planes: an integral cartesian
/// plane, and the complex-plane window a viewport describes.  Maps
/// pixels to complex points.  Built fresh at the top of every compute
/// pass (and by `zoom_to`), so it always reflects the viewport as it
/// was when the frame started.
#[derive(Debug)]
pub struct PlaneMapper {
    /// The right-upper corner of the integral cartesian plane.  The
    /// left-lower is assumed to be at 0,0.
    pub integral_plane: IntegralPlane,
    /// The two corners of the complex-plane window, left-lower and
    /// right-upper.
    pub complex_plane: ComplexPlane,
}

impl PlaneMapper {
    /// Constructor.  Takes the pixel grid dimensions and the viewport
    /// describing the window.  Rejects empty grids and non-positive
    /// zooms; a viewport restored from stale persisted data gets
    /// caught here rather than producing NaN geometry.
    pub fn new(width: usize, height: usize, view: &Viewport) -> Result<PlaneMapper, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::EmptyPlane);
        }
        // Written with the negation so that a NaN zoom fails too.
        if !(view.zoom > 0.0) || !view.zoom.is_finite() {
            return Err(EngineError::BadZoom(view.zoom));
        }

        let aspect = (width as f64) / (height as f64);
        let range_y = 2.0 / view.zoom;
        let range_x = range_y * aspect;

        let leftlower = Complex::new(
            view.center_x - range_x / 2.0,
            view.center_y - range_y / 2.0,
        );
        let rightupper = Complex::new(
            view.center_x + range_x / 2.0,
            view.center_y + range_y / 2.0,
        );

        Ok(PlaneMapper {
            integral_plane: IntegralPlane(width, height),
            complex_plane: ComplexPlane(leftlower, rightupper),
        })
    }

    /// The total number of points in the integral grid.  Used to
    /// calculate memory needs.
    pub fn len(&self) -> usize {
        self.integral_plane.0 * self.integral_plane.1
    }

    /// Describes that the integral plane is of a size.
    pub fn is_empty(&self) -> bool {
        self.integral_plane.0 == 0 || self.integral_plane.1 == 0
    }

    /// Given a pixel on the integral cartesian plane, map it to the
    /// point on the complex plane that the escape iteration should
    /// start from.  The divisor is the full grid extent, not extent
    /// minus one, so pixel 0 sits on the left edge of the window and
    /// the right edge falls just past the last pixel.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        let ll = self.complex_plane.0;
        let ru = self.complex_plane.1;
        Complex::new(
            ll.re + ((pixel.0 as f64) / (self.integral_plane.0 as f64)) * (ru.re - ll.re),
            ll.im + ((pixel.1 as f64) / (self.integral_plane.1 as f64)) * (ru.im - ll.im),
        )
    }

    /// Clamp a possibly out-of-range pixel coordinate onto the grid.
    /// Gesture input is imprecise; a tap half off the screen should
    /// zoom toward the nearest edge, not error out.
    pub fn clamp_pixel(&self, px: usize, py: usize) -> Pixel {
        Pixel(
            px.min(self.integral_plane.0 - 1),
            py.min(self.integral_plane.1 - 1),
        )
    }
}
