#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Interactive Mandelbrot set explorer core
//!
//! The Mandelbrot set lives on the complex plane: take a point c,
//! repeatedly square-and-add it (z ← z² + c), and count how many
//! iterations pass before the orbit flies off to infinity.  Points
//! whose orbits never escape are inside the set; everyone else gets
//! colored by how fast they left.  This crate owns the two stages of
//! that picture.  The `FieldEngine` maps a pixel grid onto a window
//! of the complex plane (the viewport: a center, a zoom, an iteration
//! cap) and produces a grid of escape counts, using the classic
//! border-tracing trick: if every pixel on a rectangle's border
//! escaped at the same count, the interior almost certainly did too,
//! so we fill it without computing it.  `apply_palette` then turns
//! escape counts into colors, with a rotation phase so the bands can
//! be animated without recomputing anything.
//!
//! The interactive surface, gesture handling, and bookmark storage are
//! somebody else's problem; they drive the viewport through the
//! `FieldEngine` mutation API and blit the `ColorField` we hand back.

#[macro_use]
extern crate failure;
extern crate itertools;
extern crate num;

#[cfg(test)]
extern crate rand;

pub mod engine;
pub mod palette;
pub mod planes;

pub use engine::{EscapeField, FieldEngine};
pub use palette::{apply_palette, ColorField, Palette, Rgb, PHASE_PERIOD};
pub use planes::{Pixel, PlaneMapper, Viewport};

/// The ways a caller can hand the engine geometry it refuses to work
/// with.  These are contract violations, not recoverable conditions:
/// the engine fails fast rather than render garbage.
#[derive(Debug, Fail, PartialEq)]
pub enum EngineError {
    /// The pixel grid has a zero dimension.
    #[fail(display = "pixel grid must have nonzero width and height")]
    EmptyPlane,

    /// The viewport zoom is zero, negative, or not a number.  A zoom
    /// of z means the window is 2/z units tall, so anything that is
    /// not a positive real produces undefined geometry.
    #[fail(display = "zoom must be a positive number, got {}", _0)]
    BadZoom(f64),

    /// The iteration cap is zero; every point would trivially be
    /// "inside the set" and the escape grid would be meaningless.
    #[fail(display = "iteration cap must be at least 1")]
    BadIterationCap,

    /// A zoom factor passed to `adjust_zoom` or `zoom_to` was not a
    /// positive real.
    #[fail(display = "zoom factor must be a positive number, got {}", _0)]
    BadZoomFactor(f64),
}
