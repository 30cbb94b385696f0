//! Turns escape counts into colors.
//!
//! Fractint-style palette rotation: the escape count is offset by a
//! phase, wrapped onto a fixed 256-entry ramp, and normalized to a
//! position t in [0, 1) on one of a handful of color ramps.
//! Advancing the phase slides every band along the ramp, which is how
//! the animated "rotating colors" effect works without ever touching
//! the escape field.  Mapping is pure and cheap; an animation loop
//! calls it tens of times a second against one computed field.
//!
//! Points at the iteration cap are inside the set and are always
//! painted black, whatever the palette or phase says.

use itertools::iproduct;
use num::clamp;
use std::f64::consts::PI;

use engine::EscapeField;

/// The phase distance after which the rotation returns to its
/// starting colors: t is built from `value + phase * 50` wrapped mod
/// 256, so one full turn is 256/50.  Animation loops that want a
/// seamless cycle advance the phase through exactly this much.
pub const PHASE_PERIOD: f64 = 256.0 / 50.0;

/// The closed set of palettes.  Selection usually arrives as a string
/// from persisted settings or a bookmark; see [`Palette::from_name`]
/// for the leniency contract.
///
/// [`Palette::from_name`]: #method.from_name
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Palette {
    /// Three phase-shifted sine waves, the traditional look.
    Classic,
    /// Black through red and orange into white-hot.
    Fire,
    /// Deep blue floor shading toward green and white.
    Ocean,
    /// A full HSV hue sweep.
    Rainbow,
    /// Three sine waves at clashing frequencies.
    Psychedelic,
    /// Plain luminance ramp.
    Grayscale,
}

impl Palette {
    /// Case-insensitive lookup by name.  Unknown names fall back to
    /// Rainbow instead of erroring: palette names come from
    /// user-controlled, possibly stale persisted data, and a renamed
    /// palette must not brick a saved bookmark.
    pub fn from_name(name: &str) -> Palette {
        match name.to_ascii_lowercase().as_str() {
            "classic" => Palette::Classic,
            "fire" => Palette::Fire,
            "ocean" => Palette::Ocean,
            "rainbow" => Palette::Rainbow,
            "psychedelic" => Palette::Psychedelic,
            "grayscale" => Palette::Grayscale,
            _ => Palette::Rainbow,
        }
    }

    /// The canonical name, the one `from_name` round-trips.  This is
    /// what a persistence layer should store.
    pub fn name(&self) -> &'static str {
        match *self {
            Palette::Classic => "classic",
            Palette::Fire => "fire",
            Palette::Ocean => "ocean",
            Palette::Rainbow => "rainbow",
            Palette::Psychedelic => "psychedelic",
            Palette::Grayscale => "grayscale",
        }
    }
}

/// An 8-bit RGB triple.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// A grid of colors the same shape as the escape field it was mapped
/// from.  Stateless and disposable; the next phase tick just builds a
/// new one.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorField {
    width: usize,
    height: usize,
    cells: Vec<Rgb>,
}

impl ColorField {
    /// Width of the grid in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the grid in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The color at a pixel.
    pub fn get(&self, px: usize, py: usize) -> Rgb {
        self.cells[py * self.width + px]
    }

    /// The grid flattened to row-major R, G, B bytes, the layout
    /// image encoders want.
    pub fn to_raw(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(self.cells.len() * 3);
        for rgb in &self.cells {
            raw.push(rgb.0);
            raw.push(rgb.1);
            raw.push(rgb.2);
        }
        raw
    }
}

/// Map an escape field to colors.  Deterministic in its arguments and
/// entirely stateless: same field, cap, palette, and phase, same
/// colors.
pub fn apply_palette(
    field: &EscapeField,
    max_iterations: u32,
    palette: Palette,
    phase: f64,
) -> ColorField {
    let width = field.width();
    let height = field.height();
    let cells = iproduct!(0..height, 0..width)
        .map(|(py, px)| color_for(field.get(px, py), max_iterations, palette, phase))
        .collect();
    ColorField {
        width,
        height,
        cells,
    }
}

fn color_for(value: u32, max_iterations: u32, palette: Palette, phase: f64) -> Rgb {
    // Inside the set: black, always.
    if value >= max_iterations {
        return Rgb(0, 0, 0);
    }

    // Euclidean remainder so a negative phase cannot drag t below 0.
    let t = (f64::from(value) + phase * 50.0).rem_euclid(256.0) / 255.0;

    let (r, g, b) = match palette {
        Palette::Classic => classic(t),
        Palette::Fire => fire(t),
        Palette::Ocean => ocean(t),
        Palette::Rainbow => rainbow(t),
        Palette::Psychedelic => psychedelic(t),
        Palette::Grayscale => (t, t, t),
    };

    Rgb(channel(r), channel(g), channel(b))
}

fn channel(v: f64) -> u8 {
    (clamp(v, 0.0, 1.0) * 255.0) as u8
}

fn classic(t: f64) -> (f64, f64, f64) {
    (
        ((t * 2.0 * PI).sin() + 1.0) / 2.0,
        ((t * 2.0 * PI + 2.0 * PI / 3.0).sin() + 1.0) / 2.0,
        ((t * 2.0 * PI + 4.0 * PI / 3.0).sin() + 1.0) / 2.0,
    )
}

fn fire(t: f64) -> (f64, f64, f64) {
    (t, (t - 0.3).max(0.0) * 1.5, (t - 0.7).max(0.0) * 3.0)
}

fn ocean(t: f64) -> (f64, f64, f64) {
    (t * 0.3, t * 0.8, 0.3 + t * 0.7)
}

fn rainbow(t: f64) -> (f64, f64, f64) {
    hsv_to_rgb((t * 360.0) % 360.0, 1.0, 1.0)
}

fn psychedelic(t: f64) -> (f64, f64, f64) {
    (
        ((t * 6.0 * PI).sin() + 1.0) / 2.0,
        ((t * 8.0 * PI + 1.0).sin() + 1.0) / 2.0,
        ((t * 10.0 * PI + 2.0).sin() + 1.0) / 2.0,
    )
}

/// Standard HSV to RGB, hue in degrees, saturation and value in
/// [0, 1].
fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> (f64, f64, f64) {
    let c = value * saturation;
    let hp = hue / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = value - c;
    (r + m, g + m, b + m)
}
