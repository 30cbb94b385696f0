extern crate clap;
extern crate crossbeam;
extern crate env_logger;
extern crate image;
extern crate mandelbrot;
extern crate num_cpus;
#[macro_use]
extern crate log;

use clap::{App, Arg, ArgMatches};
use image::ColorType;
use mandelbrot::{apply_palette, FieldEngine, Palette, Viewport, PHASE_PERIOD};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Instant;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn validate_positive(s: &str, err: &str) -> Result<(), String> {
    match f64::from_str(s) {
        Ok(f) if f > 0.0 && f.is_finite() => Ok(()),
        _ => Err(err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const CENTER: &str = "center";
const ZOOM: &str = "zoom";
const ITERATIONS: &str = "iterations";
const PALETTE: &str = "palette";
const PHASE: &str = "phase";
const FRAMES: &str = "frames";
const THREADS: &str = "threads";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("mandel")
        .version("0.1.0")
        .about("Interactive Mandelbrot explorer core, batch front end")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output image file, e.g. mandel.png"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("800x600")
                .validator(|s| validate_pair::<usize>(&s, 'x', "Could not parse image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(CENTER)
                .required(false)
                .long(CENTER)
                .short("c")
                .takes_value(true)
                .default_value("-0.5,0.0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse viewport center"))
                .help("Center of the viewport on the complex plane"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .required(false)
                .long(ZOOM)
                .short("z")
                .takes_value(true)
                .default_value("0.6")
                .validator(|s| validate_positive(&s, "Zoom must be a positive number"))
                .help("Magnification; the viewport is 2/zoom units tall"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("256")
                .validator(move |s| {
                    validate_range::<u32>(
                        &s,
                        1,
                        1_000_000,
                        "Could not parse iteration cap",
                        "Iteration cap must be between 1 and 1000000",
                    )
                })
                .help("Escape iteration cap"),
        )
        .arg(
            Arg::with_name(PALETTE)
                .required(false)
                .long(PALETTE)
                .short("p")
                .takes_value(true)
                .default_value("rainbow")
                .help(
                    "Palette: classic, fire, ocean, rainbow, psychedelic, \
                     grayscale (unknown names fall back to rainbow)",
                ),
        )
        .arg(
            Arg::with_name(PHASE)
                .required(false)
                .long(PHASE)
                .takes_value(true)
                .default_value("0.0")
                .validator(|s| match f64::from_str(&s) {
                    Ok(_) => Ok(()),
                    Err(_) => Err("Could not parse palette phase".to_string()),
                })
                .help("Starting palette rotation phase"),
        )
        .arg(
            Arg::with_name(FRAMES)
                .required(false)
                .long(FRAMES)
                .short("f")
                .takes_value(true)
                .default_value("1")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        100_000,
                        "Could not parse frame count",
                        "Frame count must be between 1 and 100000",
                    )
                })
                .help(
                    "Number of frames to write, advancing the palette \
                     through one full rotation across the sequence",
                ),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value("1")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads mapping animation frames"),
        )
        .get_matches()
}

fn write_image(path: &Path, pixels: &[u8], bounds: (usize, usize)) -> std::io::Result<()> {
    image::save_buffer(
        path,
        pixels,
        bounds.0 as u32,
        bounds.1 as u32,
        ColorType::RGB(8),
    )
}

/// Frame n of "anim.png" is written as "anim_0000.png" and so on.
fn frame_path(base: &Path, frame: usize) -> PathBuf {
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("frame");
    let ext = base.extension().and_then(|s| s.to_str()).unwrap_or("png");
    base.with_file_name(format!("{}_{:04}.{}", stem, frame, ext))
}

fn main() {
    env_logger::init();
    let matches = args();

    let (width, height) = parse_pair::<usize>(matches.value_of(SIZE).unwrap(), 'x')
        .expect("Error parsing image dimensions");
    let (center_x, center_y) = parse_pair::<f64>(matches.value_of(CENTER).unwrap(), ',')
        .expect("Error parsing viewport center");
    let zoom = f64::from_str(matches.value_of(ZOOM).unwrap()).expect("Could not parse zoom");
    let max_iterations = u32::from_str(matches.value_of(ITERATIONS).unwrap())
        .expect("Could not parse iteration cap");
    let palette = Palette::from_name(matches.value_of(PALETTE).unwrap());
    let phase = f64::from_str(matches.value_of(PHASE).unwrap()).expect("Could not parse phase");
    let frames =
        usize::from_str(matches.value_of(FRAMES).unwrap()).expect("Could not parse frame count");
    let threads =
        usize::from_str(matches.value_of(THREADS).unwrap()).expect("Could not parse thread count");
    let output = Path::new(matches.value_of(OUTPUT).unwrap());

    let mut engine = match FieldEngine::new(width, height) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Bad geometry: {}", e);
            std::process::exit(1);
        }
    };
    engine.set_viewport(Viewport {
        center_x,
        center_y,
        zoom,
        max_iterations,
    });

    info!(
        "computing {}x{} escape field at ({}, {}) zoom {} cap {}",
        width, height, center_x, center_y, zoom, max_iterations
    );
    let started = Instant::now();
    let field = match engine.compute() {
        Ok(field) => field,
        Err(e) => {
            eprintln!("Compute failure: {}", e);
            std::process::exit(1);
        }
    };
    debug!("escape field ready in {:?}", started.elapsed());

    if frames <= 1 {
        let colors = apply_palette(&field, max_iterations, palette, phase);
        if let Err(e) = write_image(output, &colors.to_raw(), (width, height)) {
            eprintln!("Could not write {}: {}", output.display(), e);
            std::process::exit(1);
        }
        return;
    }

    // Animation mode: the field is computed once, and each frame is
    // just a palette pass at the next phase step, so frames can be
    // mapped on as many threads as we have.  One PHASE_PERIOD across
    // the whole sequence makes it loop seamlessly.
    let step = PHASE_PERIOD / (frames as f64);
    let queue = Arc::new(Mutex::new(0..frames));
    let field = &field;

    crossbeam::scope(|spawner| {
        for _ in 0..threads {
            let queue = queue.clone();
            spawner.spawn(move |_| loop {
                let frame = { queue.lock().unwrap().next() };
                match frame {
                    Some(n) => {
                        let colors = apply_palette(
                            field,
                            max_iterations,
                            palette,
                            phase + (n as f64) * step,
                        );
                        let path = frame_path(output, n);
                        write_image(&path, &colors.to_raw(), (width, height))
                            .unwrap_or_else(|e| {
                                panic!("Could not write {}: {}", path.display(), e)
                            });
                        debug!("wrote {}", path.display());
                    }
                    None => {
                        break;
                    }
                }
            });
        }
    })
    .unwrap();
    info!("wrote {} frames in {:?}", frames, started.elapsed());
}
