use std::f64::consts::PI;

use rand::SeedableRng as _;

use crate::{config::Variant, core::Dimensions};

/// Side of one grid cell in pixels.
pub const GRID_CELL_PX: f64 = 30.0;
/// Container area that yields one dot before intensity scaling.
pub const DOT_AREA_PER_PARTICLE: f64 = 10_000.0;
pub const WAVE_COUNT: usize = 3;

/// Uniform random numbers in `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

/// Adapts any `rand` generator to [`RandomSource`].
#[derive(Debug)]
pub struct RngSource<R>(pub R);

impl<R: rand::Rng> RandomSource for RngSource<R> {
    fn next_unit(&mut self) -> f64 {
        self.0.random::<f64>()
    }
}

impl RngSource<rand::rngs::ThreadRng> {
    pub fn thread() -> Self {
        Self(rand::rng())
    }
}

impl RngSource<rand::rngs::StdRng> {
    /// Reproducible dots for offline rendering.
    pub fn seeded(seed: u64) -> Self {
        Self(rand::rngs::StdRng::seed_from_u64(seed))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridPoint {
    pub x: f64,
    pub y: f64,
    pub original_x: f64,
    pub original_y: f64,
    pub size: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dot {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub vx: f64,
    pub vy: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wave {
    pub amplitude: f64,
    pub wavelength: f64,
    pub speed: f64,
    pub phase: f64,
}

/// The animated entities of one engine instance.
///
/// Replaced wholesale on regeneration; frames only mutate positions and velocities.
#[derive(Clone, Debug, PartialEq)]
pub enum ParticleSet {
    Grid(Vec<GridPoint>),
    Dots(Vec<Dot>),
    Waves(Vec<Wave>),
}

impl ParticleSet {
    pub fn empty(variant: Variant) -> Self {
        match variant {
            Variant::Grid => Self::Grid(Vec::new()),
            Variant::Dots => Self::Dots(Vec::new()),
            Variant::Waves => Self::Waves(Vec::new()),
        }
    }

    pub fn variant(&self) -> Variant {
        match self {
            Self::Grid(_) => Variant::Grid,
            Self::Dots(_) => Variant::Dots,
            Self::Waves(_) => Variant::Waves,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Grid(v) => v.len(),
            Self::Dots(v) => v.len(),
            Self::Waves(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn grid_point_count(dims: Dimensions) -> usize {
    let (cols, rows) = grid_shape(dims);
    cols * rows
}

/// `floor(area / 10000) * factor`; a fractional product rounds up.
pub fn dot_count(dims: Dimensions, intensity_factor: f64) -> usize {
    let base = (dims.area() as f64 / DOT_AREA_PER_PARTICLE).floor();
    let scaled = base * intensity_factor.clamp(0.0, 1.0);
    // 10 * 0.3 is 3.0000000000000004 in binary floating point.
    (scaled - 1e-9).ceil().max(0.0) as usize
}

/// Builds a fresh particle set. Only [`Variant::Dots`] consumes randomness.
#[tracing::instrument(level = "debug", skip(rng))]
pub fn generate(
    variant: Variant,
    dims: Dimensions,
    intensity_factor: f64,
    rng: &mut dyn RandomSource,
) -> ParticleSet {
    if !dims.is_drawable() {
        return ParticleSet::empty(variant);
    }

    let set = match variant {
        Variant::Grid => ParticleSet::Grid(generate_grid(dims)),
        Variant::Dots => ParticleSet::Dots(generate_dots(dims, intensity_factor, rng)),
        Variant::Waves => ParticleSet::Waves(generate_waves(dims)),
    };
    tracing::debug!(count = set.len(), "generated particles");
    set
}

fn grid_shape(dims: Dimensions) -> (usize, usize) {
    let cols = (dims.width_f64() / GRID_CELL_PX).ceil() as usize;
    let rows = (dims.height_f64() / GRID_CELL_PX).ceil() as usize;
    (cols, rows)
}

fn generate_grid(dims: Dimensions) -> Vec<GridPoint> {
    let (cols, rows) = grid_shape(dims);
    let mut out = Vec::with_capacity(cols * rows);
    for ix in 0..cols {
        for iy in 0..rows {
            let x = ix as f64 * GRID_CELL_PX;
            let y = iy as f64 * GRID_CELL_PX;
            out.push(GridPoint {
                x,
                y,
                original_x: x,
                original_y: y,
                size: 1.0,
            });
        }
    }
    out
}

fn generate_dots(dims: Dimensions, intensity_factor: f64, rng: &mut dyn RandomSource) -> Vec<Dot> {
    let n = dot_count(dims, intensity_factor);
    let (w, h) = (dims.width_f64(), dims.height_f64());
    (0..n)
        .map(|_| Dot {
            x: scaled_below(rng.next_unit(), w),
            y: scaled_below(rng.next_unit(), h),
            size: rng.next_unit() * 2.0 + 1.0,
            vx: (rng.next_unit() - 0.5) * 0.5,
            vy: (rng.next_unit() - 0.5) * 0.5,
        })
        .collect()
}

fn generate_waves(dims: Dimensions) -> Vec<Wave> {
    let wave_height = dims.height_f64() / 10.0;
    let wave_length = dims.width_f64() / 2.0;
    (0..WAVE_COUNT)
        .map(|i| {
            let i = i as f64;
            Wave {
                amplitude: wave_height * (1.0 - i * 0.2),
                wavelength: wave_length * (1.0 + i * 0.3),
                speed: 0.02 * (1.0 + i * 0.1),
                phase: i * PI / 2.0,
            }
        })
        .collect()
}

/// `unit * extent`, kept strictly below `extent`.
fn scaled_below(unit: f64, extent: f64) -> f64 {
    let v = unit.clamp(0.0, 1.0) * extent;
    if v < extent { v } else { extent.next_down() }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64);

    impl RandomSource for Fixed {
        fn next_unit(&mut self) -> f64 {
            self.0
        }
    }

    #[test]
    fn grid_count_is_ceil_of_cells() {
        for (w, h) in [(1, 1), (30, 30), (31, 30), (300, 300), (601, 59), (1920, 1080)] {
            let dims = Dimensions::new(w, h);
            let set = generate(Variant::Grid, dims, 0.6, &mut Fixed(0.5));
            let expected = w.div_ceil(30) as usize * h.div_ceil(30) as usize;
            assert_eq!(set.len(), expected, "{w}x{h}");
            assert_eq!(grid_point_count(dims), expected);
        }
    }

    #[test]
    fn grid_anchors_start_at_origin_and_match_positions() {
        let ParticleSet::Grid(points) =
            generate(Variant::Grid, Dimensions::new(60, 60), 1.0, &mut Fixed(0.0))
        else {
            panic!("expected grid particles");
        };
        assert_eq!(points.len(), 4);
        assert_eq!((points[0].x, points[0].y), (0.0, 0.0));
        assert_eq!((points[1].x, points[1].y), (0.0, 30.0));
        assert_eq!((points[2].x, points[2].y), (30.0, 0.0));
        for p in &points {
            assert_eq!((p.x, p.y), (p.original_x, p.original_y));
            assert_eq!(p.size, 1.0);
        }
    }

    #[test]
    fn dot_count_scales_with_area_and_intensity() {
        assert_eq!(dot_count(Dimensions::new(1000, 1000), 1.0), 100);
        assert_eq!(dot_count(Dimensions::new(1000, 1000), 0.6), 60);
        assert_eq!(dot_count(Dimensions::new(100, 1000), 0.3), 3);
        assert_eq!(dot_count(Dimensions::new(99, 99), 1.0), 0);
        // floor(5) * 0.3 = 1.5 dots rounds up.
        assert_eq!(dot_count(Dimensions::new(500, 100), 0.3), 2);
    }

    #[test]
    fn dots_stay_in_bounds_even_at_unit_extreme() {
        let dims = Dimensions::new(200, 100);
        let ParticleSet::Dots(dots) =
            generate(Variant::Dots, dims, 1.0, &mut Fixed(1.0 - f64::EPSILON / 2.0))
        else {
            panic!("expected dots");
        };
        assert_eq!(dots.len(), 2);
        for d in &dots {
            assert!(d.x >= 0.0 && d.x < 200.0);
            assert!(d.y >= 0.0 && d.y < 100.0);
        }
    }

    #[test]
    fn seeded_dots_are_within_stated_ranges() {
        let dims = Dimensions::new(640, 480);
        let mut rng = RngSource::seeded(7);
        let ParticleSet::Dots(dots) = generate(Variant::Dots, dims, 0.6, &mut rng) else {
            panic!("expected dots");
        };
        assert_eq!(dots.len(), dot_count(dims, 0.6));
        for d in &dots {
            assert!((0.0..640.0).contains(&d.x));
            assert!((0.0..480.0).contains(&d.y));
            assert!((1.0..3.0).contains(&d.size));
            assert!((-0.25..0.25).contains(&d.vx));
            assert!((-0.25..0.25).contains(&d.vy));
        }
    }

    #[test]
    fn waves_are_three_with_monotonic_shape() {
        let ParticleSet::Waves(waves) =
            generate(Variant::Waves, Dimensions::new(800, 400), 0.3, &mut Fixed(0.0))
        else {
            panic!("expected waves");
        };
        assert_eq!(waves.len(), WAVE_COUNT);
        for pair in waves.windows(2) {
            assert!(pair[0].amplitude > pair[1].amplitude);
            assert!(pair[0].wavelength < pair[1].wavelength);
            assert!(pair[0].speed < pair[1].speed);
        }
        assert_eq!(waves[0].amplitude, 40.0);
        assert_eq!(waves[0].wavelength, 400.0);
        assert_eq!(waves[0].phase, 0.0);
        assert!((waves[2].phase - PI).abs() < 1e-12);
    }

    #[test]
    fn deterministic_variants_are_idempotent() {
        let dims = Dimensions::new(333, 222);
        for variant in [Variant::Grid, Variant::Waves] {
            let a = generate(variant, dims, 0.6, &mut Fixed(0.1));
            let b = generate(variant, dims, 0.6, &mut Fixed(0.9));
            assert_eq!(a, b);
        }
    }

    #[test]
    fn zero_sized_container_generates_nothing() {
        for variant in [Variant::Grid, Variant::Dots, Variant::Waves] {
            let set = generate(variant, Dimensions::new(0, 500), 1.0, &mut Fixed(0.5));
            assert!(set.is_empty());
            assert_eq!(set.variant(), variant);
        }
    }
}
