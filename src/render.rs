use crate::{
    color::Rgba8,
    core::{Dimensions, Point},
    error::BackdropResult,
    particles::{Dot, GridPoint, ParticleSet, Wave},
    surface::DrawSurface,
};

/// Grid points closer than this are linked.
pub const GRID_LINK_PX: f64 = 40.0;
/// Dots closer than this are linked, fading with distance.
pub const DOT_LINK_PX: f64 = 100.0;
pub const WAVE_SAMPLE_STEP_PX: usize = 5;
pub const WAVE_BASELINE_GAP_PX: f64 = 30.0;

const GRID_MOVE_PX: f64 = 5.0;
const GRID_LINE_WIDTH: f64 = 0.5;
const DOT_LINE_WIDTH: f64 = 1.0;
const WAVE_LINE_WIDTH: f64 = 2.0;

/// Per-frame inputs shared by every variant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameParams {
    pub dims: Dimensions,
    pub color: Rgba8,
    pub intensity_factor: f64,
    pub now_seconds: f64,
}

/// Clears `surface` and draws one frame of `particles`.
///
/// Grid points and dots are moved in place. Nothing is drawn for a non-drawable container.
pub fn render(
    surface: &mut dyn DrawSurface,
    particles: &mut ParticleSet,
    params: &FrameParams,
) -> BackdropResult<()> {
    if !params.dims.is_drawable() {
        return Ok(());
    }

    surface.clear();
    match particles {
        ParticleSet::Grid(points) => render_grid(surface, points, params),
        ParticleSet::Dots(dots) => render_dots(surface, dots, params),
        ParticleSet::Waves(waves) => render_waves(surface, waves, params),
    }
    surface.present()
}

/// Offsets every point from its anchor; the sway fades towards the container corners.
///
/// The fade is measured from where the point sat after the previous frame.
pub fn displace_grid(points: &mut [GridPoint], dims: Dimensions, intensity_factor: f64, now: f64) {
    let center = dims.center();
    let max_distance = dims.half_diagonal();
    let move_factor = GRID_MOVE_PX * intensity_factor;
    let t = now * 0.5;

    for p in points.iter_mut() {
        let falloff = 1.0 - Point::new(p.x, p.y).distance(center) / max_distance;
        p.x = p.original_x + (t + p.original_y * 0.01).sin() * move_factor * falloff;
        p.y = p.original_y + (t + p.original_x * 0.01).cos() * move_factor * falloff;
    }
}

/// Moves every dot by its velocity and reflects velocity components at the container edges.
///
/// Positions are not clamped: a dot may sit past an edge for one frame.
pub fn advance_dots(dots: &mut [Dot], dims: Dimensions) {
    let (w, h) = (dims.width_f64(), dims.height_f64());
    for d in dots.iter_mut() {
        d.x += d.vx;
        d.y += d.vy;
        if d.x < 0.0 || d.x > w {
            d.vx = -d.vx;
        }
        if d.y < 0.0 || d.y > h {
            d.vy = -d.vy;
        }
    }
}

fn render_grid(surface: &mut dyn DrawSurface, points: &mut [GridPoint], params: &FrameParams) {
    displace_grid(points, params.dims, params.intensity_factor, params.now_seconds);

    for p in points.iter() {
        surface.fill_circle(Point::new(p.x, p.y), p.size, params.color);
    }

    let limit_sq = GRID_LINK_PX * GRID_LINK_PX;
    for i in 0..points.len() {
        let a = Point::new(points[i].x, points[i].y);
        for b in &points[i + 1..] {
            let b = Point::new(b.x, b.y);
            if a.distance_squared(b) < limit_sq {
                surface.stroke_line(a, b, GRID_LINE_WIDTH, params.color);
            }
        }
    }
}

fn render_dots(surface: &mut dyn DrawSurface, dots: &mut [Dot], params: &FrameParams) {
    advance_dots(dots, params.dims);

    for d in dots.iter() {
        surface.fill_circle(Point::new(d.x, d.y), d.size, params.color);
    }

    for i in 0..dots.len() {
        let a = Point::new(dots[i].x, dots[i].y);
        for b in &dots[i + 1..] {
            let b = Point::new(b.x, b.y);
            let dist = a.distance(b);
            if dist < DOT_LINK_PX {
                let color = params.color.with_alpha_scaled(1.0 - dist / DOT_LINK_PX);
                surface.stroke_line(a, b, DOT_LINE_WIDTH, color);
            }
        }
    }
}

fn render_waves(surface: &mut dyn DrawSurface, waves: &[Wave], params: &FrameParams) {
    let width = params.dims.width as usize;
    let mut samples = Vec::with_capacity(width.div_ceil(WAVE_SAMPLE_STEP_PX));

    for (i, wave) in waves.iter().enumerate() {
        let baseline = params.dims.height_f64() * 0.5 + i as f64 * WAVE_BASELINE_GAP_PX;
        let shift = params.now_seconds * wave.speed + wave.phase;

        samples.clear();
        samples.extend((0..width).step_by(WAVE_SAMPLE_STEP_PX).map(|x| {
            let x = x as f64;
            Point::new(x, baseline + (x / wave.wavelength + shift).sin() * wave.amplitude)
        }));

        let alpha = (0.3 - 0.1 * i as f64).max(0.0);
        surface.stroke_polyline(&samples, WAVE_LINE_WIDTH, params.color.with_alpha_scaled(alpha));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Variant,
        particles::{RandomSource, generate},
        surface::{DrawCall, RecordingSurface},
    };

    struct Fixed(f64);

    impl RandomSource for Fixed {
        fn next_unit(&mut self) -> f64 {
            self.0
        }
    }

    fn params(dims: Dimensions, now: f64) -> FrameParams {
        FrameParams {
            dims,
            color: Rgba8::opaque(255, 255, 255),
            intensity_factor: 1.0,
            now_seconds: now,
        }
    }

    fn dot(x: f64, y: f64, vx: f64, vy: f64) -> Dot {
        Dot {
            x,
            y,
            size: 1.0,
            vx,
            vy,
        }
    }

    #[test]
    fn dot_at_right_edge_reflects_without_clamping() {
        let dims = Dimensions::new(100, 100);
        let mut dots = [dot(100.0, 50.0, 0.2, 0.0)];
        advance_dots(&mut dots, dims);
        assert!(dots[0].x > 100.0);
        assert_eq!(dots[0].vx, -0.2);
        advance_dots(&mut dots, dims);
        assert!((dots[0].x - 100.0).abs() < 1e-12);
    }

    #[test]
    fn dot_at_top_edge_reflects_vertically() {
        let mut dots = [dot(10.0, 0.0, 0.0, -0.1)];
        advance_dots(&mut dots, Dimensions::new(100, 100));
        assert_eq!(dots[0].vy, 0.1);
        assert_eq!(dots[0].vx, 0.0);
    }

    #[test]
    fn grid_corner_points_do_not_move() {
        let dims = Dimensions::new(60, 60);
        let ParticleSet::Grid(mut points) = generate(Variant::Grid, dims, 1.0, &mut Fixed(0.0))
        else {
            panic!("expected grid");
        };
        displace_grid(&mut points, dims, 1.0, 12.3);
        // (0, 0) sits exactly one half-diagonal from the center.
        assert!((points[0].x).abs() < 1e-9);
        assert!((points[0].y).abs() < 1e-9);
        assert!(points[3].x != 30.0 || points[3].y != 30.0);
    }

    #[test]
    fn grid_fade_uses_previous_position() {
        let dims = Dimensions::new(200, 200);
        let mut points = [GridPoint {
            x: 100.0,
            y: 100.0,
            original_x: 60.0,
            original_y: 40.0,
            size: 1.0,
        }];
        let now = 3.0;
        displace_grid(&mut points, dims, 1.0, now);

        // Sitting on the center means no fade at all.
        let t = now * 0.5;
        assert!((points[0].x - (60.0 + (t + 0.4).sin() * 5.0)).abs() < 1e-9);
        assert!((points[0].y - (40.0 + (t + 0.6).cos() * 5.0)).abs() < 1e-9);
    }

    #[test]
    fn grid_displacement_is_bounded_by_intensity() {
        let dims = Dimensions::new(300, 300);
        let ParticleSet::Grid(mut points) = generate(Variant::Grid, dims, 0.3, &mut Fixed(0.0))
        else {
            panic!("expected grid");
        };
        displace_grid(&mut points, dims, 0.3, 7.0);
        for p in &points {
            assert!((p.x - p.original_x).abs() <= 1.5 + 1e-9);
            assert!((p.y - p.original_y).abs() <= 1.5 + 1e-9);
        }
    }

    #[test]
    fn grid_frame_draws_points_then_links() {
        let dims = Dimensions::new(60, 30);
        let mut set = generate(Variant::Grid, dims, 1.0, &mut Fixed(0.0));
        let (mut surface, log) = RecordingSurface::new();
        render(&mut surface, &mut set, &params(dims, 0.0)).unwrap();

        let calls = log.calls();
        assert_eq!(calls.first(), Some(&DrawCall::Clear));
        assert_eq!(calls.last(), Some(&DrawCall::Present));
        let circles = calls
            .iter()
            .filter(|c| matches!(c, DrawCall::FillCircle { .. }))
            .count();
        let lines = calls
            .iter()
            .filter(|c| matches!(c, DrawCall::StrokeLine { .. }))
            .count();
        assert_eq!(circles, 2);
        assert_eq!(lines, 1);
    }

    #[test]
    fn close_dots_link_with_distance_faded_alpha() {
        let dims = Dimensions::new(500, 500);
        let mut set = ParticleSet::Dots(vec![
            dot(100.0, 100.0, 0.0, 0.0),
            dot(150.0, 100.0, 0.0, 0.0),
            dot(400.0, 400.0, 0.0, 0.0),
        ]);
        let (mut surface, log) = RecordingSurface::new();
        render(&mut surface, &mut set, &params(dims, 0.0)).unwrap();

        let lines: Vec<_> = log
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                DrawCall::StrokeLine { color, .. } => Some(color),
                _ => None,
            })
            .collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].a, 128);
    }

    #[test]
    fn waves_first_sample_sits_on_baseline_at_time_zero() {
        let dims = Dimensions::new(200, 100);
        let mut set = generate(Variant::Waves, dims, 0.6, &mut Fixed(0.0));
        let (mut surface, log) = RecordingSurface::new();
        render(&mut surface, &mut set, &params(dims, 0.0)).unwrap();

        let polylines: Vec<_> = log
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                DrawCall::StrokePolyline { points, color, .. } => Some((points, color)),
                _ => None,
            })
            .collect();
        assert_eq!(polylines.len(), 3);

        let (first, color0) = &polylines[0];
        assert_eq!(first.len(), 40);
        assert_eq!(first[0], Point::new(0.0, 50.0));
        assert_eq!(first.last().unwrap().x, 195.0);

        // Wave 1 starts a quarter turn later, one amplitude below its baseline.
        let (second, color1) = &polylines[1];
        assert!((second[0].y - (50.0 + 30.0 + 8.0)).abs() < 1e-9);
        assert!(color0.a > color1.a);
        assert!(color1.a > polylines[2].1.a);
    }

    #[test]
    fn zero_sized_frame_draws_nothing() {
        let mut set = ParticleSet::Dots(vec![dot(1.0, 1.0, 0.1, 0.1)]);
        let (mut surface, log) = RecordingSurface::new();
        render(&mut surface, &mut set, &params(Dimensions::new(0, 0), 1.0)).unwrap();
        assert!(log.is_empty());
    }
}
