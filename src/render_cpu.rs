use vello_cpu::kurbo::Shape as _;

use crate::{
    color::Rgba8,
    core::{Dimensions, FrameRGBA, Point},
    error::{BackdropError, BackdropResult},
    surface::DrawSurface,
};

/// Tolerance used when flattening circles.
const CIRCLE_TOLERANCE: f64 = 0.1;

/// [`DrawSurface`] rasterized on the CPU with `vello_cpu`.
///
/// Draw calls of a frame are batched into a render context and resolved into the
/// pixmap on [`DrawSurface::present`]. A surface created for a zero-sized container
/// holds no pixmap until it is resized to a drawable size; until then drawing is a no-op.
pub struct CpuSurface {
    width: u16,
    height: u16,
    target: Option<CpuTarget>,
}

struct CpuTarget {
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
}

impl CpuTarget {
    fn new(width: u16, height: u16) -> Self {
        Self {
            ctx: vello_cpu::RenderContext::new(width, height),
            pixmap: vello_cpu::Pixmap::new(width, height),
        }
    }
}

impl CpuSurface {
    /// Fails only when a side does not fit the rasterizer's `u16` limit.
    pub fn new(dims: Dimensions) -> BackdropResult<Self> {
        let (width, height) = surface_size(dims)?;
        Ok(Self {
            width,
            height,
            target: dims.is_drawable().then(|| CpuTarget::new(width, height)),
        })
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(u32::from(self.width), u32::from(self.height))
    }

    pub fn is_bound(&self) -> bool {
        self.target.is_some()
    }

    /// Premultiplied pixels of the last presented frame (empty while unbound).
    pub fn readback(&self) -> FrameRGBA {
        match &self.target {
            Some(target) => FrameRGBA {
                width: u32::from(self.width),
                height: u32::from(self.height),
                data: target.pixmap.data_as_u8_slice().to_vec(),
                premultiplied: true,
            },
            None => FrameRGBA::transparent(Dimensions::ZERO),
        }
    }
}

impl DrawSurface for CpuSurface {
    fn resize(&mut self, dims: Dimensions) -> BackdropResult<()> {
        let (width, height) = surface_size(dims)?;
        if !dims.is_drawable() {
            self.target = None;
        } else if self.target.is_none() || width != self.width || height != self.height {
            self.target = Some(CpuTarget::new(width, height));
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn clear(&mut self) {
        let (width, height) = (self.width, self.height);
        if let Some(target) = self.target.as_mut() {
            target.ctx = vello_cpu::RenderContext::new(width, height);
            clear_pixmap(&mut target.pixmap, [0, 0, 0, 0]);
        }
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba8) {
        let Some(target) = self.target.as_mut() else {
            return;
        };
        set_paint(&mut target.ctx, color);
        let circle = vello_cpu::kurbo::Circle::new(point_to_cpu(center), radius);
        target.ctx.fill_path(&circle.to_path(CIRCLE_TOLERANCE));
    }

    fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Rgba8) {
        self.stroke_polyline(&[from, to], width, color);
    }

    fn stroke_polyline(&mut self, points: &[Point], width: f64, color: Rgba8) {
        let Some(target) = self.target.as_mut() else {
            return;
        };
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        let mut path = vello_cpu::kurbo::BezPath::new();
        path.move_to(point_to_cpu(*first));
        for p in rest {
            path.line_to(point_to_cpu(*p));
        }

        set_paint(&mut target.ctx, color);
        target.ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
        target.ctx.stroke_path(&path);
    }

    fn present(&mut self) -> BackdropResult<()> {
        if let Some(target) = self.target.as_mut() {
            target.ctx.flush();
            target.ctx.render_to_pixmap(&mut target.pixmap);
        }
        Ok(())
    }
}

fn set_paint(ctx: &mut vello_cpu::RenderContext, color: Rgba8) {
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(color.r, color.g, color.b, color.a));
}

fn surface_size(dims: Dimensions) -> BackdropResult<(u16, u16)> {
    let width: u16 = dims
        .width
        .try_into()
        .map_err(|_| BackdropError::surface("surface width exceeds u16"))?;
    let height: u16 = dims
        .height
        .try_into()
        .map_err(|_| BackdropError::surface("surface height exceeds u16"))?;
    Ok((width, height))
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    let data = pixmap.data_as_u8_slice_mut();
    for px in data.chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_sizes_beyond_u16() {
        assert!(CpuSurface::new(Dimensions::new(70_000, 10)).is_err());
        assert!(CpuSurface::new(Dimensions::new(10, 70_000)).is_err());
    }

    #[test]
    fn zero_sized_surface_binds_on_resize() {
        let mut s = CpuSurface::new(Dimensions::new(0, 10)).unwrap();
        assert!(!s.is_bound());
        s.clear();
        s.fill_circle(Point::new(1.0, 1.0), 1.0, Rgba8::opaque(255, 0, 0));
        s.present().unwrap();
        assert!(s.readback().data.is_empty());

        s.resize(Dimensions::new(12, 6)).unwrap();
        assert!(s.is_bound());
        assert_eq!(s.readback().data.len(), 12 * 6 * 4);

        s.resize(Dimensions::ZERO).unwrap();
        assert!(!s.is_bound());
    }

    #[test]
    fn filled_circle_lands_in_pixmap() {
        let mut s = CpuSurface::new(Dimensions::new(16, 16)).unwrap();
        s.clear();
        s.fill_circle(Point::new(8.0, 8.0), 4.0, Rgba8::opaque(255, 0, 0));
        s.present().unwrap();

        let frame = s.readback();
        let idx = (8 * 16 + 8) * 4;
        assert_eq!(&frame.data[idx..idx + 4], &[255, 0, 0, 255]);
        assert_eq!(&frame.data[0..4], &[0, 0, 0, 0]);
    }

    #[test]
    fn clear_wipes_previous_frame() {
        let mut s = CpuSurface::new(Dimensions::new(8, 8)).unwrap();
        s.clear();
        s.fill_circle(Point::new(4.0, 4.0), 3.0, Rgba8::opaque(0, 255, 0));
        s.present().unwrap();
        s.clear();
        s.present().unwrap();
        assert!(s.readback().data.iter().all(|&b| b == 0));
    }

    #[test]
    fn resize_rebinds_backing_store() {
        let mut s = CpuSurface::new(Dimensions::new(8, 8)).unwrap();
        s.resize(Dimensions::new(20, 10)).unwrap();
        assert_eq!(s.dimensions(), Dimensions::new(20, 10));
        assert_eq!(s.readback().data.len(), 20 * 10 * 4);
    }
}
