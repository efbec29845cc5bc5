use std::{cell::RefCell, rc::Rc};

use crate::{
    color::Rgba8,
    core::{Dimensions, Point},
    error::{BackdropError, BackdropResult},
};

/// A 2D drawing surface whose backing store matches the container size.
///
/// Draw calls are infallible; errors surface from [`DrawSurface::resize`] and
/// [`DrawSurface::present`].
pub trait DrawSurface {
    /// Rebinds the backing store to `dims`, discarding its contents.
    fn resize(&mut self, dims: Dimensions) -> BackdropResult<()>;
    fn clear(&mut self);
    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba8);
    fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Rgba8);
    fn stroke_polyline(&mut self, points: &[Point], width: f64, color: Rgba8);
    /// Called once after the last draw call of a frame.
    fn present(&mut self) -> BackdropResult<()> {
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    Resize(Dimensions),
    Clear,
    FillCircle {
        center: Point,
        radius: f64,
        color: Rgba8,
    },
    StrokeLine {
        from: Point,
        to: Point,
        width: f64,
        color: Rgba8,
    },
    StrokePolyline {
        points: Vec<Point>,
        width: f64,
        color: Rgba8,
    },
    Present,
}

impl DrawCall {
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            Self::FillCircle { .. } | Self::StrokeLine { .. } | Self::StrokePolyline { .. }
        )
    }
}

/// Shared view of the calls a [`RecordingSurface`] received.
///
/// Stays readable after the surface itself is dropped.
#[derive(Clone, Debug, Default)]
pub struct DrawLog {
    calls: Rc<RefCell<Vec<DrawCall>>>,
}

impl DrawLog {
    pub fn calls(&self) -> Vec<DrawCall> {
        self.calls.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }

    pub fn draw_count(&self) -> usize {
        self.calls.borrow().iter().filter(|c| c.is_draw()).count()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn push(&self, call: DrawCall) {
        self.calls.borrow_mut().push(call);
    }
}

/// Surface that records every call instead of rasterizing.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    log: DrawLog,
    dims: Dimensions,
    max_side: Option<u32>,
}

impl RecordingSurface {
    pub fn new() -> (Self, DrawLog) {
        let surface = Self::default();
        let log = surface.log.clone();
        (surface, log)
    }

    /// Rejects resizes beyond `max_side` pixels per axis, like a real backing store would.
    pub fn with_max_side(mut self, max_side: u32) -> Self {
        self.max_side = Some(max_side);
        self
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }
}

impl DrawSurface for RecordingSurface {
    fn resize(&mut self, dims: Dimensions) -> BackdropResult<()> {
        if let Some(max) = self.max_side
            && (dims.width > max || dims.height > max)
        {
            return Err(BackdropError::surface(format!(
                "{}x{} exceeds {max}px backing store limit",
                dims.width, dims.height
            )));
        }
        self.dims = dims;
        self.log.push(DrawCall::Resize(dims));
        Ok(())
    }

    fn clear(&mut self) {
        self.log.push(DrawCall::Clear);
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba8) {
        self.log.push(DrawCall::FillCircle {
            center,
            radius,
            color,
        });
    }

    fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Rgba8) {
        self.log.push(DrawCall::StrokeLine {
            from,
            to,
            width,
            color,
        });
    }

    fn stroke_polyline(&mut self, points: &[Point], width: f64, color: Rgba8) {
        self.log.push(DrawCall::StrokePolyline {
            points: points.to_vec(),
            width,
            color,
        });
    }

    fn present(&mut self) -> BackdropResult<()> {
        self.log.push(DrawCall::Present);
        Ok(())
    }
}
