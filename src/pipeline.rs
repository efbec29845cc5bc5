use std::path::PathBuf;

use crate::{
    composite_cpu::overlay_content,
    config::BackdropConfig,
    core::{Dimensions, FrameRGBA},
    encode_ffmpeg::{EncodeConfig, FfmpegEncoder},
    engine::{Backdrop, FrameOutcome},
    error::{BackdropError, BackdropResult},
    particles::{RandomSource, RngSource},
    render_cpu::CpuSurface,
    scheduler::{Clock, ManualHost, SteppedClock},
};

/// Offline rendering parameters.
#[derive(Clone, Debug)]
pub struct RenderOpts {
    pub dims: Dimensions,
    pub fps: u32,
    /// Clock reading of the first frame, in seconds.
    pub start_seconds: f64,
    /// Seeds dot placement; `None` uses the thread RNG.
    pub seed: Option<u64>,
    /// Premultiplied layer painted above every frame.
    pub content: Option<FrameRGBA>,
}

impl RenderOpts {
    pub fn new(dims: Dimensions) -> Self {
        Self {
            dims,
            fps: 30,
            start_seconds: 0.0,
            seed: None,
            content: None,
        }
    }

    pub fn validate(&self) -> BackdropResult<()> {
        if !self.dims.is_drawable() {
            return Err(BackdropError::validation(
                "render width/height must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(BackdropError::validation("render fps must be non-zero"));
        }
        if !self.start_seconds.is_finite() {
            return Err(BackdropError::validation("start time must be finite"));
        }
        if let Some(content) = &self.content
            && content.dimensions() != self.dims
        {
            return Err(BackdropError::validation(format!(
                "content layer is {}x{} but the render is {}x{}",
                content.width, content.height, self.dims.width, self.dims.height
            )));
        }
        Ok(())
    }
}

/// Renders a single frame at `opts.start_seconds`.
///
/// Returns **premultiplied** RGBA8 pixels.
pub fn render_frame(config: &BackdropConfig, opts: &RenderOpts) -> BackdropResult<FrameRGBA> {
    let mut out = None;
    render_frames(config, opts, 1, |_, frame| {
        out = Some(frame.clone());
        Ok(())
    })?;
    out.ok_or_else(|| BackdropError::surface("no frame was produced"))
}

/// Drives a mounted engine through `count` frames, handing each one to `sink`.
///
/// Frames are paced by a stepped clock, so dots evolve exactly as they would live.
#[tracing::instrument(level = "debug", skip(config, opts, sink))]
pub fn render_frames(
    config: &BackdropConfig,
    opts: &RenderOpts,
    count: u64,
    mut sink: impl FnMut(u64, &FrameRGBA) -> BackdropResult<()>,
) -> BackdropResult<()> {
    opts.validate()?;

    let rng: Box<dyn RandomSource> = match opts.seed {
        Some(seed) => Box::new(RngSource::seeded(seed)),
        None => Box::new(RngSource::thread()),
    };
    let mut engine = Backdrop::with_random(config.clone(), rng);
    let mut host = ManualHost::new();
    let mut clock = SteppedClock::new(opts.start_seconds, opts.fps);

    let surface = CpuSurface::new(opts.dims)?;
    engine.mount(&opts.dims, Ok(surface), &mut host);

    for index in 0..count {
        let token = host
            .next_frame()
            .ok_or_else(|| BackdropError::surface("frame loop stopped before the last frame"))?;
        let outcome = engine.tick(token, clock.now_seconds(), &mut host);
        if outcome != FrameOutcome::Drawn {
            return Err(BackdropError::surface(format!(
                "frame {index} was not drawn ({outcome:?})"
            )));
        }

        let surface = engine
            .surface()
            .ok_or_else(|| BackdropError::surface("surface released mid-render"))?;
        let mut frame = surface.readback();
        if let Some(content) = &opts.content {
            overlay_content(&mut frame, content)?;
        }
        sink(index, &frame)?;
        clock.advance();
    }

    engine.unmount(&mut host);
    tracing::debug!(frames = count, "offline render finished");
    Ok(())
}

/// Renders `count` frames and encodes them to MP4 with the system `ffmpeg`.
pub fn render_to_mp4(
    config: &BackdropConfig,
    opts: &RenderOpts,
    count: u64,
    out_path: impl Into<PathBuf>,
    bg_rgba: [u8; 4],
) -> BackdropResult<()> {
    if count == 0 {
        return Err(BackdropError::validation("render_to_mp4 needs at least one frame"));
    }
    opts.validate()?;

    let cfg = EncodeConfig {
        width: opts.dims.width,
        height: opts.dims.height,
        fps: opts.fps,
        out_path: out_path.into(),
        overwrite: true,
    };
    let mut enc = FfmpegEncoder::new(cfg, bg_rgba)?;
    render_frames(config, opts, count, |_, frame| enc.encode_frame(frame))?;
    enc.finish()
}
