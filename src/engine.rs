use crate::{
    color::Rgba8,
    config::{BackdropConfig, Intensity, Variant},
    core::Dimensions,
    error::BackdropResult,
    layout::{Container, ResizeHandle, ResizeInbox, SizeTracker},
    particles::{ParticleSet, RandomSource, RngSource, generate},
    render::{FrameParams, render},
    scheduler::{FrameHost, FrameScheduler, FrameToken},
    surface::DrawSurface,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// Created, never mounted.
    Idle,
    Mounted,
    /// The drawing surface was unavailable; nothing is ever drawn.
    Inert,
    Unmounted,
}

/// What a single [`Backdrop::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Drawn,
    /// The container has a zero side; no draw calls were issued.
    Skipped,
    /// Drawing failed; the next frame is still scheduled.
    Failed,
    /// Stale token, overlapping call, or the engine is not mounted.
    Ignored,
}

/// One animated background instance.
///
/// Owns its particle set, its frame loop and, while mounted, its drawing surface.
/// No state is shared between instances or carried across mounts.
pub struct Backdrop<S: DrawSurface> {
    config: BackdropConfig,
    color: Rgba8,
    surface: Option<S>,
    sizes: SizeTracker,
    resize: ResizeInbox,
    particles: ParticleSet,
    scheduler: FrameScheduler,
    rng: Box<dyn RandomSource>,
    state: EngineState,
    frames_drawn: u64,
}

impl<S: DrawSurface> Backdrop<S> {
    pub fn new(config: BackdropConfig) -> Self {
        Self::with_random(config, Box::new(RngSource::thread()))
    }

    pub fn with_random(config: BackdropConfig, rng: Box<dyn RandomSource>) -> Self {
        Self {
            color: config.resolved_color(),
            particles: ParticleSet::empty(config.variant),
            config,
            surface: None,
            sizes: SizeTracker::new(),
            resize: ResizeInbox::new(),
            scheduler: FrameScheduler::new(),
            rng,
            state: EngineState::Idle,
            frames_drawn: 0,
        }
    }

    pub fn config(&self) -> &BackdropConfig {
        &self.config
    }

    pub fn color(&self) -> Rgba8 {
        self.color
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn dimensions(&self) -> Dimensions {
        self.sizes.current()
    }

    pub fn particles(&self) -> &ParticleSet {
        &self.particles
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.state == EngineState::Mounted && self.scheduler.is_running()
    }

    /// Frames that reached the surface; skipped and failed frames are not counted.
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Handle the host posts container resizes into; applied at the start of the next frame.
    pub fn resize_handle(&self) -> ResizeHandle {
        self.resize.handle()
    }

    /// Measures the container, binds the surface, generates particles and requests the first frame.
    ///
    /// An unavailable surface leaves the instance inert instead of failing the host.
    #[tracing::instrument(level = "debug", skip_all, fields(variant = %self.config.variant))]
    pub fn mount(
        &mut self,
        container: &dyn Container,
        surface: BackdropResult<S>,
        host: &mut dyn FrameHost,
    ) {
        if self.state == EngineState::Mounted {
            tracing::debug!("already mounted");
            return;
        }

        let surface = match surface {
            Ok(surface) => surface,
            Err(err) => {
                tracing::warn!(%err, "drawing surface unavailable, animation disabled");
                self.state = EngineState::Inert;
                return;
            }
        };

        self.surface = Some(surface);
        self.sizes.reset();
        // Notifications posted before mount are superseded by the measurement below.
        let _ = self.resize.take();
        self.scheduler.rearm();
        self.frames_drawn = 0;
        self.state = EngineState::Mounted;

        self.apply_dimensions(container.measure());
        if self.state == EngineState::Mounted {
            self.scheduler.request(host);
            tracing::debug!(dims = ?self.dimensions(), "mounted");
        }
    }

    /// Runs one frame for `token`, then requests the next one while still mounted.
    pub fn tick(
        &mut self,
        token: FrameToken,
        now_seconds: f64,
        host: &mut dyn FrameHost,
    ) -> FrameOutcome {
        if self.state != EngineState::Mounted || !self.scheduler.begin(token) {
            return FrameOutcome::Ignored;
        }

        if let Some(dims) = self.resize.take() {
            self.apply_dimensions(dims);
        }

        let outcome = self.draw(now_seconds);
        self.scheduler.end();
        if self.state == EngineState::Mounted {
            self.scheduler.request(host);
        }
        outcome
    }

    /// Cancels the frame loop and releases the surface.
    pub fn unmount(&mut self, host: &mut dyn FrameHost) {
        self.scheduler.cancel(host);
        self.surface = None;
        self.sizes.reset();
        self.particles = ParticleSet::empty(self.config.variant);
        if self.state != EngineState::Inert {
            self.state = EngineState::Unmounted;
        }
        tracing::debug!("unmounted");
    }

    /// Replaces the configuration and regenerates particles; a running loop keeps running.
    pub fn set_config(&mut self, config: BackdropConfig) {
        if config == self.config {
            return;
        }
        self.color = config.resolved_color();
        self.config = config;
        self.regenerate();
    }

    pub fn set_variant(&mut self, variant: Variant) {
        let config = BackdropConfig {
            variant,
            ..self.config.clone()
        };
        self.set_config(config);
    }

    pub fn set_intensity(&mut self, intensity: Intensity) {
        let config = BackdropConfig {
            intensity,
            ..self.config.clone()
        };
        self.set_config(config);
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        let config = BackdropConfig {
            color: color.into(),
            ..self.config.clone()
        };
        self.set_config(config);
    }

    fn apply_dimensions(&mut self, measured: Dimensions) {
        let Some(dims) = self.sizes.observe(measured) else {
            return;
        };

        if dims.is_drawable()
            && let Some(surface) = self.surface.as_mut()
            && let Err(err) = surface.resize(dims)
        {
            tracing::warn!(%err, ?dims, "failed to bind surface, animation disabled");
            self.surface = None;
            self.state = EngineState::Inert;
            return;
        }

        self.regenerate();
    }

    fn regenerate(&mut self) {
        self.particles = generate(
            self.config.variant,
            self.sizes.current(),
            self.config.intensity.factor(),
            self.rng.as_mut(),
        );
    }

    fn draw(&mut self, now_seconds: f64) -> FrameOutcome {
        let dims = self.sizes.current();
        if !dims.is_drawable() {
            return FrameOutcome::Skipped;
        }
        let Some(surface) = self.surface.as_mut() else {
            return FrameOutcome::Skipped;
        };

        let params = FrameParams {
            dims,
            color: self.color,
            intensity_factor: self.config.intensity.factor(),
            now_seconds,
        };
        match render(surface, &mut self.particles, &params) {
            Ok(()) => {
                self.frames_drawn += 1;
                FrameOutcome::Drawn
            }
            Err(err) => {
                tracing::warn!(%err, "frame failed");
                FrameOutcome::Failed
            }
        }
    }
}
