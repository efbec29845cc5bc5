//! Decorative background animations: an animated dot grid, drifting linked dots, or layered
//! sine waves, rendered into a container that may resize at any time.
//!
//! A [`Backdrop`] owns one animation instance. The host mounts it with a container, a
//! [`DrawSurface`] and a [`FrameHost`] (the refresh-rate facility), then calls
//! [`Backdrop::tick`] for every frame the host grants. Unmounting cancels the loop.
#![forbid(unsafe_code)]

pub mod color;
pub mod composite_cpu;
pub mod config;
pub mod core;
pub mod encode_ffmpeg;
pub mod engine;
pub mod error;
pub mod layout;
pub mod particles;
pub mod pipeline;
pub mod render;
pub mod render_cpu;
pub mod scheduler;
pub mod surface;

pub use color::{DEFAULT_COLOR, DEFAULT_COLOR_CSS, Rgba8};
pub use composite_cpu::overlay_content;
pub use config::{BackdropConfig, Intensity, Variant};
pub use crate::core::{Dimensions, FrameRGBA, Point};
pub use encode_ffmpeg::{EncodeConfig, FfmpegEncoder, is_ffmpeg_on_path};
pub use engine::{Backdrop, EngineState, FrameOutcome};
pub use error::{BackdropError, BackdropResult};
pub use layout::{Container, ResizeHandle, ResizeInbox, SizeTracker};
pub use particles::{Dot, GridPoint, ParticleSet, RandomSource, RngSource, Wave, generate};
pub use pipeline::{RenderOpts, render_frame, render_frames, render_to_mp4};
pub use render::{FrameParams, render};
pub use render_cpu::CpuSurface;
pub use scheduler::{
    Clock, FrameHost, FrameScheduler, FrameToken, ManualHost, PacedHost, SteppedClock, SystemClock,
};
pub use surface::{DrawCall, DrawLog, DrawSurface, RecordingSurface};
