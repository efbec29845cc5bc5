use std::{
    io::Write as _,
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use anyhow::Context as _;

use crate::{
    core::FrameRGBA,
    error::{BackdropError, BackdropResult},
};

#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub out_path: PathBuf,
    pub overwrite: bool,
}

impl EncodeConfig {
    pub fn validate(&self) -> BackdropResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(BackdropError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(BackdropError::validation("encode fps must be non-zero"));
        }
        // yuv420p subsamples chroma 2x2.
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(BackdropError::validation(
                "encode width/height must be even for yuv420p output",
            ));
        }
        Ok(())
    }

    /// Arguments for an `ffmpeg` reading raw RGBA frames from stdin.
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec![if self.overwrite { "-y" } else { "-n" }.to_string()];
        args.extend(
            [
                "-loglevel",
                "error",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "-s",
                &format!("{}x{}", self.width, self.height),
                "-r",
                &self.fps.to_string(),
                "-i",
                "pipe:0",
                "-an",
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
            ]
            .map(String::from),
        );
        args.push(self.out_path.display().to_string());
        args
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

pub fn ensure_parent_dir(path: &Path) -> BackdropResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Streams frames into a system `ffmpeg` process.
///
/// The animation is mostly transparent, so frames are flattened over `bg_rgba` first.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    bg_rgba: [u8; 4],
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    scratch: Vec<u8>,
}

impl FfmpegEncoder {
    pub fn new(cfg: EncodeConfig, bg_rgba: [u8; 4]) -> BackdropResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(BackdropError::validation(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(BackdropError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut child = Command::new("ffmpeg")
            .args(cfg.ffmpeg_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BackdropError::encode(format!("failed to spawn ffmpeg: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BackdropError::encode("ffmpeg stdin is not piped"))?;

        tracing::debug!(out = %cfg.out_path.display(), "ffmpeg started");
        Ok(Self {
            scratch: vec![0u8; cfg.width as usize * cfg.height as usize * 4],
            cfg,
            bg_rgba,
            child: Some(child),
            stdin: Some(stdin),
        })
    }

    pub fn encode_frame(&mut self, frame: &FrameRGBA) -> BackdropResult<()> {
        if frame.width != self.cfg.width || frame.height != self.cfg.height {
            return Err(BackdropError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.cfg.width, self.cfg.height
            )));
        }

        flatten_over_background(&mut self.scratch, frame, self.bg_rgba)?;

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| BackdropError::encode("ffmpeg encoder is already finalized"))?;
        stdin
            .write_all(&self.scratch)
            .map_err(|e| BackdropError::encode(format!("failed to write frame to ffmpeg: {e}")))
    }

    pub fn finish(mut self) -> BackdropResult<()> {
        drop(self.stdin.take());
        let child = self
            .child
            .take()
            .ok_or_else(|| BackdropError::encode("ffmpeg encoder is already finalized"))?;

        let output = child
            .wait_with_output()
            .map_err(|e| BackdropError::encode(format!("failed to wait for ffmpeg: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackdropError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    /// Stops ffmpeg without finalizing the output and reaps the process.
    pub fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
            tracing::debug!(out = %self.cfg.out_path.display(), "ffmpeg aborted");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.child.is_none()
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Writes `frame` composited over an opaque `bg_rgba` into `dst`.
fn flatten_over_background(dst: &mut [u8], frame: &FrameRGBA, bg_rgba: [u8; 4]) -> BackdropResult<()> {
    if dst.len() != frame.data.len() || !dst.len().is_multiple_of(4) {
        return Err(BackdropError::validation(
            "frame data does not match width*height*4",
        ));
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(frame.data.chunks_exact(4)) {
        let a = u16::from(s[3]);
        let inv = 255 - a;
        for i in 0..3 {
            let src = if frame.premultiplied {
                u16::from(s[i])
            } else {
                mul_div255(u16::from(s[i]), a)
            };
            d[i] = (src + mul_div255(u16::from(bg_rgba[i]), inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}
