use std::{
    collections::VecDeque,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

/// Identifies one requested frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameToken(pub u64);

/// The host's refresh-rate facility.
pub trait FrameHost {
    /// Asks for exactly one callback at the next refresh tick.
    fn request_frame(&mut self) -> FrameToken;
    fn cancel_frame(&mut self, token: FrameToken);
}

/// Per-instance frame loop state.
///
/// At most one request is in flight and at most one frame runs at a time. Once
/// cancelled, no request is issued until [`FrameScheduler::rearm`].
#[derive(Debug, Default)]
pub struct FrameScheduler {
    pending: Option<FrameToken>,
    in_frame: bool,
    cancelled: bool,
    frames_run: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the next frame unless one is pending, running, or the loop was cancelled.
    pub fn request(&mut self, host: &mut dyn FrameHost) -> bool {
        if self.cancelled || self.in_frame || self.pending.is_some() {
            return false;
        }
        self.pending = Some(host.request_frame());
        true
    }

    /// Accepts `token` only if it is the pending request.
    pub fn begin(&mut self, token: FrameToken) -> bool {
        if self.cancelled || self.in_frame || self.pending != Some(token) {
            return false;
        }
        self.pending = None;
        self.in_frame = true;
        true
    }

    pub fn end(&mut self) {
        if self.in_frame {
            self.in_frame = false;
            self.frames_run += 1;
        }
    }

    pub fn cancel(&mut self, host: &mut dyn FrameHost) {
        if let Some(token) = self.pending.take() {
            host.cancel_frame(token);
        }
        self.cancelled = true;
    }

    pub fn rearm(&mut self) {
        self.cancelled = false;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_running(&self) -> bool {
        !self.cancelled && (self.pending.is_some() || self.in_frame)
    }

    pub fn pending(&self) -> Option<FrameToken> {
        self.pending
    }

    pub fn frames_run(&self) -> u64 {
        self.frames_run
    }
}

/// Host driven explicitly: requested frames queue up until taken.
#[derive(Debug, Default)]
pub struct ManualHost {
    next_id: u64,
    queued: VecDeque<FrameToken>,
    cancelled: Vec<FrameToken>,
}

impl ManualHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// The oldest outstanding request, if any.
    pub fn next_frame(&mut self) -> Option<FrameToken> {
        self.queued.pop_front()
    }

    pub fn outstanding(&self) -> usize {
        self.queued.len()
    }

    pub fn cancelled(&self) -> &[FrameToken] {
        &self.cancelled
    }
}

impl FrameHost for ManualHost {
    fn request_frame(&mut self) -> FrameToken {
        let token = FrameToken(self.next_id);
        self.next_id += 1;
        self.queued.push_back(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.queued.retain(|t| *t != token);
        self.cancelled.push(token);
    }
}

/// Host that releases requested frames on a fixed refresh cadence.
#[derive(Debug)]
pub struct PacedHost {
    interval: Duration,
    next_deadline: Option<Instant>,
    inner: ManualHost,
}

impl PacedHost {
    pub fn new(refresh_hz: u32) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / f64::from(refresh_hz.max(1))),
            next_deadline: None,
            inner: ManualHost::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Blocks until the next refresh deadline and returns the pending request.
    ///
    /// Returns `None` without sleeping when nothing is requested.
    pub fn wait_frame(&mut self) -> Option<FrameToken> {
        let token = self.inner.next_frame()?;
        let now = Instant::now();
        let deadline = self.next_deadline.unwrap_or(now);
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
        // Late frames do not accumulate debt.
        self.next_deadline = Some(deadline.max(now) + self.interval);
        Some(token)
    }
}

impl FrameHost for PacedHost {
    fn request_frame(&mut self) -> FrameToken {
        self.inner.request_frame()
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.inner.cancel_frame(token);
    }
}

/// Time source read by the frame loop, in seconds.
pub trait Clock {
    fn now_seconds(&self) -> f64;
}

/// Wall clock: seconds since the UNIX epoch.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_seconds(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// Deterministic clock advancing a fixed step per frame.
#[derive(Clone, Copy, Debug)]
pub struct SteppedClock {
    start: f64,
    step: f64,
    frame: u64,
}

impl SteppedClock {
    pub fn new(start: f64, fps: u32) -> Self {
        Self {
            start,
            step: 1.0 / f64::from(fps.max(1)),
            frame: 0,
        }
    }

    pub fn advance(&mut self) {
        self.frame += 1;
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl Clock for SteppedClock {
    fn now_seconds(&self) -> f64 {
        self.start + (self.frame as f64) * self.step
    }
}
