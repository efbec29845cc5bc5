use std::sync::{Arc, Mutex, PoisonError};

use crate::core::Dimensions;

/// The host box an engine renders into.
pub trait Container {
    fn measure(&self) -> Dimensions;
}

impl Container for Dimensions {
    fn measure(&self) -> Dimensions {
        *self
    }
}

/// Remembers the last published size and reports only real changes.
#[derive(Clone, Copy, Debug, Default)]
pub struct SizeTracker {
    published: Option<Dimensions>,
}

impl SizeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Some` when `measured` differs from the last published size.
    pub fn observe(&mut self, measured: Dimensions) -> Option<Dimensions> {
        if self.published == Some(measured) {
            return None;
        }
        self.published = Some(measured);
        Some(measured)
    }

    pub fn current(&self) -> Dimensions {
        self.published.unwrap_or(Dimensions::ZERO)
    }

    pub fn reset(&mut self) {
        self.published = None;
    }
}

/// Resize notifications posted by the host, possibly from another thread.
///
/// Only the latest pending size is kept; the engine drains it at frame start.
#[derive(Clone, Debug, Default)]
pub struct ResizeInbox {
    pending: Arc<Mutex<Option<Dimensions>>>,
}

/// Host-side end of a [`ResizeInbox`].
#[derive(Clone, Debug)]
pub struct ResizeHandle {
    pending: Arc<Mutex<Option<Dimensions>>>,
}

impl ResizeHandle {
    pub fn notify(&self, dims: Dimensions) {
        let mut slot = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(dims);
    }
}

impl ResizeInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> ResizeHandle {
        ResizeHandle {
            pending: Arc::clone(&self.pending),
        }
    }

    pub fn take(&self) -> Option<Dimensions> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
