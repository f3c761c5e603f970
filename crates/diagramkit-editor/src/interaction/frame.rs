//! Frame-coalesced writes.
//!
//! High-frequency pointer moves overwrite one pending buffer; a frame is
//! requested only when none is outstanding, and the frame callback flushes
//! the latest value. At most one write per frame reaches the mirror.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Host hook that schedules the next animation frame.
pub trait FrameScheduler: Send {
    fn request_frame(&mut self);

    fn cancel_frame(&mut self);
}

/// Scheduler that only records requests; the host drives
/// `on_animation_frame` itself. Clones share their counters.
#[derive(Debug, Clone, Default)]
pub struct ManualFrameScheduler {
    requested: Arc<AtomicUsize>,
    cancelled: Arc<AtomicUsize>,
    pending: Arc<AtomicBool>,
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requested(&self) -> usize {
        self.requested.load(Ordering::SeqCst)
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// True between a request and the matching frame or cancellation.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Marks the outstanding frame as delivered.
    pub fn frame_delivered(&self) {
        self.pending.store(false, Ordering::SeqCst);
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request_frame(&mut self) {
        self.requested.fetch_add(1, Ordering::SeqCst);
        self.pending.store(true, Ordering::SeqCst);
    }

    fn cancel_frame(&mut self) {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
        self.pending.store(false, Ordering::SeqCst);
    }
}

/// Latest-value buffer with a "frame requested" flag.
#[derive(Debug)]
pub struct FrameCoalescer<T> {
    pending: Option<T>,
    frame_requested: bool,
}

impl<T> Default for FrameCoalescer<T> {
    fn default() -> Self {
        Self {
            pending: None,
            frame_requested: false,
        }
    }
}

impl<T> FrameCoalescer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the pending value. Returns `true` when the caller must
    /// request a frame.
    pub fn push(&mut self, value: T) -> bool {
        self.pending = Some(value);
        if self.frame_requested {
            false
        } else {
            self.frame_requested = true;
            true
        }
    }

    /// Takes the pending value and clears the frame flag.
    pub fn take(&mut self) -> Option<T> {
        self.frame_requested = false;
        self.pending.take()
    }

    /// Discards the pending value. Returns `true` if a frame was outstanding.
    pub fn cancel(&mut self) -> bool {
        self.pending = None;
        std::mem::replace(&mut self.frame_requested, false)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn frame_requested(&self) -> bool {
        self.frame_requested
    }
}
