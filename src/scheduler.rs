//! Coalesced invalidation and throttled frame callbacks.
//!
//! A view never draws in response to a state change directly. It marks
//! itself dirty and makes sure exactly one frame callback is pending. When
//! the host fires that callback the scheduler decides whether enough time
//! has passed to draw. Whatever [`ViewState`](crate::view_state::ViewState)
//! is current at that moment gets drawn.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::trace;
use web_time::Instant;

use crate::config::ViewerConfig;
use crate::enums::Orientation;

/// Host hook that arranges for a frame callback for one view, e.g. a
/// `requestAnimationFrame` or a timer on an event loop.
pub trait FrameRequester {
    fn request_frame(&mut self, orientation: Orientation);
}

/// Plain queue of requested callbacks, for hosts that poll.
#[derive(Debug, Default)]
pub struct FrameQueue {
    pending: VecDeque<Orientation>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pop(&mut self) -> Option<Orientation> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take every callback requested so far, leaving the queue empty.
    pub fn take(&mut self) -> Vec<Orientation> {
        self.pending.drain(..).collect()
    }
}

impl FrameRequester for FrameQueue {
    fn request_frame(&mut self, orientation: Orientation) {
        self.pending.push_back(orientation);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Clean,
    Dirty,
    Rendering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAction {
    Draw,
    Skip,
}

#[derive(Debug, Clone)]
pub struct FrameScheduler {
    orientation: Orientation,
    interval: Duration,
    quiet_period: Duration,
    dirty: bool,
    rendering: bool,
    pending: bool,
    last_draw: Option<Instant>,
    resize_deadline: Option<Instant>,
}

impl FrameScheduler {
    pub fn new(orientation: Orientation, config: &ViewerConfig) -> Self {
        Self {
            orientation,
            interval: config.frame_interval(),
            quiet_period: config.resize_quiet_period,
            dirty: false,
            rendering: false,
            pending: false,
            last_draw: None,
            resize_deadline: None,
        }
    }

    pub fn state(&self) -> RenderState {
        if self.rendering {
            RenderState::Rendering
        } else if self.dirty {
            RenderState::Dirty
        } else {
            RenderState::Clean
        }
    }

    /// Mark dirty and make sure a callback is pending.
    pub fn invalidate(&mut self, frames: &mut dyn FrameRequester) {
        self.dirty = true;
        self.request(frames);
    }

    fn request(&mut self, frames: &mut dyn FrameRequester) {
        if !self.pending {
            self.pending = true;
            frames.request_frame(self.orientation);
        }
    }

    /// Record a resize signal. Every signal pushes the end of the resize
    /// gesture out by the quiet period.
    pub fn resize_signal(&mut self, now: Instant) {
        self.resize_deadline = Some(now + self.quiet_period);
    }

    pub fn is_resizing(&self, now: Instant) -> bool {
        self.resize_deadline.is_some_and(|deadline| now < deadline)
    }

    /// Called when the pending callback fires. On [`FrameAction::Draw`] the
    /// caller draws and then calls [`finish_frame`](Self::finish_frame).
    pub fn begin_frame(&mut self, now: Instant) -> FrameAction {
        self.pending = false;

        if self.is_resizing(now) {
            self.rendering = true;
            return FrameAction::Draw;
        }
        self.resize_deadline = None;

        if !self.dirty {
            return FrameAction::Skip;
        }
        match self.last_draw {
            None => {
                self.last_draw = Some(now);
            }
            Some(last) => {
                let elapsed = now.saturating_duration_since(last);
                if elapsed < self.interval {
                    trace!(orientation = self.orientation.name(), "frame throttled");
                    return FrameAction::Skip;
                }
                // Keep the cadence aligned to the interval after a stall.
                let interval_ns = self.interval.as_nanos().max(1);
                let drift = Duration::from_nanos((elapsed.as_nanos() % interval_ns) as u64);
                self.last_draw = Some(now - drift);
            }
        }
        self.rendering = true;
        self.dirty = false;
        FrameAction::Draw
    }

    /// Close a frame callback, re-requesting one if there is still work.
    ///
    /// Must be called after every [`begin_frame`](Self::begin_frame),
    /// whether it drew or not.
    pub fn finish_frame(&mut self, now: Instant, frames: &mut dyn FrameRequester) {
        self.rendering = false;
        if self.dirty || self.is_resizing(now) {
            self.request(frames);
        }
    }
}
