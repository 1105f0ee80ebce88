//! Scroll coordination.
//!
//! Every store mutation schedules a deferred jump to the bottom, which runs
//! after a short settle delay so layout reflects the new content first. The
//! coordinator also tracks whether the reader has scrolled far enough up
//! that the "new messages below" indicator should show.

use std::time::Duration;

use tracing::trace;

use crate::config::Config;

/// Work deferred until after layout has settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTask {
    ScrollToBottom,
}

/// Schedules deferred work.
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration, task: DeferredTask);
}

/// [`Scheduler`] on a virtual clock.
///
/// Time only moves when [`TimerQueue::advance`] is called, so callers decide
/// whether it tracks wall-clock ticks or test steps.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    seq: u64,
    pending: Vec<Timer>,
}

#[derive(Debug)]
struct Timer {
    due: Duration,
    seq: u64,
    task: DeferredTask,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward and return the tasks now due, earliest first.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<DeferredTask> {
        self.now += elapsed;
        let now = self.now;

        let (mut due, pending): (Vec<Timer>, Vec<Timer>) =
            self.pending.drain(..).partition(|t| t.due <= now);
        self.pending = pending;

        due.sort_by_key(|t| (t.due, t.seq));
        due.into_iter().map(|t| t.task).collect()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Time until the next task is due, if any.
    pub fn next_due_in(&self) -> Option<Duration> {
        self.pending
            .iter()
            .map(|t| t.due.saturating_sub(self.now))
            .min()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl Scheduler for TimerQueue {
    fn schedule(&mut self, delay: Duration, task: DeferredTask) {
        self.seq += 1;
        self.pending.push(Timer {
            due: self.now + delay,
            seq: self.seq,
            task,
        });
    }
}

/// Scroll geometry of the message list, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    /// Offset of the top of the visible area.
    pub scroll_top: u32,
    /// Total content height.
    pub scroll_height: u32,
    /// Visible height.
    pub client_height: u32,
}

impl Viewport {
    /// Distance between the bottom of the visible area and the end of content.
    pub fn distance_from_bottom(&self) -> u32 {
        self.scroll_height
            .saturating_sub(self.scroll_top.saturating_add(self.client_height))
    }

    /// Largest valid `scroll_top`.
    pub fn max_scroll_top(&self) -> u32 {
        self.scroll_height.saturating_sub(self.client_height)
    }

    pub fn is_at_bottom(&self) -> bool {
        self.scroll_top >= self.max_scroll_top()
    }
}

/// Tracks the viewport and decides when to auto-scroll.
#[derive(Debug)]
pub struct ScrollCoordinator {
    viewport: Viewport,
    threshold: u32,
    settle_delay: Duration,
    suppressed: bool,
}

impl ScrollCoordinator {
    pub fn new(threshold: u32, settle_delay: Duration) -> Self {
        Self {
            viewport: Viewport::default(),
            threshold,
            settle_delay,
            suppressed: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.scroll_threshold_px, config.scroll_settle_delay())
    }

    /// The store changed: schedule a scroll to the bottom.
    ///
    /// Scheduled whether or not the reader has scrolled away.
    pub fn on_store_mutated(&mut self, scheduler: &mut dyn Scheduler) {
        scheduler.schedule(self.settle_delay, DeferredTask::ScrollToBottom);
        self.recompute();
    }

    /// Execute a deferred task.
    pub fn run(&mut self, task: DeferredTask) {
        match task {
            DeferredTask::ScrollToBottom => {
                self.viewport.scroll_top = self.viewport.max_scroll_top();
                trace!(scroll_top = self.viewport.scroll_top, "scrolled to bottom");
            }
        }
        self.recompute();
    }

    /// The reader moved the viewport.
    pub fn on_viewport_scrolled(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.recompute();
    }

    pub fn set_content_height(&mut self, height: u32) {
        self.viewport.scroll_height = height;
        self.clamp();
        self.recompute();
    }

    pub fn set_client_height(&mut self, height: u32) {
        self.viewport.client_height = height;
        self.clamp();
        self.recompute();
    }

    /// Scroll by `delta` pixels (negative is up), clamped to the content.
    pub fn scroll_by(&mut self, delta: i64) {
        let top = i64::from(self.viewport.scroll_top) + delta;
        let max = i64::from(self.viewport.max_scroll_top());
        self.viewport.scroll_top = u32::try_from(top.clamp(0, max)).unwrap_or(0);
        self.recompute();
    }

    /// Jump to the bottom immediately.
    pub fn scroll_to_bottom(&mut self) {
        self.run(DeferredTask::ScrollToBottom);
    }

    /// Whether the reader is far enough from the bottom to show the indicator.
    pub fn auto_scroll_suppressed(&self) -> bool {
        self.suppressed
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    fn clamp(&mut self) {
        self.viewport.scroll_top = self.viewport.scroll_top.min(self.viewport.max_scroll_top());
    }

    fn recompute(&mut self) {
        self.suppressed = self.viewport.distance_from_bottom() > self.threshold;
    }
}
