//! Stop an almost finished fling when a new touch lands
//!
//! A list that is still settling by a pixel or two per frame would otherwise
//! swallow the next tap as a "catch the fling" gesture.

use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollState {
    Idle,
    /// Finger is moving the content
    Dragging,
    /// Fling deceleration in progress
    Settling,
}

/// A scrolling container the guard can inspect and stop
pub trait ScrollingContainer {
    fn scroll_state(&self) -> ScrollState;

    fn stop_scroll(&mut self);
}

#[derive(Debug, Clone, Copy)]
pub struct ScrollInterceptGuard {
    /// Pixels; deltas below this count as "almost stopped"
    delta_threshold: f64,
    last_dy: f64,
}

impl ScrollInterceptGuard {
    pub fn new(delta_threshold_dp: f64, density: f64) -> Self {
        Self {
            delta_threshold: delta_threshold_dp * density,
            last_dy: 0.0,
        }
    }

    pub fn delta_threshold(&self) -> f64 {
        self.delta_threshold
    }

    /// Record the delta of every scroll step
    pub fn on_scrolled(&mut self, _dx: f64, dy: f64) {
        self.last_dy = dy;
    }

    pub fn last_delta(&self) -> f64 {
        self.last_dy
    }

    pub fn should_stop_scroll(&self, state: ScrollState) -> bool {
        self.last_dy.abs() < self.delta_threshold && state != ScrollState::Idle
    }

    /// A touch went down on the container. Stops a crawling fling so the
    /// touch reaches the children. Never intercepts the down itself.
    ///
    /// Returns true if the scroll was stopped.
    pub fn on_touch_down(&self, container: &mut dyn ScrollingContainer) -> bool {
        if self.should_stop_scroll(container.scroll_state()) {
            debug!(last_dy = self.last_dy, threshold = self.delta_threshold, "Stopping slow fling on touch down");
            container.stop_scroll();
            true
        } else {
            false
        }
    }
}
