//! All apps list
//!
//! One app per row, scrolled by dragging and by flings that decelerate frame by
//! frame on the `ListFling` timer. Long pressing a row drags the app out onto
//! the workspace.

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::dnd::{DragObject, DragSource, DropOutcome, ItemContainer, ItemInfo};
use crate::geometry::Rect;
use crate::scroll_guard::{ScrollInterceptGuard, ScrollState, ScrollingContainer};
use crate::timers::{Scheduler, TimerToken};

/// Below this speed (px/s) a fling stops
const MIN_FLING_VELOCITY: f64 = 50.0;

pub struct AppsList {
    apps: Vec<ItemInfo>,
    viewport: Rect,
    row_height: f64,
    scroll_y: f64,
    /// px/s, positive scrolls further down the list
    velocity: f64,
    state: ScrollState,
    guard: ScrollInterceptGuard,
    friction: f64,
    frame_ms: u64,
}

impl AppsList {
    pub fn new(config: &EngineConfig, apps: Vec<ItemInfo>) -> Self {
        let apps = apps
            .into_iter()
            .map(|mut app| {
                app.container = ItemContainer::AllApps;
                app
            })
            .collect();
        Self {
            apps,
            viewport: Rect::new(0.0, 0.0, config.screen.width, config.screen.height),
            row_height: config.px(config.scroll.row_height).max(1.0),
            scroll_y: 0.0,
            velocity: 0.0,
            state: ScrollState::Idle,
            guard: ScrollInterceptGuard::new(config.scroll.delta_threshold_dp, config.screen.density),
            friction: config.scroll.fling_friction.clamp(0.0, 0.999),
            frame_ms: config.scroll.frame_interval_ms.max(1),
        }
    }

    pub fn apps(&self) -> &[ItemInfo] {
        &self.apps
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    pub fn max_scroll(&self) -> f64 {
        (self.apps.len() as f64 * self.row_height - self.viewport.height).max(0.0)
    }

    pub fn guard(&self) -> &ScrollInterceptGuard {
        &self.guard
    }

    /// App under a point on screen
    pub fn app_at(&self, x: f64, y: f64) -> Option<&ItemInfo> {
        if !self.viewport.contains(x, y) {
            return None;
        }
        let row = ((y - self.viewport.y + self.scroll_y) / self.row_height) as usize;
        self.apps.get(row)
    }

    /// Touch down on the list. Returns true if it stopped a crawling fling.
    pub fn on_touch_down(&mut self) -> bool {
        let guard = self.guard;
        guard.on_touch_down(self)
    }

    /// Finger dragged the content by `dy` (positive moves the finger down)
    pub fn drag_by(&mut self, dy: f64) {
        self.state = ScrollState::Dragging;
        self.velocity = 0.0;
        self.scroll_by(-dy);
    }

    /// Finger lifted with `velocity_y` px/s (screen direction)
    pub fn fling(&mut self, velocity_y: f64, scheduler: &mut dyn Scheduler) {
        scheduler.remove_callbacks(TimerToken::ListFling);
        self.velocity = -velocity_y;
        if self.velocity.abs() < MIN_FLING_VELOCITY {
            self.state = ScrollState::Idle;
            return;
        }
        debug!(velocity = self.velocity, "All apps fling");
        self.state = ScrollState::Settling;
        scheduler.post_delayed(TimerToken::ListFling, self.frame_ms);
    }

    /// One frame of fling deceleration
    pub fn on_fling_frame(&mut self, scheduler: &mut dyn Scheduler) {
        if self.state != ScrollState::Settling {
            return;
        }
        let dy = self.velocity * self.frame_ms as f64 / 1000.0;
        let moved = self.scroll_by(dy);
        self.velocity *= self.friction;

        if self.velocity.abs() < MIN_FLING_VELOCITY || moved == 0.0 {
            self.velocity = 0.0;
            self.state = ScrollState::Idle;
            debug!(scroll_y = self.scroll_y, "All apps fling settled");
        } else {
            scheduler.post_delayed(TimerToken::ListFling, self.frame_ms);
        }
    }

    fn scroll_by(&mut self, dy: f64) -> f64 {
        let before = self.scroll_y;
        self.scroll_y = (self.scroll_y + dy).clamp(0.0, self.max_scroll());
        let moved = self.scroll_y - before;
        self.guard.on_scrolled(0.0, moved);
        moved
    }
}

impl ScrollingContainer for AppsList {
    fn scroll_state(&self) -> ScrollState {
        self.state
    }

    fn stop_scroll(&mut self) {
        // A pending fling frame sees Idle and does nothing
        self.velocity = 0.0;
        self.state = ScrollState::Idle;
    }
}

impl DragSource for AppsList {
    fn supports_fling_to_delete(&self) -> bool {
        false
    }

    fn on_drop_completed(&mut self, d: &DragObject, outcome: Option<&DropOutcome>, _is_fling: bool) {
        // The list keeps its copy whatever happened to the dragged one
        info!(item = ?d.item().id, ?outcome, "Drag from all apps completed");
    }
}
