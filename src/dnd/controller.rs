//! Drag controller - routes a moving pointer to exactly one drop target
//!
//! Targets are kept in registration order; hit testing walks the list from
//! the back, so the most recently added enabled target wins overlaps. At most
//! one target is active (entered and not yet exited) at any time, and
//! `on_drop` runs at most once per drag, on the target active at pointer up.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, info, trace};

use super::payload::{DragObject, DragPayload, ItemId};
use super::target::{DragScroller, DragSource, DropOutcome, DropTarget, ScrollDirection, TargetId};
use crate::alarm::DeferredAlarm;
use crate::config::DragConfig;
use crate::geometry::{Point, Rect};
use crate::input::VelocityTracker;
use crate::timers::{Scheduler, TimerToken};

pub type SharedTarget = Rc<RefCell<dyn DropTarget>>;
pub type SharedSource = Rc<RefCell<dyn DragSource>>;
pub type SharedScroller = Rc<RefCell<dyn DragScroller>>;

/// Observable drag lifecycle, drained with [`DragController::take_events`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DragEvent {
    Started { item: ItemId },
    Entered { target: TargetId, name: String },
    Exited { target: TargetId, name: String },
    Dropped { target: TargetId, outcome: DropOutcome },
    FlungToDelete { target: TargetId, outcome: DropOutcome, velocity: Point },
    /// Pointer went up with no accepting target; the item returns home
    Rejected { target: Option<TargetId> },
    Cancelled { item: ItemId },
    EdgeScroll { direction: ScrollDirection },
    Ended { item: ItemId },
}

/// Result of releasing the pointer
#[derive(Debug, Clone, PartialEq)]
pub struct DropResult {
    pub target: Option<TargetId>,
    pub outcome: Option<DropOutcome>,
    pub is_fling: bool,
    /// End-of-drag notification waits for [`DragController::on_deferred_end_drag`]
    pub deferred: bool,
}

impl DropResult {
    pub fn accepted(&self) -> bool {
        self.outcome.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeScrollState {
    OutsideZone,
    WaitingInZone,
}

struct DragSession {
    object: DragObject,
    source: SharedSource,
    last_target: Option<TargetId>,
    velocity: VelocityTracker,
    last_touch: Point,
    distance_since_scroll: f64,
}

/// Drag thresholds resolved to pixels
#[derive(Debug, Clone)]
struct DragMetrics {
    fling_to_delete_min_velocity: f64,
    max_fling_radians: f64,
    max_fling_velocity: f64,
    scroll_zone: f64,
    scroll_delay_ms: u64,
    rescroll_delay_ms: u64,
    window_touch_slop: f64,
    vertical_bar_layout: bool,
}

impl DragMetrics {
    fn new(config: &DragConfig, density: f64) -> Self {
        Self {
            fling_to_delete_min_velocity: config.fling_to_delete_min_velocity * density,
            max_fling_radians: config.max_fling_degrees.to_radians(),
            max_fling_velocity: config.max_fling_velocity * density,
            scroll_zone: config.scroll_zone * density,
            scroll_delay_ms: config.scroll_delay_ms,
            rescroll_delay_ms: config.rescroll_delay_ms,
            window_touch_slop: config.window_touch_slop * density,
            vertical_bar_layout: config.vertical_bar_layout,
        }
    }
}

pub struct DragController {
    metrics: DragMetrics,
    /// Drag layer bounds; pointer positions are clamped into it
    layer: Rect,
    targets: Vec<(TargetId, SharedTarget)>,
    next_target_id: usize,
    fling_to_delete_target: Option<TargetId>,
    scroller: Option<SharedScroller>,
    session: Option<DragSession>,
    /// Item whose end-of-drag is waiting on the drop animation
    deferred_end: Option<ItemId>,
    scroll_state: EdgeScrollState,
    scroll_alarm: DeferredAlarm<ScrollDirection>,
    last_touch_up: Option<u64>,
    events: Vec<DragEvent>,
}

fn lookup(targets: &[(TargetId, SharedTarget)], id: TargetId) -> Option<&SharedTarget> {
    targets.iter().find(|(tid, _)| *tid == id).map(|(_, t)| t)
}

impl DragController {
    pub fn new(config: &DragConfig, density: f64, layer: Rect) -> Self {
        Self {
            metrics: DragMetrics::new(config, density),
            layer,
            targets: Vec::new(),
            next_target_id: 0,
            fling_to_delete_target: None,
            scroller: None,
            session: None,
            deferred_end: None,
            scroll_state: EdgeScrollState::OutsideZone,
            scroll_alarm: DeferredAlarm::new(TimerToken::DragScroll),
            last_touch_up: None,
            events: Vec::new(),
        }
    }

    /// Add a target. Later registrations sit on top of earlier ones.
    pub fn add_target(&mut self, target: SharedTarget) -> TargetId {
        let id = TargetId(self.next_target_id);
        self.next_target_id += 1;
        debug!(?id, name = target.borrow().name(), "Drop target registered");
        self.targets.push((id, target));
        id
    }

    /// Stop sending drop events to a target
    pub fn remove_target(&mut self, id: TargetId) {
        self.targets.retain(|(tid, _)| *tid != id);
        if let Some(session) = self.session.as_mut() {
            if session.last_target == Some(id) {
                session.last_target = None;
            }
        }
        if self.fling_to_delete_target == Some(id) {
            self.fling_to_delete_target = None;
        }
    }

    pub fn set_fling_to_delete_target(&mut self, id: TargetId) {
        self.fling_to_delete_target = Some(id);
    }

    /// Container paged when the pointer hovers the screen edges
    pub fn set_drag_scroller(&mut self, scroller: SharedScroller) {
        self.scroller = Some(scroller);
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Target currently entered by the drag
    pub fn active_target(&self) -> Option<TargetId> {
        self.session.as_ref().and_then(|s| s.last_target)
    }

    pub fn drag_object(&self) -> Option<&DragObject> {
        self.session.as_ref().map(|s| &s.object)
    }

    pub fn is_end_deferred(&self) -> bool {
        self.deferred_end.is_some()
    }

    /// Item whose end of drag waits for the drop animation
    pub fn deferred_end(&self) -> Option<ItemId> {
        self.deferred_end
    }

    pub fn last_touch_up(&self) -> Option<u64> {
        self.last_touch_up
    }

    pub fn take_events(&mut self) -> Vec<DragEvent> {
        std::mem::take(&mut self.events)
    }

    /// Start a drag at pointer position (x, y)
    pub fn start_drag(
        &mut self,
        payload: DragPayload,
        source: SharedSource,
        x: f64,
        y: f64,
        scheduler: &mut dyn Scheduler,
    ) {
        if self.session.is_some() {
            self.cancel_drag(scheduler);
        }
        // A new drag supersedes a pending deferred end
        self.on_deferred_end_drag();

        let pos = self.layer.clamp_point(x, y);
        let item = payload.item.id;
        info!(?item, title = %payload.item.title, "Drag started");

        for (_, target) in &self.targets {
            target.borrow_mut().on_drag_start(&payload);
        }

        let mut velocity = VelocityTracker::new();
        velocity.add_movement(scheduler.now_ms(), pos);
        self.session = Some(DragSession {
            object: DragObject::new(payload, pos.x, pos.y),
            source,
            last_target: None,
            velocity,
            last_touch: pos,
            distance_since_scroll: 0.0,
        });
        self.scroll_state = EdgeScrollState::OutsideZone;
        self.events.push(DragEvent::Started { item });

        self.handle_move_event(pos, scheduler);
    }

    /// Pointer moved during a drag
    pub fn on_drag_move(&mut self, x: f64, y: f64, scheduler: &mut dyn Scheduler) {
        let pos = self.layer.clamp_point(x, y);
        let now = scheduler.now_ms();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.velocity.add_movement(now, pos);
        self.handle_move_event(pos, scheduler);
    }

    /// Pointer released. Resolves the drop and ends the drag.
    pub fn on_drag_end(&mut self, x: f64, y: f64, scheduler: &mut dyn Scheduler) -> DropResult {
        let pos = self.layer.clamp_point(x, y);
        let now = scheduler.now_ms();
        self.last_touch_up = Some(now);

        let fling = match self.session.as_mut() {
            Some(session) => {
                session.velocity.add_movement(now, pos);
                session.object.x = pos.x;
                session.object.y = pos.y;
                self.is_flinging_to_delete()
            }
            None => {
                return DropResult {
                    target: None,
                    outcome: None,
                    is_fling: false,
                    deferred: false,
                }
            }
        };

        let target = match fling {
            Some(_) => self.fling_to_delete_target,
            None => self.find_drop_target(),
        };

        let (outcome, is_fling) = self.drop(target, fling, scheduler);
        let deferred = self.end_drag();
        DropResult {
            target,
            outcome,
            is_fling,
            deferred,
        }
    }

    /// Stop dragging without dropping
    pub fn cancel_drag(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(session) = self.session.as_mut() {
            if let Some(prev) = session.last_target.take() {
                if let Some(t) = lookup(&self.targets, prev) {
                    let mut t = t.borrow_mut();
                    t.on_drag_exit(&session.object, scheduler);
                    self.events.push(DragEvent::Exited { target: prev, name: t.name().to_string() });
                }
            }
            session.object.payload.defer_cleanup_post_animation = false;
            session.object.cancelled = true;
            session.object.drag_complete = true;
            session.source.borrow_mut().on_drop_completed(&session.object, None, false);
            info!(item = ?session.object.item().id, "Drag cancelled");
            self.events.push(DragEvent::Cancelled { item: session.object.item().id });
        }
        self.end_drag();
    }

    /// The pointer left the window: deactivate the current target
    pub fn on_drag_exit_window(&mut self, scheduler: &mut dyn Scheduler) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(prev) = session.last_target.take() {
            if let Some(t) = lookup(&self.targets, prev) {
                let mut t = t.borrow_mut();
                t.on_drag_exit(&session.object, scheduler);
                self.events.push(DragEvent::Exited { target: prev, name: t.name().to_string() });
            }
        }
    }

    /// Re-run hit testing at the last pointer position (after the layout
    /// under the pointer changed, e.g. a page scroll)
    pub fn force_touch_move(&mut self, scheduler: &mut dyn Scheduler) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.object.x = session.last_touch.x;
        session.object.y = session.last_touch.y;
        let candidate = self.find_drop_target();
        self.check_touch_move(candidate, scheduler);
    }

    /// Accessibility drags have no pointer stream: prime the target at
    /// `(x, y)` and drop straight away
    pub fn complete_accessible_drag(&mut self, x: f64, y: f64, scheduler: &mut dyn Scheduler) -> DropResult {
        let pos = self.layer.clamp_point(x, y);
        if let Some(session) = self.session.as_mut() {
            session.object.accessible_drag = true;
            session.object.x = pos.x;
            session.object.y = pos.y;
            session.last_touch = pos;
        }
        let target = self.find_drop_target();
        self.check_touch_move(target, scheduler);
        if let Some(t) = target.and_then(|id| lookup(&self.targets, id)) {
            t.borrow_mut().prepare_accessibility_drop();
        }
        let (outcome, is_fling) = self.drop(target, None, scheduler);
        let deferred = self.end_drag();
        DropResult {
            target,
            outcome,
            is_fling,
            deferred,
        }
    }

    /// The drop animation finished; deliver the postponed end of drag
    pub fn on_deferred_end_drag(&mut self) {
        if let Some(item) = self.deferred_end.take() {
            debug!(?item, "Deferred drag end delivered");
            self.notify_drag_end(item);
        }
    }

    /// Edge scroll timer expired
    pub fn on_scroll_alarm(&mut self, scheduler: &mut dyn Scheduler) {
        let Some(direction) = self.scroll_alarm.on_timer(scheduler) else {
            return;
        };
        if let Some(scroller) = self.scroller.clone() {
            let mut scroller = scroller.borrow_mut();
            match direction {
                ScrollDirection::Left => scroller.scroll_left(),
                ScrollDirection::Right => scroller.scroll_right(),
            }
            scroller.on_exit_scroll_area();
        }
        self.scroll_state = EdgeScrollState::OutsideZone;
        self.events.push(DragEvent::EdgeScroll { direction });
        debug!(?direction, "Edge scroll");

        if let Some(session) = self.session.as_mut() {
            session.distance_since_scroll = 0.0;
            let last = session.last_touch;
            // Requeue if the pointer is still in the zone
            self.check_scroll_state(last, scheduler);
            self.force_touch_move(scheduler);
        }
    }

    fn handle_move_event(&mut self, pos: Point, scheduler: &mut dyn Scheduler) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.object.x = pos.x;
        session.object.y = pos.y;
        session.distance_since_scroll += session.last_touch.distance_to(pos);
        session.last_touch = pos;

        let candidate = self.find_drop_target();
        self.check_touch_move(candidate, scheduler);
        self.check_scroll_state(pos, scheduler);
    }

    /// Topmost enabled target under the pointer that accepts the payload
    fn find_drop_target(&self) -> Option<TargetId> {
        let session = self.session.as_ref()?;
        let d = &session.object;
        self.targets.iter().rev().find_map(|(id, target)| {
            let target = target.borrow();
            if !target.is_drop_enabled() {
                return None;
            }
            if target.hit_rect().contains(d.x, d.y) && target.accept_drop(d) {
                Some(*id)
            } else {
                None
            }
        })
    }

    fn check_touch_move(&mut self, candidate: Option<TargetId>, scheduler: &mut dyn Scheduler) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let last = session.last_target;
        if let Some(id) = candidate {
            if last != Some(id) {
                if let Some(prev) = last.and_then(|prev| lookup(&self.targets, prev).map(|t| (prev, t))) {
                    let mut t = prev.1.borrow_mut();
                    t.on_drag_exit(&session.object, scheduler);
                    self.events.push(DragEvent::Exited { target: prev.0, name: t.name().to_string() });
                }
                if let Some(t) = lookup(&self.targets, id) {
                    let mut t = t.borrow_mut();
                    t.on_drag_enter(&session.object, scheduler);
                    self.events.push(DragEvent::Entered { target: id, name: t.name().to_string() });
                }
            }
            if let Some(t) = lookup(&self.targets, id) {
                trace!(target = ?id, x = session.object.x, y = session.object.y, "Drag over");
                t.borrow_mut().on_drag_over(&session.object, scheduler);
            }
        } else if let Some(prev) = last {
            if let Some(t) = lookup(&self.targets, prev) {
                let mut t = t.borrow_mut();
                t.on_drag_exit(&session.object, scheduler);
                self.events.push(DragEvent::Exited { target: prev, name: t.name().to_string() });
            }
        }
        session.last_target = candidate;
    }

    fn check_scroll_state(&mut self, pos: Point, scheduler: &mut dyn Scheduler) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let delay = if session.distance_since_scroll < self.metrics.window_touch_slop {
            self.metrics.rescroll_delay_ms
        } else {
            self.metrics.scroll_delay_ms
        };

        let direction = if pos.x < self.layer.x + self.metrics.scroll_zone {
            Some(ScrollDirection::Left)
        } else if pos.x > self.layer.right() - self.metrics.scroll_zone {
            Some(ScrollDirection::Right)
        } else {
            None
        };

        match direction {
            Some(direction) => {
                if self.scroll_state != EdgeScrollState::OutsideZone {
                    return;
                }
                self.scroll_state = EdgeScrollState::WaitingInZone;
                let can_scroll = self
                    .scroller
                    .as_ref()
                    .is_some_and(|s| s.borrow_mut().on_enter_scroll_area(pos.x, pos.y, direction));
                if can_scroll {
                    self.scroll_alarm.set_listener(direction);
                    self.scroll_alarm.arm(scheduler, delay);
                }
            }
            None => self.clear_scroll(),
        }
    }

    fn clear_scroll(&mut self) {
        self.scroll_alarm.cancel();
        if self.scroll_state == EdgeScrollState::WaitingInZone {
            self.scroll_state = EdgeScrollState::OutsideZone;
            if let Some(scroller) = &self.scroller {
                scroller.borrow_mut().on_exit_scroll_area();
            }
        }
    }

    /// Whether the release velocity is a fling towards the delete target
    fn is_flinging_to_delete(&self) -> Option<Point> {
        self.fling_to_delete_target?;
        let session = self.session.as_ref()?;
        if !session.source.borrow().supports_fling_to_delete() {
            return None;
        }

        let vel = session.velocity.velocity(self.metrics.max_fling_velocity);
        let threshold = self.metrics.fling_to_delete_min_velocity;
        let mut theta = self.metrics.max_fling_radians + 1.0;
        if vel.y < threshold {
            theta = vel.angle_to(Point::new(0.0, -1.0));
        } else if self.metrics.vertical_bar_layout && vel.x < threshold {
            theta = vel.angle_to(Point::new(-1.0, 0.0));
        }
        if theta <= self.metrics.max_fling_radians {
            debug!(vx = vel.x, vy = vel.y, "Fling to delete detected");
            Some(vel)
        } else {
            None
        }
    }

    /// Move the drag onto `target` and let it take the drop
    fn drop(
        &mut self,
        target: Option<TargetId>,
        fling: Option<Point>,
        scheduler: &mut dyn Scheduler,
    ) -> (Option<DropOutcome>, bool) {
        // Make the final target the active one
        self.check_touch_move_to(target, scheduler);

        let Some(session) = self.session.as_mut() else {
            return (None, false);
        };
        session.object.drag_complete = true;

        let mut outcome = None;
        if let Some(id) = target {
            if let Some(t) = lookup(&self.targets, id) {
                let mut t = t.borrow_mut();
                t.on_drag_exit(&session.object, scheduler);
                if t.accept_drop(&session.object) {
                    let result = match fling {
                        Some(velocity) => {
                            let result = t.on_fling_to_delete(&session.object, velocity, scheduler);
                            self.events.push(DragEvent::FlungToDelete { target: id, outcome: result.clone(), velocity });
                            result
                        }
                        None => {
                            let result = t.on_drop(&session.object, scheduler);
                            self.events.push(DragEvent::Dropped { target: id, outcome: result.clone() });
                            result
                        }
                    };
                    info!(target = ?id, name = t.name(), outcome = ?result, "Drop accepted");
                    outcome = Some(result);
                }
            }
        }
        session.last_target = None;

        if outcome.is_none() {
            info!(?target, "Drop rejected, returning item");
            self.events.push(DragEvent::Rejected { target });
        }
        session
            .source
            .borrow_mut()
            .on_drop_completed(&session.object, outcome.as_ref(), fling.is_some());
        (outcome, fling.is_some())
    }

    /// Like `check_touch_move` but without the `on_drag_over` for the new target
    fn check_touch_move_to(&mut self, target: Option<TargetId>, scheduler: &mut dyn Scheduler) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.last_target == target {
            return;
        }
        if let Some(prev) = session.last_target {
            if let Some(t) = lookup(&self.targets, prev) {
                let mut t = t.borrow_mut();
                t.on_drag_exit(&session.object, scheduler);
                self.events.push(DragEvent::Exited { target: prev, name: t.name().to_string() });
            }
        }
        session.last_target = target;
        if let Some(id) = target {
            if let Some(t) = lookup(&self.targets, id) {
                let mut t = t.borrow_mut();
                t.on_drag_enter(&session.object, scheduler);
                self.events.push(DragEvent::Entered { target: id, name: t.name().to_string() });
            }
        }
    }

    /// Tear down the session. Returns true when the end notification is
    /// deferred until the drop animation completes.
    fn end_drag(&mut self) -> bool {
        self.clear_scroll();
        let Some(session) = self.session.take() else {
            return false;
        };
        let item = session.object.item().id;
        if session.object.payload.defer_cleanup_post_animation {
            debug!(?item, "Drag end deferred until drop animation completes");
            self.deferred_end = Some(item);
            true
        } else {
            self.notify_drag_end(item);
            false
        }
    }

    fn notify_drag_end(&mut self, item: ItemId) {
        for (_, target) in &self.targets {
            target.borrow_mut().on_drag_end();
        }
        self.events.push(DragEvent::Ended { item });
    }
}
