//! Home screen state - owns every component and routes input to them
//!
//! Nothing here is global. A [`HomeScreen`] is built with its config and
//! scheduler, fed touch events and expired timer tokens, and torn down with
//! [`HomeScreen::shutdown`].

use std::cell::{Ref, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::alarm::DeferredAlarm;
use crate::all_apps::AppsList;
use crate::caps::{PlatformCaps, SystemBars};
use crate::config::EngineConfig;
use crate::dnd::{
    ButtonDropTarget, ButtonKind, DragController, DragEvent, DragPayload, DragScroller, ItemId, ItemInfo,
    SharedSource,
};
use crate::geometry::{Point, Rect};
use crate::gesture::{HomeMode, PinchOutcome, PinchSession, TransitionEffect};
use crate::grid::{pages_to_bind_synchronously, Workspace, WorkspaceEvent};
use crate::input::{TouchEvent, TouchTracker};
use crate::scroll_guard::ScrollingContainer;
use crate::timers::{ManualScheduler, Scheduler, TimerToken};

/// Fraction of the screen width a swipe must cover to change page
const PAGE_SWIPE_FRACTION: f64 = 0.25;
/// Release velocity (dp/s) that changes page whatever the distance
const PAGE_FLING_VELOCITY: f64 = 500.0;

/// What the home screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeView {
    Workspace,
    Overview,
    AllApps,
}

impl HomeView {
    /// Pinch mode for this view, if it can be pinched
    pub fn mode(&self) -> Option<HomeMode> {
        match self {
            HomeView::Workspace => Some(HomeMode::Workspace),
            HomeView::Overview => Some(HomeMode::Overview),
            HomeView::AllApps => None,
        }
    }
}

impl From<HomeMode> for HomeView {
    fn from(mode: HomeMode) -> Self {
        match mode {
            HomeMode::Workspace => HomeView::Workspace,
            HomeMode::Overview => HomeView::Overview,
        }
    }
}

/// Everything observable the engine did, in order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum EngineEvent {
    Drag(DragEvent),
    Workspace(WorkspaceEvent),
    Transition(TransitionEffect),
    PinchFinished(PinchOutcome),
    ViewChanged { view: HomeView },
    /// A touch down stopped a crawling all apps fling
    ScrollStopped,
    Restored { pages: Vec<usize> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedEvent {
    pub at: u64,
    pub event: EngineEvent,
}

/// What a long press picks up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LongPressTarget {
    WorkspaceItem(ItemId),
    App(ItemId),
}

/// Gesture owned by the current touch sequence
#[derive(Debug)]
enum Gesture {
    Idle,
    /// Finger down, waiting for a long press or for movement
    Pending { slot: i32 },
    ScrollingList { slot: i32 },
    /// Horizontal page swipe
    Swiping { slot: i32 },
    Dragging { slot: i32 },
    Pinching(PinchSession),
    /// Finished, but fingers are still down
    Consumed,
}

pub struct HomeScreen<S: Scheduler> {
    config: EngineConfig,
    scheduler: S,
    view: HomeView,
    workspace: Rc<RefCell<Workspace>>,
    apps: Rc<RefCell<AppsList>>,
    buttons: Vec<Rc<RefCell<ButtonDropTarget>>>,
    controller: DragController,
    touches: TouchTracker,
    long_press: DeferredAlarm<LongPressTarget>,
    /// Ends the drag of this item once its drop animation is over
    drop_animation: DeferredAlarm<ItemId>,
    gesture: Gesture,
    bars: SystemBars,
    events: Vec<TimedEvent>,
    running: bool,
}

impl<S: Scheduler> HomeScreen<S> {
    pub fn new(config: EngineConfig, scheduler: S, caps: &PlatformCaps, pages: usize, apps: Vec<ItemInfo>) -> Self {
        let screen = Rect::new(0.0, 0.0, config.screen.width, config.screen.height);
        let workspace = Rc::new(RefCell::new(Workspace::new(&config, pages)));
        let apps = Rc::new(RefCell::new(AppsList::new(&config, apps)));

        let mut controller = DragController::new(&config.drag, config.screen.density, screen);
        controller.add_target(workspace.clone());
        controller.set_drag_scroller(workspace.clone());

        // The bar sits above the grid, so its buttons go on top
        let mut buttons = Vec::new();
        for button in ButtonDropTarget::bar(config.screen.width, config.px(config.grid.drop_bar_height)) {
            let kind = button.kind();
            let button = Rc::new(RefCell::new(button));
            let id = controller.add_target(button.clone());
            if kind == ButtonKind::Delete {
                controller.set_fling_to_delete_target(id);
            }
            buttons.push(button);
        }

        let mut bars = SystemBars::new(caps);
        bars.set_transparent(config.system_bars.transparent);

        info!(pages = pages.max(1), apps = apps.borrow().apps().len(), "Home screen ready");
        Self {
            config,
            scheduler,
            view: HomeView::Workspace,
            workspace,
            apps,
            buttons,
            controller,
            touches: TouchTracker::new(),
            long_press: DeferredAlarm::new(TimerToken::LongPress),
            drop_animation: DeferredAlarm::new(TimerToken::DropAnimation),
            gesture: Gesture::Idle,
            bars,
            events: Vec::new(),
            running: true,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn view(&self) -> HomeView {
        self.view
    }

    pub fn workspace(&self) -> Ref<'_, Workspace> {
        self.workspace.borrow()
    }

    pub fn apps(&self) -> Ref<'_, AppsList> {
        self.apps.borrow()
    }

    pub fn controller(&self) -> &DragController {
        &self.controller
    }

    pub fn system_bars(&self) -> &SystemBars {
        &self.bars
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the drop bar button of this kind is hovered by the drag
    pub fn is_button_hovered(&self, kind: ButtonKind) -> bool {
        self.buttons
            .iter()
            .any(|b| b.borrow().kind() == kind && b.borrow().is_hovered())
    }

    /// Place an item on the workspace, e.g. from a saved layout
    pub fn seed_item(&mut self, panel: usize, item: ItemInfo, x: usize, y: usize) -> bool {
        self.workspace.borrow_mut().add_item(panel, item, x, y)
    }

    pub fn take_events(&mut self) -> Vec<TimedEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn set_view(&mut self, view: HomeView) {
        if self.view == view {
            return;
        }
        if self.view == HomeView::AllApps {
            self.apps.borrow_mut().stop_scroll();
            self.scheduler.remove_callbacks(TimerToken::ListFling);
        }
        info!(from = ?self.view, to = ?view, "Home view changed");
        self.view = view;
        self.push(EngineEvent::ViewChanged { view });
    }

    /// Saved page state came back: pick the panels to bind first and show them
    pub fn restore(&mut self, current_page: Option<i64>, total: Option<i64>) -> BTreeSet<usize> {
        let pages = pages_to_bind_synchronously(&*self.workspace.borrow(), current_page, total);
        if let Some(&first) = pages.iter().next() {
            self.workspace.borrow_mut().set_current_page(first);
        }
        self.push(EngineEvent::Restored { pages: pages.iter().copied().collect() });
        self.collect_events();
        pages
    }

    pub fn handle_touch(&mut self, event: TouchEvent) {
        if !self.running {
            return;
        }
        let now = self.scheduler.now_ms();
        trace!(?event, now, "Touch");
        match event {
            TouchEvent::Down { slot, x, y } => self.on_down(slot, Point::new(x, y), now),
            TouchEvent::Motion { slot, x, y } => self.on_motion(slot, Point::new(x, y), now),
            TouchEvent::Up { slot } => self.on_up(slot),
            TouchEvent::Cancel => self.on_cancel(),
        }
        self.collect_events();
    }

    /// Route an expired timer registration to its owner
    pub fn dispatch_timer(&mut self, token: TimerToken) {
        if !self.running {
            return;
        }
        match token {
            TimerToken::LongPress => self.on_long_press(),
            TimerToken::Reorder => self.workspace.borrow_mut().on_reorder_alarm(&mut self.scheduler),
            TimerToken::DragScroll => self.controller.on_scroll_alarm(&mut self.scheduler),
            TimerToken::DropAnimation => self.on_drop_animation_done(),
            TimerToken::ListFling => self.apps.borrow_mut().on_fling_frame(&mut self.scheduler),
        }
        self.collect_events();
    }

    /// Cancel alarms and any drag; later input is ignored
    pub fn shutdown(&mut self) {
        if !self.running {
            return;
        }
        self.long_press.cancel();
        self.drop_animation.cancel();
        if self.controller.is_dragging() {
            self.controller.cancel_drag(&mut self.scheduler);
        }
        // The controller has already delivered the end of drag
        self.controller.on_deferred_end_drag();
        self.apps.borrow_mut().stop_scroll();
        for token in TimerToken::ALL {
            self.scheduler.remove_callbacks(token);
        }
        self.touches.cancel();
        self.gesture = Gesture::Idle;
        self.collect_events();
        self.running = false;
        info!("Home screen shut down");
    }

    fn push(&mut self, event: EngineEvent) {
        let at = self.scheduler.now_ms();
        self.events.push(TimedEvent { at, event });
    }

    fn collect_events(&mut self) {
        for event in self.controller.take_events() {
            self.push(EngineEvent::Drag(event));
        }
        let workspace_events = self.workspace.borrow_mut().take_events();
        for event in workspace_events {
            self.push(EngineEvent::Workspace(event));
        }
    }

    fn on_down(&mut self, slot: i32, pos: Point, now: u64) {
        self.touches.down(slot, pos, now);
        match self.touches.count() {
            1 => self.begin_single(slot, pos),
            2 => self.begin_pinch(now),
            n => debug!(slot, touches = n, "Extra finger ignored"),
        }
    }

    fn begin_single(&mut self, slot: i32, pos: Point) {
        self.gesture = Gesture::Pending { slot };
        let target = match self.view {
            HomeView::AllApps => {
                let (stopped, app) = {
                    let mut apps = self.apps.borrow_mut();
                    let stopped = apps.on_touch_down();
                    (stopped, apps.app_at(pos.x, pos.y).map(|a| a.id))
                };
                if stopped {
                    self.push(EngineEvent::ScrollStopped);
                }
                app.map(LongPressTarget::App)
            }
            HomeView::Workspace => {
                let workspace = self.workspace.borrow();
                workspace
                    .cell_at(pos.x, pos.y, 1, 1)
                    .and_then(|cell| workspace.panel(cell.panel)?.item_at(cell.x, cell.y))
                    .map(|placed| LongPressTarget::WorkspaceItem(placed.item.id))
            }
            HomeView::Overview => None,
        };

        if let Some(target) = target {
            debug!(?target, "Touch down on item, waiting for long press");
            self.long_press.set_listener(target);
            self.long_press.arm(&mut self.scheduler, self.config.timing.long_press_ms);
        }
    }

    fn begin_pinch(&mut self, now: u64) {
        self.long_press.cancel();
        if self.controller.is_dragging() {
            info!("Second finger down, cancelling drag");
            self.controller.cancel_drag(&mut self.scheduler);
        }
        self.gesture = match self.view.mode() {
            Some(mode) => Gesture::Pinching(PinchSession::begin(mode, &self.config.pinch, now)),
            None => {
                self.apps.borrow_mut().stop_scroll();
                Gesture::Consumed
            }
        };
    }

    fn on_motion(&mut self, slot: i32, pos: Point, now: u64) {
        let Some(point) = self.touches.motion(slot, pos, now) else {
            return;
        };
        let (distance, last_delta) = (point.distance(), point.last_delta);
        let slop = self.config.px(self.config.timing.touch_slop);

        self.gesture = match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Pending { slot: s } if s == slot && distance > slop => {
                self.long_press.cancel();
                match self.view {
                    HomeView::AllApps => {
                        self.apps.borrow_mut().drag_by(last_delta.y);
                        Gesture::ScrollingList { slot }
                    }
                    HomeView::Workspace | HomeView::Overview => Gesture::Swiping { slot },
                }
            }
            Gesture::ScrollingList { slot: s } if s == slot => {
                self.apps.borrow_mut().drag_by(last_delta.y);
                Gesture::ScrollingList { slot }
            }
            Gesture::Dragging { slot: s } if s == slot => {
                self.controller.on_drag_move(pos.x, pos.y, &mut self.scheduler);
                Gesture::Dragging { slot }
            }
            Gesture::Pinching(mut session) => match self.touches.pinch_scale() {
                Some(scale) => {
                    session.on_scale(scale, now);
                    for effect in session.take_effects() {
                        self.push(EngineEvent::Transition(effect));
                    }
                    if session.snapped().is_some() {
                        self.finish_pinch(session);
                        Gesture::Consumed
                    } else {
                        Gesture::Pinching(session)
                    }
                }
                None => Gesture::Pinching(session),
            },
            other => other,
        };
    }

    fn on_up(&mut self, slot: i32) {
        let Some(point) = self.touches.up(slot) else {
            return;
        };
        let max_velocity = self.config.px(self.config.drag.max_fling_velocity);
        let remaining = self.touches.count();

        self.gesture = match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Pending { slot: s } if s == slot => {
                self.long_press.cancel();
                if self.view == HomeView::Overview {
                    // Tapping a page in overview goes back to it
                    self.set_view(HomeView::Workspace);
                }
                Gesture::Idle
            }
            Gesture::ScrollingList { slot: s } if s == slot => {
                let velocity = point.tracker.velocity(max_velocity);
                self.apps.borrow_mut().fling(velocity.y, &mut self.scheduler);
                Gesture::Idle
            }
            Gesture::Swiping { slot: s } if s == slot => {
                self.swipe_page(point.delta().x, point.tracker.velocity(max_velocity).x);
                Gesture::Idle
            }
            Gesture::Dragging { slot: s } if s == slot => {
                let pos = point.current_pos;
                let result = self.controller.on_drag_end(pos.x, pos.y, &mut self.scheduler);
                debug!(target = ?result.target, accepted = result.accepted(), is_fling = result.is_fling, "Drag released");
                if let Some(item) = self.controller.deferred_end().filter(|_| result.deferred) {
                    self.drop_animation.set_listener(item);
                    self.drop_animation
                        .arm(&mut self.scheduler, self.config.drag.drop_animation_ms);
                }
                Gesture::Idle
            }
            Gesture::Pinching(session) if remaining < 2 => {
                self.finish_pinch(session);
                Gesture::Consumed
            }
            other => other,
        };

        if remaining == 0 {
            if let Gesture::Consumed = self.gesture {
                self.gesture = Gesture::Idle;
            }
        }
    }

    fn on_cancel(&mut self) {
        self.long_press.cancel();
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Dragging { .. } => self.controller.cancel_drag(&mut self.scheduler),
            Gesture::Pinching(session) => {
                debug!("Pinch cancelled, settling");
                self.finish_pinch(session);
            }
            Gesture::ScrollingList { .. } => self.apps.borrow_mut().stop_scroll(),
            _ => {}
        }
        self.touches.cancel();
    }

    fn finish_pinch(&mut self, session: PinchSession) {
        let (outcome, effects) = session.release();
        for effect in effects {
            self.push(EngineEvent::Transition(effect));
        }
        self.push(EngineEvent::PinchFinished(outcome));
        self.set_view(outcome.mode.into());
    }

    fn swipe_page(&mut self, dx: f64, vx: f64) {
        let distance = self.config.screen.width * PAGE_SWIPE_FRACTION;
        let fling = self.config.px(PAGE_FLING_VELOCITY);
        let mut workspace = self.workspace.borrow_mut();
        if dx < -distance || vx < -fling {
            workspace.scroll_right();
        } else if dx > distance || vx > fling {
            workspace.scroll_left();
        }
    }

    fn on_drop_animation_done(&mut self) {
        let Some(item) = self.drop_animation.on_timer(&mut self.scheduler) else {
            return;
        };
        if self.controller.deferred_end() == Some(item) {
            self.controller.on_deferred_end_drag();
        } else {
            debug!(?item, "Drop animation finished for a drag that already ended");
        }
    }

    fn on_long_press(&mut self) {
        let Some(target) = self.long_press.on_timer(&mut self.scheduler) else {
            return;
        };
        let Gesture::Pending { slot } = self.gesture else {
            debug!(?target, "Long press fired without a pending touch");
            return;
        };
        let Some(pos) = self.touches.get(slot).map(|p| p.current_pos) else {
            return;
        };

        let (payload, source) = match target {
            LongPressTarget::WorkspaceItem(id) => {
                let item = self.workspace.borrow().find_item(id).map(|(_, placed)| placed.item.clone());
                let Some(item) = item else {
                    warn!(?id, "Long pressed item vanished");
                    return;
                };
                let payload = if self.config.drag.drop_animation_ms > 0 {
                    DragPayload::deferred(item)
                } else {
                    DragPayload::new(item)
                };
                let source: SharedSource = self.workspace.clone();
                (payload, source)
            }
            LongPressTarget::App(id) => {
                let item = self.apps.borrow().apps().iter().find(|a| a.id == id).cloned();
                let Some(item) = item else {
                    warn!(?id, "Long pressed app vanished");
                    return;
                };
                // Dragging out of all apps drops onto the workspace
                self.set_view(HomeView::Workspace);
                let source: SharedSource = self.apps.clone();
                (DragPayload::new(item), source)
            }
        };

        info!(item = ?payload.item.id, x = pos.x, y = pos.y, "Long press, starting drag");
        // Starting a drag flushes any end still waiting on its drop animation
        self.drop_animation.cancel();
        self.controller.start_drag(payload, source, pos.x, pos.y, &mut self.scheduler);
        self.gesture = Gesture::Dragging { slot };
    }
}

impl HomeScreen<ManualScheduler> {
    /// Run every timer due up to `until`, then move the clock there
    pub fn advance_to(&mut self, until: u64) {
        while let Some(token) = self.scheduler.pop_due(until) {
            self.dispatch_timer(token);
        }
        self.scheduler.set_now(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dnd::{DropOutcome, ItemContainer};

    // Default screen: 720x1440 at density 2, 96px drop bar, 180x268.8 cells

    fn apps() -> Vec<ItemInfo> {
        (1..=3)
            .map(|i| ItemInfo::app(i, &format!("App {}", i), &format!("org.flick.app{}", i), ItemContainer::AllApps))
            .collect()
    }

    fn home(pages: usize) -> HomeScreen<ManualScheduler> {
        HomeScreen::new(EngineConfig::default(), ManualScheduler::new(), &PlatformCaps::default(), pages, apps())
    }

    fn touch(home: &mut HomeScreen<ManualScheduler>, at: u64, event: TouchEvent) {
        home.advance_to(at);
        home.handle_touch(event);
    }

    fn down(slot: i32, x: f64, y: f64) -> TouchEvent {
        TouchEvent::Down { slot, x, y }
    }

    fn motion(slot: i32, x: f64, y: f64) -> TouchEvent {
        TouchEvent::Motion { slot, x, y }
    }

    fn drag_events(events: &[TimedEvent]) -> Vec<DragEvent> {
        events
            .iter()
            .filter_map(|e| match &e.event {
                EngineEvent::Drag(d) => Some(d.clone()),
                _ => None,
            })
            .collect()
    }

    fn with_item() -> HomeScreen<ManualScheduler> {
        let mut home = home(2);
        let item = ItemInfo::app(10, "Phone", "org.flick.phone", ItemContainer::Workspace);
        assert!(home.seed_item(0, item, 0, 0));
        home
    }

    #[test]
    fn test_long_press_drags_item_to_new_cell() {
        let mut home = with_item();
        touch(&mut home, 0, down(0, 90.0, 230.0));
        touch(&mut home, 500, motion(0, 90.0, 230.0));
        assert!(home.controller().is_dragging());

        touch(&mut home, 600, motion(0, 450.0, 230.0));
        touch(&mut home, 650, TouchEvent::Up { slot: 0 });
        let events = drag_events(&home.take_events());
        assert!(events.contains(&DragEvent::Dropped {
            target: crate::dnd::TargetId(0),
            outcome: DropOutcome::Placed { panel: 0, cell_x: 2, cell_y: 0 },
        }));
        // Workspace drags wait for the drop animation before ending
        assert!(!events.iter().any(|e| matches!(e, DragEvent::Ended { .. })));
        assert!(home.controller().is_end_deferred());

        home.advance_to(1000);
        let events = home.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].at, 950);
        assert_eq!(events[0].event, EngineEvent::Drag(DragEvent::Ended { item: ItemId(10) }));

        let workspace = home.workspace();
        let (panel, placed) = workspace.find_item(ItemId(10)).unwrap();
        assert_eq!((panel, placed.x, placed.y), (0, 2, 0));
    }

    #[test]
    fn test_fling_up_deletes_item() {
        let mut home = with_item();
        touch(&mut home, 0, down(0, 90.0, 230.0));
        home.advance_to(500);
        touch(&mut home, 520, motion(0, 90.0, 130.0));
        touch(&mut home, 540, motion(0, 90.0, 20.0));
        assert!(home.is_button_hovered(ButtonKind::Info));
        touch(&mut home, 540, TouchEvent::Up { slot: 0 });

        let events = home.take_events();
        assert!(drag_events(&events)
            .iter()
            .any(|e| matches!(e, DragEvent::FlungToDelete { outcome: DropOutcome::Deleted { .. }, .. })));
        assert!(events
            .iter()
            .any(|e| e.event == EngineEvent::Workspace(WorkspaceEvent::ItemRemoved { item: ItemId(10) })));
        assert!(home.workspace().find_item(ItemId(10)).is_none());
    }

    #[test]
    fn test_movement_cancels_long_press() {
        let mut home = with_item();
        touch(&mut home, 0, down(0, 90.0, 230.0));
        touch(&mut home, 100, motion(0, 130.0, 230.0));
        home.advance_to(1000);
        assert!(!home.controller().is_dragging());
        touch(&mut home, 1000, TouchEvent::Up { slot: 0 });

        assert!(home.take_events().is_empty());
        assert_eq!(home.workspace().current_page(), 0);
    }

    #[test]
    fn test_swipe_changes_page() {
        let mut home = home(3);
        touch(&mut home, 0, down(0, 600.0, 700.0));
        touch(&mut home, 100, motion(0, 300.0, 700.0));
        touch(&mut home, 100, TouchEvent::Up { slot: 0 });

        assert_eq!(home.workspace().current_page(), 1);
        let events = home.take_events();
        assert!(matches!(
            events[0].event,
            EngineEvent::Workspace(WorkspaceEvent::PageChanged { page: 1, .. })
        ));
    }

    #[test]
    fn test_pinch_in_snaps_to_overview_and_tap_returns() {
        let mut home = home(2);
        touch(&mut home, 0, down(0, 200.0, 700.0));
        touch(&mut home, 10, down(1, 500.0, 700.0));
        // Finger distance 300 -> 180: scale 0.6, past the last threshold
        touch(&mut home, 100, motion(1, 380.0, 700.0));
        assert_eq!(home.view(), HomeView::Overview);

        let events: Vec<EngineEvent> = home.take_events().into_iter().map(|e| e.event).collect();
        assert_eq!(
            events,
            vec![
                EngineEvent::Transition(TransitionEffect::SnapTo { mode: HomeMode::Overview }),
                EngineEvent::PinchFinished(PinchOutcome { mode: HomeMode::Overview, committed: true }),
                EngineEvent::ViewChanged { view: HomeView::Overview },
            ]
        );

        // Lifting the fingers after the snap changes nothing
        touch(&mut home, 120, TouchEvent::Up { slot: 1 });
        touch(&mut home, 130, TouchEvent::Up { slot: 0 });
        assert!(home.take_events().is_empty());

        touch(&mut home, 500, down(0, 300.0, 700.0));
        touch(&mut home, 550, TouchEvent::Up { slot: 0 });
        assert_eq!(home.view(), HomeView::Workspace);
    }

    #[test]
    fn test_second_finger_cancels_drag() {
        let mut home = with_item();
        touch(&mut home, 0, down(0, 90.0, 230.0));
        home.advance_to(500);
        assert!(home.controller().is_dragging());

        touch(&mut home, 600, down(1, 400.0, 800.0));
        assert!(!home.controller().is_dragging());
        let events = home.take_events();
        assert!(drag_events(&events).contains(&DragEvent::Cancelled { item: ItemId(10) }));
        assert!(events
            .iter()
            .any(|e| e.event == EngineEvent::Workspace(WorkspaceEvent::ItemReturned { item: ItemId(10) })));
        assert!(home.workspace().find_item(ItemId(10)).is_some());
    }

    #[test]
    fn test_app_dragged_out_of_all_apps() {
        let mut home = home(1);
        home.set_view(HomeView::AllApps);
        home.take_events();

        // Second row is App 2
        touch(&mut home, 0, down(0, 100.0, 150.0));
        home.advance_to(500);
        assert_eq!(home.view(), HomeView::Workspace);
        assert!(home.controller().is_dragging());

        touch(&mut home, 600, motion(0, 450.0, 700.0));
        touch(&mut home, 700, TouchEvent::Up { slot: 0 });

        let events = drag_events(&home.take_events());
        assert!(events.contains(&DragEvent::Ended { item: ItemId(2) }));
        let workspace = home.workspace();
        let (_, placed) = workspace.find_item(ItemId(2)).unwrap();
        assert_eq!((placed.x, placed.y), (2, 2));
        assert_eq!(placed.item.container, ItemContainer::Workspace);
        // The list keeps its copy
        assert_eq!(home.apps().apps().len(), 3);
    }

    #[test]
    fn test_restore_shows_saved_page() {
        let mut home = home(4);
        assert_eq!(home.restore(Some(2), Some(4)), BTreeSet::from([2]));
        assert_eq!(home.workspace().current_page(), 2);

        assert!(home.restore(Some(4), Some(4)).is_empty());
        assert!(home.restore(None, Some(4)).is_empty());
        assert_eq!(home.workspace().current_page(), 2);

        let restored: Vec<_> = home
            .take_events()
            .into_iter()
            .filter_map(|e| match e.event {
                EngineEvent::Restored { pages } => Some(pages),
                _ => None,
            })
            .collect();
        assert_eq!(restored, vec![vec![2], vec![], vec![]]);
    }

    #[test]
    fn test_back_to_back_deferred_drops_end_on_their_own_animation() {
        let mut config = EngineConfig::default();
        config.drag.drop_animation_ms = 1000;
        let mut home = HomeScreen::new(config, ManualScheduler::new(), &PlatformCaps::default(), 1, apps());
        assert!(home.seed_item(0, ItemInfo::app(10, "Phone", "org.flick.phone", ItemContainer::Workspace), 0, 0));
        assert!(home.seed_item(0, ItemInfo::app(11, "Messages", "org.flick.messages", ItemContainer::Workspace), 1, 0));

        touch(&mut home, 0, down(0, 90.0, 230.0));
        touch(&mut home, 550, motion(0, 450.0, 230.0));
        touch(&mut home, 600, TouchEvent::Up { slot: 0 });
        assert_eq!(home.controller().deferred_end(), Some(ItemId(10)));

        // The second long press lands before the first animation is over
        touch(&mut home, 700, down(0, 270.0, 230.0));
        touch(&mut home, 1250, motion(0, 450.0, 500.0));
        touch(&mut home, 1300, TouchEvent::Up { slot: 0 });
        assert_eq!(home.controller().deferred_end(), Some(ItemId(11)));

        home.advance_to(1700);
        assert!(home.controller().is_end_deferred());
        home.advance_to(3000);
        assert!(!home.controller().is_end_deferred());

        let ended: Vec<(u64, ItemId)> = home
            .take_events()
            .into_iter()
            .filter_map(|e| match e.event {
                EngineEvent::Drag(DragEvent::Ended { item }) => Some((e.at, item)),
                _ => None,
            })
            .collect();
        // The first drag is flushed when the second starts
        assert_eq!(ended, vec![(1200, ItemId(10)), (2300, ItemId(11))]);
    }

    #[test]
    fn test_restore_past_last_page_binds_nothing() {
        let mut home = home(4);
        assert!(home.restore(Some(6), Some(10)).is_empty());
        assert_eq!(home.workspace().current_page(), 0);
        assert_eq!(home.restore(Some(3), Some(10)), BTreeSet::from([3]));
        assert_eq!(home.workspace().current_page(), 3);
    }

    #[test]
    fn test_touch_down_on_crawling_list_still_long_presses() {
        let apps = (1..=40)
            .map(|i| ItemInfo::app(i, &format!("App {}", i), &format!("org.flick.app{}", i), ItemContainer::AllApps))
            .collect();
        let mut home = HomeScreen::new(EngineConfig::default(), ManualScheduler::new(), &PlatformCaps::default(), 1, apps);
        home.set_view(HomeView::AllApps);
        home.take_events();

        home.apps.borrow_mut().fling(-2000.0, &mut home.scheduler);
        // About 2.5px a frame by now, under the 8px threshold
        home.advance_to(400);
        assert_eq!(home.apps().scroll_state(), crate::scroll_guard::ScrollState::Settling);
        let scroll = home.apps().scroll_y();
        let under_finger = home.apps().app_at(100.0, 150.0).map(|a| a.id).unwrap();

        touch(&mut home, 400, down(0, 100.0, 150.0));
        assert_eq!(home.apps().scroll_state(), crate::scroll_guard::ScrollState::Idle);
        assert!(home.long_press.is_pending());
        let events = home.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].at, 400);
        assert_eq!(events[0].event, EngineEvent::ScrollStopped);

        home.advance_to(900);
        assert_eq!(home.apps().scroll_y(), scroll);
        assert!(home.controller().is_dragging());
        assert_eq!(home.view(), HomeView::Workspace);
        let events = home.take_events();
        let started = events
            .iter()
            .find(|e| e.event == EngineEvent::Drag(DragEvent::Started { item: under_finger }))
            .unwrap();
        assert_eq!(started.at, 900);
    }

    #[test]
    fn test_shutdown_cancels_drag_and_timers() {
        let mut home = with_item();
        touch(&mut home, 0, down(0, 90.0, 230.0));
        home.advance_to(500);
        touch(&mut home, 550, motion(0, 700.0, 230.0));

        home.shutdown();
        assert!(!home.is_running());
        assert!(!home.controller().is_dragging());
        assert!(home.scheduler().is_idle());
        assert!(drag_events(&home.take_events()).contains(&DragEvent::Cancelled { item: ItemId(10) }));

        touch(&mut home, 600, down(0, 90.0, 230.0));
        home.advance_to(2000);
        assert!(home.take_events().is_empty());
    }
}
