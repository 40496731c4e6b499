//! Capabilities the drag controller talks to

use serde::Serialize;

use super::payload::{DragObject, DragPayload, ItemId};
use crate::geometry::{Point, Rect};
use crate::timers::Scheduler;

/// Registration handle returned by [`super::DragController::add_target`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TargetId(pub usize);

/// What a target did with an accepted drop
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DropOutcome {
    /// Item placed on a workspace panel
    Placed { panel: usize, cell_x: usize, cell_y: usize },
    /// Item removed from the home screen
    Deleted { item: ItemId },
    /// Item details requested
    ShowInfo { item: ItemId },
    /// System app info requested for the component
    ShowAppInfo { component: String },
}

impl DropOutcome {
    /// Whether the item leaves the container it was dragged from
    pub fn removes_from_source(&self) -> bool {
        matches!(self, DropOutcome::Deleted { .. })
    }
}

/// A UI region that can accept a drag payload
pub trait DropTarget {
    fn name(&self) -> &str;

    /// Disabled targets are never entered, whatever the hit test says
    fn is_drop_enabled(&self) -> bool;

    /// Whether the payload can land here. Must be side-effect free: it is
    /// queried speculatively on every move.
    fn accept_drop(&self, d: &DragObject) -> bool;

    fn on_drag_enter(&mut self, d: &DragObject, scheduler: &mut dyn Scheduler);

    fn on_drag_over(&mut self, d: &DragObject, scheduler: &mut dyn Scheduler);

    fn on_drag_exit(&mut self, d: &DragObject, scheduler: &mut dyn Scheduler);

    fn on_drop(&mut self, d: &DragObject, scheduler: &mut dyn Scheduler) -> DropOutcome;

    /// Routed here instead of [`DropTarget::on_drop`] when the item was flung
    fn on_fling_to_delete(&mut self, d: &DragObject, velocity: Point, scheduler: &mut dyn Scheduler) -> DropOutcome {
        let _ = velocity;
        self.on_drop(d, scheduler)
    }

    /// Hit area in drag layer coordinates
    fn hit_rect(&self) -> Rect;

    /// Called before an accessibility-initiated drop
    fn prepare_accessibility_drop(&mut self) {}

    /// A drag began somewhere on screen
    fn on_drag_start(&mut self, _payload: &DragPayload) {}

    /// The drag is over (after any deferred drop animation)
    fn on_drag_end(&mut self) {}
}

/// Where a drag originates
pub trait DragSource {
    fn supports_fling_to_delete(&self) -> bool;

    /// Called once per drag after the drop is resolved. `outcome` is None
    /// when nothing accepted the item (cancelled or rejected drop).
    fn on_drop_completed(&mut self, d: &DragObject, outcome: Option<&DropOutcome>, is_fling: bool);
}

/// Scroll direction while hovering an edge during a drag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Left,
    Right,
}

/// Container that pages when a drag hovers near the screen edge
pub trait DragScroller {
    fn scroll_left(&mut self);

    fn scroll_right(&mut self);

    /// Returns true if scrolling in `direction` is possible from here
    fn on_enter_scroll_area(&mut self, x: f64, y: f64, direction: ScrollDirection) -> bool;

    fn on_exit_scroll_area(&mut self);
}
