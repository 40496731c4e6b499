//! Drop targets in the bar at the top of the screen
//!
//! Each button only lights up for payloads it can handle: that decision is
//! made once at drag start and drives `is_drop_enabled` for the whole drag.

use tracing::debug;

use super::payload::{DragObject, DragPayload, ItemContainer, ItemInfo, ItemKind};
use super::target::{DropOutcome, DropTarget};
use crate::geometry::{Point, Rect};
use crate::timers::Scheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    /// Item details
    Info,
    /// Remove from the home screen (also the fling-to-delete target)
    Delete,
    /// System app info for the item's component
    AppInfo,
}

impl ButtonKind {
    pub fn name(&self) -> &'static str {
        match self {
            ButtonKind::Info => "info",
            ButtonKind::Delete => "delete",
            ButtonKind::AppInfo => "app_info",
        }
    }

    /// Whether this button can act on the item
    pub fn supports(&self, item: &ItemInfo) -> bool {
        match self {
            ButtonKind::Info => matches!(item.kind, ItemKind::AppShortcut { .. } | ItemKind::Widget { .. }),
            ButtonKind::Delete => {
                item.container == ItemContainer::Workspace || matches!(item.kind, ItemKind::PendingAdd { .. })
            }
            ButtonKind::AppInfo => matches!(item.kind, ItemKind::AppShortcut { .. }),
        }
    }
}

pub struct ButtonDropTarget {
    kind: ButtonKind,
    rect: Rect,
    /// Set at drag start when the payload is supported
    active: bool,
    hovered: bool,
}

impl ButtonDropTarget {
    pub fn new(kind: ButtonKind, rect: Rect) -> Self {
        Self {
            kind,
            rect,
            active: false,
            hovered: false,
        }
    }

    /// Lay the three buttons out across the drop bar: info, delete, app info
    pub fn bar(screen_width: f64, bar_height: f64) -> [ButtonDropTarget; 3] {
        let w = screen_width / 3.0;
        [
            ButtonDropTarget::new(ButtonKind::Info, Rect::new(0.0, 0.0, w, bar_height)),
            ButtonDropTarget::new(ButtonKind::Delete, Rect::new(w, 0.0, w, bar_height)),
            ButtonDropTarget::new(ButtonKind::AppInfo, Rect::new(2.0 * w, 0.0, screen_width - 2.0 * w, bar_height)),
        ]
    }

    pub fn kind(&self) -> ButtonKind {
        self.kind
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    fn complete(&self, item: &ItemInfo) -> DropOutcome {
        match self.kind {
            ButtonKind::Info => DropOutcome::ShowInfo { item: item.id },
            ButtonKind::Delete => DropOutcome::Deleted { item: item.id },
            ButtonKind::AppInfo => DropOutcome::ShowAppInfo {
                component: item.component().unwrap_or_default().to_string(),
            },
        }
    }
}

impl DropTarget for ButtonDropTarget {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn is_drop_enabled(&self) -> bool {
        self.active
    }

    fn accept_drop(&self, d: &DragObject) -> bool {
        self.kind.supports(d.item())
    }

    fn on_drag_enter(&mut self, _d: &DragObject, _scheduler: &mut dyn Scheduler) {
        self.hovered = true;
    }

    fn on_drag_over(&mut self, _d: &DragObject, _scheduler: &mut dyn Scheduler) {}

    fn on_drag_exit(&mut self, _d: &DragObject, _scheduler: &mut dyn Scheduler) {
        self.hovered = false;
    }

    fn on_drop(&mut self, d: &DragObject, _scheduler: &mut dyn Scheduler) -> DropOutcome {
        let outcome = self.complete(d.item());
        debug!(button = self.kind.name(), ?outcome, "Button drop");
        outcome
    }

    fn on_fling_to_delete(&mut self, d: &DragObject, velocity: Point, _scheduler: &mut dyn Scheduler) -> DropOutcome {
        debug!(button = self.kind.name(), vx = velocity.x, vy = velocity.y, "Flung onto button");
        self.complete(d.item())
    }

    fn hit_rect(&self) -> Rect {
        self.rect
    }

    fn on_drag_start(&mut self, payload: &DragPayload) {
        self.active = self.kind.supports(&payload.item);
    }

    fn on_drag_end(&mut self) {
        self.active = false;
        self.hovered = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timers::ManualScheduler;

    fn object(item: ItemInfo) -> DragObject {
        DragObject::new(DragPayload::new(item), 10.0, 10.0)
    }

    #[test]
    fn test_supported_items_per_button() {
        let app = ItemInfo::app(1, "Phone", "org.flick.phone", ItemContainer::Workspace);
        let drawer_app = ItemInfo::app(2, "Phone", "org.flick.phone", ItemContainer::AllApps);
        let widget = ItemInfo::widget(3, "Clock", "org.flick.clock", 2, 2);

        assert!(ButtonKind::Info.supports(&app));
        assert!(ButtonKind::Info.supports(&widget));
        assert!(ButtonKind::Delete.supports(&app));
        assert!(!ButtonKind::Delete.supports(&drawer_app));
        assert!(ButtonKind::AppInfo.supports(&drawer_app));
        assert!(!ButtonKind::AppInfo.supports(&widget));
    }

    #[test]
    fn test_enabled_only_during_supported_drag() {
        let mut button = ButtonDropTarget::new(ButtonKind::AppInfo, Rect::new(0.0, 0.0, 100.0, 48.0));
        assert!(!button.is_drop_enabled());

        button.on_drag_start(&DragPayload::new(ItemInfo::widget(3, "Clock", "org.flick.clock", 2, 2)));
        assert!(!button.is_drop_enabled());

        button.on_drag_start(&DragPayload::new(ItemInfo::app(1, "Phone", "org.flick.phone", ItemContainer::AllApps)));
        assert!(button.is_drop_enabled());

        button.on_drag_end();
        assert!(!button.is_drop_enabled());
    }

    #[test]
    fn test_drop_outcomes() {
        let mut sched = ManualScheduler::new();
        let app = ItemInfo::app(1, "Phone", "org.flick.phone", ItemContainer::Workspace);
        let [mut info, mut delete, mut app_info] = ButtonDropTarget::bar(300.0, 48.0);

        assert_eq!(info.on_drop(&object(app.clone()), &mut sched), DropOutcome::ShowInfo { item: app.id });
        assert_eq!(delete.on_drop(&object(app.clone()), &mut sched), DropOutcome::Deleted { item: app.id });
        assert_eq!(
            app_info.on_drop(&object(app), &mut sched),
            DropOutcome::ShowAppInfo { component: "org.flick.phone".to_string() }
        );
        assert_eq!(delete.hit_rect(), Rect::new(100.0, 0.0, 100.0, 48.0));
    }
}
