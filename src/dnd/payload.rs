//! Items carried by a drag

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

/// What a home screen item is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemKind {
    /// Launcher shortcut for an installed app
    AppShortcut { component: String },
    /// Hosted widget
    Widget { provider: String },
    /// Item being added from a picker, not yet bound to the model
    PendingAdd { component: String },
}

/// Where an item currently lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemContainer {
    Workspace,
    AllApps,
    Picker,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub id: ItemId,
    pub title: String,
    pub kind: ItemKind,
    pub container: ItemContainer,
    pub span_x: usize,
    pub span_y: usize,
}

impl ItemInfo {
    pub fn app(id: u64, title: &str, component: &str, container: ItemContainer) -> Self {
        Self {
            id: ItemId(id),
            title: title.to_string(),
            kind: ItemKind::AppShortcut { component: component.to_string() },
            container,
            span_x: 1,
            span_y: 1,
        }
    }

    pub fn widget(id: u64, title: &str, provider: &str, span_x: usize, span_y: usize) -> Self {
        Self {
            id: ItemId(id),
            title: title.to_string(),
            kind: ItemKind::Widget { provider: provider.to_string() },
            container: ItemContainer::Workspace,
            span_x: span_x.max(1),
            span_y: span_y.max(1),
        }
    }

    /// Component name for items that map to an app
    pub fn component(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::AppShortcut { component } | ItemKind::PendingAdd { component } => {
                Some(component)
            }
            ItemKind::Widget { provider } => Some(provider),
        }
    }
}

/// The item being dragged. Read-only to drop targets.
#[derive(Debug, Clone, PartialEq)]
pub struct DragPayload {
    pub item: ItemInfo,
    /// Keep the drag visual alive until the post-drop animation completes
    pub defer_cleanup_post_animation: bool,
}

impl DragPayload {
    pub fn new(item: ItemInfo) -> Self {
        Self {
            item,
            defer_cleanup_post_animation: false,
        }
    }

    pub fn deferred(item: ItemInfo) -> Self {
        Self {
            item,
            defer_cleanup_post_animation: true,
        }
    }
}

/// Drag state handed to drop targets on every callback
#[derive(Debug, Clone)]
pub struct DragObject {
    pub payload: DragPayload,
    /// Pointer position in drag layer coordinates
    pub x: f64,
    pub y: f64,
    /// Set once the pointer went up and the drop is being resolved
    pub drag_complete: bool,
    pub cancelled: bool,
    pub accessible_drag: bool,
}

impl DragObject {
    pub fn new(payload: DragPayload, x: f64, y: f64) -> Self {
        Self {
            payload,
            x,
            y,
            drag_complete: false,
            cancelled: false,
            accessible_drag: false,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn item(&self) -> &ItemInfo {
        &self.payload.item
    }
}
