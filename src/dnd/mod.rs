//! Drag and drop: payloads, drop targets and the controller routing between them

mod buttons;
mod controller;
mod payload;
mod target;

pub use buttons::{ButtonDropTarget, ButtonKind};
pub use controller::{DragController, DragEvent, DropResult, SharedScroller, SharedSource, SharedTarget};
pub use payload::{DragObject, DragPayload, ItemContainer, ItemId, ItemInfo, ItemKind};
pub use target::{DragScroller, DragSource, DropOutcome, DropTarget, ScrollDirection, TargetId};
