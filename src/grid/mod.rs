//! Home screen grid: panels, reorder previews and page addressing

mod cell_layout;
mod container;
mod reorder;
mod restore;
mod workspace;

pub use cell_layout::{CellLayout, CellMove, CellRegion, PlacedItem};
pub use container::CellLayoutContainer;
pub use reorder::{ReorderOffset, ReorderOffsets};
pub use restore::pages_to_bind_synchronously;
pub use workspace::{DropCell, Workspace, WorkspaceEvent};
