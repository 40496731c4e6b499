//! Workspace - paged grid of home screen panels
//!
//! The workspace is a drop target (hovering previews a reorder after the
//! pointer settles, dropping commits it), a drag source (items dragged off it
//! can be deleted) and the scroller the drag controller pages at the edges.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::cell_layout::{CellLayout, CellMove, CellRegion, PlacedItem};
use super::container::CellLayoutContainer;
use super::reorder::ReorderOffsets;
use crate::alarm::DeferredAlarm;
use crate::config::EngineConfig;
use crate::dnd::{
    DragObject, DragPayload, DragScroller, DragSource, DropOutcome, DropTarget, ItemContainer, ItemId,
    ItemInfo, ScrollDirection,
};
use crate::geometry::{Point, Rect};
use crate::timers::{Scheduler, TimerToken};

/// Fraction of a cell displaced items overshoot towards their new cell
const REORDER_PREVIEW_MAGNITUDE: f64 = 0.12;
/// Shrink applied to displaced items while previewing
const REORDER_BOUNCE_SCALE: f64 = -0.03;

/// Cell on a specific panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DropCell {
    pub panel: usize,
    pub x: usize,
    pub y: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkspaceEvent {
    PageChanged { page: usize, description: String },
    ReorderPreview { cell: DropCell, moves: Vec<CellMove> },
    ReorderReverted,
    ItemPlaced { item: ItemId, cell: DropCell, moved: Vec<CellMove> },
    ItemRemoved { item: ItemId },
    ItemReturned { item: ItemId },
}

pub struct Workspace {
    /// Grid area in drag layer coordinates (below the drop bar)
    area: Rect,
    columns: usize,
    rows: usize,
    two_panel: bool,
    panels: Vec<CellLayout>,
    next_panel_id: u32,
    current_page: usize,
    offsets: ReorderOffsets,
    reorder_alarm: DeferredAlarm<DropCell>,
    reorder_timeout_ms: u64,
    /// Item being dragged, wherever it came from
    drag_item: Option<ItemInfo>,
    /// Cell under the pointer
    hover: Option<DropCell>,
    /// Reorder currently being previewed
    preview: Option<(DropCell, Vec<CellMove>)>,
    events: Vec<WorkspaceEvent>,
}

impl Workspace {
    pub fn new(config: &EngineConfig, pages: usize) -> Self {
        let bar = config.px(config.grid.drop_bar_height);
        let mut workspace = Self {
            area: Rect::new(0.0, bar, config.screen.width, config.screen.height - bar),
            columns: config.grid.columns.max(1),
            rows: config.grid.rows.max(1),
            two_panel: config.grid.two_panel,
            panels: Vec::new(),
            next_panel_id: 1,
            current_page: 0,
            offsets: ReorderOffsets::new(),
            reorder_alarm: DeferredAlarm::new(TimerToken::Reorder),
            reorder_timeout_ms: config.timing.reorder_timeout_ms,
            drag_item: None,
            hover: None,
            preview: None,
            events: Vec::new(),
        };
        for _ in 0..pages.max(1) {
            workspace.add_page();
        }
        workspace
    }

    /// Append an empty panel, returning its stable id
    pub fn add_page(&mut self) -> u32 {
        let id = self.next_panel_id;
        self.next_panel_id += 1;
        self.panels.push(CellLayout::new(id, self.columns, self.rows));
        id
    }

    pub fn panel(&self, index: usize) -> Option<&CellLayout> {
        self.panels.get(index)
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Jump to the visible group containing `page`
    pub fn set_current_page(&mut self, page: usize) {
        let page = self.leftmost_visible_page_for_index(page.min(self.panels.len().saturating_sub(1)));
        if page != self.current_page {
            self.current_page = page;
            let description = self.page_description(page);
            info!(page, %description, "Workspace page changed");
            self.events.push(WorkspaceEvent::PageChanged { page, description });
        }
    }

    /// Seed an item, e.g. from a restored layout
    pub fn add_item(&mut self, panel: usize, mut item: ItemInfo, x: usize, y: usize) -> bool {
        item.container = ItemContainer::Workspace;
        let placed = self.panels.get_mut(panel).is_some_and(|p| p.add(item, x, y));
        if !placed {
            warn!(panel, x, y, "Could not place item");
        }
        placed
    }

    pub fn find_item(&self, item: ItemId) -> Option<(usize, &PlacedItem)> {
        self.panels
            .iter()
            .enumerate()
            .find_map(|(i, p)| p.find(item).map(|placed| (i, placed)))
    }

    pub fn offsets(&self) -> &ReorderOffsets {
        &self.offsets
    }

    /// Moves of the reorder currently shown
    pub fn preview(&self) -> Option<&[CellMove]> {
        self.preview.as_ref().map(|(_, moves)| moves.as_slice())
    }

    pub fn hit_area(&self) -> Rect {
        self.area
    }

    pub fn cell_size(&self) -> (f64, f64) {
        let panel_width = self.area.width / self.panel_count() as f64;
        (panel_width / self.columns as f64, self.area.height / self.rows as f64)
    }

    pub fn take_events(&mut self) -> Vec<WorkspaceEvent> {
        std::mem::take(&mut self.events)
    }

    /// Cell where an item of the given span would land with the pointer at (x, y)
    pub fn cell_at(&self, x: f64, y: f64, span_x: usize, span_y: usize) -> Option<DropCell> {
        if !self.area.contains(x, y) || span_x > self.columns || span_y > self.rows {
            return None;
        }
        let panels = self.panel_count();
        let panel_width = self.area.width / panels as f64;
        let (cell_w, cell_h) = self.cell_size();

        let rel_x = x - self.area.x;
        let slot = ((rel_x / panel_width) as usize).min(panels - 1);
        let panel = self.current_page + slot;
        if panel >= self.panels.len() {
            return None;
        }
        let col = ((rel_x - slot as f64 * panel_width) / cell_w) as usize;
        let row = ((y - self.area.y) / cell_h) as usize;
        Some(DropCell {
            panel,
            x: col.min(self.columns - span_x),
            y: row.min(self.rows - span_y),
        })
    }

    fn drop_region(&self, d: &DragObject) -> Option<(DropCell, CellRegion)> {
        let item = d.item();
        let cell = self.cell_at(d.x, d.y, item.span_x, item.span_y)?;
        Some((cell, CellRegion::new(cell.x, cell.y, item.span_x, item.span_y)))
    }

    /// Reorder timer expired: preview the reorder for the settled cell
    pub fn on_reorder_alarm(&mut self, scheduler: &mut dyn Scheduler) {
        let Some(cell) = self.reorder_alarm.on_timer(scheduler) else {
            return;
        };
        let Some(item) = self.drag_item.as_ref() else {
            return;
        };
        if self.hover != Some(cell) {
            return;
        }
        let region = CellRegion::new(cell.x, cell.y, item.span_x, item.span_y);
        let Some(moves) = self.panels.get(cell.panel).and_then(|p| p.solve_reorder(item.id, &region)) else {
            debug!(?cell, "No room to reorder");
            return;
        };

        let (cell_w, cell_h) = self.cell_size();
        self.offsets.reset();
        for m in &moves {
            let dx = (m.to.0 as f64 - m.from.0 as f64) * cell_w;
            let dy = (m.to.1 as f64 - m.from.1 as f64) * cell_h;
            let direction = Point::new(dx, dy);
            let unit = direction.scale(1.0 / direction.length().max(1.0));
            let offset = self.offsets.get_mut(m.item);
            offset.set_preview_offset(dx, dy);
            offset.set_bounce_offset(
                unit.x * cell_w * REORDER_PREVIEW_MAGNITUDE,
                unit.y * cell_h * REORDER_PREVIEW_MAGNITUDE,
            );
            offset.set_bounce_scale(REORDER_BOUNCE_SCALE);
        }
        info!(?cell, moved = moves.len(), "Reorder preview");
        self.events.push(WorkspaceEvent::ReorderPreview { cell, moves: moves.clone() });
        self.preview = Some((cell, moves));
    }

    fn revert_preview(&mut self) {
        let had_preview = self.preview.take().is_some();
        self.offsets.reset();
        if had_preview {
            debug!("Reorder preview reverted");
            self.events.push(WorkspaceEvent::ReorderReverted);
        }
    }

    fn can_scroll(&self, direction: ScrollDirection) -> bool {
        match direction {
            ScrollDirection::Left => self.current_page > 0,
            ScrollDirection::Right => self.current_page + self.panel_count() < self.panels.len(),
        }
    }
}

impl DropTarget for Workspace {
    fn name(&self) -> &str {
        "workspace"
    }

    fn is_drop_enabled(&self) -> bool {
        true
    }

    fn accept_drop(&self, d: &DragObject) -> bool {
        let Some((cell, region)) = self.drop_region(d) else {
            return false;
        };
        self.panels
            .get(cell.panel)
            .is_some_and(|p| p.solve_reorder(d.item().id, &region).is_some())
    }

    fn on_drag_enter(&mut self, d: &DragObject, _scheduler: &mut dyn Scheduler) {
        debug!(x = d.x, y = d.y, "Drag entered workspace");
        self.hover = None;
    }

    fn on_drag_over(&mut self, d: &DragObject, scheduler: &mut dyn Scheduler) {
        let Some((cell, region)) = self.drop_region(d) else {
            return;
        };
        if self.hover == Some(cell) {
            return;
        }
        self.hover = Some(cell);
        self.revert_preview();

        let vacant = self
            .panels
            .get(cell.panel)
            .is_some_and(|p| p.is_region_vacant(&region, Some(d.item().id)));
        if vacant {
            self.reorder_alarm.cancel();
        } else {
            // Debounced: only reorder once the pointer rests on one cell
            self.reorder_alarm.set_listener(cell);
            self.reorder_alarm.arm(scheduler, self.reorder_timeout_ms);
        }
    }

    fn on_drag_exit(&mut self, _d: &DragObject, _scheduler: &mut dyn Scheduler) {
        self.reorder_alarm.cancel();
        self.revert_preview();
        self.hover = None;
    }

    fn on_drop(&mut self, d: &DragObject, _scheduler: &mut dyn Scheduler) -> DropOutcome {
        self.reorder_alarm.cancel();
        self.preview = None;
        self.offsets.reset();
        self.hover = None;

        let mut item = d.item().clone();
        let (cell, region) = match self.drop_region(d) {
            Some(found) => found,
            None => {
                // accept_drop vouched for this position
                warn!(x = d.x, y = d.y, "Drop outside the grid, using first page");
                (DropCell { panel: self.current_page, x: 0, y: 0 }, CellRegion::new(0, 0, item.span_x, item.span_y))
            }
        };
        let moves = self
            .panels
            .get(cell.panel)
            .and_then(|p| p.solve_reorder(item.id, &region))
            .unwrap_or_default();

        for panel in &mut self.panels {
            panel.remove(item.id);
        }
        item.container = ItemContainer::Workspace;
        let id = item.id;
        if let Some(panel) = self.panels.get_mut(cell.panel) {
            panel.apply_moves(&moves);
            if !panel.add(item, cell.x, cell.y) {
                warn!(?id, ?cell, "Drop cell still occupied after reorder");
            }
        }

        info!(item = ?id, ?cell, moved = moves.len(), "Item dropped on workspace");
        self.events.push(WorkspaceEvent::ItemPlaced { item: id, cell, moved: moves });
        DropOutcome::Placed {
            panel: cell.panel,
            cell_x: cell.x,
            cell_y: cell.y,
        }
    }

    fn hit_rect(&self) -> Rect {
        self.area
    }

    fn on_drag_start(&mut self, payload: &DragPayload) {
        self.drag_item = Some(payload.item.clone());
    }

    fn on_drag_end(&mut self) {
        self.reorder_alarm.cancel();
        self.revert_preview();
        self.drag_item = None;
        self.hover = None;
    }
}

impl DragSource for Workspace {
    fn supports_fling_to_delete(&self) -> bool {
        true
    }

    fn on_drop_completed(&mut self, d: &DragObject, outcome: Option<&DropOutcome>, is_fling: bool) {
        let id = d.item().id;
        match outcome {
            Some(outcome) if outcome.removes_from_source() => {
                for panel in &mut self.panels {
                    panel.remove(id);
                }
                info!(item = ?id, is_fling, "Item removed from workspace");
                self.events.push(WorkspaceEvent::ItemRemoved { item: id });
            }
            Some(_) => {}
            None => {
                debug!(item = ?id, "Item returned to its cell");
                self.events.push(WorkspaceEvent::ItemReturned { item: id });
            }
        }
    }
}

impl DragScroller for Workspace {
    fn scroll_left(&mut self) {
        if self.can_scroll(ScrollDirection::Left) {
            let page = self.current_page.saturating_sub(self.panel_count());
            self.set_current_page(page);
        }
    }

    fn scroll_right(&mut self) {
        if self.can_scroll(ScrollDirection::Right) {
            let page = self.current_page + self.panel_count();
            self.set_current_page(page);
        }
    }

    fn on_enter_scroll_area(&mut self, _x: f64, _y: f64, direction: ScrollDirection) -> bool {
        let can_scroll = self.can_scroll(direction);
        debug!(?direction, can_scroll, "Drag entered scroll area");
        can_scroll
    }

    fn on_exit_scroll_area(&mut self) {}
}

impl CellLayoutContainer for Workspace {
    fn cell_layout_id(&self, index: usize) -> Option<u32> {
        self.panels.get(index).map(CellLayout::id)
    }

    fn cell_layout_index(&self, id: u32) -> Option<usize> {
        self.panels.iter().position(|p| p.id() == id)
    }

    fn panel_count(&self) -> usize {
        if self.two_panel {
            2
        } else {
            1
        }
    }

    fn page_count(&self) -> usize {
        self.panels.len()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::dnd::{ButtonDropTarget, DragController, DragEvent};
    use crate::timers::ManualScheduler;

    fn app(id: u64) -> ItemInfo {
        ItemInfo::app(id, "App", "org.flick.app", ItemContainer::Workspace)
    }

    /// Pointer position at the center of a cell on the first visible panel
    fn center(ws: &Workspace, x: usize, y: usize) -> (f64, f64) {
        let (w, h) = ws.cell_size();
        let area = ws.hit_area();
        (area.x + (x as f64 + 0.5) * w, area.y + (y as f64 + 0.5) * h)
    }

    fn drag(item: ItemInfo, (x, y): (f64, f64)) -> DragObject {
        DragObject::new(DragPayload::new(item), x, y)
    }

    fn run(ws: &mut Workspace, sched: &mut ManualScheduler, until: u64) {
        while let Some(token) = sched.pop_due(until) {
            assert_eq!(token, TimerToken::Reorder);
            ws.on_reorder_alarm(sched);
        }
        sched.set_now(until);
    }

    #[test]
    fn test_cell_at_two_panels() {
        let mut config = EngineConfig::default();
        config.grid.two_panel = true;
        let ws = Workspace::new(&config, 4);
        let area = ws.hit_area();

        // Right half maps to the second panel
        let cell = ws.cell_at(area.width * 0.75, area.y + 1.0, 1, 1).unwrap();
        assert_eq!(cell.panel, 1);
        assert_eq!(cell.y, 0);
        // Widgets are clamped to fit
        let cell = ws.cell_at(area.width - 1.0, area.bottom() - 1.0, 2, 2).unwrap();
        assert_eq!((cell.x, cell.y), (2, 3));
        // Above the grid is the drop bar
        assert_eq!(ws.cell_at(10.0, 10.0, 1, 1), None);
    }

    #[test]
    fn test_hover_over_occupied_cell_previews_after_settling() {
        let mut sched = ManualScheduler::new();
        let mut ws = Workspace::new(&EngineConfig::default(), 1);
        ws.add_item(0, app(1), 1, 1);
        let dragged = ItemInfo::app(9, "New", "org.flick.new", ItemContainer::AllApps);
        ws.on_drag_start(&DragPayload::new(dragged.clone()));

        let d = drag(dragged.clone(), center(&ws, 0, 0));
        ws.on_drag_enter(&d, &mut sched);
        ws.on_drag_over(&d, &mut sched);
        // Vacant cell: nothing armed
        assert_eq!(sched.registrations(TimerToken::Reorder), 0);

        // Wobble on and off the occupied cell: one registration, debounced
        for (t, (x, y)) in [(100, (1, 1)), (200, (0, 0)), (300, (1, 1))] {
            sched.set_now(t);
            ws.on_drag_over(&drag(dragged.clone(), center(&ws, x, y)), &mut sched);
            assert!(sched.registrations(TimerToken::Reorder) <= 1);
        }
        run(&mut ws, &mut sched, 900);
        assert!(ws.preview().is_none());

        run(&mut ws, &mut sched, 950);
        let moves = ws.preview().unwrap().to_vec();
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].item, ItemId(1));
        // Nearest free cell is the one above
        assert_eq!(moves[0].to, (1, 0));
        let (_, h) = ws.cell_size();
        let offset = ws.offsets().get(ItemId(1));
        assert_eq!(offset.preview_offset(), Point::new(0.0, -h));
        assert!(offset.effective_scale() < 1.0);
        // Logical cell untouched until drop
        assert_eq!(ws.find_item(ItemId(1)).map(|(_, p)| (p.x, p.y)), Some((1, 1)));

        // Leaving reverts the preview
        ws.on_drag_exit(&d, &mut sched);
        assert!(ws.offsets().is_empty());
        assert!(ws.take_events().contains(&WorkspaceEvent::ReorderReverted));
    }

    #[test]
    fn test_drop_commits_reorder() {
        let mut sched = ManualScheduler::new();
        let mut ws = Workspace::new(&EngineConfig::default(), 1);
        ws.add_item(0, app(1), 1, 1);
        let dragged = ItemInfo::app(9, "New", "org.flick.new", ItemContainer::AllApps);
        ws.on_drag_start(&DragPayload::new(dragged.clone()));

        let d = drag(dragged, center(&ws, 1, 1));
        assert!(ws.accept_drop(&d));
        let outcome = ws.on_drop(&d, &mut sched);
        assert_eq!(outcome, DropOutcome::Placed { panel: 0, cell_x: 1, cell_y: 1 });

        assert_eq!(ws.find_item(ItemId(1)).map(|(_, p)| (p.x, p.y)), Some((1, 0)));
        let (_, placed) = ws.find_item(ItemId(9)).unwrap();
        assert_eq!((placed.x, placed.y), (1, 1));
        assert_eq!(placed.item.container, ItemContainer::Workspace);
    }

    #[test]
    fn test_full_panel_rejects_drop() {
        let mut config = EngineConfig::default();
        config.grid.columns = 2;
        config.grid.rows = 1;
        let mut ws = Workspace::new(&config, 1);
        ws.add_item(0, app(1), 0, 0);
        ws.add_item(0, app(2), 1, 0);

        let outsider = drag(app(9), center(&ws, 0, 0));
        assert!(!ws.accept_drop(&outsider));
        // Moving an item already on the panel swaps instead
        let insider = drag(app(1), center(&ws, 1, 0));
        assert!(ws.accept_drop(&insider));
    }

    #[test]
    fn test_edge_scroll_pages() {
        let mut ws = Workspace::new(&EngineConfig::default(), 3);
        assert!(!ws.on_enter_scroll_area(0.0, 500.0, ScrollDirection::Left));
        assert!(ws.on_enter_scroll_area(719.0, 500.0, ScrollDirection::Right));
        ws.scroll_right();
        ws.scroll_right();
        ws.scroll_right();
        assert_eq!(ws.current_page(), 2);
        assert_eq!(
            ws.take_events().last(),
            Some(&WorkspaceEvent::PageChanged { page: 2, description: "Page 3 of 3".to_string() })
        );
        ws.scroll_left();
        assert_eq!(ws.current_page(), 1);
    }

    #[test]
    fn test_container_ids_are_stable() {
        let mut config = EngineConfig::default();
        config.grid.two_panel = true;
        let mut ws = Workspace::new(&config, 2);
        let id = ws.add_page();
        assert_eq!(ws.cell_layout_index(id), Some(2));
        assert_eq!(ws.cell_layout_id(0), Some(1));
        assert_eq!(ws.panel_count(), 2);
        ws.set_current_page(3);
        assert_eq!(ws.current_page(), 2);
    }

    #[test]
    fn test_fling_to_delete_removes_item() {
        let config = EngineConfig::default();
        let mut sched = ManualScheduler::new();
        let ws = Rc::new(RefCell::new(Workspace::new(&config, 1)));
        ws.borrow_mut().add_item(0, app(1), 1, 3);
        let start = center(&ws.borrow(), 1, 3);

        let mut dc = DragController::new(&config.drag, config.screen.density, Rect::new(0.0, 0.0, 720.0, 1440.0));
        let [info, delete, app_info] = ButtonDropTarget::bar(720.0, config.px(config.grid.drop_bar_height));
        dc.add_target(ws.clone());
        dc.add_target(Rc::new(RefCell::new(info)));
        let delete = dc.add_target(Rc::new(RefCell::new(delete)));
        dc.add_target(Rc::new(RefCell::new(app_info)));
        dc.set_fling_to_delete_target(delete);

        dc.start_drag(DragPayload::new(app(1)), ws.clone(), start.0, start.1, &mut sched);
        sched.set_now(40);
        dc.on_drag_move(start.0, start.1 - 200.0, &mut sched);
        sched.set_now(80);
        let result = dc.on_drag_end(start.0, start.1 - 500.0, &mut sched);

        assert!(result.is_fling);
        assert_eq!(result.outcome, Some(DropOutcome::Deleted { item: ItemId(1) }));
        assert!(ws.borrow().find_item(ItemId(1)).is_none());
        assert!(dc.take_events().iter().any(|e| matches!(e, DragEvent::FlungToDelete { .. })));
    }

    #[test]
    fn test_rejected_drop_returns_item() {
        let config = EngineConfig::default();
        let mut sched = ManualScheduler::new();
        let ws = Rc::new(RefCell::new(Workspace::new(&config, 1)));
        ws.borrow_mut().add_item(0, app(1), 0, 0);
        let start = center(&ws.borrow(), 0, 0);

        let mut dc = DragController::new(&config.drag, config.screen.density, Rect::new(0.0, 0.0, 720.0, 1440.0));
        dc.add_target(ws.clone());
        dc.start_drag(DragPayload::new(app(1)), ws.clone(), start.0, start.1, &mut sched);
        sched.set_now(500);
        // Drop bar area with no button registered
        let result = dc.on_drag_end(360.0, 10.0, &mut sched);

        assert!(!result.accepted());
        assert_eq!(ws.borrow().find_item(ItemId(1)).map(|(_, p)| (p.x, p.y)), Some((0, 0)));
        assert!(ws.borrow_mut().take_events().contains(&WorkspaceEvent::ItemReturned { item: ItemId(1) }));
    }
}
