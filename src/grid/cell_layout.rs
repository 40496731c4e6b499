//! One grid panel of the workspace and its reorder solver

use serde::Serialize;
use tracing::trace;

use crate::dnd::{ItemId, ItemInfo};

/// Rectangular block of cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellRegion {
    pub x: usize,
    pub y: usize,
    pub span_x: usize,
    pub span_y: usize,
}

impl CellRegion {
    pub fn new(x: usize, y: usize, span_x: usize, span_y: usize) -> Self {
        Self { x, y, span_x, span_y }
    }

    pub fn overlaps(&self, other: &CellRegion) -> bool {
        self.x < other.x + other.span_x
            && other.x < self.x + self.span_x
            && self.y < other.y + other.span_y
            && other.y < self.y + self.span_y
    }

    fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.y..self.y + self.span_y).flat_map(move |y| (self.x..self.x + self.span_x).map(move |x| (x, y)))
    }
}

/// An item placed on a panel
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedItem {
    pub item: ItemInfo,
    pub x: usize,
    pub y: usize,
}

impl PlacedItem {
    pub fn region(&self) -> CellRegion {
        CellRegion::new(self.x, self.y, self.item.span_x, self.item.span_y)
    }
}

/// An occupant pushed aside to make room for a drop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellMove {
    pub item: ItemId,
    pub from: (usize, usize),
    pub to: (usize, usize),
}

/// A panel of `columns x rows` cells
#[derive(Debug, Clone)]
pub struct CellLayout {
    id: u32,
    columns: usize,
    rows: usize,
    items: Vec<PlacedItem>,
}

impl CellLayout {
    pub fn new(id: u32, columns: usize, rows: usize) -> Self {
        Self {
            id,
            columns,
            rows,
            items: Vec::new(),
        }
    }

    /// Stable id, survives panel reordering
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn items(&self) -> &[PlacedItem] {
        &self.items
    }

    pub fn find(&self, item: ItemId) -> Option<&PlacedItem> {
        self.items.iter().find(|p| p.item.id == item)
    }

    pub fn item_at(&self, x: usize, y: usize) -> Option<&PlacedItem> {
        let cell = CellRegion::new(x, y, 1, 1);
        self.items.iter().find(|p| p.region().overlaps(&cell))
    }

    pub fn fits(&self, region: &CellRegion) -> bool {
        region.span_x > 0
            && region.span_y > 0
            && region.x + region.span_x <= self.columns
            && region.y + region.span_y <= self.rows
    }

    /// Whether no item other than `ignore` overlaps the region
    pub fn is_region_vacant(&self, region: &CellRegion, ignore: Option<ItemId>) -> bool {
        self.fits(region)
            && self
                .items
                .iter()
                .filter(|p| Some(p.item.id) != ignore)
                .all(|p| !p.region().overlaps(region))
    }

    /// First vacant position for a span, row by row
    pub fn find_vacant(&self, span_x: usize, span_y: usize) -> Option<(usize, usize)> {
        (0..self.rows)
            .flat_map(|y| (0..self.columns).map(move |x| (x, y)))
            .find(|&(x, y)| self.is_region_vacant(&CellRegion::new(x, y, span_x, span_y), None))
    }

    /// Place an item. Returns false if the cells are taken or out of bounds.
    pub fn add(&mut self, item: ItemInfo, x: usize, y: usize) -> bool {
        let region = CellRegion::new(x, y, item.span_x, item.span_y);
        if !self.is_region_vacant(&region, Some(item.id)) {
            return false;
        }
        self.items.retain(|p| p.item.id != item.id);
        self.items.push(PlacedItem { item, x, y });
        true
    }

    pub fn remove(&mut self, item: ItemId) -> Option<PlacedItem> {
        let index = self.items.iter().position(|p| p.item.id == item)?;
        Some(self.items.remove(index))
    }

    /// Work out how to make room for `dragged` at `region`.
    ///
    /// Occupants overlapping the region are moved, closest first, to the
    /// nearest vacant block of their own span (Manhattan distance, ties by
    /// row then column). Returns None if some occupant has nowhere to go.
    /// An empty solution means the region is already free.
    pub fn solve_reorder(&self, dragged: ItemId, region: &CellRegion) -> Option<Vec<CellMove>> {
        if !self.fits(region) {
            return None;
        }

        let mut claimed = vec![false; self.columns * self.rows];
        let claim = |claimed: &mut Vec<bool>, r: &CellRegion| {
            for (x, y) in r.cells() {
                claimed[y * self.columns + x] = true;
            }
        };

        let mut displaced = Vec::new();
        for placed in self.items.iter().filter(|p| p.item.id != dragged) {
            if placed.region().overlaps(region) {
                displaced.push(placed);
            } else {
                claim(&mut claimed, &placed.region());
            }
        }
        claim(&mut claimed, region);

        let distance = |x: usize, y: usize| x.abs_diff(region.x) + y.abs_diff(region.y);
        displaced.sort_by_key(|p| (distance(p.x, p.y), p.y, p.x));

        let mut moves = Vec::with_capacity(displaced.len());
        for placed in displaced {
            let (span_x, span_y) = (placed.item.span_x, placed.item.span_y);
            let target = (0..self.rows)
                .flat_map(|y| (0..self.columns).map(move |x| (x, y)))
                .map(|(x, y)| CellRegion::new(x, y, span_x, span_y))
                .filter(|r| self.fits(r) && r.cells().all(|(x, y)| !claimed[y * self.columns + x]))
                .min_by_key(|r| (r.x.abs_diff(placed.x) + r.y.abs_diff(placed.y), r.y, r.x))?;

            claim(&mut claimed, &target);
            trace!(item = ?placed.item.id, from = ?(placed.x, placed.y), to = ?(target.x, target.y), "Reorder move");
            moves.push(CellMove {
                item: placed.item.id,
                from: (placed.x, placed.y),
                to: (target.x, target.y),
            });
        }
        Some(moves)
    }

    /// Commit a solution produced by [`CellLayout::solve_reorder`]
    pub fn apply_moves(&mut self, moves: &[CellMove]) {
        for m in moves {
            if let Some(placed) = self.items.iter_mut().find(|p| p.item.id == m.item) {
                placed.x = m.to.0;
                placed.y = m.to.1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dnd::ItemContainer;

    fn app(id: u64) -> ItemInfo {
        ItemInfo::app(id, "App", "org.flick.app", ItemContainer::Workspace)
    }

    #[test]
    fn test_add_rejects_overlap_and_bounds() {
        let mut layout = CellLayout::new(1, 4, 5);
        assert!(layout.add(app(1), 0, 0));
        assert!(!layout.add(app(2), 0, 0));
        assert!(!layout.add(ItemInfo::widget(3, "Clock", "clock", 2, 2), 3, 0));
        assert!(layout.add(ItemInfo::widget(3, "Clock", "clock", 2, 2), 2, 0));
        assert_eq!(layout.item_at(3, 1).map(|p| p.item.id), Some(ItemId(3)));
        assert_eq!(layout.find_vacant(1, 1), Some((1, 0)));
    }

    #[test]
    fn test_solve_free_region_needs_no_moves() {
        let mut layout = CellLayout::new(1, 4, 5);
        layout.add(app(1), 0, 0);
        assert_eq!(layout.solve_reorder(ItemId(9), &CellRegion::new(1, 0, 1, 1)), Some(vec![]));
    }

    #[test]
    fn test_solve_moves_occupant_to_nearest_cell() {
        let mut layout = CellLayout::new(1, 4, 5);
        layout.add(app(1), 1, 1);
        layout.add(app(2), 1, 0);

        let moves = layout.solve_reorder(ItemId(9), &CellRegion::new(1, 1, 1, 1)).unwrap();
        // (0,1) and (2,1) are both distance 1; (1,0) is taken; row then column picks (0,1)
        assert_eq!(moves, vec![CellMove { item: ItemId(1), from: (1, 1), to: (0, 1) }]);

        layout.apply_moves(&moves);
        assert_eq!(layout.find(ItemId(1)).map(|p| (p.x, p.y)), Some((0, 1)));
    }

    #[test]
    fn test_dragged_item_does_not_block_itself() {
        let mut layout = CellLayout::new(1, 2, 1);
        layout.add(app(1), 0, 0);
        layout.add(app(2), 1, 0);
        // Item 1 moves onto item 2's cell: item 2 takes the cell item 1 vacates
        let moves = layout.solve_reorder(ItemId(1), &CellRegion::new(1, 0, 1, 1)).unwrap();
        assert_eq!(moves, vec![CellMove { item: ItemId(2), from: (1, 0), to: (0, 0) }]);
    }

    #[test]
    fn test_full_panel_has_no_solution() {
        let mut layout = CellLayout::new(1, 2, 1);
        layout.add(app(1), 0, 0);
        layout.add(app(2), 1, 0);
        assert_eq!(layout.solve_reorder(ItemId(9), &CellRegion::new(0, 0, 1, 1)), None);
        assert_eq!(layout.solve_reorder(ItemId(9), &CellRegion::new(1, 0, 2, 1)), None);
    }
}
