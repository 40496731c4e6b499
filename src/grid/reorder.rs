//! Presentational offsets used to preview a reorder
//!
//! None of this touches logical cell assignment; the grid only commits cells on
//! drop. Everything resets to zero when the drag leaves the grid or completes.

use std::collections::HashMap;

use crate::dnd::ItemId;
use crate::geometry::Point;

/// Per-item preview state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReorderOffset {
    bounce_offset: Point,
    /// Stored as a delta from identity so that the reset state is all zeros
    bounce_scale: f64,
    preview_offset: Point,
}

impl ReorderOffset {
    pub fn set_bounce_offset(&mut self, x: f64, y: f64) {
        self.bounce_offset = Point::new(x, y);
    }

    pub fn bounce_offset(&self) -> Point {
        self.bounce_offset
    }

    pub fn set_preview_offset(&mut self, x: f64, y: f64) {
        self.preview_offset = Point::new(x, y);
    }

    pub fn preview_offset(&self) -> Point {
        self.preview_offset
    }

    pub fn set_bounce_scale(&mut self, scale: f64) {
        self.bounce_scale = scale;
    }

    pub fn bounce_scale(&self) -> f64 {
        self.bounce_scale
    }

    /// Scale to draw the item with
    pub fn effective_scale(&self) -> f64 {
        1.0 + self.bounce_scale
    }

    /// Total translation to draw the item with
    pub fn translation(&self) -> Point {
        self.bounce_offset + self.preview_offset
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

/// Offsets for every item touched by the current reorder preview
#[derive(Debug, Default)]
pub struct ReorderOffsets {
    items: HashMap<ItemId, ReorderOffset>,
}

impl ReorderOffsets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, item: ItemId) -> ReorderOffset {
        self.items.get(&item).copied().unwrap_or_default()
    }

    pub fn get_mut(&mut self, item: ItemId) -> &mut ReorderOffset {
        self.items.entry(item).or_default()
    }

    /// Items currently drawn away from their cell
    pub fn displaced(&self) -> impl Iterator<Item = (ItemId, &ReorderOffset)> {
        self.items.iter().filter(|(_, o)| !o.is_identity()).map(|(id, o)| (*id, o))
    }

    pub fn is_empty(&self) -> bool {
        self.items.values().all(ReorderOffset::is_identity)
    }

    pub fn reset(&mut self) {
        self.items.clear();
    }
}
