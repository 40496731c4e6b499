//! Addressing grid panels by index
//!
//! Consumers resolve panels through [`CellLayoutContainer`] instead of holding
//! panel references, so two-panel layouts look the same as single panels to
//! anything that only needs "the index-th panel".

pub trait CellLayoutContainer {
    /// Stable id of the panel at `index`
    fn cell_layout_id(&self, index: usize) -> Option<u32>;

    /// Position of the panel with stable id `id`
    fn cell_layout_index(&self, id: u32) -> Option<usize>;

    /// Panels shown side by side (1, or 2 in two-panel mode)
    fn panel_count(&self) -> usize;

    /// Total number of panels
    fn page_count(&self) -> usize;

    /// Announcement text for the panel at `index`
    fn page_description(&self, index: usize) -> String {
        let total = self.page_count();
        if total == 0 {
            return "Home screen".to_string();
        }
        format!("Page {} of {}", index + 1, total)
    }

    /// First panel of the visible group containing `index`
    fn leftmost_visible_page_for_index(&self, index: usize) -> usize {
        let panels = self.panel_count().max(1);
        index - index % panels
    }
}
