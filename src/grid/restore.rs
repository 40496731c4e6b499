//! Which panels to bind first when restoring saved state

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::container::CellLayoutContainer;

/// Panels visible for the saved page, to be bound before the rest.
///
/// `current_page` and `total` come from saved state and may be missing or
/// garbage; anything invalid yields an empty set.
pub fn pages_to_bind_synchronously(
    container: &dyn CellLayoutContainer,
    current_page: Option<i64>,
    total: Option<i64>,
) -> BTreeSet<usize> {
    let (Some(current), Some(total)) = (current_page, total) else {
        debug!("No saved page state, nothing to bind synchronously");
        return BTreeSet::new();
    };
    if current < 0 || total < 0 || current >= total {
        warn!(current, total, "Invalid saved page state, ignoring");
        return BTreeSet::new();
    }

    let (current, total) = (current as usize, total as usize);
    let panels = container.panel_count().max(1);
    let existing = container.page_count();
    let leftmost = container.leftmost_visible_page_for_index(current);
    if leftmost >= existing {
        warn!(current, existing, "Saved page no longer exists, ignoring");
        return BTreeSet::new();
    }
    let end = (leftmost + panels).min(total).min(existing);
    let pages: BTreeSet<usize> = (leftmost..end).collect();
    debug!(?pages, "Pages to bind synchronously");
    pages
}
