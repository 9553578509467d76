//! Page-navigation helpers for the catalog list

use super::state::{Action, StateStore};

/// Maximum number of page links shown at once
pub const PAGE_WINDOW: i64 = 5;

/// Page numbers to offer, centred on `current` where possible
pub fn page_window(current: i64, total_pages: i64) -> Vec<i64> {
    let mut start = (current - PAGE_WINDOW / 2).max(1);
    let end = (start + PAGE_WINDOW - 1).min(total_pages);
    if end - start + 1 < PAGE_WINDOW {
        start = (end - PAGE_WINDOW + 1).max(1);
    }
    (start..=end).collect()
}

/// 1-based bounds for "Showing x to y of z"
pub fn showing_range(current: i64, per_page: i64, total_items: i64) -> (i64, i64) {
    let first = ((current - 1) * per_page + 1).min(total_items);
    let last = (current * per_page).min(total_items);
    (first, last)
}

/// Pagination controls are hidden for a single page
pub fn is_visible(total_pages: i64) -> bool {
    total_pages > 1
}

/// Move to `page` if it exists; returns whether the page changed
pub fn go_to(store: &StateStore, page: i64) -> bool {
    let total_pages = store.snapshot().total_pages;
    if page < 1 || page > total_pages {
        return false;
    }
    store.dispatch(Action::SetCurrentPage(page));
    true
}
