//! Page arithmetic shared by the store and the views.

use crate::types::Pagination;

pub const PAGE_SIZE_OPTIONS: [u32; 3] = [5, 10, 25];
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// `ceil(total_count / limit)`; zero when `limit` is zero.
pub fn total_pages(total_count: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    let pages = total_count.div_ceil(u64::from(limit));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

pub fn has_next_page(meta: &Pagination) -> bool {
    meta.page < meta.total_pages
}

/// Page parameter for the request after `meta`, or `None` when the list is
/// exhausted.
pub fn next_page_param(meta: &Pagination) -> Option<u32> {
    has_next_page(meta).then(|| meta.page + 1)
}

pub fn is_page_size_option(limit: u32) -> bool {
    PAGE_SIZE_OPTIONS.contains(&limit)
}
