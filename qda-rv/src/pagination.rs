//! Pagination for coded segment listings

/// Segments per page
pub const PAGE_SIZE: i64 = 50;

/// Page position within a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    pub total_pages: i64,
    /// Offset for SQL LIMIT/OFFSET query
    pub offset: i64,
}

/// Clamp `requested_page` into `[1, total_pages]` and compute its offset
///
/// # Examples
/// ```
/// use qda_rv::pagination::paginate;
///
/// // 120 segments = 3 pages (50 + 50 + 20)
/// let p = paginate(120, 2);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 50);
///
/// // Out-of-range pages are clamped to the last page
/// let p = paginate(120, 40);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 100);
/// ```
pub fn paginate(total_results: i64, requested_page: i64) -> Pagination {
    let total_pages = (total_results + PAGE_SIZE - 1) / PAGE_SIZE;
    let page = requested_page.max(1).min(total_pages.max(1));

    Pagination {
        page,
        total_pages,
        offset: (page - 1) * PAGE_SIZE,
    }
}
