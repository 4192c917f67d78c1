//! Pagination utilities for address listings

/// Rows per page when the caller does not ask for a size
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Largest page size a caller may request
pub const MAX_PAGE_SIZE: usize = 200;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: usize,
    /// Rows per page after clamping
    pub page_size: usize,
    /// Total number of pages
    pub total_pages: usize,
    /// Index of the first row on this page
    pub offset: usize,
}

impl Pagination {
    /// Slice bounds of this page within `total_results` rows
    pub fn range(&self, total_results: usize) -> std::ops::Range<usize> {
        let start = self.offset.min(total_results);
        let end = (self.offset + self.page_size).min(total_results);
        start..end
    }
}

/// Calculate pagination metadata from total results and requested page
///
/// Ensures page is within valid bounds [1, total_pages] and page size within
/// [1, MAX_PAGE_SIZE]. A missing page size means [`DEFAULT_PAGE_SIZE`].
///
/// # Examples
/// ```
/// use canvass_dash::pagination::calculate_pagination;
///
/// // 60 results at 25 per page = 3 pages (25 + 25 + 10)
/// let p = calculate_pagination(60, 2, None);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 25);
///
/// // Requesting out-of-bounds page gets clamped
/// let p = calculate_pagination(60, 99, None);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 50);
/// ```
pub fn calculate_pagination(
    total_results: usize,
    requested_page: usize,
    requested_size: Option<usize>,
) -> Pagination {
    let page_size = requested_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let total_pages = total_results.div_ceil(page_size);
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * page_size;

    Pagination {
        page,
        page_size,
        total_pages,
        offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_normal() {
        let p = calculate_pagination(60, 2, None);
        assert_eq!(p.page, 2);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.offset, 25);
        assert_eq!(p.range(60), 25..50);
    }

    #[test]
    fn test_pagination_last_page_is_short() {
        let p = calculate_pagination(60, 3, None);
        assert_eq!(p.range(60), 50..60);
    }

    #[test]
    fn test_pagination_out_of_bounds() {
        let high = calculate_pagination(60, 99, None);
        assert_eq!(high.page, 3);
        assert_eq!(high.offset, 50);

        let low = calculate_pagination(60, 0, None);
        assert_eq!(low.page, 1);
        assert_eq!(low.offset, 0);
    }

    #[test]
    fn test_pagination_page_size_clamped() {
        assert_eq!(calculate_pagination(1000, 1, Some(5000)).page_size, MAX_PAGE_SIZE);
        assert_eq!(calculate_pagination(1000, 1, Some(0)).page_size, 1);
        assert_eq!(calculate_pagination(1000, 1, Some(10)).total_pages, 100);
    }

    #[test]
    fn test_pagination_empty() {
        let p = calculate_pagination(0, 1, None);
        assert_eq!(p.page, 1);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.offset, 0);
        assert_eq!(p.range(0), 0..0);
    }
}
