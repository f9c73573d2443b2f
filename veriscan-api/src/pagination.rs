//! Pagination utilities
//!
//! Page numbers are 1-indexed. Requests past the last page return an empty
//! page with correct totals rather than clamping, so clients can page
//! forward until they receive an empty list.

use serde::Serialize;

/// Default page size for list endpoints
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Largest page size a client may request
pub const MAX_PAGE_SIZE: i64 = 100;

/// Pagination metadata returned alongside list responses
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Page size
    pub limit: i64,
    /// Total number of matching rows
    pub total: i64,
    /// Total number of pages: ceil(total / limit)
    pub pages: i64,
    /// Offset for SQL LIMIT/OFFSET (not serialized)
    #[serde(skip)]
    pub offset: i64,
}

/// Calculate pagination metadata from total results and requested page/limit
///
/// `page` is clamped to >= 1, `limit` to [1, MAX_PAGE_SIZE].
pub fn paginate(total: i64, requested_page: i64, requested_limit: i64) -> Pagination {
    let limit = requested_limit.clamp(1, MAX_PAGE_SIZE);
    let page = requested_page.max(1);
    let pages = (total + limit - 1) / limit;
    let offset = (page - 1) * limit;

    Pagination {
        page,
        limit,
        total,
        pages,
        offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_normal() {
        let p = paginate(25, 2, 10);
        assert_eq!(p.page, 2);
        assert_eq!(p.pages, 3);
        assert_eq!(p.offset, 10);
        assert_eq!(p.total, 25);
    }

    #[test]
    fn test_pagination_first_page() {
        let p = paginate(150, 1, 20);
        assert_eq!(p.page, 1);
        assert_eq!(p.pages, 8);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_exact_boundary() {
        let p = paginate(200, 2, 100);
        assert_eq!(p.pages, 2);
        assert_eq!(p.offset, 100);
    }

    #[test]
    fn test_pagination_past_the_end_is_not_clamped() {
        let p = paginate(25, 99, 10);
        assert_eq!(p.page, 99);
        assert_eq!(p.pages, 3);
        assert_eq!(p.offset, 980);
    }

    #[test]
    fn test_pagination_page_below_one_is_clamped() {
        let p = paginate(25, 0, 10);
        assert_eq!(p.page, 1);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_limit_is_bounded() {
        let p = paginate(25, 1, 100_000);
        assert_eq!(p.limit, MAX_PAGE_SIZE);

        let p = paginate(25, 1, 0);
        assert_eq!(p.limit, 1);
    }

    #[test]
    fn test_pagination_empty() {
        let p = paginate(0, 1, 20);
        assert_eq!(p.pages, 0);
        assert_eq!(p.total, 0);
        assert_eq!(p.offset, 0);
    }
}
