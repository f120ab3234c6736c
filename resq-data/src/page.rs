use serde::{Deserialize, Serialize};

/// Effective pagination for one compiled query. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    /// Build a request, clamping the page number to at least 1.
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page,
        }
    }

    /// Rows to skip. Saturates at `i64::MAX`, the largest offset SQL engines accept.
    pub fn offset(&self) -> u64 {
        (self.page.max(1) - 1)
            .saturating_mul(self.per_page)
            .min(i64::MAX as u64)
    }

    pub fn limit(&self) -> u64 {
        self.per_page
    }
}

/// Pagination metadata block of a paginated payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub current_page: u64,
    pub last_page: u64,
    pub per_page: u64,
    pub total: u64,
}

impl PageMeta {
    /// Derive the metadata for `request` given the unpaged row count.
    ///
    /// `last_page` is never below 1, even for an empty result.
    pub fn from_total(request: &PageRequest, total: u64) -> Self {
        let last_page = if request.per_page == 0 {
            1
        } else {
            total.div_ceil(request.per_page).max(1)
        };
        Self {
            current_page: request.page,
            last_page,
            per_page: request.per_page,
            total,
        }
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.last_page
    }
}

/// A page of results: `{ "data": [...], "meta": {...} }`.
///
/// `meta` is absent for unpaged results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, request: &PageRequest, total: u64) -> Self {
        Self {
            data,
            meta: Some(PageMeta::from_total(request, total)),
        }
    }

    pub fn unpaged(data: Vec<T>) -> Self {
        Self { data, meta: None }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}
