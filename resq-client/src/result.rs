use std::future::Future;

use resq_data::{Page, PageMeta};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;
use crate::query::RemoteQuery;

/// One fetched page plus the query that produced it.
#[derive(Debug, Clone)]
pub struct PageResult<T> {
    pub data: Vec<T>,
    pub meta: Option<PageMeta>,
    query: RemoteQuery,
}

impl<T> PageResult<T> {
    pub fn new(page: Page<T>, query: RemoteQuery) -> Self {
        Self {
            data: page.data,
            meta: page.meta,
            query,
        }
    }

    pub fn current_page(&self) -> Option<u64> {
        self.meta.map(|m| m.current_page)
    }

    pub fn last_page(&self) -> Option<u64> {
        self.meta.map(|m| m.last_page)
    }

    pub fn per_page(&self) -> Option<u64> {
        self.meta.map(|m| m.per_page)
    }

    pub fn total(&self) -> Option<u64> {
        self.meta.map(|m| m.total)
    }

    pub fn query(&self) -> &RemoteQuery {
        &self.query
    }

    pub fn has_prev_page(&self) -> bool {
        matches!(self.meta, Some(m) if m.current_page > 1)
    }

    pub fn has_next_page(&self) -> bool {
        matches!(self.meta, Some(m) if m.current_page < m.last_page)
    }

    pub fn into_page(self) -> Page<T> {
        Page {
            data: self.data,
            meta: self.meta,
        }
    }
}

impl<T> PageResult<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Fetch the previous page, or `None` when there is none.
    pub fn fetch_prev_page(
        &self,
        cancel: &CancellationToken,
    ) -> Option<impl Future<Output = Result<PageResult<T>, ClientError>> + Send + 'static> {
        if !self.has_prev_page() {
            return None;
        }
        let page = self.current_page()? - 1;
        Some(self.fetch(page, cancel))
    }

    /// Fetch the next page, or `None` when there is none.
    pub fn fetch_next_page(
        &self,
        cancel: &CancellationToken,
    ) -> Option<impl Future<Output = Result<PageResult<T>, ClientError>> + Send + 'static> {
        if !self.has_next_page() {
            return None;
        }
        let page = self.current_page()? + 1;
        Some(self.fetch(page, cancel))
    }

    fn fetch(
        &self,
        page: u64,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<PageResult<T>, ClientError>> + Send + 'static {
        let query = self.query.clone().page(page);
        let cancel = cancel.clone();
        async move { query.get_result::<T>(&cancel).await }
    }
}
