use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use resq_data::PageMeta;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;
use crate::query::RemoteQuery;

/// Handle to one `load_more` call. Clones resolve to the same outcome.
pub type LoadHandle<T> = Shared<BoxFuture<'static, Result<Vec<T>, ClientError>>>;

struct State<T> {
    items: Vec<T>,
    last_meta: Option<PageMeta>,
    fetched: bool,
    loading: Option<LoadHandle<T>>,
}

impl<T> State<T> {
    fn has_more(&self) -> bool {
        !self.fetched || matches!(self.last_meta, Some(m) if m.current_page < m.last_page)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the in-flight marker if the fetch task ends without doing so.
struct LoadingReset<T> {
    state: Arc<Mutex<State<T>>>,
    armed: bool,
}

impl<T> Drop for LoadingReset<T> {
    fn drop(&mut self) {
        if self.armed {
            lock(&self.state).loading = None;
        }
    }
}

/// Accumulates successive pages of a [`RemoteQuery`] into one sequence.
///
/// At most one page fetch is in flight at a time: calling
/// [`load_more`](Self::load_more) while one is running returns the same
/// handle. Clones share state.
pub struct Paginator<T> {
    query: RemoteQuery,
    state: Arc<Mutex<State<T>>>,
    cancel: Arc<Mutex<CancellationToken>>,
}

impl<T> Clone for Paginator<T> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            state: Arc::clone(&self.state),
            cancel: Arc::clone(&self.cancel),
        }
    }
}

impl<T> std::fmt::Debug for Paginator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("Paginator")
            .field("query", &self.query)
            .field("items", &state.items.len())
            .field("last_meta", &state.last_meta)
            .field("loading", &state.loading.is_some())
            .finish()
    }
}

impl<T> Paginator<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Create a paginator. With `prefetch` the first page is requested
    /// right away, which needs a running tokio runtime.
    pub fn new(query: RemoteQuery, prefetch: bool) -> Self {
        let paginator = Self {
            query,
            state: Arc::new(Mutex::new(State {
                items: Vec::new(),
                last_meta: None,
                fetched: false,
                loading: None,
            })),
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
        };
        if prefetch {
            // The fetch runs on its own task; callers pick it up via `load_more`.
            let _ = paginator.load_more();
        }
        paginator
    }

    /// Fetch the next page and resolve with everything accumulated so far.
    ///
    /// The fetch runs on a spawned task, so it makes progress whether or not
    /// the handle is polled. When every page has been read the handle
    /// resolves immediately without touching the transport. On failure the
    /// items of earlier pages are kept.
    pub fn load_more(&self) -> LoadHandle<T> {
        let mut state = lock(&self.state);
        if let Some(handle) = &state.loading {
            return handle.clone();
        }
        if !state.has_more() {
            let items = state.items.clone();
            return future::ready(Ok::<_, ClientError>(items)).boxed().shared();
        }

        let page = match state.last_meta {
            Some(meta) if state.fetched => meta.current_page + 1,
            _ => self.query.page_number(),
        };
        let query = self.query.clone().page(page);
        let cancel = lock(&self.cancel).clone();
        let mut reset = LoadingReset {
            state: Arc::clone(&self.state),
            armed: true,
        };

        tracing::debug!(page, "loading next page");
        let task = tokio::spawn(async move {
            let result = query.get_page::<T>(&cancel).await;
            let mut state = lock(&reset.state);
            state.loading = None;
            reset.armed = false;
            if cancel.is_cancelled() {
                tracing::debug!(page, "discarding cancelled page");
                return Err(ClientError::Cancelled);
            }
            let page = result?;
            state.items.extend(page.data);
            state.last_meta = page.meta;
            state.fetched = true;
            Ok(state.items.clone())
        });

        let handle = async move {
            match task.await {
                Ok(result) => result,
                Err(err) => Err(ClientError::Transport(format!("page fetch task failed: {err}"))),
            }
        }
        .boxed()
        .shared();
        state.loading = Some(handle.clone());
        handle
    }

    /// Cancel the in-flight fetch, if any. Its handle resolves with
    /// [`ClientError::Cancelled`] and accumulated items are left untouched.
    /// Later calls to [`load_more`](Self::load_more) use a fresh token.
    pub fn cancel(&self) {
        let mut token = lock(&self.cancel);
        token.cancel();
        *token = CancellationToken::new();
    }
}

impl<T: Clone> Paginator<T> {
    /// `true` until a page without a following page has been read.
    pub fn has_more(&self) -> bool {
        lock(&self.state).has_more()
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.state).loading.is_some()
    }

    /// Snapshot of the accumulated items.
    pub fn items(&self) -> Vec<T> {
        lock(&self.state).items.clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).items.len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.state).items.is_empty()
    }

    pub fn last_meta(&self) -> Option<PageMeta> {
        lock(&self.state).last_meta
    }

    pub fn current_page(&self) -> Option<u64> {
        self.last_meta().map(|m| m.current_page)
    }

    pub fn last_page(&self) -> Option<u64> {
        self.last_meta().map(|m| m.last_page)
    }

    pub fn query(&self) -> &RemoteQuery {
        &self.query
    }
}
