// SPDX-License-Identifier: AGPL-3.0
// Roster Core - Paginated list with search
//
// One controller per list screen (users, posts, tasks). Pages are appended
// in arrival order; the search box narrows the loaded items in memory.

use crate::models::Searchable;
use crate::search::{ListView, SearchState};
use crate::types::AppError;
use async_trait::async_trait;
use std::time::Duration;

/// Remote collection that can be read one page at a time.
/// An empty page marks the end of the collection.
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<Vec<T>, AppError>;
}

/// Ticket for one in-flight page fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub session: u64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A page with this many items was appended
    Appended(usize),
    /// The source returned an empty page; no further fetches
    Exhausted,
    /// The fetch failed; the same page will be requested next time
    Failed,
    /// The completion belonged to an earlier session and was dropped
    Stale,
    /// A fetch was already running or the list is exhausted
    Skipped,
}

/// Pagination state of one list screen
#[derive(Debug, Clone)]
pub struct PaginatedList<T> {
    items: Vec<T>,
    page: u32,
    loading: bool,
    has_more: bool,
    initial_loading: bool,
    session: u64,
}

impl<T> Default for PaginatedList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            loading: false,
            has_more: true,
            initial_loading: true,
            session: 0,
        }
    }
}

impl<T> PaginatedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Next page to request (1-based)
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// True until the first fetch of the session completes
    pub fn is_initial_loading(&self) -> bool {
        self.initial_loading
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    /// Mark a fetch as started, unless one is running or the list is exhausted
    pub fn begin(&mut self, limit: u32) -> Option<PageRequest> {
        if self.loading || !self.has_more {
            return None;
        }
        self.loading = true;
        Some(PageRequest {
            session: self.session,
            page: self.page,
            limit,
        })
    }

    pub fn complete(
        &mut self,
        request: PageRequest,
        result: Result<Vec<T>, AppError>,
    ) -> FetchOutcome {
        if request.session != self.session {
            return FetchOutcome::Stale;
        }

        self.loading = false;
        self.initial_loading = false;

        match result {
            Ok(page) if page.is_empty() => {
                self.has_more = false;
                FetchOutcome::Exhausted
            }
            Ok(page) => {
                let count = page.len();
                self.items.extend(page);
                self.page += 1;
                FetchOutcome::Appended(count)
            }
            Err(e) => {
                tracing::warn!("Failed to fetch page {}: {}", request.page, e);
                FetchOutcome::Failed
            }
        }
    }

    /// Release a fetch that will never complete, e.g. because its future
    /// was dropped. The same page is requested next time.
    pub fn abandon(&mut self, request: PageRequest) {
        if request.session == self.session && self.loading {
            tracing::debug!("Fetch of page {} was cancelled", request.page);
            self.loading = false;
        }
    }

    /// Start over with a new session; completions from the old one are ignored
    pub fn reset(&mut self) {
        *self = Self {
            session: self.session + 1,
            ..Self::default()
        };
    }
}

/// Fetch started by `begin`; abandoned on drop unless completed
struct InFlight<'a, T> {
    list: &'a mut PaginatedList<T>,
    request: Option<PageRequest>,
}

impl<T> InFlight<'_, T> {
    fn complete(mut self, result: Result<Vec<T>, AppError>) -> FetchOutcome {
        match self.request.take() {
            Some(request) => self.list.complete(request, result),
            None => FetchOutcome::Stale,
        }
    }
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if let Some(request) = self.request.take() {
            self.list.abandon(request);
        }
    }
}

/// Paginated list plus search box for one entity type
pub struct ListController<T, S> {
    name: &'static str,
    source: S,
    limit: u32,
    list: PaginatedList<T>,
    search: SearchState<T>,
}

impl<T, S> ListController<T, S>
where
    T: Searchable + Clone + Send + Sync + 'static,
    S: PageSource<T>,
{
    pub fn new(name: &'static str, source: S, limit: u32, debounce: Duration) -> Self {
        Self {
            name,
            source,
            limit,
            list: PaginatedList::new(),
            search: SearchState::new(debounce),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn list(&self) -> &PaginatedList<T> {
        &self.list
    }

    pub fn items(&self) -> &[T] {
        self.list.items()
    }

    pub fn search(&self) -> &SearchState<T> {
        &self.search
    }

    pub fn begin_fetch(&mut self) -> Option<PageRequest> {
        self.list.begin(self.limit)
    }

    /// Apply the result of a fetch started with `begin_fetch`
    pub fn complete_fetch(
        &mut self,
        request: PageRequest,
        result: Result<Vec<T>, AppError>,
    ) -> FetchOutcome {
        let outcome = self.list.complete(request, result);
        self.after_fetch(request, outcome)
    }

    /// Fetch and append the next page from the source. Dropping the future
    /// before it resolves leaves the list ready to retry the same page.
    pub async fn fetch_next_page(&mut self) -> FetchOutcome {
        let Some(request) = self.list.begin(self.limit) else {
            return FetchOutcome::Skipped;
        };
        let in_flight = InFlight {
            list: &mut self.list,
            request: Some(request),
        };
        let result = self.source.fetch_page(request.page, request.limit).await;
        let outcome = in_flight.complete(result);
        self.after_fetch(request, outcome)
    }

    fn after_fetch(&mut self, request: PageRequest, outcome: FetchOutcome) -> FetchOutcome {
        if let FetchOutcome::Appended(count) = outcome {
            tracing::debug!("{}: appended {} items from page {}", self.name, count, request.page);
            self.search.refilter(self.list.items());
        }
        outcome
    }

    /// Drop loaded pages and start from page 1
    pub fn reset(&mut self) {
        self.list.reset();
        self.search.refilter(self.list.items());
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search.set_search_text(text);
    }

    /// Wait for the typed text to settle, then filter
    pub async fn settle_search(&mut self) -> bool {
        self.search.settle(self.list.items()).await
    }

    pub fn apply_pending_search(&mut self) -> bool {
        self.search.apply_pending(self.list.items())
    }

    pub fn apply_search_now(&mut self) {
        self.search.apply_now(self.list.items());
    }

    pub fn clear_search(&mut self) {
        self.search.clear(self.list.items());
    }

    pub fn view(&self) -> ListView<'_, T> {
        self.search.view(self.list.items())
    }
}
