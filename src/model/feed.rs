//! Window controller for one cursor-paginated listing
//!
//! `Feed<T>` owns a [`Window`] and a [`PageCache`], decides when a page has to be
//! fetched and merges results back in. It never performs I/O itself: fetches are
//! returned as [`Effect::Fetch`] carrying a [`FetchTicket`], and the outcome comes
//! back as [`Message::PageLoaded`] with that same ticket.
//!
//! Liveness is tracked with a generation counter. Every reset or detach bumps it, and
//! results whose ticket carries an older generation are dropped without touching state.

use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        cursor::{Cursor, CursorMode},
        error::ApiError,
        page::{Page, PageRequest, WindowItem},
    },
    model::{
        page_cache::{CacheError, PageCache},
        window::{Merge, Window},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSettings {
    pub page_size: usize,
    pub window_max_items: usize,
    pub cache_capacity_pages: usize,
    pub cursor_mode: CursorMode,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            page_size: 50,
            window_max_items: 500,
            cache_capacity_pages: 20,
            cursor_mode: CursorMode::Keyset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum FetchKind {
    Initial,
    Next,
    Prev,
}

/// Identifies one outstanding page fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchTicket {
    pub generation: u64,
    pub kind: FetchKind,
    pub request: PageRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    /// Nothing requested yet
    Idle,
    Loading,
    Ready,
    /// The first page resolved with no items
    Empty,
    /// The listing does not exist (yet); shown as a neutral empty state
    NotFound,
    /// The first page could not be loaded
    Failed(ApiError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message<T> {
    InitialLoadRequested,
    NextPageRequested,
    PrevPageRequested,
    PageLoaded {
        ticket: FetchTicket,
        result: Result<Page<T>, ApiError>,
    },
    /// Discard everything and fetch the first page again
    ResetRequested,
    /// The owning view went away
    Detached,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Fetch(FetchTicket),
    /// `count` items were inserted before the previously first item
    Prepended { count: usize },
}

#[derive(Debug, Clone)]
pub struct Feed<T> {
    settings: FeedSettings,
    window: Window<T>,
    cache: PageCache<Cursor, Page<T>>,
    generation: u64,
    loading_initial: bool,
    loading_next: bool,
    loading_prev: bool,
    status: FeedStatus,
    total_count: Option<u64>,
}

impl<T: WindowItem> Feed<T> {
    pub fn new(settings: FeedSettings) -> Result<Self, CacheError> {
        Ok(Self {
            window: Window::new(settings.window_max_items),
            cache: PageCache::new(settings.cache_capacity_pages)?,
            settings,
            generation: 0,
            loading_initial: false,
            loading_next: false,
            loading_prev: false,
            status: FeedStatus::Idle,
            total_count: None,
        })
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    pub fn window(&self) -> &Window<T> {
        &self.window
    }

    pub fn items(&self) -> &[T] {
        self.window.items()
    }

    pub fn cache(&self) -> &PageCache<Cursor, Page<T>> {
        &self.cache
    }

    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading_initial(&self) -> bool {
        self.loading_initial
    }

    pub fn is_loading_next(&self) -> bool {
        self.loading_next
    }

    pub fn is_loading_prev(&self) -> bool {
        self.loading_prev
    }

    pub fn is_loading(&self) -> bool {
        self.loading_initial || self.loading_next || self.loading_prev
    }

    /// Whether a first page has been requested since the last detach
    pub fn is_started(&self) -> bool {
        self.status != FeedStatus::Idle
    }

    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    /// Server-reported total, or the number of held items when unknown
    pub fn display_total(&self) -> u64 {
        self.total_count.unwrap_or(self.window.len() as u64)
    }

    pub fn update(&mut self, message: Message<T>) -> Vec<Effect> {
        match message {
            Message::InitialLoadRequested => self.start_initial_load(),
            Message::ResetRequested => {
                self.invalidate();
                self.start_initial_load()
            }
            Message::Detached => {
                self.invalidate();
                self.window.reset();
                self.status = FeedStatus::Idle;
                self.total_count = None;
                vec![]
            }
            Message::NextPageRequested => self.load_next(),
            Message::PrevPageRequested => self.load_prev(),
            Message::PageLoaded { ticket, result } => {
                if ticket.generation != self.generation {
                    log::debug!(
                        "dropping stale {} page (generation {} != {})",
                        ticket.kind,
                        ticket.generation,
                        self.generation
                    );
                    return vec![];
                }
                match ticket.kind {
                    FetchKind::Initial => {
                        self.finish_initial(result);
                        vec![]
                    }
                    FetchKind::Next => {
                        self.loading_next = false;
                        self.finish_next(ticket.request, result);
                        vec![]
                    }
                    FetchKind::Prev => {
                        self.loading_prev = false;
                        self.finish_prev(ticket.request, result)
                    }
                }
            }
        }
    }

    fn ticket(&self, kind: FetchKind, request: PageRequest) -> Effect {
        Effect::Fetch(FetchTicket {
            generation: self.generation,
            kind,
            request,
        })
    }

    /// Forget in-flight work and cached pages; held items stay until replaced.
    fn invalidate(&mut self) {
        self.generation += 1;
        self.loading_initial = false;
        self.loading_next = false;
        self.loading_prev = false;
        self.cache.clear();
    }

    fn start_initial_load(&mut self) -> Vec<Effect> {
        if self.loading_initial {
            return vec![];
        }
        self.loading_initial = true;
        self.status = FeedStatus::Loading;
        vec![self.ticket(FetchKind::Initial, PageRequest::first(self.settings.page_size))]
    }

    fn load_next(&mut self) -> Vec<Effect> {
        if self.loading_initial || self.loading_next || self.window.reached_end() {
            return vec![];
        }
        let Some(cursor) = self.window.forward_cursor().cloned() else {
            return vec![];
        };

        if let Some(page) = self.cache.get(&cursor).cloned() {
            log::debug!("next page served from cache: {cursor}");
            self.merge_next(page);
            return vec![];
        }

        self.loading_next = true;
        vec![self.ticket(
            FetchKind::Next,
            PageRequest::next(cursor, self.settings.page_size),
        )]
    }

    fn load_prev(&mut self) -> Vec<Effect> {
        if self.loading_initial || self.loading_prev || self.window.is_empty() {
            return vec![];
        }
        let Some(key) = self.window.backward_key(self.settings.cursor_mode) else {
            return vec![];
        };

        if let Some(page) = self.cache.get(&key).cloned() {
            log::debug!("previous page served from cache: {key}");
            return self.merge_prev(page);
        }

        self.loading_prev = true;
        vec![self.ticket(
            FetchKind::Prev,
            PageRequest::prev(key, self.settings.page_size),
        )]
    }

    fn finish_initial(&mut self, result: Result<Page<T>, ApiError>) {
        self.loading_initial = false;
        match result {
            Ok(page) => {
                self.total_count = page.total_count;
                self.window.replace(page);
                self.status = if self.window.is_empty() {
                    FeedStatus::Empty
                } else {
                    FeedStatus::Ready
                };
            }
            Err(ApiError::NotFound(message)) => {
                log::info!("listing not found: {message}");
                self.window.reset();
                self.total_count = None;
                self.status = FeedStatus::NotFound;
            }
            Err(error) => {
                log::warn!("initial page failed: {error}");
                self.status = FeedStatus::Failed(error);
            }
        }
    }

    fn finish_next(&mut self, request: PageRequest, result: Result<Page<T>, ApiError>) {
        let page = match result {
            Ok(page) => page,
            Err(error) => {
                log::warn!("next page failed: {error}");
                return;
            }
        };
        let Some(cursor) = request.cursor else {
            return;
        };
        self.cache.set(cursor.clone(), page.clone());

        if self.window.forward_cursor() != Some(&cursor) {
            log::debug!("next page for {cursor} superseded; cached only");
            return;
        }
        self.merge_next(page);
    }

    fn finish_prev(
        &mut self,
        request: PageRequest,
        result: Result<Page<T>, ApiError>,
    ) -> Vec<Effect> {
        let page = match result {
            Ok(page) => page,
            Err(error) => {
                log::warn!("previous page failed: {error}");
                return vec![];
            }
        };
        let Some(key) = request.cursor else {
            return vec![];
        };
        self.cache.set(key.clone(), page.clone());

        if self.window.backward_key(self.settings.cursor_mode).as_ref() != Some(&key) {
            log::debug!("previous page for {key} superseded; cached only");
            return vec![];
        }
        self.merge_prev(page)
    }

    fn merge_next(&mut self, page: Page<T>) {
        if page.total_count.is_some() {
            self.total_count = page.total_count;
        }
        let Merge { added, dropped } = self.window.apply_next(page);
        if dropped > 0 {
            log::trace!("window trimmed {dropped} items from the head");
        }
        log::debug!("appended {added} items, window holds {}", self.window.len());
    }

    fn merge_prev(&mut self, page: Page<T>) -> Vec<Effect> {
        if page.total_count.is_some() {
            self.total_count = page.total_count;
        }
        let Merge { added, dropped } = self.window.apply_prev(page, self.settings.cursor_mode);
        if dropped > 0 {
            log::trace!("window trimmed {dropped} items from the tail");
        }
        if added == 0 {
            return vec![];
        }
        vec![Effect::Prepended { count: added }]
    }
}
