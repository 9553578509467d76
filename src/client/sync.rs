//! Read cache for book list pages.
//!
//! Entries are keyed by [`BookListKey`] and tagged with the [`Resource`] they
//! were read from. Concurrent reads of the same key share one request, and a
//! successful mutation invalidates every entry under the `books` tag.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use uuid::Uuid;

use super::{http::BookGateway, state::UiState, ClientError};
use crate::models::book::{Book, BookPage, BookPayload};

/// Identity of one list read
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BookListKey {
    pub page: i64,
    pub search: String,
    pub genre: String,
    pub status: String,
}

impl BookListKey {
    pub fn from_state(state: &UiState) -> Self {
        Self {
            page: state.current_page,
            search: state.filters.search.clone(),
            genre: state.filters.genre.clone(),
            status: state.filters.status.clone(),
        }
    }
}

/// Invalidation scope for cached reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Books,
}

/// Loaded pages kept per cache before the least recently used is evicted
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

pub type PageResult = Result<Arc<BookPage>, ClientError>;

type SharedRead = Shared<BoxFuture<'static, PageResult>>;

enum EntryState {
    /// Request in flight, started under `generation`
    Pending { generation: u64, read: SharedRead },
    Ready(Arc<BookPage>),
}

struct CacheEntry {
    tag: Resource,
    state: EntryState,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<BookListKey, CacheEntry>,
    /// Keys of `Ready` entries, least recently used first
    recent: VecDeque<BookListKey>,
    /// Bumped on every invalidation; stale completions are not stored
    generation: u64,
    /// Most recent successfully loaded page, for placeholder display
    last_loaded: Option<Arc<BookPage>>,
}

impl CacheInner {
    fn touch(&mut self, key: &BookListKey) {
        self.recent.retain(|k| k != key);
        self.recent.push_back(key.clone());
    }

    fn evict_beyond(&mut self, capacity: usize) {
        while self.recent.len() > capacity {
            if let Some(oldest) = self.recent.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }
}

/// What the cache can show for a key right now
#[derive(Debug, Clone, PartialEq)]
pub struct CachedRead {
    pub data: Option<Arc<BookPage>>,
    /// `data` belongs to another key and stands in until this one loads
    pub is_previous_data: bool,
    pub is_fetching: bool,
}

pub struct BookQueryCache {
    gateway: Arc<dyn BookGateway>,
    page_size: i64,
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl BookQueryCache {
    pub fn new(gateway: Arc<dyn BookGateway>, page_size: i64) -> Self {
        Self::with_capacity(gateway, page_size, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(gateway: Arc<dyn BookGateway>, page_size: i64, capacity: usize) -> Self {
        Self {
            gateway,
            page_size,
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_read(&self, key: &BookListKey) -> SharedRead {
        let gateway = Arc::clone(&self.gateway);
        let key = key.clone();
        let limit = self.page_size;
        async move {
            tracing::debug!(?key, "Fetching book page");
            gateway.list_books(&key, limit).await.map(Arc::new)
        }
        .boxed()
        .shared()
    }

    /// Read a page, joining an in-flight request for the same key if any
    pub async fn read(&self, key: &BookListKey) -> PageResult {
        let (generation, read) = {
            let mut inner = self.lock();
            match inner.entries.get(key).map(|entry| &entry.state) {
                Some(EntryState::Ready(page)) => {
                    let page = Arc::clone(page);
                    inner.touch(key);
                    return Ok(page);
                }
                Some(EntryState::Pending { generation, read }) => (*generation, read.clone()),
                None => {
                    let generation = inner.generation;
                    let read = self.start_read(key);
                    inner.entries.insert(
                        key.clone(),
                        CacheEntry {
                            tag: Resource::Books,
                            state: EntryState::Pending {
                                generation,
                                read: read.clone(),
                            },
                        },
                    );
                    (generation, read)
                }
            }
        };

        let result = read.await;
        self.settle(key, generation, &result);
        result
    }

    /// Record a finished read unless it was invalidated meanwhile
    fn settle(&self, key: &BookListKey, generation: u64, result: &PageResult) {
        let mut inner = self.lock();
        let still_current = matches!(
            inner.entries.get(key).map(|entry| &entry.state),
            Some(EntryState::Pending { generation: g, .. }) if *g == generation
        );
        if !still_current {
            return;
        }

        match result {
            Ok(page) => {
                inner.last_loaded = Some(Arc::clone(page));
                if let Some(entry) = inner.entries.get_mut(key) {
                    entry.state = EntryState::Ready(Arc::clone(page));
                }
                inner.touch(key);
                inner.evict_beyond(self.capacity);
            }
            // Failures are not cached; the next read retries
            Err(_) => {
                inner.entries.remove(key);
            }
        }
    }

    /// Drop every entry tagged with `tag`
    pub fn invalidate(&self, tag: Resource) {
        let mut inner = self.lock();
        inner.generation += 1;
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| entry.tag != tag);
        let CacheInner { entries, recent, .. } = &mut *inner;
        recent.retain(|key| entries.contains_key(key));
        tracing::debug!(?tag, dropped = before - inner.entries.len(), "Invalidated cached reads");
    }

    /// Current view for `key`, falling back to the last loaded page
    pub fn placeholder(&self, key: &BookListKey) -> CachedRead {
        let inner = self.lock();
        match inner.entries.get(key).map(|entry| &entry.state) {
            Some(EntryState::Ready(page)) => CachedRead {
                data: Some(Arc::clone(page)),
                is_previous_data: false,
                is_fetching: false,
            },
            state => CachedRead {
                data: inner.last_loaded.clone(),
                is_previous_data: inner.last_loaded.is_some(),
                is_fetching: matches!(state, Some(EntryState::Pending { .. })),
            },
        }
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }
}

/// Gateway access with cache maintenance after mutations
pub struct BookSync {
    gateway: Arc<dyn BookGateway>,
    cache: BookQueryCache,
}

impl BookSync {
    pub fn new(gateway: Arc<dyn BookGateway>, page_size: i64) -> Self {
        Self::with_cache(BookQueryCache::new(Arc::clone(&gateway), page_size), gateway)
    }

    pub fn with_cache(cache: BookQueryCache, gateway: Arc<dyn BookGateway>) -> Self {
        Self { gateway, cache }
    }

    pub fn cache(&self) -> &BookQueryCache {
        &self.cache
    }

    pub async fn read(&self, key: &BookListKey) -> PageResult {
        self.cache.read(key).await
    }

    pub async fn get_book(&self, id: Uuid) -> Result<Book, ClientError> {
        self.gateway.get_book(id).await
    }

    pub async fn create_book(&self, payload: &BookPayload) -> Result<Book, ClientError> {
        let book = self.gateway.create_book(payload).await?;
        self.cache.invalidate(Resource::Books);
        Ok(book)
    }

    pub async fn update_book(&self, id: Uuid, payload: &BookPayload) -> Result<Book, ClientError> {
        let book = self.gateway.update_book(id, payload).await?;
        self.cache.invalidate(Resource::Books);
        Ok(book)
    }

    pub async fn delete_book(&self, id: Uuid) -> Result<(), ClientError> {
        self.gateway.delete_book(id).await?;
        self.cache.invalidate(Resource::Books);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{payload, ServiceGateway};
    use super::*;

    fn key(page: i64) -> BookListKey {
        BookListKey {
            page,
            search: String::new(),
            genre: String::new(),
            status: String::new(),
        }
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_one_request() {
        let gateway = Arc::new(ServiceGateway::gated());
        let sync = BookSync::new(gateway.clone(), 10);

        let k = key(1);
        let (a, b, ()) = tokio::join!(sync.read(&k), sync.read(&k), async {
            tokio::task::yield_now().await;
            gateway.release(1);
        });

        assert_eq!(gateway.calls(), 1);
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[tokio::test]
    async fn test_least_recently_used_page_is_evicted() {
        let gateway = Arc::new(ServiceGateway::new());
        let cache = BookQueryCache::with_capacity(gateway.clone(), 10, 2);

        cache.read(&key(1)).await.unwrap();
        cache.read(&key(2)).await.unwrap();
        // Page 1 becomes the most recent, so page 2 goes first
        cache.read(&key(1)).await.unwrap();
        cache.read(&key(3)).await.unwrap();
        assert_eq!(gateway.calls(), 3);

        cache.read(&key(1)).await.unwrap();
        cache.read(&key(3)).await.unwrap();
        assert_eq!(gateway.calls(), 3);

        cache.read(&key(2)).await.unwrap();
        assert_eq!(gateway.calls(), 4);
    }

    #[tokio::test]
    async fn test_cached_read_is_not_refetched() {
        let gateway = Arc::new(ServiceGateway::new());
        let sync = BookSync::new(gateway.clone(), 10);

        sync.read(&key(1)).await.unwrap();
        sync.read(&key(1)).await.unwrap();
        assert_eq!(gateway.calls(), 1);

        sync.read(&key(2)).await.unwrap();
        assert_eq!(gateway.calls(), 2);
    }

    #[tokio::test]
    async fn test_mutations_invalidate_every_key() {
        let gateway = Arc::new(ServiceGateway::new());
        let sync = BookSync::new(gateway.clone(), 10);

        let filtered = BookListKey {
            genre: "Fantasy".into(),
            ..key(1)
        };
        sync.read(&key(1)).await.unwrap();
        sync.read(&filtered).await.unwrap();
        assert_eq!(gateway.calls(), 2);

        let created = sync.create_book(&payload("Frankenstein")).await.unwrap();
        let page = sync.read(&key(1)).await.unwrap();
        assert_eq!(page.total, 1);
        sync.read(&filtered).await.unwrap();
        assert_eq!(gateway.calls(), 4);

        let mut issued = payload("Frankenstein");
        issued.status = Some("Issued".into());
        sync.update_book(created.id, &issued).await.unwrap();
        let page = sync.read(&key(1)).await.unwrap();
        assert_eq!(page.data[0].status, crate::models::book::BookStatus::Issued);

        sync.delete_book(created.id).await.unwrap();
        let page = sync.read(&key(1)).await.unwrap();
        assert_eq!(page.total, 0);
        assert_eq!(gateway.calls(), 6);
    }

    #[tokio::test]
    async fn test_failed_mutation_keeps_cache() {
        let gateway = Arc::new(ServiceGateway::new());
        let sync = BookSync::new(gateway.clone(), 10);

        sync.read(&key(1)).await.unwrap();
        let err = sync.delete_book(Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_not_found());

        sync.read(&key(1)).await.unwrap();
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_read_is_not_cached() {
        let gateway = Arc::new(ServiceGateway::new());
        let sync = BookSync::new(gateway.clone(), 10);

        gateway.set_failing(true);
        assert!(sync.read(&key(1)).await.is_err());

        gateway.set_failing(false);
        assert!(sync.read(&key(1)).await.is_ok());
        assert_eq!(gateway.calls(), 2);
    }

    #[tokio::test]
    async fn test_placeholder_keeps_previous_data() {
        let gateway = Arc::new(ServiceGateway::new());
        let sync = BookSync::new(gateway.clone(), 10);

        let empty = sync.cache().placeholder(&key(1));
        assert!(empty.data.is_none());
        assert!(!empty.is_previous_data);

        let first = sync.read(&key(1)).await.unwrap();
        let current = sync.cache().placeholder(&key(1));
        assert_eq!(current.data, Some(first.clone()));
        assert!(!current.is_previous_data);

        let other = sync.cache().placeholder(&key(2));
        assert_eq!(other.data, Some(first));
        assert!(other.is_previous_data);
        assert!(!other.is_fetching);
    }

    #[tokio::test]
    async fn test_invalidated_read_does_not_repopulate() {
        let gateway = Arc::new(ServiceGateway::gated());
        let sync = BookSync::new(gateway.clone(), 10);
        let k = key(1);

        let (result, _) = tokio::join!(sync.read(&k), async {
            tokio::task::yield_now().await;
            sync.cache().invalidate(Resource::Books);
            gateway.release(1);
        });
        assert!(result.is_ok());

        // The stale completion was not stored, so this read fetches again
        gateway.release(1);
        sync.read(&k).await.unwrap();
        assert_eq!(gateway.calls(), 2);
    }
}
