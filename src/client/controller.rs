//! Catalog list controller: keeps the UI state, the read cache and the
//! user-facing notifications consistent with each other.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use super::{
    http::BookApi,
    state::{Action, StateStore},
    sync::{BookListKey, BookSync, PageResult},
    ClientConfig, ClientError,
};
use crate::models::book::{Book, BookPayload};

/// Shown when the current filters match nothing
pub const FILTERED_EMPTY_MESSAGE: &str = "Try adjusting your search or filter criteria.";

/// Shown when the catalog itself is empty
pub const EMPTY_CATALOG_MESSAGE: &str = "Get started by adding your first book.";

const NOTIFICATION_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Transient user-facing message (toast)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// What the list area should render
#[derive(Debug, Clone, PartialEq)]
pub enum ListView {
    Loading,
    Error(String),
    Empty { message: &'static str },
    Books(Vec<Book>),
}

impl ListView {
    /// Classify the latest read; `None` means nothing has arrived yet
    pub fn from_result(result: Option<&PageResult>, filters_active: bool) -> Self {
        match result {
            None => ListView::Loading,
            Some(Err(e)) => ListView::Error(e.to_string()),
            Some(Ok(page)) if page.data.is_empty() => ListView::Empty {
                message: if filters_active {
                    FILTERED_EMPTY_MESSAGE
                } else {
                    EMPTY_CATALOG_MESSAGE
                },
            },
            Some(Ok(page)) => ListView::Books(page.data.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// The state moved on or a newer read landed first; nothing was dispatched
    Superseded,
}

#[derive(Clone, Copy)]
enum Mutation {
    Create,
    Update,
    Delete,
}

impl Mutation {
    fn verb(self) -> &'static str {
        match self {
            Mutation::Create => "create",
            Mutation::Update => "update",
            Mutation::Delete => "delete",
        }
    }

    fn success_message(self) -> &'static str {
        match self {
            Mutation::Create => "Book created successfully!",
            Mutation::Update => "Book updated successfully!",
            Mutation::Delete => "Book deleted successfully!",
        }
    }
}

#[derive(Default)]
struct AppliedRead {
    ticket: u64,
    result: Option<PageResult>,
}

pub struct BookListController {
    store: StateStore,
    sync: Arc<BookSync>,
    notifications: broadcast::Sender<Notification>,
    next_ticket: AtomicU64,
    applied: Mutex<AppliedRead>,
}

impl BookListController {
    pub fn new(store: StateStore, sync: Arc<BookSync>) -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            store,
            sync,
            notifications,
            next_ticket: AtomicU64::new(0),
            applied: Mutex::new(AppliedRead::default()),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let api = Arc::new(BookApi::from_config(config));
        Self::new(
            StateStore::default(),
            Arc::new(BookSync::new(api, config.page_size)),
        )
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn sync(&self) -> &BookSync {
        &self.sync
    }

    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    fn lock_applied(&self) -> MutexGuard<'_, AppliedRead> {
        self.applied.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, level: NotificationLevel, message: String) {
        // Sending only fails when nobody is listening
        self.notifications.send(Notification { level, message }).ok();
    }

    /// Open the edit modal for a new book
    pub fn add_book(&self) {
        self.store.dispatch(Action::SetSelectedBook(None));
        self.store.dispatch(Action::OpenModal);
    }

    pub fn edit_book(&self, book: Book) {
        self.store.dispatch(Action::SetSelectedBook(Some(book)));
        self.store.dispatch(Action::OpenModal);
    }

    pub fn request_delete(&self, book: Book) {
        self.store.dispatch(Action::OpenDeleteModal(book));
    }

    /// Load the page for the current state and publish it, unless the
    /// answer is stale by the time it arrives
    pub async fn refresh(&self) -> Result<RefreshOutcome, ClientError> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let key = BookListKey::from_state(&self.store.snapshot());

        let result = self.sync.read(&key).await;

        let mut applied = self.lock_applied();
        if BookListKey::from_state(&self.store.snapshot()) != key || applied.ticket > ticket {
            tracing::debug!(ticket, ?key, "Discarding superseded book page");
            return Ok(RefreshOutcome::Superseded);
        }
        applied.ticket = ticket;

        match &result {
            Ok(page) => {
                self.store.dispatch(Action::SetBooks {
                    books: page.data.clone(),
                    total_pages: page.total_pages,
                });
            }
            Err(e) => tracing::warn!(error = %e, "Failed to load books"),
        }
        applied.result = Some(result.clone());
        result.map(|_| RefreshOutcome::Applied)
    }

    async fn refresh_after_mutation(&self) {
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "Refresh after mutation failed");
        }
    }

    /// Save the edit modal: update the selected book or create a new one
    pub async fn submit_book(&self, payload: BookPayload) -> Result<Book, ClientError> {
        let selected = self.store.snapshot().selected_book;
        let (mutation, result) = match selected {
            Some(book) => (Mutation::Update, self.sync.update_book(book.id, &payload).await),
            None => (Mutation::Create, self.sync.create_book(&payload).await),
        };

        match result {
            Ok(book) => {
                self.store.dispatch(Action::CloseModal);
                self.notify(NotificationLevel::Success, mutation.success_message().to_string());
                self.refresh_after_mutation().await;
                Ok(book)
            }
            Err(e) => {
                self.notify(
                    NotificationLevel::Error,
                    format!("Failed to {} book: {}", mutation.verb(), e),
                );
                Err(e)
            }
        }
    }

    /// Delete the book awaiting confirmation; a no-op when none is selected
    pub async fn confirm_delete(&self) -> Result<(), ClientError> {
        let Some(book) = self.store.snapshot().selected_book else {
            return Ok(());
        };

        match self.sync.delete_book(book.id).await {
            Ok(()) => {
                self.store.dispatch(Action::CloseDeleteModal);
                self.notify(
                    NotificationLevel::Success,
                    Mutation::Delete.success_message().to_string(),
                );
                self.refresh_after_mutation().await;
                Ok(())
            }
            Err(e) => {
                self.notify(
                    NotificationLevel::Error,
                    format!("Failed to {} book: {}", Mutation::Delete.verb(), e),
                );
                Err(e)
            }
        }
    }

    pub fn view(&self) -> ListView {
        let applied = self.lock_applied();
        ListView::from_result(applied.result.as_ref(), self.store.filters_active())
    }
}
