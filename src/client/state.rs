//! Client UI state and its transition function.
//!
//! [`reduce`] is a pure function over [`UiState`]; [`StateStore`] owns the
//! current state and is the only way to change it.

use std::sync::Arc;

use tokio::sync::watch;

use crate::models::book::Book;

/// Select-box sentinel meaning "no genre filter"
pub const ALL_GENRES: &str = "All Genres";

/// Select-box sentinel meaning "no status filter"
pub const ALL_STATUSES: &str = "All Statuses";

/// Genres offered by the filter and edit forms; any other genre is accepted
pub const SUGGESTED_GENRES: [&str; 13] = [
    "Classic Literature",
    "Dystopian Fiction",
    "Romance",
    "Coming-of-age",
    "Fantasy",
    "Gothic Romance",
    "Gothic Literature",
    "Science Fiction",
    "Mystery",
    "Thriller",
    "Historical Fiction",
    "Biography",
    "Non-fiction",
];

/// Active list filters; an empty string means "no constraint"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub search: String,
    pub genre: String,
    pub status: String,
}

impl Filters {
    pub fn is_active(&self) -> bool {
        !(self.search.is_empty() && self.genre.is_empty() && self.status.is_empty())
    }
}

/// Partial filter update merged into the current filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatch {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub status: Option<String>,
}

impl FilterPatch {
    pub fn search(value: impl Into<String>) -> Self {
        Self {
            search: Some(value.into()),
            ..Self::default()
        }
    }

    /// Genre selection; the "All Genres" sentinel clears the filter
    pub fn genre(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            genre: Some(if value == ALL_GENRES { String::new() } else { value }),
            ..Self::default()
        }
    }

    /// Status selection; the "All Statuses" sentinel clears the filter
    pub fn status(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            status: Some(if value == ALL_STATUSES { String::new() } else { value }),
            ..Self::default()
        }
    }

    fn apply(self, filters: Filters) -> Filters {
        Filters {
            search: self.search.unwrap_or(filters.search),
            genre: self.genre.unwrap_or(filters.genre),
            status: self.status.unwrap_or(filters.status),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub books: Vec<Book>,
    pub current_page: i64,
    pub total_pages: i64,
    pub filters: Filters,
    /// Set only while a modal referencing it is open
    pub selected_book: Option<Book>,
    pub is_modal_open: bool,
    pub is_delete_modal_open: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            books: Vec::new(),
            current_page: 1,
            total_pages: 1,
            filters: Filters::default(),
            selected_book: None,
            is_modal_open: false,
            is_delete_modal_open: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetBooks { books: Vec<Book>, total_pages: i64 },
    SetCurrentPage(i64),
    /// Merge into the current filters and go back to page 1
    SetFilters(FilterPatch),
    SetSelectedBook(Option<Book>),
    OpenModal,
    /// Close the edit modal and drop the selection
    CloseModal,
    /// Select `book` and open the delete confirmation
    OpenDeleteModal(Book),
    CloseDeleteModal,
    /// Unrecognised intent; leaves the state untouched
    Noop,
}

/// Apply one action. Total over every state and free of side effects.
pub fn reduce(state: UiState, action: Action) -> UiState {
    match action {
        Action::SetBooks { books, total_pages } => UiState {
            books,
            total_pages,
            ..state
        },
        Action::SetCurrentPage(page) => UiState {
            current_page: page,
            ..state
        },
        Action::SetFilters(patch) => UiState {
            filters: patch.apply(state.filters),
            current_page: 1,
            ..state
        },
        Action::SetSelectedBook(book) => UiState {
            selected_book: book,
            ..state
        },
        Action::OpenModal => UiState {
            is_modal_open: true,
            ..state
        },
        Action::CloseModal => UiState {
            is_modal_open: false,
            selected_book: None,
            ..state
        },
        Action::OpenDeleteModal(book) => UiState {
            is_delete_modal_open: true,
            selected_book: Some(book),
            ..state
        },
        Action::CloseDeleteModal => UiState {
            is_delete_modal_open: false,
            selected_book: None,
            ..state
        },
        Action::Noop => state,
    }
}

/// Owner of the UI state; `dispatch` and `subscribe` are the only access paths
#[derive(Clone)]
pub struct StateStore {
    tx: Arc<watch::Sender<UiState>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(UiState::default())
    }
}

impl StateStore {
    pub fn new(initial: UiState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn dispatch(&self, action: Action) {
        tracing::trace!(?action, "dispatch");
        self.tx.send_modify(|state| {
            let current = std::mem::take(state);
            *state = reduce(current, action);
        });
    }

    /// Receiver that observes every dispatched change
    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> UiState {
        self.tx.borrow().clone()
    }

    pub fn filters_active(&self) -> bool {
        self.tx.borrow().filters.is_active()
    }
}
