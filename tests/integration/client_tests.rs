//! Catalog client integration tests against an in-process server

mod common;

use std::sync::Arc;

use bookshelf::client::{
    pagination, Action, BookApi, BookGateway, BookListController, BookListKey, BookSync,
    ClientError, FilterPatch, ListView, NotificationLevel, RefreshOutcome, StateStore,
};
use bookshelf::models::{BookPayload, BookStatus};
use tokio_test::{assert_err, assert_ok};

use common::spawn_memory_app;

fn payload(title: &str, genre: &str) -> BookPayload {
    BookPayload {
        title: Some(title.into()),
        author: Some("Ursula K. Le Guin".into()),
        genre: Some(genre.into()),
        published_year: Some(1969.into()),
        status: Some("Available".into()),
    }
}

fn all_books(page: i64) -> BookListKey {
    BookListKey {
        page,
        search: String::new(),
        genre: String::new(),
        status: String::new(),
    }
}

fn controller(base: &str) -> BookListController {
    let api = Arc::new(BookApi::new(base));
    BookListController::new(StateStore::default(), Arc::new(BookSync::new(api, 10)))
}

#[tokio::test]
async fn test_gateway_round_trip() {
    let base = spawn_memory_app().await;
    let api = BookApi::new(format!("{}/", base));

    let created = assert_ok!(api.create_book(&payload("The Left Hand of Darkness", "Science Fiction")).await);
    let fetched = assert_ok!(api.get_book(created.id).await);
    assert_eq!(fetched, created);

    let mut issued = payload("The Left Hand of Darkness", "Science Fiction");
    issued.status = Some("Issued".into());
    let updated = assert_ok!(api.update_book(created.id, &issued).await);
    assert_eq!(updated.status, BookStatus::Issued);

    let key = BookListKey {
        status: "Issued".to_string(),
        ..all_books(1)
    };
    let page = assert_ok!(api.list_books(&key, 10).await);
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].id, created.id);

    assert_ok!(api.delete_book(created.id).await);
    let err = assert_err!(api.get_book(created.id).await);
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Book not found");
}

#[tokio::test]
async fn test_gateway_reports_api_errors() {
    let base = spawn_memory_app().await;
    let api = BookApi::new(base);

    let mut invalid = payload("Earthsea", "Fantasy");
    invalid.title = Some("   ".into());
    let err = assert_err!(api.create_book(&invalid).await);
    assert_eq!(
        err,
        ClientError::Api {
            status: 400,
            message: "Validation failed".to_string(),
        }
    );

    let unreachable = BookApi::new("http://127.0.0.1:1");
    let err = assert_err!(unreachable.list_books(&all_books(1), 10).await);
    assert!(matches!(err, ClientError::Transport(_)));
}

#[tokio::test]
async fn test_sync_refetches_after_mutation() {
    let base = spawn_memory_app().await;
    let sync = BookSync::new(Arc::new(BookApi::new(base)), 10);

    let empty = assert_ok!(sync.read(&all_books(1)).await);
    assert_eq!(empty.total, 0);

    assert_ok!(sync.create_book(&payload("A Wizard of Earthsea", "Fantasy")).await);
    let page = assert_ok!(sync.read(&all_books(1)).await);
    assert_eq!(page.total, 1);
    assert!(!sync.cache().placeholder(&all_books(1)).is_previous_data);
}

#[tokio::test]
async fn test_controller_browsing() {
    let base = spawn_memory_app().await;
    let controller = controller(&base);
    let mut notifications = controller.subscribe_notifications();

    assert_ok!(controller.refresh().await);
    assert_eq!(
        controller.view(),
        ListView::Empty {
            message: "Get started by adding your first book."
        }
    );

    for i in 0..12 {
        let genre = if i < 3 { "Fantasy" } else { "Science Fiction" };
        controller.add_book();
        assert_ok!(controller.submit_book(payload(&format!("Hainish {}", i), genre)).await);
        let notification = assert_ok!(notifications.recv().await);
        assert_eq!(notification.level, NotificationLevel::Success);
    }

    let state = controller.store().snapshot();
    assert_eq!(state.total_pages, 2);
    assert_eq!(state.books.len(), 10);
    assert!(!state.is_modal_open);

    assert!(pagination::go_to(controller.store(), 2));
    assert_eq!(assert_ok!(controller.refresh().await), RefreshOutcome::Applied);
    assert_eq!(controller.store().snapshot().books.len(), 2);
    assert!(!pagination::go_to(controller.store(), 3));

    controller
        .store()
        .dispatch(Action::SetFilters(FilterPatch::genre("Fantasy")));
    assert_eq!(controller.store().snapshot().current_page, 1);
    assert_ok!(controller.refresh().await);

    let state = controller.store().snapshot();
    assert_eq!(state.total_pages, 1);
    assert!(state.books.iter().all(|book| book.genre == "Fantasy"));
    assert!(matches!(controller.view(), ListView::Books(books) if books.len() == 3));

    let target = state.books[0].clone();
    controller.request_delete(target.clone());
    assert_ok!(controller.confirm_delete().await);
    let state = controller.store().snapshot();
    assert_eq!(state.books.len(), 2);
    assert!(state.books.iter().all(|book| book.id != target.id));
}

#[tokio::test]
async fn test_controller_unreachable_server() {
    let controller = controller("http://127.0.0.1:1");

    assert_err!(controller.refresh().await);
    assert!(matches!(controller.view(), ListView::Error(_)));
}
