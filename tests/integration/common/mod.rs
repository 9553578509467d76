//! Shared helpers for the integration tests

#![allow(dead_code)]

use bookshelf::{api::create_router, AppState};
use tokio::net::TcpListener;

/// Serve `state` on an ephemeral local port and return the base URL
pub async fn spawn_app(state: AppState) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");

    tokio::spawn(async move {
        axum::serve(listener, create_router(state))
            .await
            .expect("Test server failed");
    });

    format!("http://{}", addr)
}

/// Base URL of a server over a fresh in-memory catalog
pub async fn spawn_memory_app() -> String {
    spawn_app(AppState::in_memory()).await
}
