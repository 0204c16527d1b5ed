use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::routes;
use crate::store::MemoryStore;

/// Build a test router over a fresh in-memory store.
pub fn test_router() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (routes::build_router(store.clone()), store)
}

/// A running test server with base_url, a handle to the backing store for
/// seeding records, and the background task handle.
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    _handle: tokio::task::JoinHandle<()>,
}

/// Spawn an axum test server on a random port. Returns the TestServer
/// with the `base_url` (e.g. "http://127.0.0.1:12345").
pub async fn spawn_test_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");
    let (app, store) = test_router();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base_url,
        store,
        _handle: handle,
    }
}
