pub mod health;
pub mod history;
pub mod trees;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::store::MemoryStore;

pub type AppState = Arc<MemoryStore>;

pub fn build_router(store: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(trees::routes())
        .merge(history::routes())
        .layer(CorsLayer::permissive())
        .with_state(store)
}

pub(crate) fn to_error(e: treekeeper_service::ServiceError) -> (StatusCode, Json<Value>) {
    let status = match &e {
        treekeeper_service::ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        treekeeper_service::ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        treekeeper_service::ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": e.to_string() })))
}
