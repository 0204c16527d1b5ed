use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use treekeeper_core::visit::CreateVisit;

use super::{to_error, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/treehistory/{tree_id}", get(list_history))
        .route("/api/treehistory", post(append_visit))
}

async fn list_history(
    State(store): State<AppState>,
    Path(tree_id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    store
        .visit_history(&tree_id)
        .map(|h| Json(json!(h)))
        .map_err(to_error)
}

async fn append_visit(
    State(store): State<AppState>,
    Json(input): Json<CreateVisit>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    store
        .append_visit(&input)
        .map(|v| (StatusCode::CREATED, Json(json!(v))))
        .map_err(to_error)
}
