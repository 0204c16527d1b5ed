use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use treekeeper_core::tree::UpdateTree;
use treekeeper_service::ServiceError;

use super::{to_error, AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/trees/{id}", get(get_tree).put(update_tree))
}

async fn get_tree(
    State(store): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    store.get_tree(&id).map(|t| Json(json!(t))).map_err(to_error)
}

async fn update_tree(
    State(store): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateTree>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if input.id_tree != id {
        return Err(to_error(ServiceError::InvalidInput(format!(
            "idTree {} does not match path {id}",
            input.id_tree
        ))));
    }
    store
        .update_tree(&input)
        .map(|t| Json(json!(t)))
        .map_err(to_error)
}
