mod routes;
pub mod store;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;

use store::MemoryStore;

pub async fn serve(listener: TcpListener, store: Arc<MemoryStore>) -> Result<()> {
    let app = routes::build_router(store);
    axum::serve(listener, app).await?;
    Ok(())
}
