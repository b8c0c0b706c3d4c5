use axum::{extract::State, routing::get, Extension, Router};
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::db::models::inventory::InventoryItem;
use crate::utils::api_response::{ApiResponse, ApiResult};
use crate::workflow::context::AuthContext;
use crate::workflow::directory;

pub fn inventory_routes() -> Router<AppState> {
    Router::new().route("/inventory", get(list_inventory))
}

/// Current stock levels, alphabetical by item
#[utoipa::path(
    get,
    path = "/inventory",
    responses(
        (status = 200, description = "Inventory items by name", body = [InventoryItem]),
        (status = 403, description = "Procurement officers and admins only")
    ),
    tag = "Inventory",
    security(("bearerAuth" = []))
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Vec<InventoryItem>> {
    let items = directory::list_inventory(state.store.as_ref(), &ctx).await?;
    Ok(ApiResponse::ok("Inventory retrieved", items))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_inventory),
    components(schemas(InventoryItem)),
    tags((name = "Inventory", description = "Stock levels"))
)]
pub struct InventoryDoc;
