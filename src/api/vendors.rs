use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::models::vendor::{NewVendor, Vendor};
use crate::utils::api_response::{ApiResponse, ApiResult};
use crate::workflow::context::AuthContext;
use crate::workflow::directory;

pub fn vendor_routes() -> Router<AppState> {
    Router::new()
        .route("/vendors", get(list_vendors).post(create_vendor))
        .route("/vendors/{vendor_id}", delete(delete_vendor))
}

#[utoipa::path(
    get,
    path = "/vendors",
    responses((status = 200, description = "All vendors by name", body = [Vendor])),
    tag = "Vendors",
    security(("bearerAuth" = []))
)]
pub async fn list_vendors(State(state): State<AppState>) -> ApiResult<Vec<Vendor>> {
    let vendors = directory::list_vendors(state.store.as_ref()).await?;
    Ok(ApiResponse::ok("Vendors retrieved", vendors))
}

#[utoipa::path(
    post,
    path = "/vendors",
    request_body = NewVendor,
    responses(
        (status = 201, description = "Vendor created", body = Vendor),
        (status = 400, description = "Name and contact info are required"),
        (status = 403, description = "Purchasing roles only")
    ),
    tag = "Vendors",
    security(("bearerAuth" = []))
)]
pub async fn create_vendor(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<NewVendor>,
) -> ApiResult<Vendor> {
    let vendor = directory::create_vendor(state.store.as_ref(), &ctx, payload).await?;
    Ok(ApiResponse::success(StatusCode::CREATED, "Vendor created", vendor))
}

#[utoipa::path(
    delete,
    path = "/vendors/{vendor_id}",
    params(("vendor_id" = Uuid, Path, description = "Vendor ID")),
    responses(
        (status = 200, description = "Vendor deleted"),
        (status = 404, description = "Vendor not found")
    ),
    tag = "Vendors",
    security(("bearerAuth" = []))
)]
pub async fn delete_vendor(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(vendor_id): Path<Uuid>,
) -> ApiResult<()> {
    directory::delete_vendor(state.store.as_ref(), &ctx, vendor_id).await?;
    Ok(ApiResponse::ok("Vendor deleted", ()))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_vendors, create_vendor, delete_vendor),
    components(schemas(Vendor, NewVendor)),
    tags((name = "Vendors", description = "Vendor directory"))
)]
pub struct VendorDoc;
