use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::models::purchase_order::{
    NewPurchaseOrder, PurchaseOrder, PurchaseOrderDetail, PurchaseOrderFilter, PurchaseOrderListParams, Receipt,
    ShipmentUpdate,
};
use crate::utils::api_response::{ApiResponse, ApiResult};
use crate::workflow::context::AuthContext;
use crate::workflow::error::WorkflowError;
use crate::workflow::status::PurchaseOrderStatus;

pub fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route("/purchase-orders", post(issue_purchase_order).get(list_purchase_orders))
        .route("/purchase-orders/{po_id}", get(get_purchase_order))
        .route("/purchase-orders/{po_id}/status", patch(update_shipment))
        .route("/purchase-orders/{po_id}/receive", post(receive_purchase_order))
}

/// Issue a purchase order against an admin-approved request
#[utoipa::path(
    post,
    path = "/purchase-orders",
    request_body = NewPurchaseOrder,
    responses(
        (status = 201, description = "Purchase order issued, request moved to po issued", body = PurchaseOrder),
        (status = 400, description = "Missing PO number, unknown vendor or duplicate PO number"),
        (status = 403, description = "Role or request status does not allow issuance"),
        (status = 409, description = "Request changed concurrently")
    ),
    tag = "Purchase Orders",
    security(("bearerAuth" = []))
)]
pub async fn issue_purchase_order(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<NewPurchaseOrder>,
) -> ApiResult<PurchaseOrder> {
    let order = state.engine.issue_purchase_order(&ctx, payload).await?;
    Ok(ApiResponse::success(StatusCode::CREATED, "Purchase order issued", order))
}

#[utoipa::path(
    get,
    path = "/purchase-orders",
    params(PurchaseOrderListParams),
    responses(
        (status = 200, description = "Purchase orders with request and vendor", body = [PurchaseOrderDetail]),
        (status = 403, description = "Purchasing roles only")
    ),
    tag = "Purchase Orders",
    security(("bearerAuth" = []))
)]
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<PurchaseOrderListParams>,
) -> ApiResult<Vec<PurchaseOrderDetail>> {
    let statuses = match params.status.filter(|s| !s.trim().is_empty()) {
        Some(raw) => vec![raw
            .parse::<PurchaseOrderStatus>()
            .map_err(|e| WorkflowError::validation(e.to_string()))?],
        None => Vec::new(),
    };
    let filter = PurchaseOrderFilter { statuses, unpaid_only: params.unpaid_only };
    let orders = state.engine.list_purchase_orders(&ctx, filter).await?;
    Ok(ApiResponse::ok("Purchase orders retrieved", orders))
}

#[utoipa::path(
    get,
    path = "/purchase-orders/{po_id}",
    params(("po_id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order found", body = PurchaseOrder),
        (status = 404, description = "Purchase order not found")
    ),
    tag = "Purchase Orders",
    security(("bearerAuth" = []))
)]
pub async fn get_purchase_order(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(po_id): Path<Uuid>,
) -> ApiResult<PurchaseOrder> {
    let order = state.engine.get_purchase_order(&ctx, po_id).await?;
    Ok(ApiResponse::ok("Purchase order retrieved", order))
}

/// Record shipment progress (`shipped` or `delivered`)
#[utoipa::path(
    patch,
    path = "/purchase-orders/{po_id}/status",
    params(("po_id" = Uuid, Path, description = "Purchase order ID")),
    request_body = ShipmentUpdate,
    responses(
        (status = 200, description = "Shipment status updated", body = PurchaseOrder),
        (status = 403, description = "Role or current status does not allow this change")
    ),
    tag = "Purchase Orders",
    security(("bearerAuth" = []))
)]
pub async fn update_shipment(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(po_id): Path<Uuid>,
    Json(payload): Json<ShipmentUpdate>,
) -> ApiResult<PurchaseOrder> {
    let order = state.engine.advance_shipment(&ctx, po_id, payload.status).await?;
    Ok(ApiResponse::ok("Shipment status updated", order))
}

/// Mark goods received; completes the linked request
#[utoipa::path(
    post,
    path = "/purchase-orders/{po_id}/receive",
    params(("po_id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Order received, request completed", body = Receipt),
        (status = 403, description = "Role or current status does not allow receipt"),
        (status = 409, description = "Order or request changed concurrently")
    ),
    tag = "Purchase Orders",
    security(("bearerAuth" = []))
)]
pub async fn receive_purchase_order(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(po_id): Path<Uuid>,
) -> ApiResult<Receipt> {
    let receipt = state.engine.receive_purchase_order(&ctx, po_id).await?;
    Ok(ApiResponse::ok("Goods received", receipt))
}

#[derive(OpenApi)]
#[openapi(
    paths(issue_purchase_order, list_purchase_orders, get_purchase_order, update_shipment, receive_purchase_order),
    components(schemas(PurchaseOrder, PurchaseOrderDetail, NewPurchaseOrder, ShipmentUpdate, Receipt)),
    tags((name = "Purchase Orders", description = "Purchase order issuance, shipment and receipt"))
)]
pub struct PurchaseOrderDoc;
