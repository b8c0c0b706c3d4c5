use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::models::requests::{DecisionPayload, NewProcurementRequest, ProcurementRequest, RequestListParams};
use crate::utils::api_response::{ApiResponse, ApiResult};
use crate::workflow::context::AuthContext;
use crate::workflow::error::WorkflowError;
use crate::workflow::status::RequestStatus;
use crate::workflow::transitions::Decision;

pub fn request_routes() -> Router<AppState> {
    Router::new()
        .route("/requests", post(submit_request).get(list_requests))
        .route("/requests/mine", get(my_requests))
        .route("/requests/review-queue", get(review_queue))
        .route("/requests/{request_id}", get(get_request))
        .route("/requests/{request_id}/decision", post(decide_request))
        .route("/requests/{request_id}/processed", post(mark_processed))
}

fn parse_status(raw: Option<String>) -> Result<Option<RequestStatus>, WorkflowError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<RequestStatus>().map_err(|e| WorkflowError::validation(e.to_string())))
        .transpose()
}

/// Submit a procurement request for the caller's team
#[utoipa::path(
    post,
    path = "/requests",
    request_body = NewProcurementRequest,
    responses(
        (status = 201, description = "Request submitted", body = ProcurementRequest),
        (status = 400, description = "Invalid request fields")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn submit_request(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<NewProcurementRequest>,
) -> ApiResult<ProcurementRequest> {
    let request = state.engine.submit_request(&ctx, payload).await?;
    Ok(ApiResponse::success(StatusCode::CREATED, "Request submitted", request))
}

/// List requests visible to the caller, optionally by status
#[utoipa::path(
    get,
    path = "/requests",
    params(RequestListParams),
    responses(
        (status = 200, description = "Requests, newest first", body = [ProcurementRequest]),
        (status = 400, description = "Unknown status")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<RequestListParams>,
) -> ApiResult<Vec<ProcurementRequest>> {
    let status = parse_status(params.status)?;
    let requests = state.engine.list_requests(&ctx, status).await?;
    Ok(ApiResponse::ok("Requests retrieved", requests))
}

#[utoipa::path(
    get,
    path = "/requests/mine",
    responses((status = 200, description = "The caller's own requests", body = [ProcurementRequest])),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn my_requests(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Vec<ProcurementRequest>> {
    let requests = state.engine.my_requests(&ctx).await?;
    Ok(ApiResponse::ok("Requests retrieved", requests))
}

/// Requests waiting on the caller's role
#[utoipa::path(
    get,
    path = "/requests/review-queue",
    responses(
        (status = 200, description = "Requests awaiting action", body = [ProcurementRequest]),
        (status = 403, description = "Employees have no queue")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn review_queue(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Vec<ProcurementRequest>> {
    let requests = state.engine.review_queue(&ctx).await?;
    Ok(ApiResponse::ok("Review queue retrieved", requests))
}

#[utoipa::path(
    get,
    path = "/requests/{request_id}",
    params(("request_id" = Uuid, Path, description = "Procurement request ID")),
    responses(
        (status = 200, description = "Request found", body = ProcurementRequest),
        (status = 403, description = "Not visible to the caller"),
        (status = 404, description = "Request not found")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_request(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(request_id): Path<Uuid>,
) -> ApiResult<ProcurementRequest> {
    let request = state.engine.get_request(&ctx, request_id).await?;
    Ok(ApiResponse::ok("Request retrieved", request))
}

/// Approve or reject at the caller's stage
#[utoipa::path(
    post,
    path = "/requests/{request_id}/decision",
    params(("request_id" = Uuid, Path, description = "Procurement request ID")),
    request_body = DecisionPayload,
    responses(
        (status = 200, description = "Decision recorded", body = ProcurementRequest),
        (status = 403, description = "Role or status does not allow this decision"),
        (status = 409, description = "Request changed concurrently")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn decide_request(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<DecisionPayload>,
) -> ApiResult<ProcurementRequest> {
    let request = state.engine.decide_request(&ctx, request_id, payload.decision).await?;
    let message = match payload.decision {
        Decision::Approve => "Request approved",
        Decision::Reject => "Request rejected",
    };
    Ok(ApiResponse::ok(message, request))
}

#[utoipa::path(
    post,
    path = "/requests/{request_id}/processed",
    params(("request_id" = Uuid, Path, description = "Procurement request ID")),
    responses(
        (status = 200, description = "Request marked processed", body = ProcurementRequest),
        (status = 403, description = "Role or status does not allow processing")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn mark_processed(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(request_id): Path<Uuid>,
) -> ApiResult<ProcurementRequest> {
    let request = state.engine.mark_processed(&ctx, request_id).await?;
    Ok(ApiResponse::ok("Request marked processed", request))
}

#[derive(OpenApi)]
#[openapi(
    paths(submit_request, list_requests, my_requests, review_queue, get_request, decide_request, mark_processed),
    components(schemas(ProcurementRequest, NewProcurementRequest, DecisionPayload, Decision)),
    tags((name = "Requests", description = "Procurement request submission and approval"))
)]
pub struct RequestDoc;
