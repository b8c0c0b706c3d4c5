use axum::{extract::State, routing::get, Extension, Router};
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::utils::api_response::{ApiResponse, ApiResult};
use crate::workflow::context::AuthContext;
use crate::workflow::reports::{self, ProcurementSummary};

pub fn report_routes() -> Router<AppState> {
    Router::new().route("/reports/summary", get(summary))
}

/// Request and purchase order counts with payment totals
#[utoipa::path(
    get,
    path = "/reports/summary",
    responses(
        (status = 200, description = "Procurement summary", body = ProcurementSummary),
        (status = 403, description = "Purchasing roles only")
    ),
    tag = "Reports",
    security(("bearerAuth" = []))
)]
pub async fn summary(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<ProcurementSummary> {
    let summary = reports::summary(state.store.as_ref(), &ctx).await?;
    Ok(ApiResponse::ok("Summary generated", summary))
}

#[derive(OpenApi)]
#[openapi(
    paths(summary),
    components(schemas(ProcurementSummary)),
    tags((name = "Reports", description = "Procurement reporting"))
)]
pub struct ReportDoc;
