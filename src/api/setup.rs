use axum::{extract::State, routing::post, Extension, Router};
use serde::Serialize;
use tracing::info;
use utoipa::{OpenApi, ToSchema};

use crate::app_state::AppState;
use crate::utils::api_response::{ApiResponse, ApiResult};
use crate::workflow::context::AuthContext;
use crate::workflow::schema::refresh_capabilities;

pub fn setup_routes() -> Router<AppState> {
    Router::new().route("/setup/schema-check", post(schema_check))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SchemaCheckResult {
    pub payment_tracking: bool,
}

/// Re-run the payment schema check, e.g. after applying a migration
#[utoipa::path(
    post,
    path = "/setup/schema-check",
    responses(
        (status = 200, description = "Check finished", body = SchemaCheckResult),
        (status = 403, description = "Admins only")
    ),
    tag = "Setup",
    security(("bearerAuth" = []))
)]
pub async fn schema_check(State(state): State<AppState>, Extension(ctx): Extension<AuthContext>) -> ApiResult<SchemaCheckResult> {
    ctx.require_admin("run the schema check")?;
    let payment_tracking = refresh_capabilities(state.store.as_ref(), &state.capabilities).await;
    info!(payment_tracking, by = %ctx.user_id, "schema check re-run");
    Ok(ApiResponse::ok("Schema check finished", SchemaCheckResult { payment_tracking }))
}

#[derive(OpenApi)]
#[openapi(
    paths(schema_check),
    components(schemas(SchemaCheckResult)),
    tags((name = "Setup", description = "Schema readiness"))
)]
pub struct SetupDoc;
