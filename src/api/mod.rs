use std::time::Duration;

use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_rapidoc::RapiDoc;
use utoipa_swagger_ui::SwaggerUi;

use crate::app_state::AppState;
use crate::middleware::auth::{auth_context_middleware, jwt_middleware};
use crate::middleware::request_logger::log_requests;

pub mod health;
pub mod inventory;
pub mod payments;
pub mod profiles;
pub mod purchase_orders;
pub mod reports;
pub mod requests;
pub mod setup;
pub mod teams;
pub mod vendors;

const BODY_LIMIT_BYTES: usize = 1024 * 1024;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.clone().unwrap_or_default();
        components.add_security_scheme("bearerAuth", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
        openapi.components = Some(components);
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Procurement Backend", description = "Procurement request approval, purchase orders and payments"),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

pub fn api_doc() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
        .merge_from(requests::RequestDoc::openapi())
        .merge_from(purchase_orders::PurchaseOrderDoc::openapi())
        .merge_from(payments::PaymentDoc::openapi())
        .merge_from(vendors::VendorDoc::openapi())
        .merge_from(teams::TeamDoc::openapi())
        .merge_from(inventory::InventoryDoc::openapi())
        .merge_from(profiles::ProfileDoc::openapi())
        .merge_from(reports::ReportDoc::openapi())
        .merge_from(setup::SetupDoc::openapi())
}

/// The whole HTTP surface. Health and payment routes are public; everything
/// else needs a bearer token and a profile.
pub fn router(state: AppState) -> Router {
    let private_routes = Router::new()
        .merge(requests::request_routes())
        .merge(purchase_orders::purchase_order_routes())
        .merge(vendors::vendor_routes())
        .merge(teams::team_routes())
        .merge(inventory::inventory_routes())
        .merge(profiles::profile_routes())
        .merge(reports::report_routes())
        .merge(setup::setup_routes())
        .route_layer(from_fn_with_state(state.clone(), auth_context_middleware))
        .route_layer(from_fn_with_state(state.clone(), jwt_middleware));

    let doc = api_doc();
    let request_timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        .merge(health::health_routes())
        .merge(payments::payment_routes())
        .merge(private_routes)
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", doc.clone()))
        .merge(RapiDoc::with_openapi("/api-docs/rapidoc.json", doc).path("/rapidoc"))
        .layer(from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
