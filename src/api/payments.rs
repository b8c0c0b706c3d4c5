//! Gateway-facing routes. Their bodies are consumed by the payment form
//! as-is, so they skip the `ApiResponse` envelope.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::error;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::payment::service::{
    Bookkeeping, ConfirmPaymentRequest, CreatePaymentIntentRequest, CreatedPaymentIntent, PaymentConfirmation,
};
use crate::workflow::error::WorkflowError;

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/api/stripe/create-payment-intent", post(create_payment_intent))
        .route("/api/stripe/confirm-payment", post(confirm_payment))
        .route("/api/stripe/payment-methods/{customer_id}", get(list_payment_methods))
}

/// `{ "error": message }`: 400 for bad input, 500 for everything else.
fn error_body(err: WorkflowError, context: &str) -> Response {
    let status = match err {
        WorkflowError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => {
            error!(error = %err, "{}", context);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let message = match &err {
        WorkflowError::Validation(message) => message.clone(),
        other => other.to_string(),
    };
    (status, Json(json!({ "error": message }))).into_response()
}

/// A body sent without a JSON content type reads as empty, so the missing
/// fields are reported; a body that is not the expected JSON is a 400.
fn read_body<T: Default>(body: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    match body {
        Ok(Json(payload)) => Ok(payload),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(error_body(WorkflowError::validation(rejection.body_text()), "Invalid request body")),
    }
}

#[utoipa::path(
    post,
    path = "/api/stripe/create-payment-intent",
    request_body = CreatePaymentIntentRequest,
    responses(
        (status = 200, description = "Payment intent created", body = CreatedPaymentIntent),
        (status = 400, description = "purchase_order_id, amount or currency missing, or the body is not valid JSON"),
        (status = 500, description = "Payment gateway failure")
    ),
    tag = "Payments"
)]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    body: Result<Json<CreatePaymentIntentRequest>, JsonRejection>,
) -> Response {
    let payload = match read_body(body) {
        Ok(payload) => payload,
        Err(response) => return response,
    };
    match state.payments.create_payment_intent(payload).await {
        Ok(created) => (StatusCode::OK, Json(created)).into_response(),
        Err(err) => error_body(err, "Error creating payment intent"),
    }
}

/// Check a payment intent; 200 only when it has succeeded
#[utoipa::path(
    post,
    path = "/api/stripe/confirm-payment",
    request_body = ConfirmPaymentRequest,
    responses(
        (status = 200, description = "Payment succeeded", body = PaymentConfirmation),
        (status = 400, description = "Missing ids, or payment not completed (success: false)", body = PaymentConfirmation),
        (status = 500, description = "Payment gateway failure")
    ),
    tag = "Payments"
)]
pub async fn confirm_payment(
    State(state): State<AppState>,
    body: Result<Json<ConfirmPaymentRequest>, JsonRejection>,
) -> Response {
    let payload = match read_body(body) {
        Ok(payload) => payload,
        Err(response) => return response,
    };
    match state.payments.confirm_payment(payload).await {
        Ok(outcome) if outcome.success => (StatusCode::OK, Json(outcome)).into_response(),
        Ok(outcome) => (StatusCode::BAD_REQUEST, Json(outcome)).into_response(),
        Err(err) => error_body(err, "Error confirming payment"),
    }
}

#[utoipa::path(
    get,
    path = "/api/stripe/payment-methods/{customer_id}",
    params(("customer_id" = String, Path, description = "Gateway customer ID")),
    responses(
        (status = 200, description = "`{ paymentMethods: [...] }`, card methods only"),
        (status = 500, description = "Payment gateway failure")
    ),
    tag = "Payments"
)]
pub async fn list_payment_methods(State(state): State<AppState>, Path(customer_id): Path<String>) -> Response {
    match state.payments.list_payment_methods(&customer_id).await {
        Ok(methods) => (StatusCode::OK, Json(json!({ "paymentMethods": methods }))).into_response(),
        Err(err) => error_body(err, "Error fetching payment methods"),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(create_payment_intent, confirm_payment, list_payment_methods),
    components(schemas(
        CreatePaymentIntentRequest,
        CreatedPaymentIntent,
        ConfirmPaymentRequest,
        PaymentConfirmation,
        Bookkeeping
    )),
    tags((name = "Payments", description = "Payment gateway boundary"))
)]
pub struct PaymentDoc;
