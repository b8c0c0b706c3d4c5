use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::{BigDecimal, RoundingMode, Signed, ToPrimitive, Zero};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::payment::PaymentTransaction;
use crate::db::models::purchase_order::PurchaseOrder;
use crate::db::store::ProcurementStore;
use crate::payment::gateway::{PaymentGateway, PaymentIntent, PaymentIntentParams};
use crate::workflow::engine::normalize_currency;
use crate::workflow::error::WorkflowError;
use crate::workflow::schema::Capabilities;
use crate::workflow::status::PaymentStatus;

const DEFAULT_PAYMENT_TERMS: &str = "immediate";
const PAYMENT_METHOD: &str = "stripe";
const TRANSACTION_COMPLETED: &str = "completed";

/// Body of `POST /api/stripe/create-payment-intent`. Every field is optional
/// on the wire so a missing one is reported as a validation error instead of
/// a body rejection.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreatePaymentIntentRequest {
    /// String or number; numbers are used in their decimal form.
    #[schema(value_type = Option<String>)]
    pub purchase_order_id: Option<Value>,
    /// Major units, as a JSON number or numeric string.
    #[schema(value_type = Option<f64>, example = 19.99)]
    pub amount: Option<Value>,
    pub currency: Option<String>,
    pub payment_terms: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPaymentIntent {
    pub client_secret: Option<String>,
    pub payment_intent_id: String,
    /// Echo of the requested amount.
    #[schema(value_type = f64)]
    pub amount: Value,
    pub currency: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ConfirmPaymentRequest {
    pub payment_intent_id: Option<String>,
    #[schema(value_type = Option<String>)]
    pub purchase_order_id: Option<Value>,
    #[schema(value_type = Option<f64>)]
    pub amount: Option<Value>,
    pub currency: Option<String>,
}

/// Outcome of the local records written after a successful payment.
#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Bookkeeping {
    pub transaction_recorded: bool,
    pub purchase_order_marked_paid: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    pub success: bool,
    pub message: String,
    #[schema(value_type = Object)]
    pub payment_intent: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookkeeping: Option<Bookkeeping>,
}

/// Links purchase orders to the gateway's payment-intent lifecycle.
pub struct PaymentService {
    gateway: Arc<dyn PaymentGateway>,
    store: Arc<dyn ProcurementStore>,
    capabilities: Arc<Capabilities>,
}

impl PaymentService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        store: Arc<dyn ProcurementStore>,
        capabilities: Arc<Capabilities>,
    ) -> Self {
        Self { gateway, store, capabilities }
    }

    pub async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<CreatedPaymentIntent, WorkflowError> {
        let missing = || WorkflowError::validation("Purchase order ID, amount, and currency are required.");

        let purchase_order_id = present_id(request.purchase_order_id).ok_or_else(missing)?;
        let raw_amount = request.amount.filter(|v| !v.is_null()).ok_or_else(missing)?;
        let currency = present(request.currency).ok_or_else(missing)?;

        let amount = parse_amount(&raw_amount)?;
        if amount.is_zero() {
            return Err(missing());
        }
        if amount.is_negative() {
            return Err(WorkflowError::validation("amount must be greater than zero"));
        }
        normalize_currency(&currency)?;

        let mut metadata = BTreeMap::new();
        metadata.insert("purchase_order_id".to_string(), purchase_order_id.clone());
        metadata.insert(
            "payment_terms".to_string(),
            present(request.payment_terms).unwrap_or_else(|| DEFAULT_PAYMENT_TERMS.to_string()),
        );

        let intent = self
            .gateway
            .create_payment_intent(PaymentIntentParams {
                amount: to_minor_units(&amount)?,
                currency: currency.to_lowercase(),
                metadata,
            })
            .await?;

        info!(payment_intent = %intent.id, purchase_order_id = %purchase_order_id, "payment intent created");
        Ok(CreatedPaymentIntent {
            client_secret: intent.client_secret,
            payment_intent_id: intent.id,
            amount: raw_amount,
            currency,
        })
    }

    /// Reports success only for an intent in exactly `succeeded`. On success
    /// the local records are written best-effort; their failures become
    /// warnings on the returned value.
    pub async fn confirm_payment(&self, request: ConfirmPaymentRequest) -> Result<PaymentConfirmation, WorkflowError> {
        let missing = || WorkflowError::validation("Payment intent ID and purchase order ID are required.");
        let intent_id = present(request.payment_intent_id).ok_or_else(missing)?;
        let purchase_order_id = present_id(request.purchase_order_id).ok_or_else(missing)?;

        let intent = self.gateway.retrieve_payment_intent(&intent_id).await?;

        // only intents created for this order may settle it
        match intent.metadata.get("purchase_order_id") {
            Some(tagged) if tagged == &purchase_order_id => {}
            Some(_) => {
                return Err(WorkflowError::validation(format!(
                    "payment intent {intent_id} belongs to a different purchase order"
                )))
            }
            None => {
                return Err(WorkflowError::validation(format!(
                    "payment intent {intent_id} is not tagged with a purchase order"
                )))
            }
        }

        if !intent.succeeded() {
            info!(payment_intent = %intent.id, status = %intent.status, "payment not completed");
            return Ok(PaymentConfirmation {
                success: false,
                message: format!("Payment not completed. Status: {}", intent.status),
                payment_intent: intent.raw,
                bookkeeping: None,
            });
        }

        let bookkeeping = self.record_payment(&purchase_order_id, &intent).await;
        info!(
            payment_intent = %intent.id,
            purchase_order_id = %purchase_order_id,
            warnings = bookkeeping.warnings.len(),
            "payment confirmed"
        );
        Ok(PaymentConfirmation {
            success: true,
            message: "Payment confirmed successfully".to_string(),
            payment_intent: intent.raw,
            bookkeeping: Some(bookkeeping),
        })
    }

    pub async fn list_payment_methods(&self, customer_id: &str) -> Result<Vec<Value>, WorkflowError> {
        Ok(self.gateway.list_payment_methods(customer_id).await?)
    }

    async fn record_payment(&self, purchase_order_id: &str, intent: &PaymentIntent) -> Bookkeeping {
        let mut bookkeeping = Bookkeeping::default();

        if !self.capabilities.payment_tracking() {
            bookkeeping.skip("payment tracking schema is not installed; local payment records were not updated");
            return bookkeeping;
        }
        let Ok(po_id) = Uuid::parse_str(purchase_order_id) else {
            bookkeeping.skip(format!("`{purchase_order_id}` is not a purchase order id; nothing recorded"));
            return bookkeeping;
        };
        let order = match self.store.get_purchase_order(po_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                bookkeeping.skip(format!("purchase order {po_id} not found; nothing recorded"));
                return bookkeeping;
            }
            Err(e) => {
                bookkeeping.skip(format!("could not load purchase order {po_id}: {e}"));
                return bookkeeping;
            }
        };
        if order.payment_status == PaymentStatus::Paid {
            bookkeeping.skip(format!("purchase order {po_id} was already marked paid"));
            return bookkeeping;
        }

        let currency = match self.store.get_request(order.request_id).await {
            Ok(Some(request)) => request.currency,
            Ok(None) => {
                bookkeeping.skip(format!("request of purchase order {po_id} not found; nothing recorded"));
                return bookkeeping;
            }
            Err(e) => {
                bookkeeping.skip(format!("could not load the request of purchase order {po_id}: {e}"));
                return bookkeeping;
            }
        };
        if let Err(mismatch) = settles(&order, &currency, intent) {
            bookkeeping.skip(mismatch);
            return bookkeeping;
        }

        let transaction = transaction_for(&order, currency, intent);
        match self.store.insert_payment_transaction(transaction).await {
            Ok(_) => bookkeeping.transaction_recorded = true,
            Err(e) => bookkeeping.skip(format!("payment transaction not recorded: {e}")),
        }

        match self.store.mark_purchase_order_paid(po_id, Utc::now()).await {
            Ok(()) => bookkeeping.purchase_order_marked_paid = true,
            Err(e) => bookkeeping.skip(format!("purchase order payment status not updated: {e}")),
        }
        bookkeeping
    }
}

/// The intent must charge exactly the order total, in the request currency.
fn settles(order: &PurchaseOrder, currency: &str, intent: &PaymentIntent) -> Result<(), String> {
    let expected = to_minor_units(&order.total_amount).map_err(|e| e.to_string())?;
    if intent.amount != expected || !intent.currency.eq_ignore_ascii_case(currency) {
        return Err(format!(
            "payment intent {} charged {} {} (minor units) but purchase order {} totals {} {}; not marked paid",
            intent.id,
            intent.amount,
            intent.currency.to_uppercase(),
            order.id,
            expected,
            currency.to_uppercase()
        ));
    }
    Ok(())
}

fn transaction_for(order: &PurchaseOrder, currency: String, intent: &PaymentIntent) -> PaymentTransaction {
    PaymentTransaction {
        id: Uuid::new_v4(),
        purchase_order_id: order.id,
        amount: order.total_amount.clone(),
        currency,
        payment_method: PAYMENT_METHOD.to_string(),
        payment_status: TRANSACTION_COMPLETED.to_string(),
        payment_intent_id: intent.id.clone(),
        payment_terms: Some(order.payment_terms.clone().unwrap_or_else(|| DEFAULT_PAYMENT_TERMS.to_string())),
        due_date: order.payment_due_date,
        paid_at: Utc::now(),
        created_by: None,
    }
}

impl Bookkeeping {
    fn skip(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        warn!(%warning, "payment bookkeeping incomplete");
        self.warnings.push(warning);
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn present_id(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => present(Some(s)),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_amount(raw: &Value) -> Result<BigDecimal, WorkflowError> {
    let text = match raw {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(WorkflowError::validation("amount must be a number")),
    };
    BigDecimal::from_str(&text).map_err(|_| WorkflowError::validation(format!("`{text}` is not a valid amount")))
}

/// Major to minor units, rounding half away from zero: 19.999 -> 2000.
pub fn to_minor_units(amount: &BigDecimal) -> Result<i64, WorkflowError> {
    (amount * BigDecimal::from(100))
        .with_scale_round(0, RoundingMode::HalfUp)
        .to_i64()
        .ok_or_else(|| WorkflowError::validation("amount is too large"))
}
