use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::workflow::status::{PaymentStatus, PurchaseOrderStatus};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub request_id: Uuid,
    pub vendor_id: Uuid,
    pub po_number: String,
    #[schema(value_type = String)]
    pub total_amount: BigDecimal,
    #[sqlx(try_from = "String")]
    #[schema(value_type = String, example = "issued")]
    pub status: PurchaseOrderStatus,
    pub issued_by: Uuid,
    #[sqlx(try_from = "String")]
    #[schema(value_type = String, example = "pending")]
    pub payment_status: PaymentStatus,
    pub payment_terms: Option<String>,
    pub payment_due_date: Option<NaiveDate>,
    pub payment_completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A purchase order with its request and vendor embedded.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PurchaseOrderDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub order: PurchaseOrder,
    pub item_name: String,
    pub quantity: i32,
    pub currency: String,
    pub requester_id: Uuid,
    pub vendor_name: String,
}

/// Body of `POST /purchase-orders`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewPurchaseOrder {
    pub request_id: Uuid,
    pub vendor_id: Uuid,
    pub po_number: String,
    pub payment_terms: Option<String>,
    pub payment_due_date: Option<NaiveDate>,
}

/// Body of `PATCH /purchase-orders/{po_id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShipmentUpdate {
    #[schema(value_type = String, example = "shipped")]
    pub status: PurchaseOrderStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PurchaseOrderListParams {
    pub status: Option<String>,
    #[serde(default)]
    pub unpaid_only: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PurchaseOrderFilter {
    pub statuses: Vec<PurchaseOrderStatus>,
    pub unpaid_only: bool,
}

impl PurchaseOrderFilter {
    pub fn matches(&self, order: &PurchaseOrder) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&order.status))
            && (!self.unpaid_only || order.payment_status != PaymentStatus::Paid)
    }
}

/// Result of a receipt: both rows as written in the same transaction.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Receipt {
    pub purchase_order: PurchaseOrder,
    pub request: crate::db::models::requests::ProcurementRequest,
}
