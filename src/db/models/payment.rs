use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Local bookkeeping row for a gateway payment. The backing table is optional.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub purchase_order_id: Uuid,
    #[schema(value_type = String)]
    pub amount: BigDecimal,
    pub currency: String,
    pub payment_method: String,
    pub payment_status: String,
    pub payment_intent_id: String,
    pub payment_terms: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub paid_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

/// Row in `app_setup_status` marking a one-time setup step as done.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SetupMarker {
    pub setup_name: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub version: Option<String>,
}
