// src/db/models/requests.rs
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::workflow::status::RequestStatus;
use crate::workflow::transitions::Decision;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ProcurementRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub team_id: Uuid,
    pub item_name: String,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub unit_price: BigDecimal,
    pub currency: String,
    #[schema(value_type = String)]
    pub total_estimate: BigDecimal,
    pub justification: Option<String>,
    #[sqlx(try_from = "String")]
    #[schema(value_type = String, example = "pending")]
    pub status: RequestStatus,
    pub approved_by_team_lead: bool,
    pub rejected_by_team_lead: bool,
    pub approved_by_admin: bool,
    pub rejected_by_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /requests`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewProcurementRequest {
    pub item_name: String,
    pub quantity: i32,
    #[schema(value_type = String, example = "500.00")]
    pub unit_price: BigDecimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub justification: Option<String>,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Body of `PATCH /requests/{request_id}/decision`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DecisionPayload {
    pub decision: Decision,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct RequestListParams {
    /// Case-insensitive status filter, e.g. `approved by admin`.
    pub status: Option<String>,
}

/// Predicate handed to the store; every set field narrows the result.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub requester_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub statuses: Vec<RequestStatus>,
}

impl RequestFilter {
    pub fn matches(&self, request: &ProcurementRequest) -> bool {
        self.requester_id.map_or(true, |id| request.requester_id == id)
            && self.team_id.map_or(true, |id| request.team_id == id)
            && (self.statuses.is_empty() || self.statuses.contains(&request.status))
    }
}
