use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::models::purchase_order::PurchaseOrderFilter;
use crate::db::models::requests::RequestFilter;
use crate::db::store::ProcurementStore;
use crate::workflow::context::AuthContext;
use crate::workflow::error::WorkflowError;
use crate::workflow::status::{PaymentStatus, PurchaseOrderStatus, RequestStatus};

/// Money totals are keyed by the upper-cased request currency; amounts in
/// different currencies are never added together.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProcurementSummary {
    pub requests_by_status: BTreeMap<String, usize>,
    pub purchase_orders_by_status: BTreeMap<String, usize>,
    #[schema(value_type = BTreeMap<String, String>)]
    pub paid_total: BTreeMap<String, BigDecimal>,
    #[schema(value_type = BTreeMap<String, String>)]
    pub unpaid_total: BTreeMap<String, BigDecimal>,
    pub vendor_count: usize,
}

pub async fn summary(store: &dyn ProcurementStore, ctx: &AuthContext) -> Result<ProcurementSummary, WorkflowError> {
    ctx.require_purchasing("view reports")?;

    let requests = store.list_requests(RequestFilter::default()).await?;
    let orders = store.list_purchase_orders(PurchaseOrderFilter::default()).await?;
    let vendor_count = store.list_vendors().await?.len();

    let mut requests_by_status: BTreeMap<String, usize> =
        RequestStatus::ALL.iter().map(|s| (s.to_string(), 0)).collect();
    for request in &requests {
        *requests_by_status.entry(request.status.to_string()).or_default() += 1;
    }

    let mut purchase_orders_by_status: BTreeMap<String, usize> =
        PurchaseOrderStatus::ALL.iter().map(|s| (s.to_string(), 0)).collect();
    let mut paid_total: BTreeMap<String, BigDecimal> = BTreeMap::new();
    let mut unpaid_total: BTreeMap<String, BigDecimal> = BTreeMap::new();
    for detail in &orders {
        *purchase_orders_by_status.entry(detail.order.status.to_string()).or_default() += 1;
        let currency = detail.currency.trim().to_uppercase();
        let paid = paid_total.entry(currency.clone()).or_insert_with(|| BigDecimal::from(0));
        let unpaid = unpaid_total.entry(currency).or_insert_with(|| BigDecimal::from(0));
        match detail.order.payment_status {
            PaymentStatus::Paid => *paid += &detail.order.total_amount,
            PaymentStatus::Pending => *unpaid += &detail.order.total_amount,
        }
    }

    Ok(ProcurementSummary { requests_by_status, purchase_orders_by_status, paid_total, unpaid_total, vendor_count })
}
