use std::sync::Arc;

use bigdecimal::{BigDecimal, Signed};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::db::models::purchase_order::{
    NewPurchaseOrder, PurchaseOrder, PurchaseOrderDetail, PurchaseOrderFilter, Receipt,
};
use crate::db::models::requests::{NewProcurementRequest, ProcurementRequest, RequestFilter};
use crate::db::store::{
    ProcurementStore, PurchaseOrderInsert, ReceiptWrite, RequestInsert, RequestTransition,
};
use crate::workflow::context::AuthContext;
use crate::workflow::error::WorkflowError;
use crate::workflow::schema::Capabilities;
use crate::workflow::status::{PurchaseOrderStatus, RequestStatus, Role};
use crate::workflow::transitions::{
    next_order_status, next_request_status, AuditFlag, Decision, RequestAction,
    RECEIVABLE_ORDER_STATUSES,
};

const DEFAULT_PAYMENT_TERMS: &str = "immediate";

/// Owns the request -> purchase order -> receipt lifecycle.
pub struct WorkflowEngine {
    store: Arc<dyn ProcurementStore>,
    capabilities: Arc<Capabilities>,
}

impl WorkflowEngine {
    pub fn new(store: Arc<dyn ProcurementStore>, capabilities: Arc<Capabilities>) -> Self {
        Self { store, capabilities }
    }

    pub async fn submit_request(
        &self,
        ctx: &AuthContext,
        new: NewProcurementRequest,
    ) -> Result<ProcurementRequest, WorkflowError> {
        let item_name = new.item_name.trim().to_string();
        if item_name.is_empty() {
            return Err(WorkflowError::validation("item name is required"));
        }
        if new.quantity < 1 {
            return Err(WorkflowError::validation("quantity must be at least 1"));
        }
        if !new.unit_price.is_positive() {
            return Err(WorkflowError::validation("unit price must be greater than zero"));
        }
        let currency = normalize_currency(&new.currency)?;
        let team_id = ctx
            .team_id
            .ok_or_else(|| WorkflowError::validation("no team assigned to your profile"))?;

        let total_estimate = &new.unit_price * BigDecimal::from(new.quantity);
        let justification = new
            .justification
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        let request = self
            .store
            .insert_request(RequestInsert {
                id: Uuid::new_v4(),
                requester_id: ctx.user_id,
                team_id,
                item_name,
                quantity: new.quantity,
                unit_price: new.unit_price,
                currency,
                total_estimate,
                justification,
                created_at: Utc::now(),
            })
            .await?;

        info!(request_id = %request.id, requester = %ctx.user_id, "procurement request submitted");
        Ok(request)
    }

    /// Visible to the requester, team leads of the request's team, and the
    /// purchasing roles.
    pub async fn get_request(&self, ctx: &AuthContext, id: Uuid) -> Result<ProcurementRequest, WorkflowError> {
        let request = self.load_request(id).await?;
        if !can_view(ctx, &request) {
            return Err(WorkflowError::forbidden("you may not view this request"));
        }
        Ok(request)
    }

    pub async fn my_requests(&self, ctx: &AuthContext) -> Result<Vec<ProcurementRequest>, WorkflowError> {
        let filter = RequestFilter { requester_id: Some(ctx.user_id), ..Default::default() };
        Ok(self.store.list_requests(filter).await?)
    }

    pub async fn list_requests(
        &self,
        ctx: &AuthContext,
        status: Option<RequestStatus>,
    ) -> Result<Vec<ProcurementRequest>, WorkflowError> {
        let mut filter = RequestFilter { statuses: status.into_iter().collect(), ..Default::default() };
        match ctx.role {
            Role::Employee => filter.requester_id = Some(ctx.user_id),
            Role::TeamLead => filter.team_id = Some(self.lead_team(ctx)?),
            Role::ProcurementOfficer | Role::Admin => {}
        }
        Ok(self.store.list_requests(filter).await?)
    }

    /// Requests waiting on the caller's role.
    pub async fn review_queue(&self, ctx: &AuthContext) -> Result<Vec<ProcurementRequest>, WorkflowError> {
        let filter = match ctx.role {
            Role::TeamLead => RequestFilter {
                team_id: Some(self.lead_team(ctx)?),
                statuses: vec![RequestStatus::Pending],
                ..Default::default()
            },
            Role::Admin => RequestFilter {
                statuses: vec![RequestStatus::ApprovedByTeamLead],
                ..Default::default()
            },
            Role::ProcurementOfficer => RequestFilter {
                statuses: vec![RequestStatus::ApprovedByAdmin],
                ..Default::default()
            },
            Role::Employee => return Err(WorkflowError::forbidden("employees have no review queue")),
        };
        Ok(self.store.list_requests(filter).await?)
    }

    pub async fn decide_request(
        &self,
        ctx: &AuthContext,
        id: Uuid,
        decision: Decision,
    ) -> Result<ProcurementRequest, WorkflowError> {
        let request = self.load_request(id).await?;
        if ctx.role == Role::TeamLead && !ctx.is_team_lead_of(request.team_id) {
            return Err(WorkflowError::forbidden("team leads may only decide requests from their own team"));
        }
        let to = next_request_status(ctx.role, RequestAction::Decide(decision), request.status)?;

        let updated = self
            .store
            .transition_request(RequestTransition {
                request_id: id,
                from: request.status,
                to,
                audit: AuditFlag::for_status(to),
            })
            .await?;

        info!(request_id = %id, by = %ctx.user_id, from = %request.status, to = %to, "request decided");
        Ok(updated)
    }

    pub async fn issue_purchase_order(
        &self,
        ctx: &AuthContext,
        new: NewPurchaseOrder,
    ) -> Result<PurchaseOrder, WorkflowError> {
        let po_number = new.po_number.trim().to_string();
        if po_number.is_empty() {
            return Err(WorkflowError::validation("PO number is required"));
        }

        let request = self.load_request(new.request_id).await?;
        let to = next_request_status(ctx.role, RequestAction::IssuePurchaseOrder, request.status)?;

        if self.store.get_vendor(new.vendor_id).await?.is_none() {
            return Err(WorkflowError::validation(format!("unknown vendor {}", new.vendor_id)));
        }

        let (payment_terms, payment_due_date) = if self.capabilities.payment_tracking() {
            (
                Some(new.payment_terms.unwrap_or_else(|| DEFAULT_PAYMENT_TERMS.to_string())),
                new.payment_due_date,
            )
        } else {
            (None, None)
        };

        let order = self
            .store
            .issue_purchase_order(
                PurchaseOrderInsert {
                    id: Uuid::new_v4(),
                    request_id: request.id,
                    vendor_id: new.vendor_id,
                    po_number,
                    total_amount: request.total_estimate.clone(),
                    issued_by: ctx.user_id,
                    payment_terms,
                    payment_due_date,
                    created_at: Utc::now(),
                },
                RequestTransition { request_id: request.id, from: request.status, to, audit: None },
            )
            .await?;

        info!(po_id = %order.id, po_number = %order.po_number, request_id = %request.id, "purchase order issued");
        Ok(order)
    }

    pub async fn mark_processed(&self, ctx: &AuthContext, id: Uuid) -> Result<ProcurementRequest, WorkflowError> {
        let request = self.load_request(id).await?;
        let to = next_request_status(ctx.role, RequestAction::MarkProcessed, request.status)?;
        let updated = self
            .store
            .transition_request(RequestTransition { request_id: id, from: request.status, to, audit: None })
            .await?;
        info!(request_id = %id, by = %ctx.user_id, "request processed");
        Ok(updated)
    }

    /// Shipment progress short of receipt: `shipped` or `delivered`.
    pub async fn advance_shipment(
        &self,
        ctx: &AuthContext,
        po_id: Uuid,
        target: PurchaseOrderStatus,
    ) -> Result<PurchaseOrder, WorkflowError> {
        if target == PurchaseOrderStatus::Received {
            return Err(WorkflowError::validation("use the receive action to mark goods received"));
        }
        let order = self.load_order(po_id).await?;
        let to = next_order_status(ctx.role, order.status, target)?;
        let updated = self.store.transition_purchase_order(po_id, order.status, to).await?;
        info!(po_id = %po_id, from = %order.status, to = %to, "purchase order shipment updated");
        Ok(updated)
    }

    /// Marks the order received and completes its request in one write.
    pub async fn receive_purchase_order(&self, ctx: &AuthContext, po_id: Uuid) -> Result<Receipt, WorkflowError> {
        let order = self.load_order(po_id).await?;
        next_order_status(ctx.role, order.status, PurchaseOrderStatus::Received)?;

        let request = self.load_request(order.request_id).await?;
        let to = next_request_status(ctx.role, RequestAction::Receive, request.status)?;

        let receipt = self
            .store
            .receive_purchase_order(ReceiptWrite {
                purchase_order_id: po_id,
                order_from: RECEIVABLE_ORDER_STATUSES.to_vec(),
                request: RequestTransition { request_id: request.id, from: request.status, to, audit: None },
            })
            .await?;

        info!(po_id = %po_id, request_id = %request.id, "goods received, request completed");
        Ok(receipt)
    }

    pub async fn list_purchase_orders(
        &self,
        ctx: &AuthContext,
        filter: PurchaseOrderFilter,
    ) -> Result<Vec<PurchaseOrderDetail>, WorkflowError> {
        ctx.require_purchasing("view purchase orders")?;
        Ok(self.store.list_purchase_orders(filter).await?)
    }

    pub async fn get_purchase_order(&self, ctx: &AuthContext, po_id: Uuid) -> Result<PurchaseOrder, WorkflowError> {
        ctx.require_purchasing("view purchase orders")?;
        self.load_order(po_id).await
    }

    async fn load_request(&self, id: Uuid) -> Result<ProcurementRequest, WorkflowError> {
        self.store
            .get_request(id)
            .await?
            .ok_or_else(|| WorkflowError::not_found(format!("procurement request {id} not found")))
    }

    async fn load_order(&self, id: Uuid) -> Result<PurchaseOrder, WorkflowError> {
        self.store
            .get_purchase_order(id)
            .await?
            .ok_or_else(|| WorkflowError::not_found(format!("purchase order {id} not found")))
    }

    fn lead_team(&self, ctx: &AuthContext) -> Result<Uuid, WorkflowError> {
        ctx.team_id
            .ok_or_else(|| WorkflowError::forbidden("team lead has no team assigned"))
    }
}

fn can_view(ctx: &AuthContext, request: &ProcurementRequest) -> bool {
    request.requester_id == ctx.user_id
        || ctx.role.is_purchasing()
        || ctx.is_team_lead_of(request.team_id)
}

/// Three ASCII letters, stored upper-case.
pub fn normalize_currency(raw: &str) -> Result<String, WorkflowError> {
    let code = raw.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(WorkflowError::validation(format!("`{raw}` is not a 3-letter currency code")))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::models::vendor::NewVendor;
    use tokio_test::{assert_err, assert_ok};

    struct Fixture {
        store: Arc<MemoryStore>,
        engine: WorkflowEngine,
        team: Uuid,
        employee: AuthContext,
        lead: AuthContext,
        admin: AuthContext,
        officer: AuthContext,
        vendor: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let team = Uuid::new_v4();
        let vendor = store
            .create_vendor(
                Uuid::new_v4(),
                NewVendor {
                    name: "Acme Supplies".into(),
                    contact_info: "sales@acme.test".into(),
                    contact_person: None,
                    email: None,
                    phone: None,
                    address: None,
                },
            )
            .await
            .unwrap()
            .id;
        let engine = WorkflowEngine::new(store.clone(), Arc::new(Capabilities::new(true)));
        Fixture {
            store,
            engine,
            team,
            employee: AuthContext::new(Uuid::new_v4(), Role::Employee, Some(team)),
            lead: AuthContext::new(Uuid::new_v4(), Role::TeamLead, Some(team)),
            admin: AuthContext::new(Uuid::new_v4(), Role::Admin, None),
            officer: AuthContext::new(Uuid::new_v4(), Role::ProcurementOfficer, None),
            vendor,
        }
    }

    fn laptops() -> NewProcurementRequest {
        NewProcurementRequest {
            item_name: "Laptop".into(),
            quantity: 2,
            unit_price: BigDecimal::from(500),
            currency: "USD".into(),
            justification: Some("new hires".into()),
        }
    }

    fn po(request_id: Uuid, vendor_id: Uuid, number: &str) -> NewPurchaseOrder {
        NewPurchaseOrder {
            request_id,
            vendor_id,
            po_number: number.into(),
            payment_terms: None,
            payment_due_date: None,
        }
    }

    #[tokio::test]
    async fn laptop_request_end_to_end() {
        let f = fixture().await;

        let request = f.engine.submit_request(&f.employee, laptops()).await.unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.total_estimate, BigDecimal::from(1000));

        let request = f.engine.decide_request(&f.lead, request.id, Decision::Approve).await.unwrap();
        assert_eq!(request.status, RequestStatus::ApprovedByTeamLead);
        assert!(request.approved_by_team_lead);

        let request = f.engine.decide_request(&f.admin, request.id, Decision::Approve).await.unwrap();
        assert_eq!(request.status, RequestStatus::ApprovedByAdmin);
        assert!(request.approved_by_admin);
        assert!(request.approved_by_team_lead, "audit flags are never cleared");

        let order = f
            .engine
            .issue_purchase_order(&f.officer, po(request.id, f.vendor, "PO-001"))
            .await
            .unwrap();
        assert_eq!(order.status, PurchaseOrderStatus::Issued);
        assert_eq!(order.total_amount, BigDecimal::from(1000));
        assert_eq!(order.payment_terms.as_deref(), Some("immediate"));
        let stored = f.store.get_request(request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::PoIssued);

        let receipt = f.engine.receive_purchase_order(&f.officer, order.id).await.unwrap();
        assert_eq!(receipt.purchase_order.status, PurchaseOrderStatus::Received);
        assert_eq!(receipt.request.status, RequestStatus::Completed);
        assert_eq!(
            receipt.request.status,
            RequestStatus::from_str("Completed").unwrap()
        );
    }

    #[tokio::test]
    async fn processed_step_sits_between_issue_and_receipt() {
        let f = fixture().await;
        let id = f.engine.submit_request(&f.employee, laptops()).await.unwrap().id;
        f.engine.decide_request(&f.lead, id, Decision::Approve).await.unwrap();
        f.engine.decide_request(&f.admin, id, Decision::Approve).await.unwrap();

        assert_err!(f.engine.mark_processed(&f.officer, id).await, "cannot process before a PO exists");

        let order = f.engine.issue_purchase_order(&f.admin, po(id, f.vendor, "PO-7")).await.unwrap();
        let processed = f.engine.mark_processed(&f.officer, id).await.unwrap();
        assert_eq!(processed.status, RequestStatus::Processed);

        let receipt = f.engine.receive_purchase_order(&f.admin, order.id).await.unwrap();
        assert_eq!(receipt.request.status, RequestStatus::Completed);
    }

    #[tokio::test]
    async fn second_purchase_order_for_a_request_fails() {
        let f = fixture().await;
        let id = f.engine.submit_request(&f.employee, laptops()).await.unwrap().id;
        f.engine.decide_request(&f.lead, id, Decision::Approve).await.unwrap();
        f.engine.decide_request(&f.admin, id, Decision::Approve).await.unwrap();

        assert_ok!(f.engine.issue_purchase_order(&f.officer, po(id, f.vendor, "PO-1")).await);
        let second = f.engine.issue_purchase_order(&f.officer, po(id, f.vendor, "PO-2")).await;

        assert!(matches!(second, Err(WorkflowError::Authorization(_))));
        let orders = f.store.list_purchase_orders(PurchaseOrderFilter::default()).await.unwrap();
        assert_eq!(orders.len(), 1);
    }

    #[tokio::test]
    async fn rejected_transitions_leave_status_unchanged() {
        let f = fixture().await;
        let contexts = [&f.employee, &f.lead, &f.admin, &f.officer];

        for seeded in RequestStatus::ALL {
            let request = f.engine.submit_request(&f.employee, laptops()).await.unwrap();
            f.store.force_request_status(request.id, *seeded);

            for ctx in contexts {
                for decision in [Decision::Approve, Decision::Reject] {
                    let allowed = next_request_status(ctx.role, RequestAction::Decide(decision), *seeded).is_ok();
                    if allowed {
                        continue;
                    }
                    let result = f.engine.decide_request(ctx, request.id, decision).await;
                    assert!(
                        matches!(result, Err(WorkflowError::Authorization(_))),
                        "{:?} {decision:?} on {seeded}",
                        ctx.role
                    );
                    let now = f.store.get_request(request.id).await.unwrap().unwrap();
                    assert_eq!(now.status, *seeded);
                }
                if next_request_status(ctx.role, RequestAction::MarkProcessed, *seeded).is_err() {
                    assert_err!(f.engine.mark_processed(ctx, request.id).await);
                    let now = f.store.get_request(request.id).await.unwrap().unwrap();
                    assert_eq!(now.status, *seeded);
                }
            }
        }
    }

    #[tokio::test]
    async fn team_lead_cannot_decide_other_teams_requests() {
        let f = fixture().await;
        let id = f.engine.submit_request(&f.employee, laptops()).await.unwrap().id;
        let outsider = AuthContext::new(Uuid::new_v4(), Role::TeamLead, Some(Uuid::new_v4()));

        let result = f.engine.decide_request(&outsider, id, Decision::Reject).await;
        assert!(matches!(result, Err(WorkflowError::Authorization(_))));

        let rejected = f.engine.decide_request(&f.lead, id, Decision::Reject).await.unwrap();
        assert_eq!(rejected.status, RequestStatus::RejectedByTeamLead);
        assert!(rejected.rejected_by_team_lead);
    }

    #[tokio::test]
    async fn stale_write_surfaces_as_conflict() {
        let f = fixture().await;
        let id = f.engine.submit_request(&f.employee, laptops()).await.unwrap().id;
        // another lead decided after our read
        f.store.fail_next_transition();

        let result = f.engine.decide_request(&f.lead, id, Decision::Approve).await;
        assert!(matches!(result, Err(WorkflowError::Conflict(_))));
    }

    #[tokio::test]
    async fn submission_is_validated_before_any_write() {
        let f = fixture().await;

        let mut bad = laptops();
        bad.quantity = 0;
        assert!(matches!(f.engine.submit_request(&f.employee, bad).await, Err(WorkflowError::Validation(_))));

        let mut bad = laptops();
        bad.currency = "dollars".into();
        assert!(matches!(f.engine.submit_request(&f.employee, bad).await, Err(WorkflowError::Validation(_))));

        let mut bad = laptops();
        bad.unit_price = BigDecimal::from(0);
        assert!(matches!(f.engine.submit_request(&f.employee, bad).await, Err(WorkflowError::Validation(_))));

        let teamless = AuthContext::new(Uuid::new_v4(), Role::Employee, None);
        assert!(matches!(f.engine.submit_request(&teamless, laptops()).await, Err(WorkflowError::Validation(_))));

        assert!(f.engine.my_requests(&f.employee).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lower_case_currency_is_normalized() {
        let f = fixture().await;
        let mut new = laptops();
        new.currency = "eur".into();
        let request = f.engine.submit_request(&f.employee, new).await.unwrap();
        assert_eq!(request.currency, "EUR");
    }

    #[tokio::test]
    async fn visibility_follows_role() {
        let f = fixture().await;
        let mine = f.engine.submit_request(&f.employee, laptops()).await.unwrap();
        let other_team = AuthContext::new(Uuid::new_v4(), Role::Employee, Some(Uuid::new_v4()));
        f.engine.submit_request(&other_team, laptops()).await.unwrap();

        assert_eq!(f.engine.list_requests(&f.employee, None).await.unwrap().len(), 1);
        assert_eq!(f.engine.list_requests(&f.lead, None).await.unwrap().len(), 1);
        assert_eq!(f.engine.list_requests(&f.admin, None).await.unwrap().len(), 2);
        assert_eq!(f.engine.review_queue(&f.lead).await.unwrap().len(), 1);
        assert!(f.engine.review_queue(&f.admin).await.unwrap().is_empty());
        assert_err!(f.engine.review_queue(&f.employee).await);

        assert_ok!(f.engine.get_request(&f.lead, mine.id).await);
        assert_err!(f.engine.get_request(&other_team, mine.id).await);
        assert_err!(f.engine.list_purchase_orders(&f.lead, PurchaseOrderFilter::default()).await);
    }

    #[tokio::test]
    async fn unknown_vendor_is_rejected() {
        let f = fixture().await;
        let id = f.engine.submit_request(&f.employee, laptops()).await.unwrap().id;
        f.engine.decide_request(&f.lead, id, Decision::Approve).await.unwrap();
        f.engine.decide_request(&f.admin, id, Decision::Approve).await.unwrap();

        let result = f.engine.issue_purchase_order(&f.officer, po(id, Uuid::new_v4(), "PO-9")).await;
        assert!(matches!(result, Err(WorkflowError::Validation(_))));
        let stored = f.store.get_request(id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::ApprovedByAdmin);
    }

    #[tokio::test]
    async fn shipment_progress_then_receipt() {
        let f = fixture().await;
        let id = f.engine.submit_request(&f.employee, laptops()).await.unwrap().id;
        f.engine.decide_request(&f.lead, id, Decision::Approve).await.unwrap();
        f.engine.decide_request(&f.admin, id, Decision::Approve).await.unwrap();
        let order = f.engine.issue_purchase_order(&f.officer, po(id, f.vendor, "PO-3")).await.unwrap();

        let shipped = f.engine.advance_shipment(&f.officer, order.id, PurchaseOrderStatus::Shipped).await.unwrap();
        assert_eq!(shipped.status, PurchaseOrderStatus::Shipped);
        assert_err!(f.engine.advance_shipment(&f.officer, order.id, PurchaseOrderStatus::Received).await);
        assert_err!(f.engine.advance_shipment(&f.employee, order.id, PurchaseOrderStatus::Delivered).await);

        let receipt = f.engine.receive_purchase_order(&f.officer, order.id).await.unwrap();
        assert_eq!(receipt.purchase_order.status, PurchaseOrderStatus::Received);
        assert_err!(f.engine.receive_purchase_order(&f.officer, order.id).await, "already received");
    }

    #[tokio::test]
    async fn terms_are_dropped_without_payment_tracking() {
        let f = fixture().await;
        let engine = WorkflowEngine::new(f.store.clone(), Arc::new(Capabilities::new(false)));
        let id = engine.submit_request(&f.employee, laptops()).await.unwrap().id;
        engine.decide_request(&f.lead, id, Decision::Approve).await.unwrap();
        engine.decide_request(&f.admin, id, Decision::Approve).await.unwrap();

        let mut new = po(id, f.vendor, "PO-4");
        new.payment_terms = Some("net 30".into());
        let order = engine.issue_purchase_order(&f.officer, new).await.unwrap();
        assert_eq!(order.payment_terms, None);
    }
}
