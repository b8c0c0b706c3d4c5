use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::db::models::inventory::InventoryItem;
use crate::db::models::payment::PaymentTransaction;
use crate::db::models::profile::{Profile, ProfileUpdate};
use crate::db::models::purchase_order::{PurchaseOrder, PurchaseOrderDetail, PurchaseOrderFilter, Receipt};
use crate::db::models::requests::{ProcurementRequest, RequestFilter};
use crate::db::models::team::{NewTeam, Team};
use crate::db::models::vendor::{NewVendor, Vendor};
use crate::workflow::status::{PurchaseOrderStatus, RequestStatus};
use crate::workflow::transitions::AuditFlag;

/// Errors that can occur while talking to the data store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    /// A guarded write found the row in a different status than expected.
    #[error("{0} is no longer in the expected status")]
    StaleState(String),

    #[error("{0} already exists")]
    Duplicate(String),

    /// A delete would orphan rows that still point at the target.
    #[error("{0}")]
    InUse(String),

    #[error("schema unavailable: {0}")]
    SchemaUnavailable(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                // undefined_table / undefined_column
                Some("42P01") | Some("42703") => {
                    return StoreError::SchemaUnavailable(db_err.message().to_string())
                }
                // unique_violation
                Some("23505") => {
                    let what = db_err.constraint().unwrap_or("record").to_string();
                    return StoreError::Duplicate(what);
                }
                // foreign_key_violation
                Some("23503") => {
                    let what = db_err.table().unwrap_or("record");
                    return StoreError::InUse(format!("{what} is still referenced by other records"));
                }
                _ => {}
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Row written by `insert_request`; status is always `pending`.
#[derive(Debug, Clone)]
pub struct RequestInsert {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub team_id: Uuid,
    pub item_name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub currency: String,
    pub total_estimate: BigDecimal,
    pub justification: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PurchaseOrderInsert {
    pub id: Uuid,
    pub request_id: Uuid,
    pub vendor_id: Uuid,
    pub po_number: String,
    pub total_amount: BigDecimal,
    pub issued_by: Uuid,
    pub payment_terms: Option<String>,
    pub payment_due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Guarded request status change: applied only while the row is in `from`.
#[derive(Debug, Clone)]
pub struct RequestTransition {
    pub request_id: Uuid,
    pub from: RequestStatus,
    pub to: RequestStatus,
    pub audit: Option<AuditFlag>,
}

#[derive(Debug, Clone)]
pub struct ReceiptWrite {
    pub purchase_order_id: Uuid,
    pub order_from: Vec<PurchaseOrderStatus>,
    pub request: RequestTransition,
}

/// Persistence collaborator of the workflow engine.
///
/// Every status write is a compare-and-set against the expected source status;
/// methods that touch two rows apply both or neither.
#[async_trait]
pub trait ProcurementStore: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>>;
    async fn list_profiles(&self) -> StoreResult<Vec<Profile>>;
    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> StoreResult<Profile>;

    async fn list_teams(&self) -> StoreResult<Vec<Team>>;
    async fn create_team(&self, id: Uuid, team: NewTeam) -> StoreResult<Team>;
    async fn delete_team(&self, id: Uuid) -> StoreResult<()>;

    async fn list_vendors(&self) -> StoreResult<Vec<Vendor>>;
    async fn get_vendor(&self, id: Uuid) -> StoreResult<Option<Vendor>>;
    async fn create_vendor(&self, id: Uuid, vendor: NewVendor) -> StoreResult<Vendor>;
    async fn delete_vendor(&self, id: Uuid) -> StoreResult<()>;

    /// Stock levels ordered by item name.
    async fn list_inventory(&self) -> StoreResult<Vec<InventoryItem>>;

    async fn insert_request(&self, request: RequestInsert) -> StoreResult<ProcurementRequest>;
    async fn get_request(&self, id: Uuid) -> StoreResult<Option<ProcurementRequest>>;
    /// Newest first.
    async fn list_requests(&self, filter: RequestFilter) -> StoreResult<Vec<ProcurementRequest>>;
    /// Sets the audit flag (never clears one) together with the status.
    async fn transition_request(&self, transition: RequestTransition) -> StoreResult<ProcurementRequest>;

    /// Inserts the order and moves its request `approved by admin -> po issued`
    /// in one unit of work.
    async fn issue_purchase_order(
        &self,
        order: PurchaseOrderInsert,
        request: RequestTransition,
    ) -> StoreResult<PurchaseOrder>;
    async fn get_purchase_order(&self, id: Uuid) -> StoreResult<Option<PurchaseOrder>>;
    async fn purchase_order_for_request(&self, request_id: Uuid) -> StoreResult<Option<PurchaseOrder>>;
    /// Newest first, with request and vendor embedded.
    async fn list_purchase_orders(&self, filter: PurchaseOrderFilter) -> StoreResult<Vec<PurchaseOrderDetail>>;
    async fn transition_purchase_order(
        &self,
        id: Uuid,
        from: PurchaseOrderStatus,
        to: PurchaseOrderStatus,
    ) -> StoreResult<PurchaseOrder>;
    /// Marks the order received and completes its request together.
    async fn receive_purchase_order(&self, receipt: ReceiptWrite) -> StoreResult<Receipt>;

    async fn insert_payment_transaction(&self, transaction: PaymentTransaction) -> StoreResult<PaymentTransaction>;
    async fn mark_purchase_order_paid(&self, id: Uuid, paid_at: DateTime<Utc>) -> StoreResult<()>;

    /// `Err(SchemaUnavailable)` when the marker table itself is missing.
    async fn setup_marker_completed(&self, setup_name: &str) -> StoreResult<bool>;
    async fn mark_setup_complete(&self, setup_name: &str, version: &str) -> StoreResult<()>;
    async fn table_exists(&self, table: &str) -> StoreResult<bool>;
    async fn columns_exist(&self, table: &str, columns: &[&str]) -> StoreResult<bool>;
}
