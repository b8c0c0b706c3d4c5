//! In-process `ProcurementStore` for tests. A single mutex makes every
//! multi-row method atomic.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::models::inventory::InventoryItem;
use crate::db::models::payment::{PaymentTransaction, SetupMarker};
use crate::db::models::profile::{Profile, ProfileUpdate};
use crate::db::models::purchase_order::{
    PurchaseOrder, PurchaseOrderDetail, PurchaseOrderFilter, Receipt,
};
use crate::db::models::requests::{ProcurementRequest, RequestFilter};
use crate::db::models::team::{NewTeam, Team};
use crate::db::models::vendor::{NewVendor, Vendor};
use crate::db::store::{
    ProcurementStore, PurchaseOrderInsert, ReceiptWrite, RequestInsert, RequestTransition,
    StoreError, StoreResult,
};
use crate::workflow::schema::PAYMENT_COLUMNS;
use crate::workflow::status::{PaymentStatus, PurchaseOrderStatus, RequestStatus, Role};
use crate::workflow::transitions::AuditFlag;

#[derive(Default)]
struct Tables {
    profiles: HashMap<Uuid, Profile>,
    teams: HashMap<Uuid, Team>,
    vendors: HashMap<Uuid, Vendor>,
    requests: HashMap<Uuid, ProcurementRequest>,
    orders: HashMap<Uuid, PurchaseOrder>,
    transactions: Vec<PaymentTransaction>,
    inventory: Vec<InventoryItem>,
    setup: HashMap<String, SetupMarker>,
}

pub struct MemoryStore {
    tables: Mutex<Tables>,
    missing_tables: Mutex<HashSet<String>>,
    payment_columns: AtomicBool,
    fail_next_transition: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            missing_tables: Mutex::new(HashSet::new()),
            payment_columns: AtomicBool::new(true),
            fail_next_transition: AtomicBool::new(false),
        }
    }

    /// Simulates a table that was never created.
    pub fn drop_table(&self, table: &str) {
        self.missing_tables.lock().unwrap().insert(table.to_string());
    }

    pub fn drop_payment_columns(&self) {
        self.payment_columns.store(false, Ordering::SeqCst);
    }

    /// Makes the next guarded request write behave as if a concurrent writer won.
    pub fn fail_next_transition(&self) {
        self.fail_next_transition.store(true, Ordering::SeqCst);
    }

    pub fn force_request_status(&self, id: Uuid, status: RequestStatus) {
        if let Some(request) = self.tables.lock().unwrap().requests.get_mut(&id) {
            request.status = status;
        }
    }

    pub fn add_profile(&self, id: Uuid, role: Role, team_id: Option<Uuid>) -> Profile {
        let profile = Profile { id, full_name: None, role, team_id, created_at: Utc::now() };
        self.tables.lock().unwrap().profiles.insert(id, profile.clone());
        profile
    }

    pub fn add_inventory_item(&self, item_name: &str, current_stock: i32) -> InventoryItem {
        let item = InventoryItem {
            id: Uuid::new_v4(),
            item_name: item_name.to_string(),
            current_stock,
            unit_of_measure: Some("unit".into()),
            last_received_at: None,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().inventory.push(item.clone());
        item
    }

    pub fn transactions(&self) -> Vec<PaymentTransaction> {
        self.tables.lock().unwrap().transactions.clone()
    }

    fn require_table(&self, table: &str) -> StoreResult<()> {
        if self.missing_tables.lock().unwrap().contains(table) {
            Err(StoreError::SchemaUnavailable(format!("relation \"{table}\" does not exist")))
        } else {
            Ok(())
        }
    }

    fn take_forced_failure(&self) -> bool {
        self.fail_next_transition.swap(false, Ordering::SeqCst)
    }
}

fn apply_transition(tables: &mut Tables, transition: &RequestTransition) -> StoreResult<ProcurementRequest> {
    let request = tables
        .requests
        .get_mut(&transition.request_id)
        .ok_or_else(|| StoreError::NotFound("procurement request".into()))?;
    if request.status != transition.from {
        return Err(StoreError::StaleState("procurement request".into()));
    }
    request.status = transition.to;
    match transition.audit {
        Some(AuditFlag::ApprovedByTeamLead) => request.approved_by_team_lead = true,
        Some(AuditFlag::RejectedByTeamLead) => request.rejected_by_team_lead = true,
        Some(AuditFlag::ApprovedByAdmin) => request.approved_by_admin = true,
        Some(AuditFlag::RejectedByAdmin) => request.rejected_by_admin = true,
        None => {}
    }
    request.updated_at = Utc::now();
    Ok(request.clone())
}

#[async_trait]
impl ProcurementStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        Ok(self.tables.lock().unwrap().profiles.get(&id).cloned())
    }

    async fn list_profiles(&self) -> StoreResult<Vec<Profile>> {
        Ok(self.tables.lock().unwrap().profiles.values().cloned().collect())
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> StoreResult<Profile> {
        let mut tables = self.tables.lock().unwrap();
        let profile = tables.profiles.get_mut(&id).ok_or_else(|| StoreError::NotFound("profile".into()))?;
        if let Some(role) = update.role {
            profile.role = role;
        }
        if update.team_id.is_some() {
            profile.team_id = update.team_id;
        }
        if update.full_name.is_some() {
            profile.full_name = update.full_name;
        }
        Ok(profile.clone())
    }

    async fn list_teams(&self) -> StoreResult<Vec<Team>> {
        let mut teams: Vec<_> = self.tables.lock().unwrap().teams.values().cloned().collect();
        teams.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(teams)
    }

    async fn create_team(&self, id: Uuid, team: NewTeam) -> StoreResult<Team> {
        let team = Team { id, name: team.name, description: team.description, created_at: Utc::now() };
        self.tables.lock().unwrap().teams.insert(id, team.clone());
        Ok(team)
    }

    async fn delete_team(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.teams.contains_key(&id) {
            return Err(StoreError::NotFound("team".into()));
        }
        if tables.requests.values().any(|r| r.team_id == id) {
            return Err(StoreError::InUse("team is still referenced by procurement requests".into()));
        }
        tables.teams.remove(&id);
        // profiles.team_id is ON DELETE SET NULL
        for profile in tables.profiles.values_mut().filter(|p| p.team_id == Some(id)) {
            profile.team_id = None;
        }
        Ok(())
    }

    async fn list_vendors(&self) -> StoreResult<Vec<Vendor>> {
        let mut vendors: Vec<_> = self.tables.lock().unwrap().vendors.values().cloned().collect();
        vendors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(vendors)
    }

    async fn get_vendor(&self, id: Uuid) -> StoreResult<Option<Vendor>> {
        Ok(self.tables.lock().unwrap().vendors.get(&id).cloned())
    }

    async fn create_vendor(&self, id: Uuid, vendor: NewVendor) -> StoreResult<Vendor> {
        let vendor = Vendor {
            id,
            name: vendor.name,
            contact_info: vendor.contact_info,
            contact_person: vendor.contact_person,
            email: vendor.email,
            phone: vendor.phone,
            address: vendor.address,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().vendors.insert(id, vendor.clone());
        Ok(vendor)
    }

    async fn delete_vendor(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.vendors.contains_key(&id) {
            return Err(StoreError::NotFound("vendor".into()));
        }
        if tables.orders.values().any(|o| o.vendor_id == id) {
            return Err(StoreError::InUse("vendor is still referenced by purchase orders".into()));
        }
        tables.vendors.remove(&id);
        Ok(())
    }

    async fn list_inventory(&self) -> StoreResult<Vec<InventoryItem>> {
        self.require_table("inventory_items")?;
        let mut items = self.tables.lock().unwrap().inventory.clone();
        items.sort_by(|a, b| a.item_name.cmp(&b.item_name));
        Ok(items)
    }

    async fn insert_request(&self, request: RequestInsert) -> StoreResult<ProcurementRequest> {
        let row = ProcurementRequest {
            id: request.id,
            requester_id: request.requester_id,
            team_id: request.team_id,
            item_name: request.item_name,
            quantity: request.quantity,
            unit_price: request.unit_price,
            currency: request.currency,
            total_estimate: request.total_estimate,
            justification: request.justification,
            status: RequestStatus::Pending,
            approved_by_team_lead: false,
            rejected_by_team_lead: false,
            approved_by_admin: false,
            rejected_by_admin: false,
            created_at: request.created_at,
            updated_at: request.created_at,
        };
        self.tables.lock().unwrap().requests.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_request(&self, id: Uuid) -> StoreResult<Option<ProcurementRequest>> {
        Ok(self.tables.lock().unwrap().requests.get(&id).cloned())
    }

    async fn list_requests(&self, filter: RequestFilter) -> StoreResult<Vec<ProcurementRequest>> {
        let mut rows: Vec<_> = self
            .tables
            .lock()
            .unwrap()
            .requests
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn transition_request(&self, transition: RequestTransition) -> StoreResult<ProcurementRequest> {
        if self.take_forced_failure() {
            return Err(StoreError::StaleState("procurement request".into()));
        }
        apply_transition(&mut self.tables.lock().unwrap(), &transition)
    }

    async fn issue_purchase_order(
        &self,
        order: PurchaseOrderInsert,
        request: RequestTransition,
    ) -> StoreResult<PurchaseOrder> {
        if self.take_forced_failure() {
            return Err(StoreError::StaleState("procurement request".into()));
        }
        let mut tables = self.tables.lock().unwrap();
        if tables.orders.values().any(|o| o.request_id == order.request_id) {
            return Err(StoreError::Duplicate("purchase order for this request".into()));
        }
        if tables.orders.values().any(|o| o.po_number == order.po_number) {
            return Err(StoreError::Duplicate("purchase_orders_po_number_key".into()));
        }
        apply_transition(&mut tables, &request)?;

        let row = PurchaseOrder {
            id: order.id,
            request_id: order.request_id,
            vendor_id: order.vendor_id,
            po_number: order.po_number,
            total_amount: order.total_amount,
            status: PurchaseOrderStatus::Issued,
            issued_by: order.issued_by,
            payment_status: PaymentStatus::Pending,
            payment_terms: order.payment_terms,
            payment_due_date: order.payment_due_date,
            payment_completed_at: None,
            created_at: order.created_at,
            updated_at: order.created_at,
        };
        tables.orders.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_purchase_order(&self, id: Uuid) -> StoreResult<Option<PurchaseOrder>> {
        Ok(self.tables.lock().unwrap().orders.get(&id).cloned())
    }

    async fn purchase_order_for_request(&self, request_id: Uuid) -> StoreResult<Option<PurchaseOrder>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .orders
            .values()
            .find(|o| o.request_id == request_id)
            .cloned())
    }

    async fn list_purchase_orders(&self, filter: PurchaseOrderFilter) -> StoreResult<Vec<PurchaseOrderDetail>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<_> = tables
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .filter_map(|o| {
                let request = tables.requests.get(&o.request_id)?;
                let vendor = tables.vendors.get(&o.vendor_id)?;
                Some(PurchaseOrderDetail {
                    order: o.clone(),
                    item_name: request.item_name.clone(),
                    quantity: request.quantity,
                    currency: request.currency.clone(),
                    requester_id: request.requester_id,
                    vendor_name: vendor.name.clone(),
                })
            })
            .collect();
        rows.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));
        Ok(rows)
    }

    async fn transition_purchase_order(
        &self,
        id: Uuid,
        from: PurchaseOrderStatus,
        to: PurchaseOrderStatus,
    ) -> StoreResult<PurchaseOrder> {
        let mut tables = self.tables.lock().unwrap();
        let order = tables.orders.get_mut(&id).ok_or_else(|| StoreError::NotFound("purchase order".into()))?;
        if order.status != from {
            return Err(StoreError::StaleState("purchase order".into()));
        }
        order.status = to;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn receive_purchase_order(&self, receipt: ReceiptWrite) -> StoreResult<Receipt> {
        let mut tables = self.tables.lock().unwrap();
        let current = tables
            .orders
            .get(&receipt.purchase_order_id)
            .ok_or_else(|| StoreError::NotFound("purchase order".into()))?
            .status;
        if !receipt.order_from.contains(&current) {
            return Err(StoreError::StaleState("purchase order".into()));
        }
        let request = apply_transition(&mut tables, &receipt.request)?;

        let order = tables
            .orders
            .get_mut(&receipt.purchase_order_id)
            .ok_or_else(|| StoreError::NotFound("purchase order".into()))?;
        order.status = PurchaseOrderStatus::Received;
        order.updated_at = Utc::now();
        Ok(Receipt { purchase_order: order.clone(), request })
    }

    async fn insert_payment_transaction(&self, transaction: PaymentTransaction) -> StoreResult<PaymentTransaction> {
        self.require_table("payment_transactions")?;
        self.tables.lock().unwrap().transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn mark_purchase_order_paid(&self, id: Uuid, paid_at: DateTime<Utc>) -> StoreResult<()> {
        if !self.payment_columns.load(Ordering::SeqCst) {
            return Err(StoreError::SchemaUnavailable("column \"payment_status\" does not exist".into()));
        }
        let mut tables = self.tables.lock().unwrap();
        let order = tables.orders.get_mut(&id).ok_or_else(|| StoreError::NotFound("purchase order".into()))?;
        order.payment_status = PaymentStatus::Paid;
        order.payment_completed_at = Some(paid_at);
        Ok(())
    }

    async fn setup_marker_completed(&self, setup_name: &str) -> StoreResult<bool> {
        self.require_table("app_setup_status")?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .setup
            .get(setup_name)
            .is_some_and(|marker| marker.completed_at.is_some()))
    }

    async fn mark_setup_complete(&self, setup_name: &str, version: &str) -> StoreResult<()> {
        self.require_table("app_setup_status")?;
        self.tables.lock().unwrap().setup.insert(
            setup_name.to_string(),
            SetupMarker {
                setup_name: setup_name.to_string(),
                completed_at: Some(Utc::now()),
                version: Some(version.to_string()),
            },
        );
        Ok(())
    }

    async fn table_exists(&self, table: &str) -> StoreResult<bool> {
        Ok(!self.missing_tables.lock().unwrap().contains(table))
    }

    async fn columns_exist(&self, table: &str, columns: &[&str]) -> StoreResult<bool> {
        if table == "purchase_orders" && columns.iter().any(|c| PAYMENT_COLUMNS.contains(c)) {
            return Ok(self.payment_columns.load(Ordering::SeqCst));
        }
        Ok(true)
    }
}
