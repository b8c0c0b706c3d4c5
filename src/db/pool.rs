use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::db::models::inventory::InventoryItem;
use crate::db::models::payment::PaymentTransaction;
use crate::db::models::profile::{Profile, ProfileUpdate};
use crate::db::models::purchase_order::{PurchaseOrder, PurchaseOrderDetail, PurchaseOrderFilter, Receipt};
use crate::db::models::requests::{ProcurementRequest, RequestFilter};
use crate::db::models::team::{NewTeam, Team};
use crate::db::models::vendor::{NewVendor, Vendor};
use crate::db::queries::{inventory, payments, profiles, purchase_orders, requests, setup, teams, vendors};
use crate::db::store::{
    ProcurementStore, PurchaseOrderInsert, ReceiptWrite, RequestInsert, RequestTransition, StoreResult,
};
use crate::workflow::schema::Capabilities;
use crate::workflow::status::PurchaseOrderStatus;

pub async fn get_db_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.database_url)
        .await
}

/// `ProcurementStore` backed by Postgres.
///
/// Reads of `purchase_orders` consult `capabilities` so a database without
/// the payment-tracking columns still serves orders.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    capabilities: Arc<Capabilities>,
}

impl PgStore {
    pub fn new(pool: PgPool, capabilities: Arc<Capabilities>) -> Self {
        Self { pool, capabilities }
    }

    fn payment_columns(&self) -> bool {
        self.capabilities.payment_tracking()
    }
}

#[async_trait]
impl ProcurementStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        profiles::get_profile(&self.pool, id).await
    }

    async fn list_profiles(&self) -> StoreResult<Vec<Profile>> {
        profiles::list_profiles(&self.pool).await
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> StoreResult<Profile> {
        profiles::update_profile(&self.pool, id, update).await
    }

    async fn list_teams(&self) -> StoreResult<Vec<Team>> {
        teams::list_teams(&self.pool).await
    }

    async fn create_team(&self, id: Uuid, team: NewTeam) -> StoreResult<Team> {
        teams::create_team(&self.pool, id, team).await
    }

    async fn delete_team(&self, id: Uuid) -> StoreResult<()> {
        teams::delete_team(&self.pool, id).await
    }

    async fn list_vendors(&self) -> StoreResult<Vec<Vendor>> {
        vendors::list_vendors(&self.pool).await
    }

    async fn get_vendor(&self, id: Uuid) -> StoreResult<Option<Vendor>> {
        vendors::get_vendor(&self.pool, id).await
    }

    async fn create_vendor(&self, id: Uuid, vendor: NewVendor) -> StoreResult<Vendor> {
        vendors::create_vendor(&self.pool, id, vendor).await
    }

    async fn delete_vendor(&self, id: Uuid) -> StoreResult<()> {
        vendors::delete_vendor(&self.pool, id).await
    }

    async fn list_inventory(&self) -> StoreResult<Vec<InventoryItem>> {
        inventory::list_inventory(&self.pool).await
    }

    async fn insert_request(&self, request: RequestInsert) -> StoreResult<ProcurementRequest> {
        requests::insert_request(&self.pool, request).await
    }

    async fn get_request(&self, id: Uuid) -> StoreResult<Option<ProcurementRequest>> {
        requests::get_request(&self.pool, id).await
    }

    async fn list_requests(&self, filter: RequestFilter) -> StoreResult<Vec<ProcurementRequest>> {
        requests::list_requests(&self.pool, filter).await
    }

    async fn transition_request(&self, transition: RequestTransition) -> StoreResult<ProcurementRequest> {
        let mut conn = self.pool.acquire().await?;
        requests::transition_request(&mut conn, &transition).await
    }

    async fn issue_purchase_order(
        &self,
        order: PurchaseOrderInsert,
        request: RequestTransition,
    ) -> StoreResult<PurchaseOrder> {
        purchase_orders::issue_purchase_order(&self.pool, order, request, self.payment_columns()).await
    }

    async fn get_purchase_order(&self, id: Uuid) -> StoreResult<Option<PurchaseOrder>> {
        purchase_orders::get_purchase_order(&self.pool, id, self.payment_columns()).await
    }

    async fn purchase_order_for_request(&self, request_id: Uuid) -> StoreResult<Option<PurchaseOrder>> {
        purchase_orders::purchase_order_for_request(&self.pool, request_id, self.payment_columns()).await
    }

    async fn list_purchase_orders(&self, filter: PurchaseOrderFilter) -> StoreResult<Vec<PurchaseOrderDetail>> {
        purchase_orders::list_purchase_orders(&self.pool, filter, self.payment_columns()).await
    }

    async fn transition_purchase_order(
        &self,
        id: Uuid,
        from: PurchaseOrderStatus,
        to: PurchaseOrderStatus,
    ) -> StoreResult<PurchaseOrder> {
        purchase_orders::transition_purchase_order(&self.pool, id, &[from], to, self.payment_columns()).await
    }

    async fn receive_purchase_order(&self, receipt: ReceiptWrite) -> StoreResult<Receipt> {
        purchase_orders::receive_purchase_order(&self.pool, receipt, self.payment_columns()).await
    }

    async fn insert_payment_transaction(&self, transaction: PaymentTransaction) -> StoreResult<PaymentTransaction> {
        payments::insert_payment_transaction(&self.pool, transaction).await
    }

    async fn mark_purchase_order_paid(&self, id: Uuid, paid_at: DateTime<Utc>) -> StoreResult<()> {
        purchase_orders::mark_purchase_order_paid(&self.pool, id, paid_at).await
    }

    async fn setup_marker_completed(&self, setup_name: &str) -> StoreResult<bool> {
        let marker = setup::setup_marker(&self.pool, setup_name).await?;
        Ok(marker.is_some_and(|m| m.completed_at.is_some()))
    }

    async fn mark_setup_complete(&self, setup_name: &str, version: &str) -> StoreResult<()> {
        setup::mark_setup_complete(&self.pool, setup_name, version).await
    }

    async fn table_exists(&self, table: &str) -> StoreResult<bool> {
        setup::table_exists(&self.pool, table).await
    }

    async fn columns_exist(&self, table: &str, columns: &[&str]) -> StoreResult<bool> {
        setup::columns_exist(&self.pool, table, columns).await
    }
}
