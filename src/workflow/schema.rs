//! Startup readiness check for the optional payment-tracking schema.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::db::store::{ProcurementStore, StoreError};

pub const PAYMENT_SCHEMA_SETUP: &str = "payment_schema_v1";
pub const PAYMENT_SCHEMA_VERSION: &str = "1.0";
pub const PAYMENT_COLUMNS: [&str; 4] = [
    "payment_status",
    "payment_terms",
    "payment_due_date",
    "payment_completed_at",
];

/// Capability flags resolved once at startup and consulted before any
/// optional write, instead of discovering them by failure on each call.
#[derive(Debug, Default)]
pub struct Capabilities {
    payment_tracking: AtomicBool,
}

impl Capabilities {
    pub fn new(payment_tracking: bool) -> Self {
        Self { payment_tracking: AtomicBool::new(payment_tracking) }
    }

    pub fn payment_tracking(&self) -> bool {
        self.payment_tracking.load(Ordering::Relaxed)
    }

    pub fn set_payment_tracking(&self, available: bool) {
        self.payment_tracking.store(available, Ordering::Relaxed);
    }
}

/// Reports whether the payment-tracking schema is usable, recording a
/// completion marker the first time it is confirmed. Never fails: every
/// error is logged and read as "not available".
pub async fn check_payment_readiness(store: &dyn ProcurementStore) -> bool {
    match store.setup_marker_completed(PAYMENT_SCHEMA_SETUP).await {
        Ok(true) => {
            info!("payment schema setup already completed");
            return true;
        }
        Ok(false) => {}
        Err(StoreError::SchemaUnavailable(detail)) => {
            warn!(%detail, "app_setup_status table not found, payment tracking disabled");
            return false;
        }
        Err(e) => {
            warn!(error = %e, "setup status check failed, payment tracking disabled");
            return false;
        }
    }

    match check_payment_schema(store).await {
        Ok(true) => {}
        Ok(false) => {
            warn!(
                "payment schema not found; apply migrations/0002_payment_tracking.sql. \
                 The app keeps working but payment tracking is limited"
            );
            return false;
        }
        Err(e) => {
            warn!(error = %e, "payment schema check failed, payment tracking disabled");
            return false;
        }
    }

    if let Err(e) = store.mark_setup_complete(PAYMENT_SCHEMA_SETUP, PAYMENT_SCHEMA_VERSION).await {
        // The schema is there; only the marker is missing, so the next start re-checks.
        warn!(error = %e, "failed to mark payment schema setup complete");
    } else {
        info!("payment schema setup marked as complete");
    }
    true
}

async fn check_payment_schema(store: &dyn ProcurementStore) -> Result<bool, StoreError> {
    if !store.table_exists("payment_transactions").await? {
        info!("payment_transactions table not found");
        return Ok(false);
    }
    if !store.columns_exist("purchase_orders", &PAYMENT_COLUMNS).await? {
        info!("payment columns not found in purchase_orders");
        return Ok(false);
    }
    Ok(true)
}

/// Runs the readiness check and publishes the result to `capabilities`.
pub async fn refresh_capabilities(store: &dyn ProcurementStore, capabilities: &Capabilities) -> bool {
    let available = check_payment_readiness(store).await;
    capabilities.set_payment_tracking(available);
    available
}
