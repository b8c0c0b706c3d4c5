//! Scripted `PaymentGateway` for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::payment::gateway::{GatewayError, PaymentGateway, PaymentIntent, PaymentIntentParams};

/// Answers every intent lookup with `status` and records what was created.
/// Looked-up intents carry `amount` (minor units) and `currency`.
pub struct FakeGateway {
    pub status: String,
    pub amount: i64,
    pub currency: String,
    pub metadata: HashMap<String, String>,
    pub created: Mutex<Vec<PaymentIntentParams>>,
    pub fail: bool,
}

impl FakeGateway {
    pub fn with_status(status: &str) -> Self {
        Self {
            status: status.into(),
            amount: 100_000,
            currency: "usd".into(),
            metadata: HashMap::new(),
            created: Mutex::new(vec![]),
            fail: false,
        }
    }

    /// Tags looked-up intents with `purchase_order_id` metadata.
    pub fn for_order(mut self, purchase_order_id: &str) -> Self {
        self.metadata.insert("purchase_order_id".into(), purchase_order_id.into());
        self
    }

    fn intent(&self, amount: i64, currency: &str) -> PaymentIntent {
        PaymentIntent::from_value(json!({
            "id": "pi_test",
            "status": self.status,
            "amount": amount,
            "currency": currency,
            "client_secret": "pi_test_secret",
            "metadata": self.metadata,
        }))
        .unwrap()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_payment_intent(&self, params: PaymentIntentParams) -> Result<PaymentIntent, GatewayError> {
        if self.fail {
            return Err(GatewayError::Api { status: 402, message: "card declined".into() });
        }
        let intent = self.intent(params.amount, &params.currency);
        self.created.lock().unwrap().push(params);
        Ok(intent)
    }

    async fn retrieve_payment_intent(&self, _id: &str) -> Result<PaymentIntent, GatewayError> {
        if self.fail {
            return Err(GatewayError::Api { status: 500, message: "gateway down".into() });
        }
        Ok(self.intent(self.amount, &self.currency))
    }

    async fn list_payment_methods(&self, _customer_id: &str) -> Result<Vec<Value>, GatewayError> {
        if self.fail {
            return Err(GatewayError::Api { status: 500, message: "gateway down".into() });
        }
        Ok(vec![json!({"id": "pm_1", "type": "card"})])
    }
}
