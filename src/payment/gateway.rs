use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("payment gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("payment gateway returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected payment gateway response: {0}")]
    Decode(String),
}

/// What we ask the gateway to create. `amount` is already in minor units.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntentParams {
    pub amount: i64,
    pub currency: String,
    pub metadata: BTreeMap<String, String>,
}

/// The gateway's view of a payment intent. `raw` is the body as received and
/// is what clients get back.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: String,
    pub status: String,
    pub amount: i64,
    pub currency: String,
    pub client_secret: Option<String>,
    pub metadata: HashMap<String, String>,
    pub raw: Value,
}

#[derive(Deserialize)]
struct IntentFields {
    id: String,
    status: String,
    amount: i64,
    currency: String,
    client_secret: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl PaymentIntent {
    pub fn from_value(raw: Value) -> Result<Self, GatewayError> {
        let fields = IntentFields::deserialize(&raw).map_err(|e| GatewayError::Decode(e.to_string()))?;
        Ok(Self {
            id: fields.id,
            status: fields.status,
            amount: fields.amount,
            currency: fields.currency,
            client_secret: fields.client_secret,
            metadata: fields.metadata,
            raw,
        })
    }

    pub fn succeeded(&self) -> bool {
        self.status == "succeeded"
    }
}

/// The external payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_intent(&self, params: PaymentIntentParams) -> Result<PaymentIntent, GatewayError>;
    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, GatewayError>;
    /// Card payment methods saved for `customer_id`, passed through untouched.
    async fn list_payment_methods(&self, customer_id: &str) -> Result<Vec<Value>, GatewayError>;
}
