use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::payment::gateway::{GatewayError, PaymentGateway, PaymentIntent, PaymentIntentParams};

/// Stripe REST client. Requests are form-encoded, responses JSON.
#[derive(Clone)]
pub struct StripeGateway {
    client: Client,
    base_url: String,
    secret_key: String,
    api_version: String,
}

impl StripeGateway {
    pub fn new(
        base_url: impl Into<String>,
        secret_key: impl Into<String>,
        api_version: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
            api_version: api_version.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        Self::new(
            &config.stripe_api_base,
            &config.stripe_secret_key,
            &config.stripe_api_version,
            Duration::from_secs(config.gateway_timeout_secs),
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.secret_key)
            .header("Stripe-Version", &self.api_version)
    }

    async fn read_json(response: Response) -> Result<Value, GatewayError> {
        let status = response.status();
        let body: Value = response.json().await?;
        if status.is_success() {
            return Ok(body);
        }
        let message = body["error"]["message"]
            .as_str()
            .unwrap_or("no error message")
            .to_string();
        warn!(status = status.as_u16(), %message, "payment gateway rejected request");
        Err(GatewayError::Api { status: status.as_u16(), message })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_payment_intent(&self, params: PaymentIntentParams) -> Result<PaymentIntent, GatewayError> {
        let mut form: Vec<(String, String)> = vec![
            ("amount".into(), params.amount.to_string()),
            ("currency".into(), params.currency.to_lowercase()),
            ("automatic_payment_methods[enabled]".into(), "true".into()),
        ];
        form.extend(
            params
                .metadata
                .into_iter()
                .map(|(key, value)| (format!("metadata[{key}]"), value)),
        );

        debug!(amount = params.amount, "creating payment intent");
        let response = self
            .authorized(self.client.post(format!("{}/v1/payment_intents", self.base_url)))
            .form(&form)
            .send()
            .await?;
        PaymentIntent::from_value(Self::read_json(response).await?)
    }

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, GatewayError> {
        let response = self
            .authorized(self.client.get(format!("{}/v1/payment_intents/{id}", self.base_url)))
            .send()
            .await?;
        PaymentIntent::from_value(Self::read_json(response).await?)
    }

    async fn list_payment_methods(&self, customer_id: &str) -> Result<Vec<Value>, GatewayError> {
        let response = self
            .authorized(self.client.get(format!("{}/v1/payment_methods", self.base_url)))
            .query(&[("customer", customer_id), ("type", "card")])
            .send()
            .await?;
        let mut body = Self::read_json(response).await?;
        match body.get_mut("data").map(Value::take) {
            Some(Value::Array(methods)) => Ok(methods),
            _ => Err(GatewayError::Decode("payment method list has no data array".into())),
        }
    }
}
