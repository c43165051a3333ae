//! Stripe adapter: payment intents over the REST API.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::config::StripeConfig;
use crate::domain::ports::{PaymentCharge, PaymentError, PaymentIntent, PaymentProvider};

pub struct StripePaymentProvider {
    client: reqwest::Client,
    secret_key: String,
    currency: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: String,
    #[serde(default)]
    client_secret: Option<String>,
    status: String,
    amount: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl StripePaymentProvider {
    pub fn new(cfg: &StripeConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            secret_key: cfg.secret_key.clone(),
            currency: cfg.currency.clone(),
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn parse_intent(&self, response: reqwest::Response) -> Result<IntentResponse, PaymentError> {
        if response.status().is_success() {
            return response
                .json::<IntentResponse>()
                .await
                .map_err(|e| PaymentError::Provider(format!("malformed response: {e}")));
        }

        let status = response.status();
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error.message,
            Err(_) => format!("HTTP {status}"),
        };
        Err(PaymentError::Provider(message))
    }
}

#[async_trait::async_trait]
impl PaymentProvider for StripePaymentProvider {
    #[instrument(name = "commerce.stripe.create_intent", skip(self), fields(amount))]
    async fn create_intent(&self, amount: i64, user_id: Uuid) -> Result<PaymentIntent, PaymentError> {
        debug!("Creating Stripe payment intent");

        let params = [
            ("amount", amount.to_string()),
            ("currency", self.currency.clone()),
            ("metadata[user_id]", user_id.to_string()),
        ];
        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        let intent = self.parse_intent(response).await?;
        let client_secret = intent.client_secret.ok_or_else(|| {
            PaymentError::Provider("payment intent has no client secret".to_string())
        })?;

        Ok(PaymentIntent {
            id: intent.id,
            client_secret,
        })
    }

    #[instrument(name = "commerce.stripe.retrieve", skip(self))]
    async fn retrieve(&self, payment_intent_id: &str) -> Result<PaymentCharge, PaymentError> {
        debug!("Retrieving Stripe payment intent");

        let response = self
            .client
            .get(format!(
                "{}/v1/payment_intents/{payment_intent_id}",
                self.api_base
            ))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        let intent = self.parse_intent(response).await?;
        Ok(PaymentCharge {
            id: intent.id,
            status: intent.status,
            amount: intent.amount,
        })
    }
}
