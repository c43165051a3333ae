//! In-process payment provider for development and tests.
//!
//! Every intent it creates is immediately "succeeded", and the created
//! amounts are remembered so amount verification at checkout behaves like it
//! would against the real provider.

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{PaymentCharge, PaymentError, PaymentIntent, PaymentProvider};

pub struct MockPaymentProvider {
    currency: String,
    intents: DashMap<String, i64>,
}

impl MockPaymentProvider {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            intents: DashMap::new(),
        }
    }
}

#[async_trait::async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_intent(&self, amount: i64, _user_id: Uuid) -> Result<PaymentIntent, PaymentError> {
        let id = format!("pi_mock_{}", Uuid::new_v4().simple());
        self.intents.insert(id.clone(), amount);
        debug!(intent_id = %id, amount, currency = %self.currency, "Created mock payment intent");
        Ok(PaymentIntent {
            client_secret: format!("{id}_secret"),
            id,
        })
    }

    async fn retrieve(&self, payment_intent_id: &str) -> Result<PaymentCharge, PaymentError> {
        match self.intents.get(payment_intent_id) {
            Some(amount) => Ok(PaymentCharge {
                id: payment_intent_id.to_string(),
                status: "succeeded".to_string(),
                amount: *amount,
            }),
            // Unknown references verify as not-succeeded rather than erroring,
            // mirroring how a bogus id fails checkout against the real API.
            None => Ok(PaymentCharge {
                id: payment_intent_id.to_string(),
                status: "unknown".to_string(),
                amount: 0,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn created_intent_verifies_with_its_amount() {
        let provider = MockPaymentProvider::new("jpy");
        let intent = provider.create_intent(2800, Uuid::new_v4()).await.unwrap();
        assert!(intent.id.starts_with("pi_mock_"));
        assert_eq!(intent.client_secret, format!("{}_secret", intent.id));

        let charge = provider.retrieve(&intent.id).await.unwrap();
        assert!(charge.succeeded());
        assert_eq!(charge.amount, 2800);
    }

    #[tokio::test]
    async fn unknown_reference_does_not_verify() {
        let provider = MockPaymentProvider::new("jpy");
        let charge = provider.retrieve("pi_mock_forged").await.unwrap();
        assert!(!charge.succeeded());
        assert_eq!(charge.amount, 0);
    }
}
