use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::ports::{PaymentCharge, PaymentIntent, PaymentProvider};

/// Thin service over the payment provider port: intent creation for checkout
/// and on-demand verification of an existing intent.
#[derive(Clone)]
pub struct PaymentService {
    provider: Arc<dyn PaymentProvider>,
    publishable_key: String,
}

impl PaymentService {
    pub fn new(provider: Arc<dyn PaymentProvider>, publishable_key: impl Into<String>) -> Self {
        Self {
            provider,
            publishable_key: publishable_key.into(),
        }
    }

    /// The key the browser needs to initialize the card widget.
    pub fn publishable_key(&self) -> &str {
        &self.publishable_key
    }

    #[instrument(name = "commerce.service.create_intent", skip(self), fields(user_id = %user_id, amount))]
    pub async fn create_intent(
        &self,
        amount: i64,
        user_id: Uuid,
    ) -> Result<PaymentIntent, DomainError> {
        info!("Creating payment intent");

        if amount <= 0 {
            return Err(DomainError::validation(
                "amount",
                "amount must be positive",
            ));
        }

        let intent = self
            .provider
            .create_intent(amount, user_id)
            .await
            .map_err(|e| DomainError::payment_provider(e.to_string()))?;

        info!(intent_id = %intent.id, "Successfully created payment intent");
        Ok(intent)
    }

    /// Fetch the provider's record for an intent without judging it. Callers
    /// decide what a non-succeeded status means for them.
    #[instrument(name = "commerce.service.verify_intent", skip(self))]
    pub async fn verify_intent(&self, payment_intent_id: &str) -> Result<PaymentCharge, DomainError> {
        debug!("Verifying payment intent");
        self.provider
            .retrieve(payment_intent_id)
            .await
            .map_err(|e| DomainError::payment_provider(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::PaymentError;
    use async_trait::async_trait;

    struct FixedProvider;

    #[async_trait]
    impl PaymentProvider for FixedProvider {
        async fn create_intent(
            &self,
            amount: i64,
            _user_id: Uuid,
        ) -> Result<PaymentIntent, PaymentError> {
            Ok(PaymentIntent {
                id: format!("pi_{amount}"),
                client_secret: "secret".to_string(),
            })
        }

        async fn retrieve(&self, payment_intent_id: &str) -> Result<PaymentCharge, PaymentError> {
            Ok(PaymentCharge {
                id: payment_intent_id.to_string(),
                status: "succeeded".to_string(),
                amount: 1000,
            })
        }
    }

    #[tokio::test]
    async fn rejects_non_positive_amount() {
        let svc = PaymentService::new(Arc::new(FixedProvider), "pk_test");
        assert!(matches!(
            svc.create_intent(0, Uuid::new_v4()).await.unwrap_err(),
            DomainError::Validation { .. }
        ));
        assert!(matches!(
            svc.create_intent(-5, Uuid::new_v4()).await.unwrap_err(),
            DomainError::Validation { .. }
        ));
    }

    #[tokio::test]
    async fn creates_intent_for_positive_amount() {
        let svc = PaymentService::new(Arc::new(FixedProvider), "pk_test");
        let intent = svc.create_intent(1000, Uuid::new_v4()).await.unwrap();
        assert_eq!(intent.id, "pi_1000");
        assert_eq!(svc.publishable_key(), "pk_test");
    }
}
