use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// A freshly created payment intent: `id` is the server-side reference used
/// for later verification, `client_secret` is handed to the browser to drive
/// the card flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// The provider's current view of a charge. `amount` is in the smallest
/// currency unit (whole yen for jpy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentCharge {
    pub id: String,
    pub status: String,
    pub amount: i64,
}

impl PaymentCharge {
    pub fn succeeded(&self) -> bool {
        self.status == "succeeded"
    }
}

#[derive(Error, Debug)]
pub enum PaymentError {
    /// The provider could not be reached, timed out, or rejected the call.
    /// Always surfaced to clients as a retryable verification failure.
    #[error("payment provider error: {0}")]
    Provider(String),
}

/// Port for the external payment provider. The client-asserted payment state
/// is never trusted; callers always re-query through this port.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create an intent to charge `amount` on behalf of `user_id`.
    async fn create_intent(&self, amount: i64, user_id: Uuid) -> Result<PaymentIntent, PaymentError>;

    /// Fetch the provider's record for a previously created intent.
    async fn retrieve(&self, payment_intent_id: &str) -> Result<PaymentCharge, PaymentError>;
}
