//! Payment provider adapters behind the `PaymentProvider` port.

pub mod mock;
pub mod stripe;

use std::sync::Arc;

use tracing::info;

use crate::config::StripeConfig;
use crate::domain::ports::PaymentProvider;

pub use mock::MockPaymentProvider;
pub use stripe::StripePaymentProvider;

/// Pick an adapter from configuration. A real Stripe secret key (the `sk_`
/// prefix, and not a placeholder containing "dummy") selects the live
/// adapter; anything else gets the in-memory mock so the checkout flow works
/// end to end without credentials.
pub fn provider_from_config(cfg: &StripeConfig) -> anyhow::Result<Arc<dyn PaymentProvider>> {
    if cfg.secret_key.starts_with("sk_") && !cfg.secret_key.contains("dummy") {
        info!("Using Stripe payment provider");
        Ok(Arc::new(StripePaymentProvider::new(cfg)?))
    } else {
        info!("No usable Stripe secret key, using mock payment provider");
        Ok(Arc::new(MockPaymentProvider::new(&cfg.currency)))
    }
}
