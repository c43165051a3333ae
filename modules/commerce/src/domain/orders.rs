use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::{CartLine, NewOrder, Order, OrderItem, OrderStatus};
use crate::domain::error::DomainError;
use crate::domain::ports::PaymentProvider;
use crate::domain::repo::OrdersRepository;

/// Checkout service. Verifies the claimed payment against the provider,
/// validates the cart, and hands the repository one atomic unit of work:
/// stock decrements, the order row, and its line items.
#[derive(Clone)]
pub struct OrderService {
    repo: Arc<dyn OrdersRepository>,
    payments: Arc<dyn PaymentProvider>,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrdersRepository>, payments: Arc<dyn PaymentProvider>) -> Self {
        Self { repo, payments }
    }

    #[instrument(
        name = "commerce.service.place_order",
        skip(self, new_order),
        fields(user_id = %user_id, lines = new_order.items.len())
    )]
    pub async fn place_order(
        &self,
        user_id: Uuid,
        new_order: NewOrder,
    ) -> Result<Order, DomainError> {
        info!("Placing order");

        self.validate_cart(&new_order)?;

        // The client-supplied total is never the source of truth for what was
        // actually charged: re-query the provider for the reference it claims.
        if let Some(ref payment_intent_id) = new_order.payment_intent_id {
            self.verify_payment(payment_intent_id, new_order.total)
                .await?;
        }

        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let items = new_order
            .items
            .iter()
            .map(|line| OrderItem {
                id: Uuid::new_v4(),
                order_id,
                product_id: line.product_id,
                // Snapshot the name exactly as the client displayed it.
                product_name: line.product_name.clone(),
                quantity: line.quantity,
                price: line.price,
            })
            .collect();

        let order = Order {
            id: order_id,
            user_id,
            total: new_order.total,
            status: OrderStatus::Paid,
            payment_intent_id: new_order.payment_intent_id,
            items,
            created_at: now,
            updated_at: now,
        };

        // Stock checks and decrements happen inside the repository, in the
        // same transaction as the order insert, so any failure rolls every
        // earlier decrement back.
        let order = self.repo.create_order(order).await?;

        info!(order_id = %order.id, "Successfully placed order");
        Ok(order)
    }

    #[instrument(name = "commerce.service.list_orders", skip(self), fields(user_id = %user_id))]
    pub async fn list_orders(&self, user_id: Uuid) -> Result<Vec<Order>, DomainError> {
        debug!("Listing orders");

        let orders = self
            .repo
            .list_for_user(user_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        debug!("Found {} orders", orders.len());
        Ok(orders)
    }

    #[instrument(
        name = "commerce.service.get_order",
        skip(self),
        fields(user_id = %user_id, order_id = %order_id)
    )]
    pub async fn get_order(&self, user_id: Uuid, order_id: Uuid) -> Result<Order, DomainError> {
        debug!("Getting order");

        // Ownership is part of the lookup key: an order belonging to someone
        // else is indistinguishable from a missing one.
        self.repo
            .find_for_user(user_id, order_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::order_not_found(order_id))
    }

    // --- helpers ---

    async fn verify_payment(
        &self,
        payment_intent_id: &str,
        total: Decimal,
    ) -> Result<(), DomainError> {
        let charge = self
            .payments
            .retrieve(payment_intent_id)
            .await
            .map_err(|e| {
                warn!("Payment provider lookup failed: {e}");
                DomainError::payment_provider(e.to_string())
            })?;

        if !charge.succeeded() {
            return Err(DomainError::payment_not_completed(charge.status));
        }

        let charged = Decimal::from(charge.amount);
        if charged != total {
            return Err(DomainError::payment_amount_mismatch(total, charged));
        }

        Ok(())
    }

    fn validate_cart(&self, new_order: &NewOrder) -> Result<(), DomainError> {
        if new_order.items.is_empty() {
            return Err(DomainError::validation("items", "cart must not be empty"));
        }

        for line in &new_order.items {
            self.validate_line(line)?;
        }

        // The total the client pays with must equal the line item math;
        // otherwise an under-reported total could slip past payment
        // verification.
        let computed: Decimal = new_order
            .items
            .iter()
            .map(|line| line.price * Decimal::from(line.quantity))
            .sum();
        if computed != new_order.total {
            return Err(DomainError::total_mismatch(new_order.total, computed));
        }

        Ok(())
    }

    fn validate_line(&self, line: &CartLine) -> Result<(), DomainError> {
        if line.quantity <= 0 {
            return Err(DomainError::validation(
                "items.quantity",
                format!("quantity must be positive (got {})", line.quantity),
            ));
        }
        if line.price < Decimal::ZERO {
            return Err(DomainError::validation(
                "items.price",
                "price must not be negative",
            ));
        }
        if line.product_name.trim().is_empty() {
            return Err(DomainError::validation(
                "items.productName",
                "product name must not be empty",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{PaymentCharge, PaymentError, PaymentIntent};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Repo stub: records the order it was handed, succeeds unconditionally.
    #[derive(Default)]
    struct RecordingRepo {
        last: Mutex<Option<Order>>,
    }

    #[async_trait]
    impl OrdersRepository for RecordingRepo {
        async fn create_order(&self, order: Order) -> Result<Order, DomainError> {
            *self.last.lock().unwrap() = Some(order.clone());
            Ok(order)
        }

        async fn list_for_user(&self, _user_id: Uuid) -> anyhow::Result<Vec<Order>> {
            Ok(vec![])
        }

        async fn find_for_user(
            &self,
            _user_id: Uuid,
            _order_id: Uuid,
        ) -> anyhow::Result<Option<Order>> {
            Ok(None)
        }
    }

    /// Provider stub with a scripted answer.
    struct ScriptedProvider {
        charge: Result<PaymentCharge, ()>,
    }

    #[async_trait]
    impl PaymentProvider for ScriptedProvider {
        async fn create_intent(
            &self,
            _amount: i64,
            _user_id: Uuid,
        ) -> Result<PaymentIntent, PaymentError> {
            unimplemented!("not used in these tests")
        }

        async fn retrieve(&self, payment_intent_id: &str) -> Result<PaymentCharge, PaymentError> {
            match &self.charge {
                Ok(charge) => Ok(PaymentCharge {
                    id: payment_intent_id.to_string(),
                    ..charge.clone()
                }),
                Err(()) => Err(PaymentError::Provider("connection timed out".into())),
            }
        }
    }

    fn service_with(charge: Result<PaymentCharge, ()>) -> (OrderService, Arc<RecordingRepo>) {
        let repo = Arc::new(RecordingRepo::default());
        let provider = Arc::new(ScriptedProvider { charge });
        (OrderService::new(repo.clone(), provider), repo)
    }

    fn cart(total: i64, lines: &[(i64, i32)]) -> NewOrder {
        NewOrder {
            total: Decimal::from(total),
            payment_intent_id: None,
            items: lines
                .iter()
                .map(|(price, quantity)| CartLine {
                    product_id: Uuid::new_v4(),
                    product_name: "Crocheted bear".to_string(),
                    quantity: *quantity,
                    price: Decimal::from(*price),
                })
                .collect(),
        }
    }

    fn succeeded(amount: i64) -> Result<PaymentCharge, ()> {
        Ok(PaymentCharge {
            id: String::new(),
            status: "succeeded".to_string(),
            amount,
        })
    }

    #[tokio::test]
    async fn places_order_with_matching_payment() {
        let (service, repo) = service_with(succeeded(1000));
        let mut new_order = cart(1000, &[(500, 2)]);
        new_order.payment_intent_id = Some("pi_123".to_string());

        let order = service
            .place_order(Uuid::new_v4(), new_order)
            .await
            .expect("order should be placed");

        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.total, Decimal::from(1000));
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].order_id, order.id);
        assert!(repo.last.lock().unwrap().is_some());
    }

    #[tokio::test]
    async fn rejects_empty_cart() {
        let (service, repo) = service_with(succeeded(0));
        let err = service
            .place_order(Uuid::new_v4(), cart(0, &[]))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation { .. }));
        assert!(repo.last.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_non_positive_quantity() {
        let (service, _) = service_with(succeeded(0));
        let err = service
            .place_order(Uuid::new_v4(), cart(0, &[(500, 0)]))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[tokio::test]
    async fn rejects_total_that_disagrees_with_lines() {
        let (service, repo) = service_with(succeeded(900));
        let err = service
            .place_order(Uuid::new_v4(), cart(900, &[(500, 2)]))
            .await
            .unwrap_err();

        match err {
            DomainError::TotalMismatch { total, computed } => {
                assert_eq!(total, Decimal::from(900));
                assert_eq!(computed, Decimal::from(1000));
            }
            other => panic!("expected TotalMismatch, got {other:?}"),
        }
        assert!(repo.last.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_incomplete_payment_before_any_persistence() {
        let (service, repo) = service_with(Ok(PaymentCharge {
            id: String::new(),
            status: "requires_payment_method".to_string(),
            amount: 1000,
        }));
        let mut new_order = cart(1000, &[(1000, 1)]);
        new_order.payment_intent_id = Some("pi_123".to_string());

        let err = service
            .place_order(Uuid::new_v4(), new_order)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::PaymentNotCompleted { .. }));
        assert!(repo.last.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_amount_mismatch() {
        let (service, repo) = service_with(succeeded(900));
        let mut new_order = cart(1000, &[(1000, 1)]);
        new_order.payment_intent_id = Some("pi_123".to_string());

        let err = service
            .place_order(Uuid::new_v4(), new_order)
            .await
            .unwrap_err();

        match err {
            DomainError::PaymentAmountMismatch { total, charged } => {
                assert_eq!(total, Decimal::from(1000));
                assert_eq!(charged, Decimal::from(900));
            }
            other => panic!("expected PaymentAmountMismatch, got {other:?}"),
        }
        assert!(repo.last.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn provider_failure_is_retryable_not_fatal() {
        let (service, repo) = service_with(Err(()));
        let mut new_order = cart(1000, &[(1000, 1)]);
        new_order.payment_intent_id = Some("pi_123".to_string());

        let err = service
            .place_order(Uuid::new_v4(), new_order)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::PaymentProvider { .. }));
        assert!(repo.last.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn unpaid_cart_skips_provider() {
        // No payment reference: the provider stub would fail, but it must not
        // be consulted at all.
        let (service, _) = service_with(Err(()));
        let order = service
            .place_order(Uuid::new_v4(), cart(1000, &[(500, 2)]))
            .await
            .expect("order without payment reference should be placed");
        assert_eq!(order.payment_intent_id, None);
    }
}
