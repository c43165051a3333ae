//! Checkout tests against a real SQLite database.
//!
//! Each test runs on a fresh in-memory database with migrations applied, a
//! SeaORM-backed orders repository, and the mock payment provider, so the
//! whole path from service call to committed rows is exercised.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{Database, DatabaseConnection, EntityTrait, PaginatorTrait};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use commerce::contract::{CartLine, NewOrder, OrderStatus, Product, User};
use commerce::domain::error::DomainError;
use commerce::domain::orders::OrderService;
use commerce::domain::ports::PaymentProvider;
use commerce::domain::repo::{CatalogRepository, UsersRepository};
use commerce::infra::payment::MockPaymentProvider;
use commerce::infra::storage::entity::{order, order_item, product};
use commerce::infra::storage::{
    Migrator, SeaOrmCatalogRepository, SeaOrmOrdersRepository, SeaOrmUsersRepository,
};

async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// Orders carry a foreign key to `users`, so every buyer must be a real row.
async fn insert_user(db: &DatabaseConnection, email: &str) -> Uuid {
    let id = Uuid::new_v4();
    let users = SeaOrmUsersRepository::new(db.clone());
    users
        .insert(
            User {
                id,
                email: email.to_string(),
                display_name: "Shopper".to_string(),
                is_admin: false,
                created_at: Utc::now(),
            },
            "unused-hash".to_string(),
        )
        .await
        .expect("Failed to insert user");
    id
}

async fn insert_product(db: &DatabaseConnection, name: &str, price: i64, stock: i32) -> Uuid {
    let now = Utc::now();
    let id = Uuid::new_v4();
    let catalog = SeaOrmCatalogRepository::new(db.clone());
    catalog
        .insert(Product {
            id,
            name: name.to_string(),
            price: Decimal::from(price),
            description: String::new(),
            image_url: String::new(),
            stock,
            category: "amigurumi".to_string(),
            created_at: now,
            updated_at: now,
        })
        .await
        .expect("Failed to insert product");
    id
}

fn test_harness(db: DatabaseConnection) -> (OrderService, Arc<MockPaymentProvider>) {
    let provider = Arc::new(MockPaymentProvider::new("jpy"));
    let repo = Arc::new(SeaOrmOrdersRepository::new(db));
    (OrderService::new(repo, provider.clone()), provider)
}

fn cart(total: i64, lines: Vec<(Uuid, i64, i32)>) -> NewOrder {
    NewOrder {
        total: Decimal::from(total),
        payment_intent_id: None,
        items: lines
            .into_iter()
            .map(|(product_id, price, quantity)| CartLine {
                product_id,
                product_name: "Crocheted Bear Amigurumi".to_string(),
                quantity,
                price: Decimal::from(price),
            })
            .collect(),
    }
}

async fn stock_of(db: &DatabaseConnection, id: Uuid) -> i32 {
    product::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("query failed")
        .expect("product missing")
        .stock
}

#[tokio::test]
async fn place_order_decrements_stock_and_persists_lines() {
    let db = create_test_db().await;
    let bear = insert_product(&db, "Bear", 2800, 8).await;
    let user_id = insert_user(&db, "shopper@example.com").await;
    let (service, _) = test_harness(db.clone());

    let order = service
        .place_order(user_id, cart(5600, vec![(bear, 2800, 2)]))
        .await
        .expect("order should be placed");

    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(stock_of(&db, bear).await, 6);

    let stored = service
        .get_order(user_id, order.id)
        .await
        .expect("stored order should load");
    assert_eq!(stored.items.len(), 1);
    assert_eq!(stored.items[0].quantity, 2);
    assert_eq!(stored.total, Decimal::from(5600));
}

#[tokio::test]
async fn insufficient_stock_rejects_and_leaves_no_rows() {
    let db = create_test_db().await;
    let bear = insert_product(&db, "Bear", 2800, 1).await;
    let user_id = insert_user(&db, "shopper@example.com").await;
    let (service, _) = test_harness(db.clone());

    let err = service
        .place_order(user_id, cart(5600, vec![(bear, 2800, 2)]))
        .await
        .unwrap_err();

    match err {
        DomainError::InsufficientStock { name } => assert_eq!(name, "Bear"),
        other => panic!("expected InsufficientStock, got {other:?}"),
    }
    assert_eq!(stock_of(&db, bear).await, 1);
    assert_eq!(order::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(order_item::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn failing_second_line_rolls_back_first_decrement() {
    let db = create_test_db().await;
    let bear = insert_product(&db, "Bear", 2800, 8).await;
    let scarf = insert_product(&db, "Scarf", 4500, 1).await;
    let user_id = insert_user(&db, "shopper@example.com").await;
    let (service, _) = test_harness(db.clone());

    let err = service
        .place_order(
            user_id,
            cart(11800, vec![(bear, 2800, 1), (scarf, 4500, 2)]),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::InsufficientStock { .. }));
    // The bear decrement from the first line must have been undone.
    assert_eq!(stock_of(&db, bear).await, 8);
    assert_eq!(stock_of(&db, scarf).await, 1);
    assert_eq!(order::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let db = create_test_db().await;
    let user_id = insert_user(&db, "shopper@example.com").await;
    let (service, _) = test_harness(db);

    let ghost = Uuid::new_v4();
    let err = service
        .place_order(user_id, cart(2800, vec![(ghost, 2800, 1)]))
        .await
        .unwrap_err();

    match err {
        DomainError::ProductNotFound { id } => assert_eq!(id, ghost),
        other => panic!("expected ProductNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn orders_are_scoped_to_their_owner() {
    let db = create_test_db().await;
    let bear = insert_product(&db, "Bear", 2800, 8).await;
    let owner = insert_user(&db, "owner@example.com").await;
    let stranger = insert_user(&db, "stranger@example.com").await;
    let (service, _) = test_harness(db);

    let order = service
        .place_order(owner, cart(2800, vec![(bear, 2800, 1)]))
        .await
        .unwrap();

    assert!(service.get_order(owner, order.id).await.is_ok());
    let err = service.get_order(stranger, order.id).await.unwrap_err();
    assert!(matches!(err, DomainError::OrderNotFound { .. }));

    assert_eq!(service.list_orders(owner).await.unwrap().len(), 1);
    assert!(service.list_orders(stranger).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_orders_returns_newest_first_with_items() {
    let db = create_test_db().await;
    let bear = insert_product(&db, "Bear", 2800, 20).await;
    let user_id = insert_user(&db, "shopper@example.com").await;
    let (service, _) = test_harness(db);

    let first = service
        .place_order(user_id, cart(2800, vec![(bear, 2800, 1)]))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = service
        .place_order(user_id, cart(5600, vec![(bear, 2800, 2)]))
        .await
        .unwrap();

    let orders = service.list_orders(user_id).await.unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id, second.id);
    assert_eq!(orders[1].id, first.id);
    assert!(orders.iter().all(|o| !o.items.is_empty()));
}

#[tokio::test]
async fn verified_payment_must_match_cart_total() {
    let db = create_test_db().await;
    let bear = insert_product(&db, "Bear", 2800, 8).await;
    let user_id = insert_user(&db, "shopper@example.com").await;
    let (service, provider) = test_harness(db.clone());

    // Intent charged for a different amount than the cart claims.
    let intent = provider.create_intent(2000, user_id).await.unwrap();
    let mut new_order = cart(2800, vec![(bear, 2800, 1)]);
    new_order.payment_intent_id = Some(intent.id);

    let err = service.place_order(user_id, new_order).await.unwrap_err();
    assert!(matches!(err, DomainError::PaymentAmountMismatch { .. }));
    assert_eq!(stock_of(&db, bear).await, 8);

    // Matching amount goes through.
    let intent = provider.create_intent(2800, user_id).await.unwrap();
    let mut new_order = cart(2800, vec![(bear, 2800, 1)]);
    new_order.payment_intent_id = Some(intent.id.clone());

    let order = service.place_order(user_id, new_order).await.unwrap();
    assert_eq!(order.payment_intent_id, Some(intent.id));
    assert_eq!(stock_of(&db, bear).await, 7);
}

#[tokio::test]
async fn forged_payment_reference_is_rejected() {
    let db = create_test_db().await;
    let bear = insert_product(&db, "Bear", 2800, 8).await;
    let user_id = insert_user(&db, "shopper@example.com").await;
    let (service, _) = test_harness(db);

    let mut new_order = cart(2800, vec![(bear, 2800, 1)]);
    new_order.payment_intent_id = Some("pi_mock_forged".to_string());

    let err = service
        .place_order(user_id, new_order)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::PaymentNotCompleted { .. }));
}

#[tokio::test]
async fn concurrent_orders_never_oversell() {
    let db = create_test_db().await;
    let bear = insert_product(&db, "Bear", 2800, 5).await;
    let buyers = [
        insert_user(&db, "first@example.com").await,
        insert_user(&db, "second@example.com").await,
    ];
    let (service, _) = test_harness(db.clone());
    let service = Arc::new(service);

    // Two buyers race for 3 units each out of 5. The guarded decrement must
    // let exactly one through.
    let mut handles = Vec::new();
    for buyer in buyers {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .place_order(buyer, cart(8400, vec![(bear, 2800, 3)]))
                .await
        }));
    }

    let mut ok = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => ok += 1,
            Err(DomainError::InsufficientStock { .. }) => insufficient += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(ok, 1);
    assert_eq!(insufficient, 1);
    assert_eq!(stock_of(&db, bear).await, 2);
}
