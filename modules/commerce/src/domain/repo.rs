use crate::contract::{Order, Product, User};
use crate::domain::error::DomainError;
use async_trait::async_trait;
use uuid::Uuid;

/// Port for account persistence. Object-safe and async-friendly via `async_trait`.
///
/// The password hash travels separately from the contract `User` so it never
/// leaks out of the storage and auth layers.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// Load a user together with their credential hash, for login.
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<(User, String)>>;
    async fn email_exists(&self, email: &str) -> anyhow::Result<bool>;
    /// Insert a fully-formed domain user.
    ///
    /// Service computes id/timestamps/validation; repo persists.
    async fn insert(&self, user: User, password_hash: String) -> anyhow::Result<()>;
}

/// Port for catalog persistence.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Product>>;
    /// All products, newest first.
    async fn list(&self) -> anyhow::Result<Vec<Product>>;
    async fn insert(&self, product: Product) -> anyhow::Result<()>;
    async fn update(&self, product: Product) -> anyhow::Result<()>;
    /// Delete by id. Returns true if a row was deleted.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

/// Port for order persistence.
#[async_trait]
pub trait OrdersRepository: Send + Sync {
    /// Persist the order, its line items, and the stock decrements for every
    /// line as one atomic unit: either all of it commits or none of it does.
    ///
    /// Stock is decremented with a conditional update (`stock >= quantity`)
    /// so that two concurrent orders can never jointly oversell a product.
    /// Returns `ProductNotFound` or `InsufficientStock` (and rolls the whole
    /// transaction back) when a line cannot be satisfied.
    async fn create_order(&self, order: Order) -> Result<Order, DomainError>;

    /// The user's orders, newest first, items included.
    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Order>>;

    /// An order by id, only if it belongs to `user_id`.
    async fn find_for_user(&self, user_id: Uuid, order_id: Uuid) -> anyhow::Result<Option<Order>>;
}
