//! SeaORM-backed implementations of the domain repository ports.
//!
//! Each repository is generic over `C: ConnectionTrait`, so it can be
//! constructed with a `DatabaseConnection` or a transactional connection.
//! The orders repository additionally requires `TransactionTrait` because
//! checkout is a multi-statement atomic unit.

use anyhow::Context;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::contract::{Order, Product, User};
use crate::domain::error::DomainError;
use crate::domain::repo::{CatalogRepository, OrdersRepository, UsersRepository};
use crate::infra::storage::entity::{order, order_item, product, user};

pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let found = user::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        Ok(found.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<(User, String)>> {
        let found = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("find_by_email failed")?;
        Ok(found.map(|m| {
            let hash = m.password_hash.clone();
            (m.into(), hash)
        }))
    }

    async fn email_exists(&self, email: &str) -> anyhow::Result<bool> {
        let count = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .count(&self.conn)
            .await
            .context("email_exists failed")?;
        Ok(count > 0)
    }

    async fn insert(&self, u: User, password_hash: String) -> anyhow::Result<()> {
        let m = user::ActiveModel {
            id: Set(u.id),
            email: Set(u.email),
            password_hash: Set(password_hash),
            display_name: Set(u.display_name),
            is_admin: Set(u.is_admin),
            created_at: Set(u.created_at),
        };
        let _ = m.insert(&self.conn).await.context("insert failed")?;
        Ok(())
    }
}

pub struct SeaOrmCatalogRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmCatalogRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> CatalogRepository for SeaOrmCatalogRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Product>> {
        let found = product::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        Ok(found.map(Into::into))
    }

    async fn list(&self) -> anyhow::Result<Vec<Product>> {
        let rows = product::Entity::find()
            .order_by_desc(product::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("list failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert(&self, p: Product) -> anyhow::Result<()> {
        let m = product::ActiveModel {
            id: Set(p.id),
            name: Set(p.name),
            price: Set(p.price),
            description: Set(p.description),
            image_url: Set(p.image_url),
            stock: Set(p.stock),
            category: Set(p.category),
            created_at: Set(p.created_at),
            updated_at: Set(p.updated_at),
        };
        let _ = m.insert(&self.conn).await.context("insert failed")?;
        Ok(())
    }

    async fn update(&self, p: Product) -> anyhow::Result<()> {
        let m = product::ActiveModel {
            id: Set(p.id),
            name: Set(p.name),
            price: Set(p.price),
            description: Set(p.description),
            image_url: Set(p.image_url),
            stock: Set(p.stock),
            category: Set(p.category),
            created_at: Set(p.created_at),
            updated_at: Set(p.updated_at),
        };
        let _ = m.update(&self.conn).await.context("update failed")?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = product::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("delete failed")?;
        Ok(res.rows_affected > 0)
    }
}

pub struct SeaOrmOrdersRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmOrdersRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> OrdersRepository for SeaOrmOrdersRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn create_order(&self, o: Order) -> Result<Order, DomainError> {
        let txn = self
            .conn
            .begin()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        // Decrement stock line by line with a guarded update. The guard
        // (`stock >= quantity`) makes the decrement race-free: of two
        // concurrent orders competing for the last units, the database lets
        // exactly one through. Any early return drops `txn`, which rolls back
        // every decrement already applied.
        for item in &o.items {
            let found = product::Entity::find_by_id(item.product_id)
                .one(&txn)
                .await
                .map_err(|e| DomainError::database(e.to_string()))?;
            let Some(existing) = found else {
                return Err(DomainError::product_not_found(item.product_id));
            };

            let res = product::Entity::update_many()
                .col_expr(
                    product::Column::Stock,
                    Expr::col(product::Column::Stock).sub(item.quantity),
                )
                .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(product::Column::Id.eq(item.product_id))
                .filter(product::Column::Stock.gte(item.quantity))
                .exec(&txn)
                .await
                .map_err(|e| DomainError::database(e.to_string()))?;

            if res.rows_affected == 0 {
                return Err(DomainError::insufficient_stock(existing.name));
            }
        }

        let order_row = order::ActiveModel {
            id: Set(o.id),
            user_id: Set(o.user_id),
            total: Set(o.total),
            status: Set(o.status.as_str().to_string()),
            payment_intent_id: Set(o.payment_intent_id.clone()),
            created_at: Set(o.created_at),
            updated_at: Set(o.updated_at),
        };
        let _ = order_row
            .insert(&txn)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        let item_rows: Vec<order_item::ActiveModel> = o
            .items
            .iter()
            .map(|item| order_item::ActiveModel {
                id: Set(item.id),
                order_id: Set(item.order_id),
                product_id: Set(item.product_id),
                product_name: Set(item.product_name.clone()),
                quantity: Set(item.quantity),
                price: Set(item.price),
            })
            .collect();
        order_item::Entity::insert_many(item_rows)
            .exec(&txn)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        Ok(o)
    }

    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Order>> {
        let rows = order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .find_with_related(order_item::Entity)
            .all(&self.conn)
            .await
            .context("list_for_user failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_for_user(&self, user_id: Uuid, order_id: Uuid) -> anyhow::Result<Option<Order>> {
        let mut rows = order::Entity::find_by_id(order_id)
            .filter(order::Column::UserId.eq(user_id))
            .find_with_related(order_item::Entity)
            .all(&self.conn)
            .await
            .context("find_for_user failed")?;
        Ok(rows.pop().map(Into::into))
    }
}
