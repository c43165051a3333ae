//! Conversions between database entities and contract models.

use crate::contract::{Order, OrderItem, OrderStatus, Product, User};
use crate::infra::storage::entity::{order, order_item, product, user};

impl From<user::Model> for User {
    fn from(entity: user::Model) -> Self {
        User {
            id: entity.id,
            email: entity.email,
            display_name: entity.display_name,
            is_admin: entity.is_admin,
            created_at: entity.created_at,
        }
    }
}

impl From<product::Model> for Product {
    fn from(entity: product::Model) -> Self {
        Product {
            id: entity.id,
            name: entity.name,
            price: entity.price,
            description: entity.description,
            image_url: entity.image_url,
            stock: entity.stock,
            category: entity.category,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

impl From<order_item::Model> for OrderItem {
    fn from(entity: order_item::Model) -> Self {
        OrderItem {
            id: entity.id,
            order_id: entity.order_id,
            product_id: entity.product_id,
            product_name: entity.product_name,
            quantity: entity.quantity,
            price: entity.price,
        }
    }
}

/// An order row with its item rows. An unrecognized status string in the
/// database maps to `Pending` rather than failing the whole read.
impl From<(order::Model, Vec<order_item::Model>)> for Order {
    fn from((entity, items): (order::Model, Vec<order_item::Model>)) -> Self {
        Order {
            id: entity.id,
            user_id: entity.user_id,
            total: entity.total,
            status: OrderStatus::parse(&entity.status).unwrap_or(OrderStatus::Pending),
            payment_intent_id: entity.payment_intent_id,
            items: items.into_iter().map(Into::into).collect(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
