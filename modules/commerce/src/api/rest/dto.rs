//! REST DTOs. The wire format is camelCase JSON; conversions to and from the
//! contract models live here so handlers stay thin.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::contract::{
    CartLine, Credentials, NewOrder, NewProduct, NewUser, Order, OrderItem, OrderStatus, Product,
    ProductPatch, User,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterReq {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginReq {
    pub email: String,
    pub password: String,
}

/// Registration and login both answer with a token plus the account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponseDto {
    pub token: String,
    pub user: UserDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub image_url: String,
    pub stock: i32,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductReq {
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductReq {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub stock: Option<i32>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total: Decimal,
    #[schema(value_type = String, example = "paid")]
    pub status: OrderStatus,
    pub payment_reference: Option<String>,
    pub items: Vec<OrderItemDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDto {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderReq {
    pub total: Decimal,
    pub stripe_payment_intent_id: Option<String>,
    pub items: Vec<CartLineReq>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLineReq {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateIntentReq {
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntentDto {
    pub client_secret: String,
    pub payment_intent_id: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentReq {
    pub payment_intent_id: String,
}

/// Answer for explicit verification. `verified: false` carries the provider's
/// status so the client can decide whether to retry the card flow.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentDto {
    pub verified: bool,
    pub amount: i64,
    pub payment_intent_id: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StripeConfigDto {
    pub publishable_key: String,
}

// Conversions between REST DTOs and contract models

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

impl From<RegisterReq> for NewUser {
    fn from(req: RegisterReq) -> Self {
        Self {
            email: req.email,
            password: req.password,
            display_name: req.display_name,
        }
    }
}

impl From<LoginReq> for Credentials {
    fn from(req: LoginReq) -> Self {
        Self {
            email: req.email,
            password: req.password,
        }
    }
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            price: p.price,
            description: p.description,
            image_url: p.image_url,
            stock: p.stock,
            category: p.category,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl From<CreateProductReq> for NewProduct {
    fn from(req: CreateProductReq) -> Self {
        Self {
            name: req.name,
            price: req.price,
            description: req.description,
            image_url: req.image_url,
            stock: req.stock,
            category: req.category,
        }
    }
}

impl From<UpdateProductReq> for ProductPatch {
    fn from(req: UpdateProductReq) -> Self {
        Self {
            name: req.name,
            price: req.price,
            description: req.description,
            image_url: req.image_url,
            stock: req.stock,
            category: req.category,
        }
    }
}

impl From<OrderItem> for OrderItemDto {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id,
            order_id: item.order_id,
            product_id: item.product_id,
            product_name: item.product_name,
            quantity: item.quantity,
            price: item.price,
        }
    }
}

impl From<Order> for OrderDto {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            total: order.total,
            status: order.status,
            payment_reference: order.payment_intent_id,
            items: order.items.into_iter().map(Into::into).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

impl From<PlaceOrderReq> for NewOrder {
    fn from(req: PlaceOrderReq) -> Self {
        Self {
            total: req.total,
            payment_intent_id: req.stripe_payment_intent_id,
            items: req.items.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<CartLineReq> for CartLine {
    fn from(req: CartLineReq) -> Self {
        Self {
            product_id: req.product_id,
            product_name: req.product_name,
            quantity: req.quantity,
            price: req.price,
        }
    }
}
