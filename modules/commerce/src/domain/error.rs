use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Product not found: {id}")]
    ProductNotFound { id: Uuid },

    #[error("Order not found: {id}")]
    OrderNotFound { id: Uuid },

    #[error("User not found: {id}")]
    UserNotFound { id: Uuid },

    #[error("User with email '{email}' already exists")]
    EmailAlreadyExists { email: String },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Admin privileges required")]
    Forbidden,

    #[error("Insufficient stock for '{name}'")]
    InsufficientStock { name: String },

    #[error("Cart total {total} does not match line item sum {computed}")]
    TotalMismatch { total: Decimal, computed: Decimal },

    #[error("Payment not completed (provider status: {status})")]
    PaymentNotCompleted { status: String },

    #[error("Charged amount {charged} does not match cart total {total}")]
    PaymentAmountMismatch { total: Decimal, charged: Decimal },

    #[error("Payment provider error: {message}")]
    PaymentProvider { message: String },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn product_not_found(id: Uuid) -> Self {
        Self::ProductNotFound { id }
    }

    pub fn order_not_found(id: Uuid) -> Self {
        Self::OrderNotFound { id }
    }

    pub fn user_not_found(id: Uuid) -> Self {
        Self::UserNotFound { id }
    }

    pub fn email_already_exists(email: impl Into<String>) -> Self {
        Self::EmailAlreadyExists {
            email: email.into(),
        }
    }

    pub fn insufficient_stock(name: impl Into<String>) -> Self {
        Self::InsufficientStock { name: name.into() }
    }

    pub fn total_mismatch(total: Decimal, computed: Decimal) -> Self {
        Self::TotalMismatch { total, computed }
    }

    pub fn payment_not_completed(status: impl Into<String>) -> Self {
        Self::PaymentNotCompleted {
            status: status.into(),
        }
    }

    pub fn payment_amount_mismatch(total: Decimal, charged: Decimal) -> Self {
        Self::PaymentAmountMismatch { total, charged }
    }

    pub fn payment_provider(message: impl Into<String>) -> Self {
        Self::PaymentProvider {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
