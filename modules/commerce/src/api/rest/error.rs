use axum::http::StatusCode;

use crate::api::problem::{Problem, ProblemResponse};
use crate::domain::error::DomainError;

/// Helper to create a ProblemResponse with less boilerplate.
pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
) -> ProblemResponse {
    ProblemResponse(
        Problem::new(status, title, detail)
            .with_type(format!("https://errors.storefront.dev/{code}"))
            .with_code(code)
            .with_instance(instance),
    )
}

/// Map a domain error to an RFC 9457 ProblemResponse.
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::ProductNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "COMMERCE_PRODUCT_NOT_FOUND",
            "Product not found",
            format!("Product with id {id} was not found"),
            instance,
        ),
        DomainError::OrderNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "COMMERCE_ORDER_NOT_FOUND",
            "Order not found",
            format!("Order with id {id} was not found"),
            instance,
        ),
        DomainError::UserNotFound { .. } => from_parts(
            StatusCode::NOT_FOUND,
            "AUTH_USER_NOT_FOUND",
            "User not found",
            "The authenticated account no longer exists",
            instance,
        ),
        DomainError::EmailAlreadyExists { email } => from_parts(
            StatusCode::CONFLICT,
            "AUTH_EMAIL_CONFLICT",
            "Email already exists",
            format!("Email '{email}' is already in use"),
            instance,
        ),
        DomainError::InvalidCredentials => from_parts(
            StatusCode::UNAUTHORIZED,
            "AUTH_INVALID_CREDENTIALS",
            "Invalid credentials",
            "Email or password is incorrect",
            instance,
        ),
        DomainError::Forbidden => from_parts(
            StatusCode::FORBIDDEN,
            "AUTH_FORBIDDEN",
            "Forbidden",
            "Admin privileges are required",
            instance,
        ),
        DomainError::InsufficientStock { .. }
        | DomainError::TotalMismatch { .. }
        | DomainError::PaymentNotCompleted { .. }
        | DomainError::PaymentAmountMismatch { .. } => from_parts(
            StatusCode::BAD_REQUEST,
            match e {
                DomainError::InsufficientStock { .. } => "COMMERCE_INSUFFICIENT_STOCK",
                DomainError::TotalMismatch { .. } => "COMMERCE_TOTAL_MISMATCH",
                DomainError::PaymentNotCompleted { .. } => "COMMERCE_PAYMENT_NOT_COMPLETED",
                _ => "COMMERCE_PAYMENT_MISMATCH",
            },
            "Order rejected",
            e.to_string(),
            instance,
        ),
        DomainError::PaymentProvider { .. } => from_parts(
            StatusCode::BAD_REQUEST,
            "COMMERCE_PAYMENT_PROVIDER",
            "Payment provider error",
            "The payment could not be verified with the provider",
            instance,
        ),
        DomainError::Validation { .. } => from_parts(
            StatusCode::BAD_REQUEST,
            "COMMERCE_VALIDATION",
            "Validation error",
            e.to_string(),
            instance,
        ),
        DomainError::Database { .. } | DomainError::Internal { .. } => {
            // Log the internal details but never expose them to the client.
            tracing::error!(error = ?e, "Internal error");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Internal error",
                "An internal error occurred",
                instance,
            )
        }
    }
}

/// Missing or unusable bearer credential.
pub fn auth_required(instance: &str) -> ProblemResponse {
    from_parts(
        StatusCode::UNAUTHORIZED,
        "AUTH_REQUIRED",
        "Authentication required",
        "A valid bearer token is required",
        instance,
    )
}
