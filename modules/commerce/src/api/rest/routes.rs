use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};

use crate::api::rest::handlers;
use crate::domain::auth::AuthService;
use crate::domain::catalog::CatalogService;
use crate::domain::orders::OrderService;
use crate::domain::payments::PaymentService;
use crate::security::TokenService;

/// Everything the REST layer needs, shared via an `Extension` layer.
pub struct ApiContext {
    pub auth: AuthService,
    pub catalog: CatalogService,
    pub orders: OrderService,
    pub payments: PaymentService,
    pub tokens: TokenService,
}

/// The full REST surface under `/api`.
pub fn router(ctx: Arc<ApiContext>) -> Router {
    Router::new()
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/me", get(handlers::current_user))
        .route(
            "/api/products",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/api/products/{id}",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route(
            "/api/orders",
            get(handlers::list_orders).post(handlers::place_order),
        )
        .route("/api/orders/{id}", get(handlers::get_order))
        .route(
            "/api/stripe/create-payment-intent",
            post(handlers::create_payment_intent),
        )
        .route("/api/stripe/verify-payment", post(handlers::verify_payment))
        .route("/api/stripe/config", get(handlers::stripe_config))
        .layer(Extension(ctx))
}
