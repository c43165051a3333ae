//! Commerce module: user accounts, product catalog, checkout and payment
//! verification for the storefront server.
//!
//! Layering follows the usual module shape:
//! - `contract` — plain domain models shared across layers.
//! - `domain` — services with the business rules, depending only on ports.
//! - `infra` — SeaORM storage adapters and payment provider adapters.
//! - `api` — REST DTOs, handlers, routes and problem mapping.

pub mod api;
pub mod config;
pub mod contract;
pub mod domain;
pub mod infra;
pub mod security;

pub use config::CommerceConfig;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::api::rest::ApiContext;
use crate::domain::auth::AuthService;
use crate::domain::catalog::CatalogService;
use crate::domain::orders::OrderService;
use crate::domain::payments::PaymentService;
use crate::domain::ports::PaymentProvider;
use crate::infra::storage::{
    SeaOrmCatalogRepository, SeaOrmOrdersRepository, SeaOrmUsersRepository,
};
use crate::security::TokenService;

/// Wire the module's services against a live database connection and a
/// payment provider, producing the shared REST context.
pub fn build_context(
    db: DatabaseConnection,
    cfg: &CommerceConfig,
    provider: Arc<dyn PaymentProvider>,
) -> Arc<ApiContext> {
    let tokens = TokenService::new(&cfg.jwt_secret, cfg.jwt_expiry_hours);

    let users_repo = Arc::new(SeaOrmUsersRepository::new(db.clone()));
    let catalog_repo = Arc::new(SeaOrmCatalogRepository::new(db.clone()));
    let orders_repo = Arc::new(SeaOrmOrdersRepository::new(db));

    Arc::new(ApiContext {
        auth: AuthService::new(
            users_repo,
            tokens.clone(),
            cfg.admin_email_domain.clone(),
            cfg.min_password_len,
        ),
        catalog: CatalogService::new(catalog_repo),
        orders: OrderService::new(orders_repo, provider.clone()),
        payments: PaymentService::new(provider, cfg.stripe.publishable_key.clone()),
        tokens,
    })
}
