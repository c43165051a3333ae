use std::sync::Arc;

use axum::{
    extract::Path,
    http::{StatusCode, Uri},
    response::Json,
    Extension,
};
use tracing::{error, info};
use uuid::Uuid;

use crate::api::problem::ProblemResponse;
use crate::api::rest::auth::AuthUser;
use crate::api::rest::dto::{
    AuthResponseDto, CreateIntentReq, CreateProductReq, IntentDto, LoginReq, OrderDto,
    PlaceOrderReq, ProductDto, RegisterReq, StripeConfigDto, UpdateProductReq, UserDto,
    VerifyPaymentDto, VerifyPaymentReq,
};
use crate::api::rest::error::map_domain_error;
use crate::api::rest::routes::ApiContext;

// --- auth ---

pub async fn register(
    uri: Uri,
    Extension(ctx): Extension<Arc<ApiContext>>,
    Json(req_body): Json<RegisterReq>,
) -> Result<(StatusCode, Json<AuthResponseDto>), ProblemResponse> {
    info!("Registering user: {}", req_body.email);

    match ctx.auth.register(req_body.into()).await {
        Ok((user, token)) => Ok((
            StatusCode::CREATED,
            Json(AuthResponseDto {
                token,
                user: UserDto::from(user),
            }),
        )),
        Err(e) => {
            error!("Failed to register user: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

pub async fn login(
    uri: Uri,
    Extension(ctx): Extension<Arc<ApiContext>>,
    Json(req_body): Json<LoginReq>,
) -> Result<Json<AuthResponseDto>, ProblemResponse> {
    match ctx.auth.login(req_body.into()).await {
        Ok((user, token)) => Ok(Json(AuthResponseDto {
            token,
            user: UserDto::from(user),
        })),
        Err(e) => Err(map_domain_error(&e, uri.path())),
    }
}

pub async fn current_user(
    AuthUser(user_id): AuthUser,
    Extension(ctx): Extension<Arc<ApiContext>>,
    uri: Uri,
) -> Result<Json<UserDto>, ProblemResponse> {
    match ctx.auth.current_user(user_id).await {
        Ok(user) => Ok(Json(UserDto::from(user))),
        Err(e) => Err(map_domain_error(&e, uri.path())),
    }
}

// --- catalog ---

pub async fn list_products(
    Extension(ctx): Extension<Arc<ApiContext>>,
    uri: Uri,
) -> Result<Json<Vec<ProductDto>>, ProblemResponse> {
    match ctx.catalog.list_products().await {
        Ok(products) => Ok(Json(products.into_iter().map(ProductDto::from).collect())),
        Err(e) => {
            error!("Failed to list products: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

pub async fn get_product(
    Extension(ctx): Extension<Arc<ApiContext>>,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<ProductDto>, ProblemResponse> {
    match ctx.catalog.get_product(id).await {
        Ok(product) => Ok(Json(ProductDto::from(product))),
        Err(e) => Err(map_domain_error(&e, uri.path())),
    }
}

pub async fn create_product(
    AuthUser(user_id): AuthUser,
    uri: Uri,
    Extension(ctx): Extension<Arc<ApiContext>>,
    Json(req_body): Json<CreateProductReq>,
) -> Result<(StatusCode, Json<ProductDto>), ProblemResponse> {
    info!("Creating product: {}", req_body.name);

    let _admin = ctx
        .auth
        .require_admin(user_id)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;

    match ctx.catalog.create_product(req_body.into()).await {
        Ok(product) => Ok((StatusCode::CREATED, Json(ProductDto::from(product)))),
        Err(e) => {
            error!("Failed to create product: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

pub async fn update_product(
    AuthUser(user_id): AuthUser,
    uri: Uri,
    Extension(ctx): Extension<Arc<ApiContext>>,
    Path(id): Path<Uuid>,
    Json(req_body): Json<UpdateProductReq>,
) -> Result<Json<ProductDto>, ProblemResponse> {
    info!("Updating product {}", id);

    let _admin = ctx
        .auth
        .require_admin(user_id)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;

    match ctx.catalog.update_product(id, req_body.into()).await {
        Ok(product) => Ok(Json(ProductDto::from(product))),
        Err(e) => {
            error!("Failed to update product {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

pub async fn delete_product(
    AuthUser(user_id): AuthUser,
    Extension(ctx): Extension<Arc<ApiContext>>,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<StatusCode, ProblemResponse> {
    info!("Deleting product {}", id);

    let _admin = ctx
        .auth
        .require_admin(user_id)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;

    match ctx.catalog.delete_product(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete product {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

// --- orders ---

pub async fn place_order(
    AuthUser(user_id): AuthUser,
    uri: Uri,
    Extension(ctx): Extension<Arc<ApiContext>>,
    Json(req_body): Json<PlaceOrderReq>,
) -> Result<(StatusCode, Json<OrderDto>), ProblemResponse> {
    info!(
        "Placing order for user {} with {} lines",
        user_id,
        req_body.items.len()
    );

    match ctx.orders.place_order(user_id, req_body.into()).await {
        Ok(order) => Ok((StatusCode::CREATED, Json(OrderDto::from(order)))),
        Err(e) => {
            error!("Failed to place order: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

pub async fn list_orders(
    AuthUser(user_id): AuthUser,
    Extension(ctx): Extension<Arc<ApiContext>>,
    uri: Uri,
) -> Result<Json<Vec<OrderDto>>, ProblemResponse> {
    match ctx.orders.list_orders(user_id).await {
        Ok(orders) => Ok(Json(orders.into_iter().map(OrderDto::from).collect())),
        Err(e) => {
            error!("Failed to list orders: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

pub async fn get_order(
    AuthUser(user_id): AuthUser,
    Extension(ctx): Extension<Arc<ApiContext>>,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<OrderDto>, ProblemResponse> {
    match ctx.orders.get_order(user_id, id).await {
        Ok(order) => Ok(Json(OrderDto::from(order))),
        Err(e) => Err(map_domain_error(&e, uri.path())),
    }
}

// --- payments ---

pub async fn create_payment_intent(
    AuthUser(user_id): AuthUser,
    uri: Uri,
    Extension(ctx): Extension<Arc<ApiContext>>,
    Json(req_body): Json<CreateIntentReq>,
) -> Result<Json<IntentDto>, ProblemResponse> {
    info!("Creating payment intent for user {}", user_id);

    match ctx.payments.create_intent(req_body.amount, user_id).await {
        Ok(intent) => Ok(Json(IntentDto {
            client_secret: intent.client_secret,
            payment_intent_id: intent.id,
        })),
        Err(e) => {
            error!("Failed to create payment intent: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

pub async fn verify_payment(
    AuthUser(_user_id): AuthUser,
    uri: Uri,
    Extension(ctx): Extension<Arc<ApiContext>>,
    Json(req_body): Json<VerifyPaymentReq>,
) -> Result<Json<VerifyPaymentDto>, ProblemResponse> {
    match ctx.payments.verify_intent(&req_body.payment_intent_id).await {
        Ok(charge) => Ok(Json(VerifyPaymentDto {
            verified: charge.succeeded(),
            amount: charge.amount,
            payment_intent_id: charge.id,
            status: charge.status,
        })),
        Err(e) => {
            error!("Failed to verify payment: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

pub async fn stripe_config(
    Extension(ctx): Extension<Arc<ApiContext>>,
) -> Json<StripeConfigDto> {
    Json(StripeConfigDto {
        publishable_key: ctx.payments.publishable_key().to_string(),
    })
}
