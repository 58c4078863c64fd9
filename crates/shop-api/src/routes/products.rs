//! 상품 endpoint.
//!
//! 조회는 공개, 생성/수정/삭제는 admin 게이트 뒤에 있습니다.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use super::MessageResponse;
use crate::error::{ApiError, ApiErrorResponse, ApiResult, ValidatedJson};
use crate::repository::{NewProduct, Product, ProductFilter, ProductRepository, ProductUpdate};
use crate::state::AppState;

/// 상품 생성 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    /// 업로드 디렉터리 기준 이미지 경로
    pub image: Option<String>,
}

/// 상품 부분 수정 요청.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
}

fn ensure_price(price: Option<Decimal>) -> ApiResult<()> {
    match price {
        Some(p) if p.is_sign_negative() && !p.is_zero() => {
            Err(ApiError::Validation("price must not be negative".to_string()))
        }
        _ => Ok(()),
    }
}

/// 상품 목록.
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "products",
    params(ProductFilter),
    responses(
        (status = 200, description = "상품 목록", body = Vec<Product>),
        (status = 503, description = "DB 미설정", body = ApiErrorResponse)
    )
)]
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ProductFilter>,
) -> ApiResult<Json<Vec<Product>>> {
    let pool = state.db()?;
    let products = ProductRepository::list(pool, &filter.normalized()).await?;
    Ok(Json(products))
}

/// 상품 조회.
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "products",
    params(("id" = i64, Path, description = "상품 ID")),
    responses(
        (status = 200, description = "상품", body = Product),
        (status = 404, description = "상품 없음", body = ApiErrorResponse)
    )
)]
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Product>> {
    let pool = state.db()?;
    let product = ProductRepository::get_by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("product"))?;
    Ok(Json(product))
}

/// 상품 생성 (admin).
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "products",
    security(("bearer_auth" = [])),
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "생성된 상품", body = Product),
        (status = 400, description = "검증 실패", body = ApiErrorResponse),
        (status = 403, description = "admin 아님", body = ApiErrorResponse)
    )
)]
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    ensure_price(Some(req.price))?;
    let pool = state.db()?;

    let product = ProductRepository::create(
        pool,
        NewProduct {
            title: req.title,
            price: req.price,
            description: req.description,
            category: req.category,
            image: req.image,
        },
    )
    .await?;

    info!(product_id = product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// 상품 부분 수정 (admin).
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "products",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "상품 ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "수정된 상품", body = Product),
        (status = 404, description = "상품 없음", body = ApiErrorResponse)
    )
)]
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateProductRequest>,
) -> ApiResult<Json<Product>> {
    ensure_price(req.price)?;
    let pool = state.db()?;

    let update = ProductUpdate {
        title: req.title,
        price: req.price,
        description: req.description,
        category: req.category,
        image: req.image,
    };

    let product = ProductRepository::update(pool, id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("product"))?;

    Ok(Json(product))
}

/// 상품 삭제 (admin).
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "products",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "상품 ID")),
    responses(
        (status = 200, description = "삭제 완료", body = MessageResponse),
        (status = 404, description = "상품 없음", body = ApiErrorResponse)
    )
)]
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    let pool = state.db()?;

    if !ProductRepository::delete(pool, id).await? {
        return Err(ApiError::not_found("product"));
    }

    info!(product_id = id, "Product deleted");
    Ok(Json(MessageResponse::new("Product deleted")))
}

/// 공개 상품 라우터.
pub fn products_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
}

/// admin 전용 상품 라우터.
pub fn products_admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/products", post(create_product))
        .route(
            "/products/{id}",
            axum::routing::put(update_product).delete(delete_product),
        )
}
